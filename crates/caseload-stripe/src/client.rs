// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Stripe Checkout Sessions API.
//!
//! Stripe's API is form-encoded with bracketed array/hash keys, so the
//! request body is built as an explicit parameter list rather than a serde
//! struct. Only the two response fields we read are deserialized.

use std::time::Duration;

use async_trait::async_trait;
use caseload_core::CaseloadError;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

/// One purchasable line on a Checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub description: Option<String>,
    pub unit_amount_cents: i64,
    pub quantity: u32,
}

/// Everything needed to create a hosted Checkout session.
///
/// `metadata` is echoed back verbatim on the webhook event and is the only
/// channel through which the order id survives the round trip.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub line_items: Vec<LineItem>,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: Vec<(String, String)>,
}

/// The slice of Stripe's session object we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page URL. Absent once the session is consumed.
    pub url: Option<String>,
}

/// Abstraction over session creation so services can be tested with a fake
/// payment provider.
#[async_trait]
pub trait CheckoutClient: Send + Sync {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, CaseloadError>;
}

/// Live client talking to the Stripe REST API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
}

impl StripeClient {
    /// Creates a client authenticated with the given secret key.
    ///
    /// `api_base` is normally `https://api.stripe.com`; tests point it at a
    /// mock server.
    pub fn new(secret_key: &str, api_base: &str) -> Result<Self, CaseloadError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {secret_key}"))
            .map_err(|e| CaseloadError::Config(format!("invalid Stripe secret key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CaseloadError::PaymentProvider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn form_params(request: &SessionRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            (
                "customer_email".to_string(),
                request.customer_email.clone(),
            ),
        ];
        for (i, item) in request.line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                request.currency.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            if let Some(description) = &item.description {
                params.push((
                    format!("line_items[{i}][price_data][product_data][description]"),
                    description.clone(),
                ));
            }
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount_cents.to_string(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }
        for (key, value) in &request.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
        }
        params
    }
}

#[async_trait]
impl CheckoutClient for StripeClient {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, CaseloadError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let response = self
            .client
            .post(&url)
            .form(&Self::form_params(request))
            .send()
            .await
            .map_err(|e| CaseloadError::PaymentProvider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "checkout session response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CaseloadError::PaymentProvider {
                message: format!("Stripe returned {status}: {body}"),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CaseloadError::PaymentProvider {
                message: format!("failed to read response body: {e}"),
                source: Some(Box::new(e)),
            })?;
        serde_json::from_str(&body).map_err(|e| CaseloadError::PaymentProvider {
            message: format!("failed to parse session response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
