// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook signature verification and event parsing.
//!
//! Stripe signs the raw request body with HMAC-SHA256 and sends the result
//! in the `Stripe-Signature` header as `t=<unix>,v1=<hex>[,v1=<hex>...]`.
//! The signed payload is `"{t}.{body}"`, which binds the timestamp to the
//! body and lets the tolerance check defeat replay.

use std::collections::HashMap;

use caseload_core::CaseloadError;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The one event type the fulfillment engine acts on.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Why a webhook delivery failed authentication.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("no v1 signature matched the payload")]
    NoMatchingSignature,
    #[error("timestamp outside tolerance window ({drift_secs}s drift)")]
    TimestampOutOfTolerance { drift_secs: i64 },
}

impl From<SignatureError> for CaseloadError {
    fn from(e: SignatureError) -> Self {
        CaseloadError::Signature(e.to_string())
    }
}

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// `now_unix` is injected so the tolerance check is deterministic in tests.
/// Comparison goes through `Mac::verify_slice`, which is constant-time.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: u64,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::MalformedHeader);
        };
        match key {
            "t" => {
                timestamp =
                    Some(value.parse().map_err(|_| SignatureError::MalformedHeader)?);
            }
            "v1" => {
                let bytes = hex::decode(value).map_err(|_| SignatureError::MalformedHeader)?;
                candidates.push(bytes);
            }
            // Unknown schemes (v0, ...) are ignored per Stripe's docs.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MalformedHeader)?;
    if candidates.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }

    let drift = (now_unix - timestamp).abs();
    if drift > tolerance_secs as i64 {
        return Err(SignatureError::TimestampOutOfTolerance { drift_secs: drift });
    }

    for candidate in &candidates {
        // Mac construction from arbitrary-length keys cannot fail.
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return Err(SignatureError::NoMatchingSignature);
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::NoMatchingSignature)
}

/// Mint a valid `Stripe-Signature` header for `payload`. Test and tooling
/// helper; the service only ever verifies.
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}

/// A parsed webhook event, reduced to the fields fulfillment reads.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: CheckoutObject,
}

/// The `data.object` of a checkout event: the session and its metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutObject {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl WebhookEvent {
    /// Parse the raw (already signature-verified) body.
    pub fn parse(payload: &[u8]) -> Result<Self, CaseloadError> {
        serde_json::from_slice(payload)
            .map_err(|e| CaseloadError::Validation(format!("malformed webhook payload: {e}")))
    }

    /// Metadata value by key, if present and non-empty.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.data
            .object
            .metadata
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
