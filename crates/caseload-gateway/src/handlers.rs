// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the storefront REST API.

use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use caseload_core::types::{Order, PhoneRecord, VisitationRecord};
use caseload_core::CaseloadError;
use caseload_orders::resolver::AvailabilityReport;
use caseload_orders::{access, checkout, engine, resolver, waitlist};
use serde::{Deserialize, Serialize};

use crate::auth::{resolve_user, AuthUser};
use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map service errors onto HTTP statuses.
///
/// Signature failures are 400 (the processor retries on non-2xx);
/// provider failures are 502 so the client can distinguish "try again"
/// from "your request was wrong".
fn error_response(e: CaseloadError) -> Response {
    let status = match &e {
        CaseloadError::Validation(_) | CaseloadError::Signature(_) => StatusCode::BAD_REQUEST,
        CaseloadError::Auth(_) => StatusCode::UNAUTHORIZED,
        CaseloadError::NotFound(_) => StatusCode::NOT_FOUND,
        CaseloadError::Conflict(_) => StatusCode::CONFLICT,
        CaseloadError::PaymentProvider { .. } => StatusCode::BAD_GATEWAY,
        CaseloadError::Config(_)
        | CaseloadError::Storage { .. }
        | CaseloadError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "request failed");
    }
    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health — unauthenticated liveness probe.
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Request body for POST /v1/availability.
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub doc_number: String,
}

/// POST /v1/availability
///
/// Auth is optional here: an authenticated caller additionally gets the
/// already-purchased report. An invalid token degrades to anonymous, like
/// an unauthenticated availability check from the storefront.
pub async fn post_availability(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(body): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityReport>, Response> {
    let user = resolve_user(&state, &headers).await;
    let report = resolver::check_availability(&state.db, &body.doc_number, user.as_ref().map(|u| u.id.as_str()))
        .await
        .map_err(error_response)?;
    Ok(Json(report))
}

/// Request body for POST /v1/checkout.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub record_types: Vec<String>,
    pub inmate_id: String,
}

/// Response body for POST /v1/checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
    pub order_id: String,
}

/// POST /v1/checkout — requires auth.
pub async fn post_checkout(
    State(state): State<GatewayState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, Response> {
    let outcome = checkout::create_checkout(
        &state.db,
        state.checkout.as_ref(),
        &state.config,
        &user,
        &checkout::CheckoutRequest {
            record_types: body.record_types,
            inmate_id: body.inmate_id,
        },
    )
    .await
    .map_err(error_response)?;
    Ok(Json(CheckoutResponse {
        url: outcome.url,
        order_id: outcome.order_id,
    }))
}

/// POST /v1/stripe/webhook
///
/// Raw body in, "ok" out. The signature header is the credential; this
/// route sits outside the bearer-auth middleware.
pub async fn post_stripe_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, Response> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(CaseloadError::Signature(
                "missing Stripe-Signature header".into(),
            ))
        })?;

    engine::handle_webhook(&state.db, &state.config.stripe, &body, signature)
        .await
        .map_err(error_response)?;
    Ok("ok")
}

/// Response body for GET /v1/orders/{id}/records.
#[derive(Debug, Serialize)]
pub struct OrderRecordsResponse {
    pub order: Order,
    pub phone_record: Option<PhoneRecord>,
    pub visitation_record: Option<VisitationRecord>,
}

/// GET /v1/orders/{id}/records — requires auth; gated on unlock state.
pub async fn get_order_records(
    State(state): State<GatewayState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderRecordsResponse>, Response> {
    let unlocked = access::fetch_unlocked_records(&state.db, &user.id, &order_id)
        .await
        .map_err(error_response)?;
    Ok(Json(OrderRecordsResponse {
        order: unlocked.order,
        phone_record: unlocked.phone_record,
        visitation_record: unlocked.visitation_record,
    }))
}

/// Request body for POST /v1/waitlist.
#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    pub email: String,
    pub state: String,
}

/// Response body for POST /v1/waitlist.
#[derive(Debug, Serialize)]
pub struct WaitlistResponse {
    pub message: String,
}

/// POST /v1/waitlist — open endpoint, 409 on duplicate signup.
pub async fn post_waitlist(
    State(state): State<GatewayState>,
    Json(body): Json<WaitlistRequest>,
) -> Result<Json<WaitlistResponse>, Response> {
    waitlist::join_waitlist(&state.db, &body.email, &body.state)
        .await
        .map_err(error_response)?;
    Ok(Json(WaitlistResponse {
        message: "added to waitlist".to_string(),
    }))
}
