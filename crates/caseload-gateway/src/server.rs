// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use caseload_config::model::CaseloadConfig;
use caseload_core::CaseloadError;
use caseload_storage::Database;
use caseload_stripe::CheckoutClient;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub db: Arc<Database>,
    pub checkout: Arc<dyn CheckoutClient>,
    pub config: Arc<CaseloadConfig>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Build the full route tree over the given state.
///
/// Split from [`start_server`] so tests can drive the router without a
/// listener.
pub fn build_router(state: GatewayState) -> Router {
    // Open routes: liveness, availability (auth optional, resolved
    // inline), the waitlist, and the webhook (signature is the credential).
    let open_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/availability", post(handlers::post_availability))
        .route("/v1/waitlist", post(handlers::post_waitlist))
        .route("/v1/stripe/webhook", post(handlers::post_stripe_webhook))
        .with_state(state.clone());

    // Routes requiring an authenticated user.
    let api_routes = Router::new()
        .route("/v1/checkout", post(handlers::post_checkout))
        .route("/v1/orders/{id}/records", get(handlers::get_order_records))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let mut app = Router::new()
        .merge(open_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http());

    if state.config.server.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    app
}

/// Bind and serve until `shutdown` resolves.
pub async fn start_server(
    state: GatewayState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), CaseloadError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CaseloadError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CaseloadError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}
