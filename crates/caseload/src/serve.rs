// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `caseload serve` command implementation.
//!
//! Wires storage, the Stripe client, and the gateway together, then serves
//! until ctrl-c. Migrations run on database open.

use std::sync::Arc;

use caseload_config::model::CaseloadConfig;
use caseload_core::CaseloadError;
use caseload_gateway::GatewayState;
use caseload_storage::Database;
use caseload_stripe::StripeClient;
use tracing::{error, info};

/// Runs the `caseload serve` command.
pub async fn run_serve(config: CaseloadConfig) -> Result<(), CaseloadError> {
    init_tracing(&config.service.log_level);

    info!("starting caseload serve");

    let secret_key = config.stripe.secret_key.as_deref().ok_or_else(|| {
        eprintln!(
            "error: Stripe secret key required. Set stripe.secret_key in caseload.toml \
             or the CASELOAD_STRIPE_SECRET_KEY environment variable."
        );
        CaseloadError::Config("stripe.secret_key is not set".into())
    })?;
    if config.stripe.webhook_secret.is_none() {
        eprintln!(
            "error: Stripe webhook secret required. Set stripe.webhook_secret in caseload.toml \
             or the CASELOAD_STRIPE_WEBHOOK_SECRET environment variable."
        );
        return Err(CaseloadError::Config("stripe.webhook_secret is not set".into()));
    }

    let db = Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode)
        .await
        .map_err(|e| {
            error!(error = %e, path = %config.storage.database_path, "failed to open database");
            e
        })?;
    info!(path = %config.storage.database_path, "storage ready");

    let stripe = StripeClient::new(secret_key, &config.stripe.api_base)?;

    let db = Arc::new(db);
    let state = GatewayState {
        db: db.clone(),
        checkout: Arc::new(stripe),
        config: Arc::new(config),
        start_time: std::time::Instant::now(),
    };

    caseload_gateway::start_server(state, shutdown_signal()).await?;

    info!("shutting down");
    db.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install ctrl-c handler");
    }
    info!("shutdown signal received");
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("caseload={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
