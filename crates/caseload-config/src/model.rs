// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Caseload records storefront.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Caseload configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CaseloadConfig {
    /// Service identity and logging settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Stripe API and webhook settings.
    #[serde(default)]
    pub stripe: StripeConfig,

    /// Fixed record price table.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "caseload".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin on browser-facing endpoints.
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors_permissive(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_cors_permissive() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("caseload").join("caseload.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("caseload.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Stripe API and webhook configuration.
///
/// `secret_key` and `webhook_secret` are `None` by default and must be
/// provided (config file or `CASELOAD_STRIPE_*` env vars) to serve.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StripeConfig {
    /// Stripe secret API key.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Shared secret for webhook signature verification.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Stripe API base URL. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Redirect target after successful payment.
    #[serde(default = "default_success_url")]
    pub success_url: String,

    /// Redirect target after cancelled payment.
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,

    /// Maximum accepted age of a webhook signature timestamp, in seconds.
    #[serde(default = "default_signature_tolerance_secs")]
    pub signature_tolerance_secs: i64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            webhook_secret: None,
            api_base: default_api_base(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
            signature_tolerance_secs: default_signature_tolerance_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_success_url() -> String {
    "https://caseload.example/payment-success".to_string()
}

fn default_cancel_url() -> String {
    "https://caseload.example/".to_string()
}

fn default_signature_tolerance_secs() -> i64 {
    300
}

/// Fixed record price table. Totals are always computed from this table
/// server-side; client-sent amounts are never trusted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Unit price of telephone records, in cents.
    #[serde(default = "default_record_price_cents")]
    pub telephone_cents: i64,

    /// Unit price of visitor records, in cents.
    #[serde(default = "default_record_price_cents")]
    pub visitor_cents: i64,

    /// ISO currency code for checkout sessions.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Upper bound on a single order total, in cents. Defense against
    /// absurd totals.
    #[serde(default = "default_max_total_cents")]
    pub max_total_cents: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            telephone_cents: default_record_price_cents(),
            visitor_cents: default_record_price_cents(),
            currency: default_currency(),
            max_total_cents: default_max_total_cents(),
        }
    }
}

fn default_record_price_cents() -> i64 {
    2999
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_max_total_cents() -> i64 {
    100_000
}
