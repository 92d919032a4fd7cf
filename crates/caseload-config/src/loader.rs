// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./caseload.toml` > `~/.config/caseload/caseload.toml`
//! > `/etc/caseload/caseload.toml` with environment variable overrides via
//! `CASELOAD_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CaseloadConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/caseload/caseload.toml` (system-wide)
/// 3. `~/.config/caseload/caseload.toml` (user XDG config)
/// 4. `./caseload.toml` (local directory)
/// 5. `CASELOAD_*` environment variables
pub fn load_config() -> Result<CaseloadConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CaseloadConfig::default()))
        .merge(Toml::file("/etc/caseload/caseload.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("caseload/caseload.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("caseload.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CaseloadConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CaseloadConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CaseloadConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CaseloadConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CASELOAD_STRIPE_WEBHOOK_SECRET`
/// must map to `stripe.webhook_secret`, not `stripe.webhook.secret`.
fn env_provider() -> Env {
    Env::prefixed("CASELOAD_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CASELOAD_STRIPE_WEBHOOK_SECRET -> "stripe_webhook_secret"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("stripe_", "stripe.", 1)
            .replacen("pricing_", "pricing.", 1);
        mapped.into()
    })
}
