// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, positive prices, and a sane
//! order-total ceiling.

use crate::diagnostic::ConfigError;
use crate::model::CaseloadConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CaseloadConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let addr = config.server.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{addr}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.stripe.signature_tolerance_secs <= 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "stripe.signature_tolerance_secs must be positive, got {}",
                config.stripe.signature_tolerance_secs
            ),
        });
    }

    for (key, cents) in [
        ("pricing.telephone_cents", config.pricing.telephone_cents),
        ("pricing.visitor_cents", config.pricing.visitor_cents),
    ] {
        if cents <= 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be positive, got {cents}"),
            });
        }
        if cents >= config.pricing.max_total_cents {
            errors.push(ConfigError::Validation {
                message: format!(
                    "{key} ({cents}) must be below pricing.max_total_cents ({})",
                    config.pricing.max_total_cents
                ),
            });
        }
    }

    if config.pricing.currency.len() != 3
        || !config.pricing.currency.chars().all(|c| c.is_ascii_lowercase())
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "pricing.currency must be a lowercase ISO code, got `{}`",
                config.pricing.currency
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = CaseloadConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = CaseloadConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))));
    }

    #[test]
    fn non_positive_price_fails_validation() {
        let mut config = CaseloadConfig::default();
        config.pricing.telephone_cents = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("telephone_cents"))));
    }

    #[test]
    fn price_above_total_ceiling_fails_validation() {
        let mut config = CaseloadConfig::default();
        config.pricing.visitor_cents = 200_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("max_total_cents"))));
    }

    #[test]
    fn zero_tolerance_fails_validation() {
        let mut config = CaseloadConfig::default();
        config.stripe.signature_tolerance_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("signature_tolerance_secs"))));
    }

    #[test]
    fn uppercase_currency_fails_validation() {
        let mut config = CaseloadConfig::default();
        config.pricing.currency = "USD".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("currency"))));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = CaseloadConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.storage.database_path = "/tmp/caseload.db".to_string();
        config.stripe.secret_key = Some("sk_test_1".to_string());
        config.stripe.webhook_secret = Some("whsec_1".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
