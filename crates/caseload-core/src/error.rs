// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Caseload records storefront.

use thiserror::Error;

/// The primary error type used across all Caseload services and storage operations.
#[derive(Debug, Error)]
pub enum CaseloadError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Request validation errors (bad cart, bad identifier, bad total).
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication errors (missing or unrecognized credential).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Webhook signature verification failures. Always a hard rejection
    /// before any payload field is trusted.
    #[error("signature verification failed: {0}")]
    Signature(String),

    /// Payment provider errors (session creation failure, malformed response).
    #[error("payment provider error: {message}")]
    PaymentProvider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated (e.g. duplicate waitlist entry).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
