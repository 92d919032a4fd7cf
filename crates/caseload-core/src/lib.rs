// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Caseload records storefront.
//!
//! This crate provides the domain types, the error type, and the pure
//! fulfillment derivation logic shared across the Caseload workspace.
//! It performs no I/O; everything here is unit-testable without a store.

pub mod error;
pub mod fulfillment;
pub mod types;

pub use error::CaseloadError;
pub use fulfillment::{derive_fulfillment, FulfillmentOutcome, SettlementAvailability, TypeAvailability};
pub use types::{FulfillmentStatus, PaymentStatus, ProcessStatus, RecordStatus, RecordType};
