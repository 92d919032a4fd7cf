// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Business services for the Caseload records storefront.
//!
//! Four request-scoped services over the storage and Stripe layers:
//!
//! - [`resolver`] — read-only availability checks with redacted previews
//! - [`checkout`] — cart validation and hosted-session creation
//! - [`engine`] — the webhook-driven fulfillment state machine
//! - [`access`] — unlock-gated record retrieval
//!
//! plus the trivial [`waitlist`] signup. None of these hold state between
//! requests; each call owns exactly one order row at most.

pub mod access;
pub mod checkout;
pub mod engine;
pub mod resolver;
pub mod waitlist;
