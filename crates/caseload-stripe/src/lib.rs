// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stripe integration for the Caseload records storefront.
//!
//! Two concerns live here: creating hosted Checkout sessions
//! ([`client::StripeClient`]) and authenticating webhook deliveries
//! ([`webhook::verify_signature`]). Everything else about payments is the
//! fulfillment engine's business.

pub mod client;
pub mod webhook;

pub use client::{CheckoutClient, CheckoutSession, LineItem, SessionRequest, StripeClient};
pub use webhook::{
    verify_signature, SignatureError, WebhookEvent, CHECKOUT_SESSION_COMPLETED,
};
