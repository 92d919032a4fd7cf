// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API gateway for the Caseload records storefront.
//!
//! Exposes the availability resolver, checkout, the Stripe webhook, gated
//! record access, and the waitlist over axum. Authentication is a bearer
//! token resolved against the `users` table; the webhook authenticates via
//! its signature instead.

pub mod auth;
pub mod handlers;
pub mod server;

pub use server::{build_router, start_server, GatewayState};
