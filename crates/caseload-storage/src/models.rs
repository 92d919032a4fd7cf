// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `caseload-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within the
//! storage crate.

pub use caseload_core::types::{
    Inmate, Order, PhoneRecord, User, VisitationRecord, WaitlistEntry,
};
