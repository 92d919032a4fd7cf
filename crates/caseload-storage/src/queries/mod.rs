// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod inmates;
pub mod orders;
pub mod records;
pub mod users;
pub mod waitlist;
