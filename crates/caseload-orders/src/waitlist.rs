// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waitlist signups for states without record coverage yet.

use caseload_core::types::WaitlistEntry;
use caseload_core::CaseloadError;
use caseload_storage::queries::waitlist;
use caseload_storage::Database;
use tracing::info;

/// Join the waitlist for a state. Duplicate (email, state) signups map to
/// a conflict.
pub async fn join_waitlist(db: &Database, email: &str, state: &str) -> Result<(), CaseloadError> {
    let email = email.trim().to_lowercase();
    let state = state.trim().to_uppercase();
    if email.is_empty() || !email.contains('@') {
        return Err(CaseloadError::Validation("a valid email is required".into()));
    }
    if state.is_empty() {
        return Err(CaseloadError::Validation("state is required".into()));
    }

    waitlist::insert(db, &WaitlistEntry { email, state: state.clone() }).await?;
    info!(state = %state, "waitlist signup recorded");
    Ok(())
}
