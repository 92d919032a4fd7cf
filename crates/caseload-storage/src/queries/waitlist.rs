// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Waitlist signups, unique per (email, state).

use caseload_core::CaseloadError;
use rusqlite::params;

use crate::database::Database;
use crate::models::WaitlistEntry;

/// Insert a waitlist signup. A duplicate (email, state) pair maps to
/// [`CaseloadError::Conflict`] so the gateway can answer 409.
pub async fn insert(db: &Database, entry: &WaitlistEntry) -> Result<(), CaseloadError> {
    let entry = entry.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            match conn.execute(
                "INSERT INTO waitlist (email, state) VALUES (?1, ?2)",
                params![entry.email, entry.state],
            ) {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(CaseloadError::Conflict(
            "already on the waitlist for this state".to_string(),
        ))
    }
}
