// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User lookups for gateway authentication.

use caseload_core::CaseloadError;
use rusqlite::params;

use crate::database::Database;
use crate::models::User;

fn user_from_row(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        api_token: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Resolve a bearer token to its user. `None` means the request is
/// unauthenticated.
pub async fn get_by_api_token(
    db: &Database,
    api_token: &str,
) -> Result<Option<User>, CaseloadError> {
    let api_token = api_token.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, api_token, created_at FROM users WHERE api_token = ?1",
            )?;
            let result = stmt.query_row(params![api_token], user_from_row);
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a user row. Used by provisioning tooling and tests.
pub async fn insert_user(db: &Database, user: &User) -> Result<(), CaseloadError> {
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, api_token, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.email, user.api_token, user.created_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
