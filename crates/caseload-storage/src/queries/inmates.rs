// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only inmate lookups. Inmate rows are written by an out-of-band
//! ingestion process; this system never mutates them.

use caseload_core::CaseloadError;
use rusqlite::params;

use crate::database::Database;
use crate::models::Inmate;

fn inmate_from_row(row: &rusqlite::Row<'_>) -> Result<Inmate, rusqlite::Error> {
    Ok(Inmate {
        id: row.get(0)?,
        doc_number: row.get(1)?,
        full_name: row.get(2)?,
        phone_records_available: row.get::<_, i64>(3)? != 0,
        visitor_records_available: row.get::<_, i64>(4)? != 0,
        phone_records_available_date: row.get(5)?,
        visitor_records_available_date: row.get(6)?,
    })
}

/// Look up an inmate by DOC number. Returns `None` for unknown numbers;
/// callers degrade to a "processing" response rather than erroring.
pub async fn get_by_doc_number(
    db: &Database,
    doc_number: &str,
) -> Result<Option<Inmate>, CaseloadError> {
    let doc_number = doc_number.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, doc_number, full_name, \
                 phone_records_available, visitor_records_available, \
                 phone_records_available_date, visitor_records_available_date \
                 FROM inmates WHERE doc_number = ?1",
            )?;
            let result = stmt.query_row(params![doc_number], inmate_from_row);
            match result {
                Ok(inmate) => Ok(Some(inmate)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    async fn seed_inmate(db: &Database) {
        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO inmates (id, doc_number, full_name, \
                     phone_records_available, visitor_records_available, \
                     phone_records_available_date) \
                     VALUES ('inm-1', '12345', 'John Doe', 1, 0, '2026-03-01')",
                    [],
                )?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
            .unwrap();
    }

    #[tokio::test]
    async fn get_by_doc_number_maps_flags_and_dates() {
        let (db, _dir) = setup_db().await;
        seed_inmate(&db).await;

        let inmate = get_by_doc_number(&db, "12345").await.unwrap().unwrap();
        assert_eq!(inmate.id, "inm-1");
        assert_eq!(inmate.full_name.as_deref(), Some("John Doe"));
        assert!(inmate.phone_records_available);
        assert!(!inmate.visitor_records_available);
        assert_eq!(
            inmate.phone_records_available_date.as_deref(),
            Some("2026-03-01")
        );
        assert!(inmate.visitor_records_available_date.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_doc_number_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get_by_doc_number(&db, "99999").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
