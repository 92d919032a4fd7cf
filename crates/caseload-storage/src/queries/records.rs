// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone and visitation record lookups.
//!
//! Fulfillment only needs the row id (cheap existence probe); the access
//! gateway loads full payloads for unlocked orders.

use caseload_core::CaseloadError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{PhoneRecord, VisitationRecord};

fn phone_from_row(row: &rusqlite::Row<'_>) -> Result<PhoneRecord, rusqlite::Error> {
    Ok(PhoneRecord {
        id: row.get(0)?,
        inmate_id: row.get(1)?,
        call_history: row.get(2)?,
        total_calls: row.get(3)?,
        total_approved_numbers: row.get(4)?,
    })
}

fn visitation_from_row(row: &rusqlite::Row<'_>) -> Result<VisitationRecord, rusqlite::Error> {
    Ok(VisitationRecord {
        id: row.get(0)?,
        inmate_id: row.get(1)?,
        approved_visitors: row.get(2)?,
        visit_history: row.get(3)?,
        total_approved_visitors: row.get(4)?,
        total_visits: row.get(5)?,
    })
}

/// Id of the phone record for an inmate, if one exists.
pub async fn phone_record_id_for_inmate(
    db: &Database,
    inmate_id: &str,
) -> Result<Option<String>, CaseloadError> {
    let inmate_id = inmate_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM phone_records WHERE inmate_id = ?1 LIMIT 1")?;
            let result = stmt.query_row(params![inmate_id], |row| row.get(0));
            match result {
                Ok(id) => Ok(Some(id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Id of the visitation record for an inmate, if one exists.
pub async fn visitation_record_id_for_inmate(
    db: &Database,
    inmate_id: &str,
) -> Result<Option<String>, CaseloadError> {
    let inmate_id = inmate_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id FROM visitation_records WHERE inmate_id = ?1 LIMIT 1")?;
            let result = stmt.query_row(params![inmate_id], |row| row.get(0));
            match result {
                Ok(id) => Ok(Some(id)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a phone record payload by id.
pub async fn get_phone_record(
    db: &Database,
    record_id: &str,
) -> Result<Option<PhoneRecord>, CaseloadError> {
    let record_id = record_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, inmate_id, call_history, total_calls, total_approved_numbers \
                 FROM phone_records WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![record_id], phone_from_row);
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a visitation record payload by id.
pub async fn get_visitation_record(
    db: &Database,
    record_id: &str,
) -> Result<Option<VisitationRecord>, CaseloadError> {
    let record_id = record_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, inmate_id, approved_visitors, visit_history, \
                 total_approved_visitors, total_visits \
                 FROM visitation_records WHERE id = ?1",
            )?;
            let result = stmt.query_row(params![record_id], visitation_from_row);
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load the phone record payload for an inmate, if one exists. Used by
/// preview construction.
pub async fn get_phone_record_by_inmate(
    db: &Database,
    inmate_id: &str,
) -> Result<Option<PhoneRecord>, CaseloadError> {
    let inmate_id = inmate_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, inmate_id, call_history, total_calls, total_approved_numbers \
                 FROM phone_records WHERE inmate_id = ?1 LIMIT 1",
            )?;
            let result = stmt.query_row(params![inmate_id], phone_from_row);
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load the visitation record payload for an inmate, if one exists.
pub async fn get_visitation_record_by_inmate(
    db: &Database,
    inmate_id: &str,
) -> Result<Option<VisitationRecord>, CaseloadError> {
    let inmate_id = inmate_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, inmate_id, approved_visitors, visit_history, \
                 total_approved_visitors, total_visits \
                 FROM visitation_records WHERE inmate_id = ?1 LIMIT 1",
            )?;
            let result = stmt.query_row(params![inmate_id], visitation_from_row);
            match result {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
