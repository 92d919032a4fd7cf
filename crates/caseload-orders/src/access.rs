// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unlock-gated record retrieval.
//!
//! This is the only path that reads phone/visitation payloads for
//! customers. The gate is `records_unlocked` plus the per-type id; a
//! missing row behind a set id means the data is still being prepared and
//! surfaces as an empty payload, never an error.

use caseload_core::types::{Order, PhoneRecord, VisitationRecord};
use caseload_core::CaseloadError;
use caseload_storage::queries::{orders, records};
use caseload_storage::Database;
use tracing::debug;

/// The order plus whatever payloads its unlock state permits.
#[derive(Debug, Clone)]
pub struct UnlockedRecords {
    pub order: Order,
    pub phone_record: Option<PhoneRecord>,
    pub visitation_record: Option<VisitationRecord>,
}

/// Fetch the records unlocked by `order_id`, scoped to the owning user.
pub async fn fetch_unlocked_records(
    db: &Database,
    user_id: &str,
    order_id: &str,
) -> Result<UnlockedRecords, CaseloadError> {
    let order = orders::get_for_user(db, order_id, user_id)
        .await?
        .ok_or_else(|| CaseloadError::NotFound(format!("order {order_id} not found")))?;

    let mut phone_record = None;
    let mut visitation_record = None;

    if order.records_unlocked {
        if let Some(id) = &order.phone_record_id {
            phone_record = records::get_phone_record(db, id).await?;
            if phone_record.is_none() {
                debug!(order_id = %order.id, record_id = %id, "phone record not yet materialized");
            }
        }
        if let Some(id) = &order.visitor_record_id {
            visitation_record = records::get_visitation_record(db, id).await?;
            if visitation_record.is_none() {
                debug!(order_id = %order.id, record_id = %id, "visitation record not yet materialized");
            }
        }
    }

    Ok(UnlockedRecords {
        order,
        phone_record,
        visitation_record,
    })
}
