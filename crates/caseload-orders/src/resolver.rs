// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only availability resolution with redacted previews.
//!
//! The resolver never blocks a purchase: an unknown doc number is a valid
//! `exists=false` outcome, and preview construction failures degrade to
//! `preview: null` rather than failing the call.

use caseload_core::types::RecordStatus;
use caseload_core::CaseloadError;
use caseload_storage::queries::{inmates, orders, records};
use caseload_storage::Database;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Entries shown per preview.
const PREVIEW_LIMIT: usize = 5;

/// Availability report for one record type.
#[derive(Debug, Clone, Serialize)]
pub struct TypeReport {
    pub available: bool,
    pub available_date: Option<String>,
    pub status: RecordStatus,
    pub preview: Option<Value>,
    pub already_purchased: bool,
}

impl TypeReport {
    fn unprocessed() -> Self {
        Self {
            available: false,
            available_date: None,
            status: RecordStatus::Processing,
            preview: None,
            already_purchased: false,
        }
    }
}

/// The full resolver result for one doc number.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub exists: bool,
    pub doc_number: String,
    pub inmate_name: Option<String>,
    /// Existing paid order for (user, doc number), if any.
    pub order_id: Option<String>,
    pub phone_records: TypeReport,
    pub visitor_records: TypeReport,
}

/// Check availability for `doc_number`, optionally on behalf of a known
/// user (which enables the already-purchased report).
///
/// Read-only. The only error paths are an empty doc number and a failure
/// reading the inmate or order row itself; preview reads are best-effort.
pub async fn check_availability(
    db: &Database,
    doc_number: &str,
    requesting_user: Option<&str>,
) -> Result<AvailabilityReport, CaseloadError> {
    let doc_number = doc_number.trim();
    if doc_number.is_empty() {
        return Err(CaseloadError::Validation("doc_number is required".into()));
    }

    let Some(inmate) = inmates::get_by_doc_number(db, doc_number).await? else {
        debug!(doc_number, "inmate not found, purchase still allowed");
        return Ok(AvailabilityReport {
            exists: false,
            doc_number: doc_number.to_string(),
            inmate_name: None,
            order_id: None,
            phone_records: TypeReport::unprocessed(),
            visitor_records: TypeReport::unprocessed(),
        });
    };

    let mut order_id = None;
    let mut phone_purchased = false;
    let mut visitor_purchased = false;
    if let Some(user_id) = requesting_user {
        if let Some(order) = orders::find_paid_for_user(db, user_id, doc_number).await? {
            phone_purchased = order.phone_record_id.is_some() && order.records_unlocked;
            visitor_purchased = order.visitor_record_id.is_some() && order.records_unlocked;
            order_id = Some(order.id);
        }
    }

    let phone_preview = if inmate.phone_records_available {
        phone_preview(db, &inmate.id).await
    } else {
        None
    };
    let visitor_preview = if inmate.visitor_records_available {
        visitor_preview(db, &inmate.id).await
    } else {
        None
    };

    Ok(AvailabilityReport {
        exists: true,
        doc_number: inmate.doc_number.clone(),
        inmate_name: inmate.full_name.clone(),
        order_id,
        phone_records: TypeReport {
            available: inmate.phone_records_available,
            available_date: inmate.phone_records_available_date.clone(),
            status: type_status(
                inmate.phone_records_available,
                inmate.phone_records_available_date.as_deref(),
            ),
            preview: phone_preview,
            already_purchased: phone_purchased,
        },
        visitor_records: TypeReport {
            available: inmate.visitor_records_available,
            available_date: inmate.visitor_records_available_date.clone(),
            status: type_status(
                inmate.visitor_records_available,
                inmate.visitor_records_available_date.as_deref(),
            ),
            preview: visitor_preview,
            already_purchased: visitor_purchased,
        },
    })
}

/// Precedence: available beats a scheduled date beats unprocessed.
fn type_status(available: bool, available_date: Option<&str>) -> RecordStatus {
    if available {
        RecordStatus::Available
    } else if available_date.is_some() {
        RecordStatus::Pending
    } else {
        RecordStatus::Processing
    }
}

/// Top dialed numbers plus aggregate totals. Any storage error or
/// malformed `call_history` yields `None`.
async fn phone_preview(db: &Database, inmate_id: &str) -> Option<Value> {
    let record = match records::get_phone_record_by_inmate(db, inmate_id).await {
        Ok(record) => record?,
        Err(e) => {
            warn!(inmate_id, error = %e, "phone preview fetch failed");
            return None;
        }
    };

    let history: Value = serde_json::from_str(record.call_history.as_deref()?).ok()?;
    let entries = history.as_array()?;
    let top: Vec<Value> = entries.iter().take(PREVIEW_LIMIT).cloned().collect();

    Some(serde_json::json!({
        "top_numbers": top,
        "total_calls": record.total_calls,
        "total_unique_numbers": record.total_approved_numbers,
    }))
}

/// Top visitors deduplicated by name across the approved list and the
/// visit history, approved-list entries taking precedence.
async fn visitor_preview(db: &Database, inmate_id: &str) -> Option<Value> {
    let record = match records::get_visitation_record_by_inmate(db, inmate_id).await {
        Ok(record) => record?,
        Err(e) => {
            warn!(inmate_id, error = %e, "visitor preview fetch failed");
            return None;
        }
    };

    let approved = parse_entries(record.approved_visitors.as_deref());
    let visits = parse_entries(record.visit_history.as_deref());

    let mut seen: Vec<String> = Vec::new();
    let mut visitors: Vec<Value> = Vec::new();

    for entry in &approved {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            continue;
        };
        if seen.iter().any(|n| n == name) {
            continue;
        }
        let relationship = entry
            .get("relationship")
            .or_else(|| entry.get("status"))
            .cloned()
            .unwrap_or(Value::Null);
        seen.push(name.to_string());
        visitors.push(serde_json::json!({ "name": name, "relationship": relationship }));
    }
    for entry in &visits {
        let name = entry
            .get("visitor_name")
            .or_else(|| entry.get("name"))
            .and_then(Value::as_str);
        let Some(name) = name else { continue };
        if seen.iter().any(|n| n == name) {
            continue;
        }
        let relationship = entry.get("relationship").cloned().unwrap_or(Value::Null);
        seen.push(name.to_string());
        visitors.push(serde_json::json!({ "name": name, "relationship": relationship }));
    }

    if visitors.is_empty() {
        return None;
    }

    let total_visitors = if record.total_approved_visitors > 0 {
        record.total_approved_visitors
    } else {
        visitors.len() as i64
    };
    visitors.truncate(PREVIEW_LIMIT);

    Some(serde_json::json!({
        "top_visitors": visitors,
        "total_visitors": total_visitors,
    }))
}

fn parse_entries(raw: Option<&str>) -> Vec<Value> {
    let Some(raw) = raw else { return Vec::new() };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        _ => Vec::new(),
    }
}
