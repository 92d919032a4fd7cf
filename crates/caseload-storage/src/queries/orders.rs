// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order CRUD and the settlement write.
//!
//! The settlement write is the only mutation of a paid order and is a
//! single conditional UPDATE guarded by `payment_status = 'pending'`, so
//! redelivered webhook events fall through as no-ops.

use std::str::FromStr;

use caseload_core::fulfillment::FulfillmentOutcome;
use caseload_core::types::{FulfillmentStatus, PaymentStatus, ProcessStatus, RecordType};
use caseload_core::CaseloadError;
use rusqlite::params;
use rusqlite::types::Type;

use crate::database::Database;
use crate::models::Order;

const ORDER_COLUMNS: &str = "id, user_id, user_email, inmate_id, inmate_doc_number, \
     record_types, paid_amount_cents, currency, stripe_session_id, \
     payment_status, process_status, fulfillment_status, \
     phone_record_id, visitor_record_id, records_unlocked, created_at, updated_at";

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn order_from_row(row: &rusqlite::Row<'_>) -> Result<Order, rusqlite::Error> {
    let record_types_json: String = row.get(5)?;
    let record_types: Vec<RecordType> =
        serde_json::from_str(&record_types_json).map_err(|e| conversion_err(5, e))?;

    let payment_status: String = row.get(9)?;
    let process_status: String = row.get(10)?;
    let fulfillment_status: String = row.get(11)?;

    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        user_email: row.get(2)?,
        inmate_id: row.get(3)?,
        inmate_doc_number: row.get(4)?,
        record_types,
        paid_amount_cents: row.get(6)?,
        currency: row.get(7)?,
        stripe_session_id: row.get(8)?,
        payment_status: PaymentStatus::from_str(&payment_status)
            .map_err(|e| conversion_err(9, e))?,
        process_status: ProcessStatus::from_str(&process_status)
            .map_err(|e| conversion_err(10, e))?,
        fulfillment_status: FulfillmentStatus::from_str(&fulfillment_status)
            .map_err(|e| conversion_err(11, e))?,
        phone_record_id: row.get(12)?,
        visitor_record_id: row.get(13)?,
        records_unlocked: row.get::<_, i64>(14)? != 0,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

/// Insert a new pending order.
pub async fn insert_order(db: &Database, order: &Order) -> Result<(), CaseloadError> {
    let order = order.clone();
    let record_types_json = serde_json::to_string(&order.record_types)
        .map_err(|e| CaseloadError::Internal(format!("serialize record_types: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO orders (id, user_id, user_email, inmate_id, inmate_doc_number, \
                 record_types, paid_amount_cents, currency, stripe_session_id, \
                 payment_status, process_status, fulfillment_status, \
                 phone_record_id, visitor_record_id, records_unlocked, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    order.id,
                    order.user_id,
                    order.user_email,
                    order.inmate_id,
                    order.inmate_doc_number,
                    record_types_json,
                    order.paid_amount_cents,
                    order.currency,
                    order.stripe_session_id,
                    order.payment_status.to_string(),
                    order.process_status.to_string(),
                    order.fulfillment_status.to_string(),
                    order.phone_record_id,
                    order.visitor_record_id,
                    order.records_unlocked as i64,
                    order.created_at,
                    order.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Attach the payment session id to a freshly created order.
pub async fn set_stripe_session(
    db: &Database,
    order_id: &str,
    session_id: &str,
) -> Result<(), CaseloadError> {
    let order_id = order_id.to_string();
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE orders SET stripe_session_id = ?1, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?2",
                params![session_id, order_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load an order by the `(stripe_session_id, order_id)` conjunction.
///
/// Requiring both prevents cross-order confusion if session ids are ever
/// reused externally.
pub async fn get_by_session(
    db: &Database,
    session_id: &str,
    order_id: &str,
) -> Result<Option<Order>, CaseloadError> {
    let session_id = session_id.to_string();
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE stripe_session_id = ?1 AND id = ?2"
            ))?;
            let result = stmt.query_row(params![session_id, order_id], order_from_row);
            match result {
                Ok(order) => Ok(Some(order)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load an order by id, scoped to its owning user.
pub async fn get_for_user(
    db: &Database,
    order_id: &str,
    user_id: &str,
) -> Result<Option<Order>, CaseloadError> {
    let order_id = order_id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"
            ))?;
            let result = stmt.query_row(params![order_id, user_id], order_from_row);
            match result {
                Ok(order) => Ok(Some(order)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find an existing paid order for `(user, doc number)`. The natural key
/// for duplicate-purchase checks.
pub async fn find_paid_for_user(
    db: &Database,
    user_id: &str,
    doc_number: &str,
) -> Result<Option<Order>, CaseloadError> {
    let user_id = user_id.to_string();
    let doc_number = doc_number.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORDER_COLUMNS} FROM orders \
                 WHERE user_id = ?1 AND inmate_doc_number = ?2 AND payment_status = 'paid' \
                 ORDER BY created_at DESC LIMIT 1"
            ))?;
            let result = stmt.query_row(params![user_id, doc_number], order_from_row);
            match result {
                Ok(order) => Ok(Some(order)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All fields written by the settlement update, derived at webhook time.
#[derive(Debug, Clone)]
pub struct OrderSettlement {
    pub order_id: String,
    pub stripe_session_id: String,
    pub inmate_doc_number: String,
    pub outcome: FulfillmentOutcome,
}

/// Atomically settle an order: mark it paid and persist the derived
/// fulfillment fields, guarded by `payment_status = 'pending'`.
///
/// Returns `true` if the row transitioned, `false` if the order was
/// already paid (duplicate delivery) and nothing was written.
pub async fn settle(db: &Database, settlement: &OrderSettlement) -> Result<bool, CaseloadError> {
    let s = settlement.clone();
    db.connection()
        .call(move |conn| {
            let affected = conn.execute(
                "UPDATE orders SET \
                     payment_status = 'paid', \
                     process_status = ?1, \
                     fulfillment_status = ?2, \
                     inmate_doc_number = ?3, \
                     phone_record_id = ?4, \
                     visitor_record_id = ?5, \
                     records_unlocked = ?6, \
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ?7 AND stripe_session_id = ?8 AND payment_status = 'pending'",
                params![
                    s.outcome.process_status.to_string(),
                    s.outcome.fulfillment_status.to_string(),
                    s.inmate_doc_number,
                    s.outcome.phone_record_id,
                    s.outcome.visitor_record_id,
                    s.outcome.records_unlocked as i64,
                    s.order_id,
                    s.stripe_session_id,
                ],
            )?;
            Ok(affected > 0)
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

    fn make_order(id: &str) -> Order {
        Order {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            user_email: "user@example.com".to_string(),
            inmate_id: "12345".to_string(),
            inmate_doc_number: None,
            record_types: vec![RecordType::Telephone, RecordType::Visitor],
            paid_amount_cents: 5998,
            currency: "usd".to_string(),
            stripe_session_id: Some(format!("cs_{id}")),
            payment_status: PaymentStatus::Pending,
            process_status: ProcessStatus::Received,
            fulfillment_status: FulfillmentStatus::Processing,
            phone_record_id: None,
            visitor_record_id: None,
            records_unlocked: false,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    fn fulfilled_outcome() -> FulfillmentOutcome {
        FulfillmentOutcome {
            fulfillment_status: FulfillmentStatus::Fulfilled,
            process_status: ProcessStatus::Completed,
            records_unlocked: true,
            phone_record_id: Some("pr-1".to_string()),
            visitor_record_id: Some("vr-1".to_string()),
        }
    }

    #[tokio::test]
    async fn insert_and_load_by_session_round_trips() {
        let (db, _dir) = setup_db().await;
        let order = make_order("o-1");
        insert_order(&db, &order).await.unwrap();

        let loaded = get_by_session(&db, "cs_o-1", "o-1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "o-1");
        assert_eq!(loaded.payment_status, PaymentStatus::Pending);
        assert_eq!(
            loaded.record_types,
            vec![RecordType::Telephone, RecordType::Visitor]
        );
        assert!(!loaded.records_unlocked);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn session_conjunction_requires_both_keys() {
        let (db, _dir) = setup_db().await;
        insert_order(&db, &make_order("o-1")).await.unwrap();
        insert_order(&db, &make_order("o-2")).await.unwrap();

        // Right session, wrong order id: no match.
        assert!(get_by_session(&db, "cs_o-1", "o-2").await.unwrap().is_none());
        assert!(get_by_session(&db, "cs_o-1", "o-1").await.unwrap().is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_stripe_session_updates_row() {
        let (db, _dir) = setup_db().await;
        let mut order = make_order("o-1");
        order.stripe_session_id = None;
        insert_order(&db, &order).await.unwrap();

        set_stripe_session(&db, "o-1", "cs_live_123").await.unwrap();
        let loaded = get_by_session(&db, "cs_live_123", "o-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.stripe_session_id.as_deref(), Some("cs_live_123"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn settle_transitions_pending_order_once() {
        let (db, _dir) = setup_db().await;
        insert_order(&db, &make_order("o-1")).await.unwrap();

        let settlement = OrderSettlement {
            order_id: "o-1".to_string(),
            stripe_session_id: "cs_o-1".to_string(),
            inmate_doc_number: "12345".to_string(),
            outcome: fulfilled_outcome(),
        };

        assert!(settle(&db, &settlement).await.unwrap());

        let order = get_by_session(&db, "cs_o-1", "o-1").await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(order.process_status, ProcessStatus::Completed);
        assert!(order.records_unlocked);
        assert_eq!(order.phone_record_id.as_deref(), Some("pr-1"));
        assert_eq!(order.inmate_doc_number.as_deref(), Some("12345"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn settle_is_a_noop_for_paid_order() {
        let (db, _dir) = setup_db().await;
        insert_order(&db, &make_order("o-1")).await.unwrap();

        let settlement = OrderSettlement {
            order_id: "o-1".to_string(),
            stripe_session_id: "cs_o-1".to_string(),
            inmate_doc_number: "12345".to_string(),
            outcome: fulfilled_outcome(),
        };
        assert!(settle(&db, &settlement).await.unwrap());

        // Redelivery with a different (worse) outcome must not write.
        let mut redelivered = settlement.clone();
        redelivered.outcome = FulfillmentOutcome {
            fulfillment_status: FulfillmentStatus::Processing,
            process_status: ProcessStatus::Processing,
            records_unlocked: false,
            phone_record_id: None,
            visitor_record_id: None,
        };
        assert!(!settle(&db, &redelivered).await.unwrap());

        let order = get_by_session(&db, "cs_o-1", "o-1").await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert!(order.records_unlocked);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_paid_for_user_filters_on_payment_status() {
        let (db, _dir) = setup_db().await;
        insert_order(&db, &make_order("o-1")).await.unwrap();

        // Pending order: not a duplicate purchase.
        assert!(find_paid_for_user(&db, "user-1", "12345")
            .await
            .unwrap()
            .is_none());

        let settlement = OrderSettlement {
            order_id: "o-1".to_string(),
            stripe_session_id: "cs_o-1".to_string(),
            inmate_doc_number: "12345".to_string(),
            outcome: fulfilled_outcome(),
        };
        settle(&db, &settlement).await.unwrap();

        let found = find_paid_for_user(&db, "user-1", "12345").await.unwrap();
        assert!(found.is_some());
        assert!(find_paid_for_user(&db, "user-2", "12345")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_for_user_scopes_to_owner() {
        let (db, _dir) = setup_db().await;
        insert_order(&db, &make_order("o-1")).await.unwrap();

        assert!(get_for_user(&db, "o-1", "user-1").await.unwrap().is_some());
        assert!(get_for_user(&db, "o-1", "someone-else")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }
}
