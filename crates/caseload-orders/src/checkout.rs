// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cart validation and hosted-session creation.
//!
//! The pending order row is inserted before the payment provider is
//! contacted, so every session has a corresponding order even when the
//! provider call fails. Prices come from the config table only; nothing
//! client-sent is trusted for amounts.

use std::str::FromStr;

use caseload_config::model::CaseloadConfig;
use caseload_core::types::{
    FulfillmentStatus, Order, PaymentStatus, ProcessStatus, RecordType, User,
};
use caseload_core::CaseloadError;
use caseload_storage::queries::orders;
use caseload_storage::Database;
use caseload_stripe::{CheckoutClient, LineItem, SessionRequest};
use tracing::{info, warn};
use uuid::Uuid;

/// Bounds on the sanitized inmate identifier.
const INMATE_ID_MIN: usize = 3;
const INMATE_ID_MAX: usize = 20;

/// A validated checkout request as received from the gateway.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Raw type tags; anything outside the known enumeration is dropped.
    pub record_types: Vec<String>,
    pub inmate_id: String,
}

/// What the caller needs to continue: the redirect URL and the order id.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: String,
    pub url: String,
}

/// Create a pending order and a hosted payment session for it.
pub async fn create_checkout(
    db: &Database,
    client: &dyn CheckoutClient,
    config: &CaseloadConfig,
    user: &User,
    request: &CheckoutRequest,
) -> Result<CheckoutOutcome, CaseloadError> {
    let record_types = validate_record_types(&request.record_types)?;
    let inmate_id = sanitize_inmate_id(&request.inmate_id)?;
    let total_cents = compute_total(&record_types, config)?;

    let now = now_iso();
    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        user_email: user.email.clone(),
        inmate_id: inmate_id.clone(),
        inmate_doc_number: None,
        record_types: record_types.clone(),
        paid_amount_cents: total_cents,
        currency: config.pricing.currency.clone(),
        stripe_session_id: None,
        payment_status: PaymentStatus::Pending,
        process_status: ProcessStatus::Received,
        fulfillment_status: FulfillmentStatus::Processing,
        phone_record_id: None,
        visitor_record_id: None,
        records_unlocked: false,
        created_at: now.clone(),
        updated_at: now,
    };
    orders::insert_order(db, &order).await?;
    info!(order_id = %order.id, inmate_id = %inmate_id, total_cents, "pending order created");

    let session_request = build_session_request(&order, config);
    let session = match client.create_session(&session_request).await {
        Ok(session) => session,
        Err(e) => {
            // The dangling pending order stays for manual reconciliation;
            // it holds no unlocked data.
            warn!(order_id = %order.id, error = %e, "payment session creation failed");
            return Err(e);
        }
    };

    orders::set_stripe_session(db, &order.id, &session.id).await?;

    let url = session.url.ok_or_else(|| CaseloadError::PaymentProvider {
        message: "payment session has no redirect URL".into(),
        source: None,
    })?;
    Ok(CheckoutOutcome {
        order_id: order.id,
        url,
    })
}

/// Reduce the requested tags to the known enumeration, deduplicated and
/// order-preserving. Empty intersection is a validation failure.
fn validate_record_types(raw: &[String]) -> Result<Vec<RecordType>, CaseloadError> {
    if raw.is_empty() {
        return Err(CaseloadError::Validation("no record types selected".into()));
    }
    let mut types = Vec::new();
    for tag in raw {
        if let Ok(record_type) = RecordType::from_str(tag.trim()) {
            if !types.contains(&record_type) {
                types.push(record_type);
            }
        }
    }
    if types.is_empty() {
        return Err(CaseloadError::Validation(
            "no valid records selected".into(),
        ));
    }
    Ok(types)
}

/// Trim, strip to `[A-Za-z0-9_-]`, and bound the length to 3..=20.
fn sanitize_inmate_id(raw: &str) -> Result<String, CaseloadError> {
    let sanitized: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if sanitized.len() < INMATE_ID_MIN || sanitized.len() > INMATE_ID_MAX {
        return Err(CaseloadError::Validation(format!(
            "inmate id must be {INMATE_ID_MIN}-{INMATE_ID_MAX} characters after sanitization"
        )));
    }
    Ok(sanitized)
}

fn unit_price_cents(record_type: RecordType, config: &CaseloadConfig) -> i64 {
    match record_type {
        RecordType::Telephone => config.pricing.telephone_cents,
        RecordType::Visitor => config.pricing.visitor_cents,
    }
}

/// Server-side total with sanity bounds against absurd configurations.
fn compute_total(types: &[RecordType], config: &CaseloadConfig) -> Result<i64, CaseloadError> {
    let total: i64 = types.iter().map(|t| unit_price_cents(*t, config)).sum();
    if total <= 0 || total > config.pricing.max_total_cents {
        return Err(CaseloadError::Validation(format!(
            "order total {total} outside allowed range"
        )));
    }
    Ok(total)
}

fn build_session_request(order: &Order, config: &CaseloadConfig) -> SessionRequest {
    let line_items = order
        .record_types
        .iter()
        .map(|t| LineItem {
            name: match t {
                RecordType::Telephone => "Telephone Records".to_string(),
                RecordType::Visitor => "Visitor Records".to_string(),
            },
            description: Some(format!("Inmate ID: {}", order.inmate_id)),
            unit_amount_cents: unit_price_cents(*t, config),
            quantity: 1,
        })
        .collect();

    let record_types_csv = order
        .record_types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    SessionRequest {
        line_items,
        currency: order.currency.clone(),
        customer_email: order.user_email.clone(),
        success_url: config.stripe.success_url.clone(),
        cancel_url: config.stripe.cancel_url.clone(),
        metadata: vec![
            ("order_id".to_string(), order.id.clone()),
            ("user_id".to_string(), order.user_id.clone()),
            ("inmate_id".to_string(), order.inmate_id.clone()),
            ("record_types".to_string(), record_types_csv),
        ],
    }
}

fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use caseload_stripe::CheckoutSession;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records the last session request; optionally fails.
    struct FakeCheckout {
        fail: bool,
        last_request: Mutex<Option<SessionRequest>>,
    }

    impl FakeCheckout {
        fn new() -> Self {
            Self {
                fail: false,
                last_request: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CheckoutClient for FakeCheckout {
        async fn create_session(
            &self,
            request: &SessionRequest,
        ) -> Result<CheckoutSession, CaseloadError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.fail {
                return Err(CaseloadError::PaymentProvider {
                    message: "provider down".into(),
                    source: None,
                });
            }
            Ok(CheckoutSession {
                id: "cs_fake_1".into(),
                url: Some("https://checkout.example/cs_fake_1".into()),
            })
        }
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn test_user() -> User {
        User {
            id: "user-1".into(),
            email: "buyer@example.com".into(),
            api_token: "tok_1".into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    fn config() -> CaseloadConfig {
        CaseloadConfig::default()
    }

    #[tokio::test]
    async fn happy_path_creates_order_then_session() {
        let (db, _dir) = setup_db().await;
        let fake = FakeCheckout::new();

        let outcome = create_checkout(
            &db,
            &fake,
            &config(),
            &test_user(),
            &CheckoutRequest {
                record_types: vec!["telephone".into(), "visitor".into()],
                inmate_id: " 12345 ".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome.url, "https://checkout.example/cs_fake_1");

        let order = orders::get_by_session(&db, "cs_fake_1", &outcome.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.process_status, ProcessStatus::Received);
        assert_eq!(order.inmate_id, "12345");
        assert_eq!(order.paid_amount_cents, 5998);
        assert!(!order.records_unlocked);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn total_is_derived_from_price_table_not_client_input() {
        let (db, _dir) = setup_db().await;
        let fake = FakeCheckout::new();

        // Duplicates and junk tags collapse to the two known types.
        create_checkout(
            &db,
            &fake,
            &config(),
            &test_user(),
            &CheckoutRequest {
                record_types: vec![
                    "telephone".into(),
                    "telephone".into(),
                    "dental".into(),
                    "visitor".into(),
                ],
                inmate_id: "12345".into(),
            },
        )
        .await
        .unwrap();

        let request = fake.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.line_items.len(), 2);
        assert_eq!(
            request.line_items.iter().map(|i| i.unit_amount_cents).sum::<i64>(),
            5998
        );
        assert_eq!(request.line_items[0].name, "Telephone Records");
        assert_eq!(
            request.line_items[0].description.as_deref(),
            Some("Inmate ID: 12345")
        );
        assert!(request
            .metadata
            .contains(&("record_types".to_string(), "telephone,visitor".to_string())));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_carts_are_rejected_before_any_order_row() {
        let (db, _dir) = setup_db().await;
        let fake = FakeCheckout::new();

        for request in [
            CheckoutRequest {
                record_types: vec![],
                inmate_id: "12345".into(),
            },
            CheckoutRequest {
                record_types: vec!["dental".into()],
                inmate_id: "12345".into(),
            },
            CheckoutRequest {
                record_types: vec!["telephone".into()],
                inmate_id: "!!".into(),
            },
            CheckoutRequest {
                record_types: vec!["telephone".into()],
                inmate_id: "a".repeat(21),
            },
        ] {
            let err = create_checkout(&db, &fake, &config(), &test_user(), &request)
                .await
                .unwrap_err();
            assert!(matches!(err, CaseloadError::Validation(_)), "{request:?}");
        }

        // No session attempts and no order rows.
        assert!(fake.last_request.lock().unwrap().is_none());
        let count: i64 = db
            .connection()
            .call(|c| c.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sanitization_strips_disallowed_characters() {
        assert_eq!(sanitize_inmate_id("  AB-12_x  ").unwrap(), "AB-12_x");
        assert_eq!(sanitize_inmate_id("12#34$5").unwrap(), "12345");
        assert!(sanitize_inmate_id("a!b").is_err());
        assert!(sanitize_inmate_id("").is_err());
    }

    #[tokio::test]
    async fn provider_failure_leaves_dangling_pending_order() {
        let (db, _dir) = setup_db().await;
        let fake = FakeCheckout::failing();

        let err = create_checkout(
            &db,
            &fake,
            &config(),
            &test_user(),
            &CheckoutRequest {
                record_types: vec!["telephone".into()],
                inmate_id: "12345".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CaseloadError::PaymentProvider { .. }));

        // The order row survives, unpaid and sessionless.
        let count: i64 = db
            .connection()
            .call(|c| {
                c.query_row(
                    "SELECT COUNT(*) FROM orders \
                     WHERE payment_status = 'pending' AND stripe_session_id IS NULL",
                    [],
                    |r| r.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn absurd_totals_are_rejected() {
        let mut cfg = config();
        cfg.pricing.telephone_cents = 200_000;
        let err = compute_total(&[RecordType::Telephone], &cfg).unwrap_err();
        assert!(matches!(err, CaseloadError::Validation(_)));

        cfg.pricing.telephone_cents = 0;
        let err = compute_total(&[RecordType::Telephone], &cfg).unwrap_err();
        assert!(matches!(err, CaseloadError::Validation(_)));
    }
}
