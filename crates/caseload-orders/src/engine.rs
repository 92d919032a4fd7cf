// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The webhook-driven fulfillment engine.
//!
//! Order of operations is load-bearing: verify the signature before
//! trusting any payload field, short-circuit on an already-paid order,
//! re-resolve availability at settlement time (never from cart time), and
//! finish with the single conditional settle write. Only signature
//! failures, a missing order, and the settle write itself can fail the
//! request; the payment processor retries on non-2xx.

use caseload_config::model::StripeConfig;
use caseload_core::fulfillment::{
    derive_fulfillment, SettlementAvailability, TypeAvailability,
};
use caseload_core::types::{Inmate, PaymentStatus, RecordType};
use caseload_core::CaseloadError;
use caseload_storage::queries::{inmates, orders, records};
use caseload_storage::queries::orders::OrderSettlement;
use caseload_storage::Database;
use caseload_stripe::{verify_signature, WebhookEvent, CHECKOUT_SESSION_COMPLETED};
use tracing::{info, warn};

/// What a successfully acknowledged delivery did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAck {
    /// The order transitioned pending -> paid with derived fulfillment.
    Settled { order_id: String },
    /// The order was already paid; redelivery acknowledged without writes.
    AlreadyPaid { order_id: String },
    /// Event type we do not act on; acknowledged so Stripe stops retrying.
    Ignored,
}

/// Handle one webhook delivery against the raw request body.
pub async fn handle_webhook(
    db: &Database,
    stripe: &StripeConfig,
    payload: &[u8],
    signature: &str,
) -> Result<WebhookAck, CaseloadError> {
    let secret = stripe
        .webhook_secret
        .as_deref()
        .ok_or_else(|| CaseloadError::Config("stripe.webhook_secret is not set".into()))?;
    let tolerance = stripe.signature_tolerance_secs.max(0) as u64;
    verify_signature(
        payload,
        signature,
        secret,
        tolerance,
        chrono::Utc::now().timestamp(),
    )?;

    let event = WebhookEvent::parse(payload)?;
    if event.event_type != CHECKOUT_SESSION_COMPLETED {
        info!(event_type = %event.event_type, "ignoring webhook event type");
        return Ok(WebhookAck::Ignored);
    }

    let session_id = event.data.object.id.clone();
    if session_id.is_empty() {
        return Err(CaseloadError::Validation(
            "webhook event carries no session id".into(),
        ));
    }
    let order_id = event
        .metadata("order_id")
        .ok_or_else(|| CaseloadError::Validation("webhook metadata missing order_id".into()))?
        .to_string();

    let order = orders::get_by_session(db, &session_id, &order_id)
        .await?
        .ok_or_else(|| {
            warn!(%session_id, %order_id, "webhook for unknown order");
            CaseloadError::NotFound(format!("no order {order_id} for session {session_id}"))
        })?;

    // Idempotency: a paid order is terminal. Redelivery must not re-derive.
    if order.payment_status == PaymentStatus::Paid {
        info!(order_id = %order.id, "order already paid, acknowledging redelivery");
        return Ok(WebhookAck::AlreadyPaid { order_id: order.id });
    }

    let inmate = inmates::get_by_doc_number(db, &order.inmate_id).await?;
    let availability = match &inmate {
        Some(inmate) => Some(resolve_availability(db, inmate, &order.record_types).await),
        None => {
            info!(order_id = %order.id, inmate_id = %order.inmate_id,
                "inmate not in records database, parking order for manual processing");
            None
        }
    };

    let outcome = derive_fulfillment(&order.record_types, availability.as_ref());
    info!(
        order_id = %order.id,
        fulfillment_status = %outcome.fulfillment_status,
        records_unlocked = outcome.records_unlocked,
        "derived fulfillment"
    );

    let doc_number = inmate
        .map(|i| i.doc_number)
        .unwrap_or_else(|| order.inmate_id.clone());
    let settled = orders::settle(
        db,
        &OrderSettlement {
            order_id: order.id.clone(),
            stripe_session_id: session_id,
            inmate_doc_number: doc_number,
            outcome,
        },
    )
    .await?;

    if settled {
        Ok(WebhookAck::Settled { order_id: order.id })
    } else {
        // A concurrent delivery won the conditional write. Same terminal
        // state either way.
        info!(order_id = %order.id, "settle raced a concurrent delivery, no-op");
        Ok(WebhookAck::AlreadyPaid { order_id: order.id })
    }
}

/// Snapshot per-type availability for a known inmate.
///
/// Record-id lookups are only attempted for types whose flag is set. A
/// storage error during a lookup degrades to not-found so a preview-grade
/// failure cannot lose the payment; the order parks instead of unlocking.
async fn resolve_availability(
    db: &Database,
    inmate: &Inmate,
    requested: &[RecordType],
) -> SettlementAvailability {
    let mut availability = SettlementAvailability {
        phone: TypeAvailability {
            available: inmate.phone_records_available,
            record_id: None,
            scheduled: inmate.phone_records_available_date.is_some(),
        },
        visitor: TypeAvailability {
            available: inmate.visitor_records_available,
            record_id: None,
            scheduled: inmate.visitor_records_available_date.is_some(),
        },
    };

    if requested.contains(&RecordType::Telephone) && inmate.phone_records_available {
        availability.phone.record_id =
            match records::phone_record_id_for_inmate(db, &inmate.id).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(inmate_id = %inmate.id, error = %e, "phone record lookup failed");
                    None
                }
            };
    }
    if requested.contains(&RecordType::Visitor) && inmate.visitor_records_available {
        availability.visitor.record_id =
            match records::visitation_record_id_for_inmate(db, &inmate.id).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(inmate_id = %inmate.id, error = %e, "visitation record lookup failed");
                    None
                }
            };
    }

    availability
}
