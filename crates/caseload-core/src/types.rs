// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Caseload workspace.
//!
//! Status enums carry their lowercase wire/storage forms via strum, so the
//! same spelling flows through SQLite columns and JSON responses.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A purchasable record type. The enumeration is closed: anything outside
/// it is rejected at cart validation and never reaches an order row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Telephone,
    Visitor,
}

/// Payment lifecycle of an order. Transitions pending -> paid exactly once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Back-office processing status of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Received,
    Processing,
    Completed,
}

/// Coarse fulfillment display hint for an order.
///
/// `records_unlocked` on the order is the authoritative unlock signal;
/// this status is a label for the user-facing badge, not a gate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentStatus {
    /// Nothing available and nothing scheduled; needs manual processing.
    Processing,
    /// Waiting on a future availability date, or partially unlocked.
    Pending,
    /// Every requested record type is unlocked.
    Fulfilled,
}

/// Per-record-type availability badge reported by the availability check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Available,
    Pending,
    Processing,
}

/// An account able to purchase records. Provisioned out-of-band; looked up
/// by API token at the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub api_token: String,
    pub created_at: String,
}

/// An inmate row from the records database. Read-only from this system's
/// perspective; availability flags may flip over time, which is why
/// fulfillment re-reads this at settlement time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inmate {
    pub id: String,
    pub doc_number: String,
    pub full_name: Option<String>,
    pub phone_records_available: bool,
    pub visitor_records_available: bool,
    pub phone_records_available_date: Option<String>,
    pub visitor_records_available_date: Option<String>,
}

/// A phone record payload for one inmate. `call_history` is raw JSON text;
/// consumers parse it and tolerate malformed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneRecord {
    pub id: String,
    pub inmate_id: String,
    pub call_history: Option<String>,
    pub total_calls: i64,
    pub total_approved_numbers: i64,
}

/// A visitation record payload for one inmate. `approved_visitors` and
/// `visit_history` are raw JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitationRecord {
    pub id: String,
    pub inmate_id: String,
    pub approved_visitors: Option<String>,
    pub visit_history: Option<String>,
    pub total_approved_visitors: i64,
    pub total_visits: i64,
}

/// The central transactional entity. Created pending by checkout, settled
/// exactly once by the fulfillment engine, read thereafter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    /// Sanitized identifier the customer searched for.
    pub inmate_id: String,
    /// Canonical doc number, populated at fulfillment time.
    pub inmate_doc_number: Option<String>,
    pub record_types: Vec<RecordType>,
    pub paid_amount_cents: i64,
    pub currency: String,
    pub stripe_session_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub process_status: ProcessStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub phone_record_id: Option<String>,
    pub visitor_record_id: Option<String>,
    pub records_unlocked: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    /// True iff this order's unlock state satisfies the structural
    /// invariant: unlocked requires at least one sub-record id.
    pub fn unlock_invariant_holds(&self) -> bool {
        !self.records_unlocked
            || self.phone_record_id.is_some()
            || self.visitor_record_id.is_some()
    }
}

/// A waitlist signup, unique per (email, state).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub state: String,
}
