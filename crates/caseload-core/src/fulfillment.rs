// SPDX-FileCopyrightText: 2026 Caseload Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure fulfillment derivation: the order settlement state machine.
//!
//! The webhook handler captures per-type availability at settlement time
//! and feeds it through [`derive_fulfillment`]. Keeping the derivation
//! pure makes every branch of the state machine testable without a store.

use crate::types::{FulfillmentStatus, ProcessStatus, RecordType};

/// Availability of one record type, observed at settlement time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAvailability {
    /// The inmate's availability flag for this type.
    pub available: bool,
    /// Concrete sub-record id, if the flag was set and a row was found.
    pub record_id: Option<String>,
    /// A future availability date is set for this type.
    pub scheduled: bool,
}

impl TypeAvailability {
    /// Flag set and a concrete sub-record row found.
    fn found(&self) -> bool {
        self.available && self.record_id.is_some()
    }
}

/// Snapshot of both record types for a known inmate at settlement time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementAvailability {
    pub phone: TypeAvailability,
    pub visitor: TypeAvailability,
}

/// The derived terminal state for a settled order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentOutcome {
    pub fulfillment_status: FulfillmentStatus,
    pub process_status: ProcessStatus,
    /// Authoritative unlock signal: true iff at least one requested
    /// sub-record was found and its id is carried below.
    pub records_unlocked: bool,
    pub phone_record_id: Option<String>,
    pub visitor_record_id: Option<String>,
}

impl FulfillmentOutcome {
    fn locked(status: FulfillmentStatus) -> Self {
        Self {
            fulfillment_status: status,
            process_status: ProcessStatus::Processing,
            records_unlocked: false,
            phone_record_id: None,
            visitor_record_id: None,
        }
    }
}

/// Derive the terminal order state from the requested record types and the
/// availability observed right now.
///
/// `availability` is `None` when the inmate has no row in the records
/// database at all; the order then parks in `processing` for manual
/// back-office handling. Purchase is never blocked by absence of data.
///
/// For a known inmate, per requested type:
/// - flag set and sub-record found        -> that portion unlocks
/// - flag unset but a future date is set  -> counts as scheduled
/// - neither                              -> counts as unprocessed
///
/// All requested found => fulfilled; some found => pending with a partial
/// unlock; none found but something scheduled => pending, locked; nothing
/// at all => processing, locked. `process_status` is `completed` only for
/// the fully fulfilled case.
pub fn derive_fulfillment(
    requested: &[RecordType],
    availability: Option<&SettlementAvailability>,
) -> FulfillmentOutcome {
    let Some(avail) = availability else {
        return FulfillmentOutcome::locked(FulfillmentStatus::Processing);
    };

    let wants_phone = requested.contains(&RecordType::Telephone);
    let wants_visitor = requested.contains(&RecordType::Visitor);

    let phone_found = wants_phone && avail.phone.found();
    let visitor_found = wants_visitor && avail.visitor.found();

    let any_scheduled = (wants_phone && !phone_found && avail.phone.scheduled)
        || (wants_visitor && !visitor_found && avail.visitor.scheduled);

    let all_found = (!wants_phone || phone_found) && (!wants_visitor || visitor_found);
    let any_found = phone_found || visitor_found;

    let phone_record_id = phone_found.then(|| avail.phone.record_id.clone()).flatten();
    let visitor_record_id = visitor_found
        .then(|| avail.visitor.record_id.clone())
        .flatten();

    if all_found && any_found {
        FulfillmentOutcome {
            fulfillment_status: FulfillmentStatus::Fulfilled,
            process_status: ProcessStatus::Completed,
            records_unlocked: true,
            phone_record_id,
            visitor_record_id,
        }
    } else if any_found {
        // Partial availability: expose what exists now, the rest waits.
        FulfillmentOutcome {
            fulfillment_status: FulfillmentStatus::Pending,
            process_status: ProcessStatus::Processing,
            records_unlocked: true,
            phone_record_id,
            visitor_record_id,
        }
    } else if any_scheduled {
        FulfillmentOutcome::locked(FulfillmentStatus::Pending)
    } else {
        FulfillmentOutcome::locked(FulfillmentStatus::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(id: &str) -> TypeAvailability {
        TypeAvailability {
            available: true,
            record_id: Some(id.to_string()),
            scheduled: false,
        }
    }

    fn scheduled() -> TypeAvailability {
        TypeAvailability {
            available: false,
            record_id: None,
            scheduled: true,
        }
    }

    fn absent() -> TypeAvailability {
        TypeAvailability::default()
    }

    fn both() -> Vec<RecordType> {
        vec![RecordType::Telephone, RecordType::Visitor]
    }

    /// Invariant: unlocked implies at least one id populated; fulfilled
    /// implies every requested type has its id.
    fn assert_invariants(requested: &[RecordType], outcome: &FulfillmentOutcome) {
        if outcome.records_unlocked {
            assert!(
                outcome.phone_record_id.is_some() || outcome.visitor_record_id.is_some(),
                "unlocked outcome must carry at least one record id"
            );
        }
        if outcome.fulfillment_status == FulfillmentStatus::Fulfilled {
            if requested.contains(&RecordType::Telephone) {
                assert!(outcome.phone_record_id.is_some());
            }
            if requested.contains(&RecordType::Visitor) {
                assert!(outcome.visitor_record_id.is_some());
            }
        }
    }

    #[test]
    fn unknown_inmate_parks_in_processing() {
        let outcome = derive_fulfillment(&both(), None);
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Processing);
        assert_eq!(outcome.process_status, ProcessStatus::Processing);
        assert!(!outcome.records_unlocked);
        assert!(outcome.phone_record_id.is_none());
        assert!(outcome.visitor_record_id.is_none());
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn all_requested_found_is_fulfilled() {
        let avail = SettlementAvailability {
            phone: found("pr-1"),
            visitor: found("vr-1"),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(outcome.process_status, ProcessStatus::Completed);
        assert!(outcome.records_unlocked);
        assert_eq!(outcome.phone_record_id.as_deref(), Some("pr-1"));
        assert_eq!(outcome.visitor_record_id.as_deref(), Some("vr-1"));
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn single_type_request_fulfilled_by_that_type_alone() {
        let avail = SettlementAvailability {
            phone: found("pr-1"),
            visitor: absent(),
        };
        let requested = vec![RecordType::Telephone];
        let outcome = derive_fulfillment(&requested, Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert!(outcome.records_unlocked);
        assert!(outcome.visitor_record_id.is_none());
        assert_invariants(&requested, &outcome);
    }

    #[test]
    fn partial_availability_unlocks_found_portion() {
        // Phone available, visitor neither available nor scheduled.
        let avail = SettlementAvailability {
            phone: found("pr-1"),
            visitor: absent(),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Pending);
        assert_eq!(outcome.process_status, ProcessStatus::Processing);
        assert!(outcome.records_unlocked);
        assert_eq!(outcome.phone_record_id.as_deref(), Some("pr-1"));
        assert!(outcome.visitor_record_id.is_none());
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn nothing_found_but_scheduled_is_pending_locked() {
        let avail = SettlementAvailability {
            phone: scheduled(),
            visitor: absent(),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Pending);
        assert!(!outcome.records_unlocked);
        assert!(outcome.phone_record_id.is_none());
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn nothing_found_nothing_scheduled_is_processing() {
        let avail = SettlementAvailability {
            phone: absent(),
            visitor: absent(),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Processing);
        assert!(!outcome.records_unlocked);
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn flag_set_without_row_does_not_unlock() {
        // Availability flag true but no sub-record row yet: data still
        // being prepared. Must not count as found.
        let avail = SettlementAvailability {
            phone: TypeAvailability {
                available: true,
                record_id: None,
                scheduled: false,
            },
            visitor: absent(),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Processing);
        assert!(!outcome.records_unlocked);
        assert_invariants(&both(), &outcome);
    }

    #[test]
    fn unrequested_type_is_ignored_entirely() {
        // Visitor data exists but was not purchased: must not leak into
        // the outcome or count toward fulfillment.
        let avail = SettlementAvailability {
            phone: scheduled(),
            visitor: found("vr-9"),
        };
        let requested = vec![RecordType::Telephone];
        let outcome = derive_fulfillment(&requested, Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Pending);
        assert!(!outcome.records_unlocked);
        assert!(outcome.visitor_record_id.is_none());
        assert_invariants(&requested, &outcome);
    }

    #[test]
    fn scheduled_type_beside_partial_unlock_stays_pending() {
        let avail = SettlementAvailability {
            phone: found("pr-1"),
            visitor: scheduled(),
        };
        let outcome = derive_fulfillment(&both(), Some(&avail));
        assert_eq!(outcome.fulfillment_status, FulfillmentStatus::Pending);
        assert!(outcome.records_unlocked);
        assert_eq!(outcome.phone_record_id.as_deref(), Some("pr-1"));
        assert_invariants(&both(), &outcome);
    }
}
