//! Pure decision logic of the approval workflow.
//!
//! Everything in this module is a function of plain values, so the routing
//! rule, the bulk transition planning and the finalization aggregator can be
//! tested without a database. The actions layer owns transactions and side
//! effects; it asks this module what to do.

use crate::common::{DurationClass, NationalityClass, Stage};

use super::models::{PersonStatus, RequestStatus};

/// Person-count threshold above which a request always routes to USB.
const DIRECT_AS_MAX_PERSONS: usize = 3;

/// Decide which stage reviews a freshly created request first.
///
/// Long-term requests, requests with more than three visitors and requests
/// with any foreign visitor start at the first stage (USB); everything else
/// goes directly to the second stage (AS).
pub fn route(duration: DurationClass, nationalities: &[NationalityClass]) -> Stage {
    let foreign = nationalities
        .iter()
        .any(|n| *n == NationalityClass::Foreign);
    if duration == DurationClass::LongTerm
        || nationalities.len() > DIRECT_AS_MAX_PERSONS
        || foreign
    {
        Stage::Usb
    } else {
        Stage::As
    }
}

/// Initial request/person statuses for a routed stage.
pub fn initial_statuses(stage: Stage) -> (RequestStatus, PersonStatus) {
    match stage {
        Stage::Usb => (RequestStatus::PendingUsb, PersonStatus::PendingUsb),
        Stage::As => (RequestStatus::PendingAs, PersonStatus::PendingAs),
    }
}

/// The stage an admin actor is acting at, inferred from the request status.
///
/// Stage officers always act at their own stage; admins follow the request.
/// APPROVED_USB counts as AS work: that status only exists once USB has
/// decided every person, so the remaining decisions belong to AS.
pub fn admin_stage_for(status: RequestStatus) -> Stage {
    match status {
        RequestStatus::PendingUsb | RequestStatus::DeclinedUsb => Stage::Usb,
        _ => Stage::As,
    }
}

/// Target status for one person under a bulk stage approval, or `None` if the
/// person is skipped (already terminal, or already past this stage).
pub fn bulk_approve_target(stage: Stage, person: PersonStatus) -> Option<PersonStatus> {
    match stage {
        Stage::Usb => match person {
            PersonStatus::PendingUsb | PersonStatus::ApprovedUsb => {
                Some(PersonStatus::ApprovedUsb)
            }
            _ => None,
        },
        Stage::As => {
            if person.is_declined() {
                None
            } else {
                Some(PersonStatus::ApprovedAs)
            }
        }
    }
}

/// Target status for one person under a bulk stage decline, or `None` if the
/// person is skipped.
///
/// An AS decline overwrites a prior USB decline (and its reason); a USB
/// decline leaves already-declined persons untouched so their original
/// reasons survive.
pub fn bulk_decline_target(stage: Stage, person: PersonStatus) -> Option<PersonStatus> {
    match stage {
        Stage::Usb => {
            if person.is_declined() {
                None
            } else {
                Some(PersonStatus::DeclinedUsb)
            }
        }
        Stage::As => {
            if person == PersonStatus::DeclinedAs {
                None
            } else {
                Some(PersonStatus::DeclinedAs)
            }
        }
    }
}

/// Request status written by a bulk stage action.
///
/// A USB bulk approval advances the request straight to PENDING_AS; the
/// person-level aggregation path stops at APPROVED_USB instead. The two paths
/// are not symmetric.
pub fn bulk_request_status(stage: Stage, approve: bool) -> RequestStatus {
    match (stage, approve) {
        (Stage::Usb, true) => RequestStatus::PendingAs,
        (Stage::Usb, false) => RequestStatus::DeclinedUsb,
        (Stage::As, true) => RequestStatus::ApprovedAs,
        (Stage::As, false) => RequestStatus::DeclinedAs,
    }
}

/// Status a person transitions to under an individual decision.
pub fn person_decision_target(stage: Stage, approve: bool) -> PersonStatus {
    match (stage, approve) {
        (Stage::Usb, true) => PersonStatus::ApprovedUsb,
        (Stage::Usb, false) => PersonStatus::DeclinedUsb,
        (Stage::As, true) => PersonStatus::ApprovedAs,
        (Stage::As, false) => PersonStatus::DeclinedAs,
    }
}

/// Recompute the request status from its persons' statuses after an
/// individual decision at `stage`.
///
/// Returns `Some(new_status)` only when the status actually changes, so
/// re-running with the same inputs is a no-op (idempotent by construction).
///
/// Three cases:
/// - USB: once every person is USB-decided, the request becomes APPROVED_USB
///   (any approval) or DECLINED_USB (none).
/// - AS, direct flow (request PENDING_AS, never passed USB): once every
///   person is AS-decided, APPROVED_AS or DECLINED_AS.
/// - AS, via-USB flow (request APPROVED_USB): once AS has decided everyone
///   USB ever approved, APPROVED_AS or DECLINED_AS. USB-declined persons do
///   not count and are never waited on.
pub fn finalize(
    stage: Stage,
    current: RequestStatus,
    persons: &[PersonStatus],
) -> Option<RequestStatus> {
    let total = persons.len();
    if total == 0 {
        return None;
    }

    let computed = match stage {
        Stage::Usb => {
            if !current.allows_stage(Stage::Usb) {
                return None;
            }
            let usb_decided = persons.iter().filter(|s| s.usb_decided()).count();
            if usb_decided != total {
                return None;
            }
            let approved = persons
                .iter()
                .filter(|s| **s == PersonStatus::ApprovedUsb)
                .count();
            if approved == 0 {
                RequestStatus::DeclinedUsb
            } else {
                RequestStatus::ApprovedUsb
            }
        }
        Stage::As => {
            let as_decided = persons.iter().filter(|s| s.as_decided()).count();
            let approved = persons
                .iter()
                .filter(|s| **s == PersonStatus::ApprovedAs)
                .count();
            match current {
                RequestStatus::PendingAs => {
                    if as_decided != total {
                        return None;
                    }
                    if approved == 0 {
                        RequestStatus::DeclinedAs
                    } else {
                        RequestStatus::ApprovedAs
                    }
                }
                RequestStatus::ApprovedUsb => {
                    let usb_approved_total =
                        persons.iter().filter(|s| s.usb_ever_approved()).count();
                    if as_decided == 0 || as_decided != usb_approved_total {
                        return None;
                    }
                    if approved == 0 {
                        RequestStatus::DeclinedAs
                    } else {
                        RequestStatus::ApprovedAs
                    }
                }
                _ => return None,
            }
        }
    };

    if computed == current {
        None
    } else {
        Some(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::requests::models::PersonStatus::*;
    use crate::domains::requests::models::RequestStatus as R;

    const L: NationalityClass = NationalityClass::Local;
    const F: NationalityClass = NationalityClass::Foreign;

    // ------------------------------------------------------------------
    // Routing
    // ------------------------------------------------------------------

    #[test]
    fn test_long_term_always_routes_to_usb() {
        assert_eq!(route(DurationClass::LongTerm, &[L]), Stage::Usb);
        assert_eq!(route(DurationClass::LongTerm, &[L, L, L]), Stage::Usb);
    }

    #[test]
    fn test_small_local_short_term_routes_directly_to_as() {
        assert_eq!(route(DurationClass::ShortTerm, &[L]), Stage::As);
        assert_eq!(route(DurationClass::ShortTerm, &[L, L, L]), Stage::As);
    }

    #[test]
    fn test_more_than_three_persons_routes_to_usb() {
        assert_eq!(route(DurationClass::ShortTerm, &[L, L, L, L]), Stage::Usb);
    }

    #[test]
    fn test_any_foreign_person_routes_to_usb() {
        assert_eq!(route(DurationClass::ShortTerm, &[F]), Stage::Usb);
        assert_eq!(route(DurationClass::ShortTerm, &[L, F]), Stage::Usb);
    }

    #[test]
    fn test_initial_statuses_match_routed_stage() {
        assert_eq!(
            initial_statuses(Stage::Usb),
            (R::PendingUsb, PersonStatus::PendingUsb)
        );
        assert_eq!(
            initial_statuses(Stage::As),
            (R::PendingAs, PersonStatus::PendingAs)
        );
    }

    // ------------------------------------------------------------------
    // Bulk planning
    // ------------------------------------------------------------------

    #[test]
    fn test_bulk_usb_approve_skips_declined_and_as_stage_persons() {
        assert_eq!(bulk_approve_target(Stage::Usb, PendingUsb), Some(ApprovedUsb));
        assert_eq!(bulk_approve_target(Stage::Usb, ApprovedUsb), Some(ApprovedUsb));
        assert_eq!(bulk_approve_target(Stage::Usb, DeclinedUsb), None);
        assert_eq!(bulk_approve_target(Stage::Usb, ApprovedAs), None);
        assert_eq!(bulk_approve_target(Stage::Usb, DeclinedAs), None);
    }

    #[test]
    fn test_bulk_as_approve_skips_only_declined() {
        assert_eq!(bulk_approve_target(Stage::As, PendingAs), Some(ApprovedAs));
        assert_eq!(bulk_approve_target(Stage::As, ApprovedUsb), Some(ApprovedAs));
        assert_eq!(bulk_approve_target(Stage::As, DeclinedUsb), None);
        assert_eq!(bulk_approve_target(Stage::As, DeclinedAs), None);
    }

    #[test]
    fn test_bulk_usb_decline_preserves_existing_declines() {
        assert_eq!(bulk_decline_target(Stage::Usb, PendingUsb), Some(DeclinedUsb));
        assert_eq!(bulk_decline_target(Stage::Usb, DeclinedUsb), None);
        assert_eq!(bulk_decline_target(Stage::Usb, DeclinedAs), None);
    }

    #[test]
    fn test_bulk_as_decline_overwrites_usb_declines() {
        assert_eq!(bulk_decline_target(Stage::As, DeclinedUsb), Some(DeclinedAs));
        assert_eq!(bulk_decline_target(Stage::As, ApprovedAs), Some(DeclinedAs));
        assert_eq!(bulk_decline_target(Stage::As, DeclinedAs), None);
    }

    #[test]
    fn test_bulk_usb_approve_jumps_to_pending_as() {
        // Deliberate asymmetry with the aggregation path, which stops at
        // APPROVED_USB.
        assert_eq!(bulk_request_status(Stage::Usb, true), R::PendingAs);
    }

    // ------------------------------------------------------------------
    // USB finalization
    // ------------------------------------------------------------------

    #[test]
    fn test_usb_partial_progress_leaves_status_untouched() {
        assert_eq!(finalize(Stage::Usb, R::PendingUsb, &[ApprovedUsb, PendingUsb]), None);
        assert_eq!(
            finalize(Stage::Usb, R::PendingUsb, &[DeclinedUsb, PendingUsb, PendingUsb]),
            None
        );
    }

    #[test]
    fn test_usb_mixed_decisions_approve_request() {
        // 2 approved + 1 declined, all processed
        assert_eq!(
            finalize(Stage::Usb, R::PendingUsb, &[ApprovedUsb, ApprovedUsb, DeclinedUsb]),
            Some(R::ApprovedUsb)
        );
    }

    #[test]
    fn test_usb_all_declined_declines_request() {
        assert_eq!(
            finalize(Stage::Usb, R::PendingUsb, &[DeclinedUsb, DeclinedUsb, DeclinedUsb]),
            Some(R::DeclinedUsb)
        );
    }

    #[test]
    fn test_usb_finalization_is_idempotent() {
        let persons = [ApprovedUsb, ApprovedUsb, DeclinedUsb];
        let first = finalize(Stage::Usb, R::PendingUsb, &persons).unwrap();
        assert_eq!(first, R::ApprovedUsb);
        // Re-running against the new status with no person change: no-op
        assert_eq!(finalize(Stage::Usb, first, &persons), None);
    }

    #[test]
    fn test_usb_finalization_ignores_as_stage_requests() {
        assert_eq!(finalize(Stage::Usb, R::PendingAs, &[ApprovedUsb]), None);
        assert_eq!(finalize(Stage::Usb, R::ApprovedAs, &[ApprovedUsb]), None);
    }

    // ------------------------------------------------------------------
    // AS finalization, direct flow
    // ------------------------------------------------------------------

    #[test]
    fn test_as_direct_mixed_decisions_approve_request() {
        assert_eq!(
            finalize(Stage::As, R::PendingAs, &[ApprovedAs, DeclinedAs]),
            Some(R::ApprovedAs)
        );
    }

    #[test]
    fn test_as_direct_all_declined_declines_request() {
        assert_eq!(
            finalize(Stage::As, R::PendingAs, &[DeclinedAs, DeclinedAs]),
            Some(R::DeclinedAs)
        );
    }

    #[test]
    fn test_as_direct_waits_for_every_person() {
        assert_eq!(finalize(Stage::As, R::PendingAs, &[ApprovedAs, PendingAs]), None);
    }

    #[test]
    fn test_as_direct_is_idempotent() {
        let persons = [ApprovedAs, DeclinedAs];
        let first = finalize(Stage::As, R::PendingAs, &persons).unwrap();
        assert_eq!(finalize(Stage::As, first, &persons), None);
    }

    // ------------------------------------------------------------------
    // AS finalization, via-USB flow
    // ------------------------------------------------------------------

    #[test]
    fn test_as_via_usb_ignores_usb_declined_person() {
        // USB declined one of three; AS decides the remaining two.
        assert_eq!(
            finalize(Stage::As, R::ApprovedUsb, &[DeclinedUsb, ApprovedAs, ApprovedAs]),
            Some(R::ApprovedAs)
        );
        assert_eq!(
            finalize(Stage::As, R::ApprovedUsb, &[DeclinedUsb, DeclinedAs, DeclinedAs]),
            Some(R::DeclinedAs)
        );
    }

    #[test]
    fn test_as_via_usb_waits_for_all_usb_approved() {
        // One of the two USB-approved persons still undecided by AS
        assert_eq!(
            finalize(Stage::As, R::ApprovedUsb, &[DeclinedUsb, ApprovedAs, ApprovedUsb]),
            None
        );
    }

    #[test]
    fn test_as_via_usb_requires_at_least_one_as_decision() {
        // Nobody AS-decided yet: as_done == 0 must not finalize even though
        // the counts would otherwise trivially match
        assert_eq!(
            finalize(Stage::As, R::ApprovedUsb, &[DeclinedUsb, DeclinedUsb, DeclinedUsb]),
            None
        );
    }

    #[test]
    fn test_as_via_usb_mixed_outcome() {
        assert_eq!(
            finalize(Stage::As, R::ApprovedUsb, &[ApprovedAs, DeclinedAs]),
            Some(R::ApprovedAs)
        );
    }

    #[test]
    fn test_as_via_usb_is_idempotent() {
        let persons = [DeclinedUsb, ApprovedAs, DeclinedAs];
        let first = finalize(Stage::As, R::ApprovedUsb, &persons).unwrap();
        assert_eq!(first, R::ApprovedAs);
        assert_eq!(finalize(Stage::As, first, &persons), None);
    }

    #[test]
    fn test_finalize_terminal_requests_untouched() {
        assert_eq!(finalize(Stage::As, R::DeclinedUsb, &[DeclinedUsb]), None);
        assert_eq!(finalize(Stage::As, R::Closed, &[ApprovedAs]), None);
        assert_eq!(finalize(Stage::As, R::Issued, &[ApprovedAs]), None);
    }

    #[test]
    fn test_finalize_empty_person_list_is_noop() {
        assert_eq!(finalize(Stage::Usb, R::PendingUsb, &[]), None);
    }

    // ------------------------------------------------------------------
    // Admin stage inference
    // ------------------------------------------------------------------

    #[test]
    fn test_admin_acts_at_stage_implied_by_status() {
        assert_eq!(admin_stage_for(R::PendingUsb), Stage::Usb);
        assert_eq!(admin_stage_for(R::DeclinedUsb), Stage::Usb);
        // APPROVED_USB means USB already decided everyone; what remains is AS
        assert_eq!(admin_stage_for(R::ApprovedUsb), Stage::As);
        assert_eq!(admin_stage_for(R::PendingAs), Stage::As);
        assert_eq!(admin_stage_for(R::ApprovedAs), Stage::As);
    }
}
