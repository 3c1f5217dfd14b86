extern crate std;

use soroban_sdk::{testutils::Address as _, Address};

use crate::invariants::{
    assert_all_reservation_invariants, assert_request_exclusive, assert_spot_matches_reservation,
    assert_valid_status_transition,
};
use crate::test::{setup, Harness, HOUR, START, WALLET};
use crate::{Error, ReservationStatus, CANCELLATION_GRACE, TIMEOUT_PERIOD};

fn check(h: &Harness, reservation_id: u64) {
    let reservation = h.client.get_reservation(&reservation_id);
    let spot = h.client.get_spot(&reservation.spot_id);
    assert_all_reservation_invariants(&reservation);
    assert_spot_matches_reservation(&spot, &reservation, h.now());
}

// ─────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────

#[test]
fn test_request_opens_pending_reservation() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);

    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.user, user);
    assert_eq!(reservation.deposit, 20);
    assert_eq!(reservation.start_time, START);
    assert_eq!(reservation.end_time, START + 2 * HOUR);
    assert_ne!(request_id, 0);

    let request = h.client.get_request(&request_id);
    assert_eq!(request.reservation_id, reservation_id);
    assert_eq!(request.requester, user);
    assert_eq!(request.created_at, START);
    assert!(request.is_open());

    // Escrowed, but the spot is not held until confirmation.
    assert_eq!(h.token.balance(&user), WALLET - 20);
    assert_eq!(h.token.balance(&h.client.address), 20);
    assert!(h.client.is_available(&spot_id));
    assert_eq!(
        h.client.get_user_reservations(&user),
        soroban_sdk::vec![&h.env, reservation_id]
    );
}

#[test]
fn test_request_preconditions() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);

    let stranger = Address::generate(&h.env);
    assert_eq!(
        h.client.try_request_reservation(&stranger, &spot_id, &HOUR, &10),
        Err(Ok(Error::NotRegistered))
    );
    assert_eq!(
        h.client.try_request_reservation(&user, &99, &HOUR, &10),
        Err(Ok(Error::InvalidSpot))
    );
    assert_eq!(
        h.client
            .try_request_reservation(&user, &spot_id, &(crate::MIN_DURATION - 1), &10),
        Err(Ok(Error::InvalidDuration))
    );
    assert_eq!(
        h.client
            .try_request_reservation(&user, &spot_id, &(crate::MAX_DURATION + 1), &10),
        Err(Ok(Error::InvalidDuration))
    );
    assert_eq!(
        h.client.try_request_reservation(&user, &spot_id, &HOUR, &0),
        Err(Ok(Error::InvalidAmount))
    );

    h.client.deactivate_spot(&h.operator, &spot_id);
    assert_eq!(
        h.client.try_request_reservation(&user, &spot_id, &HOUR, &10),
        Err(Ok(Error::InvalidSpot))
    );

    // Nothing was escrowed by the failed calls.
    assert_eq!(h.token.balance(&user), WALLET);
    assert_eq!(h.client.get_user_reservations(&user).len(), 0);
}

#[test]
fn test_request_on_reserved_spot_fails() {
    let h = setup();
    let spot_id = h.spot(10);
    let first = h.user();
    h.active(&first, spot_id, 2 * HOUR, 20);

    let second = h.user();
    assert_eq!(
        h.client.try_request_reservation(&second, &spot_id, &HOUR, &10),
        Err(Ok(Error::SpotUnavailable))
    );

    // Still covered at the exact end time, free right after it.
    h.advance(2 * HOUR);
    assert!(!h.client.is_available(&spot_id));
    h.advance(1);
    assert!(h.client.is_available(&spot_id));
    h.request(&second, spot_id, HOUR, 10);
}

// ─────────────────────────────────────────────────────────
// Confirmation
// ─────────────────────────────────────────────────────────

/// Scenario A.
#[test]
fn test_confirm_available_activates_reservation() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    h.client.confirm(&h.gateway, &request_id, &true);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Active);
    assert_eq!(reservation.platform_fee, 1);
    assert_eq!(reservation.request_id, 0);

    let spot = h.client.get_spot(&spot_id);
    assert_eq!(spot.reservation_end, START + 2 * HOUR);
    assert_eq!(spot.current_reservation, reservation_id);
    assert!(!h.client.is_available(&spot_id));

    assert_eq!(h.client.platform_revenue(), 1);
    assert_eq!(h.client.get_user(&user).reservation_count, 1);

    let request = h.client.get_request(&request_id);
    assert!(request.processed);
    assert!(!request.timed_out);
    check(&h, reservation_id);
}

/// Scenario B.
#[test]
fn test_confirm_unavailable_refunds() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    h.client.confirm(&h.gateway, &request_id, &false);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Refunded);
    assert_eq!(reservation.refunded, 20);
    assert_eq!(h.token.balance(&user), WALLET);
    assert_eq!(h.client.get_user(&user).deposit_balance, 0);
    assert!(h.client.is_available(&spot_id));
    assert_eq!(h.client.platform_revenue(), 0);
    assert_eq!(h.client.get_user(&user).reservation_count, 0);
    check(&h, reservation_id);
}

#[test]
fn test_confirm_twice_is_rejected() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    h.client.confirm(&h.gateway, &request_id, &true);
    let before = h.client.get_reservation(&reservation_id);

    assert_eq!(
        h.client.try_confirm(&h.gateway, &request_id, &false),
        Err(Ok(Error::AlreadyProcessed))
    );
    assert_eq!(h.client.get_reservation(&reservation_id), before);
    assert_eq!(h.client.platform_revenue(), 1);
}

#[test]
fn test_confirm_requires_gateway() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (_, request_id) = h.request(&user, spot_id, HOUR, 10);

    assert_eq!(
        h.client.try_confirm(&user, &request_id, &true),
        Err(Ok(Error::NotAuthorized))
    );
    assert_eq!(
        h.client.try_confirm(&h.owner, &request_id, &true),
        Err(Ok(Error::NotAuthorized))
    );
    assert_eq!(
        h.client.try_confirm(&h.gateway, &99, &true),
        Err(Ok(Error::RequestNotFound))
    );
}

#[test]
fn test_second_confirmation_on_same_spot_is_refunded() {
    let h = setup();
    let spot_id = h.spot(10);
    let alice = h.user();
    let bob = h.user();

    // Pending requests do not block each other.
    let (alice_res, alice_req) = h.request(&alice, spot_id, 2 * HOUR, 20);
    let (bob_res, bob_req) = h.request(&bob, spot_id, HOUR, 10);

    h.client.confirm(&h.gateway, &alice_req, &true);
    // The gateway answered "available" but the spot is already held.
    h.client.confirm(&h.gateway, &bob_req, &true);

    assert_eq!(
        h.client.get_reservation(&alice_res).status,
        ReservationStatus::Active
    );
    assert_eq!(
        h.client.get_reservation(&bob_res).status,
        ReservationStatus::Refunded
    );
    assert_eq!(h.client.get_spot(&spot_id).current_reservation, alice_res);
    assert_eq!(h.token.balance(&bob), WALLET);
    check(&h, alice_res);
    check(&h, bob_res);
}

#[test]
fn test_confirm_after_deactivation_refunds() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, HOUR, 10);

    h.client.deactivate_spot(&h.operator, &spot_id);
    h.client.confirm(&h.gateway, &request_id, &true);

    assert_eq!(
        h.client.get_reservation(&reservation_id).status,
        ReservationStatus::Refunded
    );
    assert_eq!(h.token.balance(&user), WALLET);
}

// ─────────────────────────────────────────────────────────
// Timeout
// ─────────────────────────────────────────────────────────

/// Scenario C.
#[test]
fn test_timeout_refunds_and_blocks_late_confirm() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    h.advance(TIMEOUT_PERIOD + 1);
    h.client.trigger_timeout(&user, &request_id);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Refunded);
    assert_eq!(h.token.balance(&user), WALLET);

    let request = h.client.get_request(&request_id);
    assert!(request.timed_out);
    assert!(!request.processed);
    assert_request_exclusive(&request);

    assert_eq!(
        h.client.try_confirm(&h.gateway, &request_id, &true),
        Err(Ok(Error::AlreadyProcessed))
    );
    assert_eq!(
        h.client.try_trigger_timeout(&user, &request_id),
        Err(Ok(Error::AlreadyProcessed))
    );
    check(&h, reservation_id);
}

#[test]
fn test_timeout_before_deadline_fails() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (_, request_id) = h.request(&user, spot_id, HOUR, 10);

    assert_eq!(
        h.client.try_trigger_timeout(&user, &request_id),
        Err(Ok(Error::TimeoutNotReached))
    );
    h.advance(TIMEOUT_PERIOD);
    assert_eq!(
        h.client.try_trigger_timeout(&user, &request_id),
        Err(Ok(Error::TimeoutNotReached))
    );
    assert!(h.client.get_request(&request_id).is_open());
}

#[test]
fn test_timeout_callers() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, HOUR, 10);
    h.advance(TIMEOUT_PERIOD + 1);

    let stranger = Address::generate(&h.env);
    assert_eq!(
        h.client.try_trigger_timeout(&stranger, &request_id),
        Err(Ok(Error::NotAuthorized))
    );

    h.client.trigger_timeout(&h.operator, &request_id);
    assert_eq!(
        h.client.get_reservation(&reservation_id).status,
        ReservationStatus::Refunded
    );
}

#[test]
fn test_timeout_after_confirm_fails() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (_, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);
    h.client.confirm(&h.gateway, &request_id, &true);

    h.advance(TIMEOUT_PERIOD + 1);
    assert_eq!(
        h.client.try_trigger_timeout(&user, &request_id),
        Err(Ok(Error::AlreadyProcessed))
    );
    let request = h.client.get_request(&request_id);
    assert!(request.processed && !request.timed_out);
}

// ─────────────────────────────────────────────────────────
// Cancellation
// ─────────────────────────────────────────────────────────

/// Scenario D, inside the grace window.
#[test]
fn test_cancel_active_within_grace_refunds_ninety_percent() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, 2 * HOUR, 20);

    h.advance(CANCELLATION_GRACE);
    h.client.cancel(&user, &reservation_id);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(reservation.refunded, 18);
    assert_eq!(reservation.platform_fee, 2);
    assert_eq!(h.client.platform_revenue(), 2);
    assert_eq!(h.token.balance(&user), WALLET - 2);
    assert!(h.client.is_available(&spot_id));
    check(&h, reservation_id);
}

#[test]
fn test_cancel_active_with_huge_deposit_refunds_ninety_percent() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let payment = i128::MAX / 50;
    h.token_admin.mint(&user, &payment);
    let reservation_id = h.active(&user, spot_id, 2 * HOUR, payment);

    h.client.cancel(&user, &reservation_id);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    // The retained tenth is rounded up, the refund down.
    let retained = payment / 10 + i128::from(payment % 10 != 0);
    assert_eq!(reservation.platform_fee, retained);
    assert_eq!(reservation.refunded, payment - retained);
    assert_eq!(h.client.platform_revenue(), retained);
    assert_eq!(h.token.balance(&user), WALLET + payment - retained);
    check(&h, reservation_id);
}

/// Scenario D, after the grace window.
#[test]
fn test_cancel_active_after_grace_fails() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, 2 * HOUR, 20);

    h.advance(CANCELLATION_GRACE + 1);
    assert_eq!(
        h.client.try_cancel(&user, &reservation_id),
        Err(Ok(Error::CancellationWindowExpired))
    );
    assert_eq!(
        h.client.get_reservation(&reservation_id).status,
        ReservationStatus::Active
    );
}

#[test]
fn test_cancel_pending_refunds_in_full_and_closes_request() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, 2 * HOUR, 20);

    h.client.cancel(&user, &reservation_id);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Cancelled);
    assert_eq!(reservation.refunded, 20);
    assert_eq!(h.token.balance(&user), WALLET);

    assert_eq!(
        h.client.try_confirm(&h.gateway, &request_id, &true),
        Err(Ok(Error::AlreadyProcessed))
    );
    check(&h, reservation_id);
}

#[test]
fn test_cancel_rules() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, HOUR, 10);

    let other = h.user();
    assert_eq!(
        h.client.try_cancel(&other, &reservation_id),
        Err(Ok(Error::NotReservationOwner))
    );
    assert_eq!(
        h.client.try_cancel(&user, &99),
        Err(Ok(Error::ReservationNotFound))
    );

    h.advance(HOUR);
    h.client.complete(&user, &reservation_id);
    assert_eq!(
        h.client.try_cancel(&user, &reservation_id),
        Err(Ok(Error::InvalidStateTransition))
    );
}

// ─────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────

/// Scenario E.
#[test]
fn test_complete_only_after_end_time() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let reservation_id = h.active(&user, spot_id, 2 * HOUR, 20);

    h.advance(2 * HOUR - 1);
    assert_eq!(
        h.client.try_complete(&user, &reservation_id),
        Err(Ok(Error::ReservationNotEnded))
    );

    h.advance(1);
    h.client.complete(&user, &reservation_id);

    let reservation = h.client.get_reservation(&reservation_id);
    assert_eq!(reservation.status, ReservationStatus::Completed);
    assert_eq!(reservation.platform_fee, 1);
    assert_eq!(reservation.earned, 19);
    assert_eq!(reservation.refunded, 0);
    assert_eq!(h.client.platform_revenue(), 20);

    let spot = h.client.get_spot(&spot_id);
    assert_eq!(spot.reservation_end, 0);
    assert!(h.client.is_available(&spot_id));
    check(&h, reservation_id);
}

#[test]
fn test_complete_rules() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, HOUR, 10);

    assert_eq!(
        h.client.try_complete(&user, &reservation_id),
        Err(Ok(Error::InvalidStateTransition))
    );

    h.client.confirm(&h.gateway, &request_id, &true);
    h.advance(HOUR);

    let stranger = Address::generate(&h.env);
    assert_eq!(
        h.client.try_complete(&stranger, &reservation_id),
        Err(Ok(Error::NotAuthorized))
    );

    // Operators may close reservations on behalf of users.
    h.client.complete(&h.operator, &reservation_id);
    assert_eq!(
        h.client.try_complete(&h.operator, &reservation_id),
        Err(Ok(Error::InvalidStateTransition))
    );
}

#[test]
fn test_completing_stale_reservation_keeps_newer_hold() {
    let h = setup();
    let spot_id = h.spot(10);
    let alice = h.user();
    let bob = h.user();

    let old = h.active(&alice, spot_id, HOUR, 10);
    h.advance(HOUR + 1);
    let new = h.active(&bob, spot_id, HOUR, 10);

    h.client.complete(&alice, &old);

    let spot = h.client.get_spot(&spot_id);
    assert_eq!(spot.current_reservation, new);
    assert!(!h.client.is_available(&spot_id));
    check(&h, old);
    check(&h, new);
}

// ─────────────────────────────────────────────────────────
// Cross-cutting properties
// ─────────────────────────────────────────────────────────

#[test]
fn test_deposit_conserved_across_terminal_states() {
    let h = setup();
    let user = h.user();
    let spots = [h.spot(10), h.spot(10), h.spot(10), h.spot(10)];
    let payment = 37i128;

    let completed = h.active(&user, spots[0], HOUR, payment);
    let cancelled = h.active(&user, spots[1], HOUR, payment);
    let (refunded, refunded_req) = h.request(&user, spots[2], HOUR, payment);
    let (pending_cancelled, _) = h.request(&user, spots[3], HOUR, payment);

    h.client.cancel(&user, &cancelled);
    h.client.confirm(&h.gateway, &refunded_req, &false);
    h.client.cancel(&user, &pending_cancelled);
    h.advance(HOUR);
    h.client.complete(&user, &completed);

    let mut kept = 0i128;
    for id in [completed, cancelled, refunded, pending_cancelled] {
        let reservation = h.client.get_reservation(&id);
        assert!(reservation.status.is_terminal());
        assert!(reservation.is_settled());
        kept += reservation.platform_fee + reservation.earned;
    }

    // Cancelled-active keeps 37 - 33 = 4, completed keeps all 37.
    assert_eq!(kept, 41);
    assert_eq!(h.client.platform_revenue(), kept);
    assert_eq!(h.token.balance(&h.client.address), kept);
    assert_eq!(h.token.balance(&user), WALLET - kept);
}

#[test]
fn test_status_transitions_are_forward_only() {
    let h = setup();
    let user = h.user();
    let spot_id = h.spot(10);
    let (reservation_id, request_id) = h.request(&user, spot_id, HOUR, 10);

    let mut last = h.client.get_reservation(&reservation_id).status;
    h.client.confirm(&h.gateway, &request_id, &true);
    let next = h.client.get_reservation(&reservation_id).status;
    assert_valid_status_transition(&last, &next);
    last = next;

    h.advance(HOUR);
    h.client.complete(&user, &reservation_id);
    let next = h.client.get_reservation(&reservation_id).status;
    assert_valid_status_transition(&last, &next);
    assert!(next.is_terminal());
}
