//! # Reservation ledger
//!
//! The reservation state machine and its pending-request bridge to the
//! confirmation gateway.
//!
//! A request escrows the payment and leaves the reservation `Pending` with an
//! open [`PendingRequest`]. The request is closed by exactly one of:
//!
//! - `confirm` from the gateway (`processed`),
//! - `trigger_timeout` once `TIMEOUT_PERIOD` has elapsed (`timed_out`),
//! - `cancel` by the owner, or an owner `force_refund` (`processed`).
//!
//! Every function writes its own state before any refund leaves the contract.

use soroban_sdk::{Address, Env};

use crate::events::{self, ReservationConfirmed, ReservationRequested};
use crate::payout;
use crate::rbac;
use crate::storage;
use crate::types::{PendingRequest, Reservation, ReservationStatus};
use crate::Error;

pub const MIN_DURATION: u64 = 3_600;
pub const MAX_DURATION: u64 = 24 * 3_600;
/// How long the gateway has to answer before anyone may time the request out.
pub const TIMEOUT_PERIOD: u64 = 3_600;
/// Window after `start_time` during which an active reservation may be cancelled.
pub const CANCELLATION_GRACE: u64 = 30 * 60;
/// Platform fee on confirmation is `deposit / PLATFORM_FEE_DIVISOR` (5%).
pub const PLATFORM_FEE_DIVISOR: i128 = 20;
pub const ACTIVE_CANCEL_REFUND_PERCENT: i128 = 90;

pub fn request(
    env: &Env,
    user: Address,
    spot_id: u64,
    duration: u64,
    payment: i128,
) -> Result<u64, Error> {
    storage::load_user(env, &user)?;

    let now = env.ledger().timestamp();
    let spot = storage::load_spot(env, spot_id)?;
    if !spot.active {
        return Err(Error::InvalidSpot);
    }
    if !spot.is_available_at(now) {
        return Err(Error::SpotUnavailable);
    }
    if !(MIN_DURATION..=MAX_DURATION).contains(&duration) {
        return Err(Error::InvalidDuration);
    }
    if payment <= 0 {
        return Err(Error::InvalidAmount);
    }
    let end_time = now.checked_add(duration).ok_or(Error::Overflow)?;

    let reservation_id = storage::next_reservation_id(env);
    let request_id = storage::next_request_id(env);

    storage::save_reservation(
        env,
        &Reservation {
            id: reservation_id,
            spot_id,
            user: user.clone(),
            start_time: now,
            end_time,
            status: ReservationStatus::Pending,
            deposit: payment,
            platform_fee: 0,
            refunded: 0,
            earned: 0,
            request_id,
        },
    );
    storage::save_request(
        env,
        &PendingRequest {
            id: request_id,
            reservation_id,
            requester: user.clone(),
            created_at: now,
            processed: false,
            timed_out: false,
        },
    );
    storage::push_user_reservation(env, &user, reservation_id);

    payout::collect(env, &user, payment)?;

    events::emit_reservation_requested(
        env,
        ReservationRequested {
            reservation_id,
            request_id,
            spot_id,
            user,
            amount: payment,
            end_time,
        },
    );
    Ok(reservation_id)
}

/// Gateway callback. The spot is re-checked on chain: a positive answer for a
/// spot that has meanwhile been taken, deactivated or put into maintenance is
/// treated as unavailable.
pub fn confirm(env: &Env, request_id: u64, spot_still_available: bool) -> Result<(), Error> {
    let mut request = storage::load_request(env, request_id)?;
    if !request.is_open() {
        return Err(Error::AlreadyProcessed);
    }
    let mut reservation = storage::load_reservation(env, request.reservation_id)?;
    if reservation.status != ReservationStatus::Pending {
        return Err(Error::InvalidStateTransition);
    }

    request.processed = true;
    storage::save_request(env, &request);
    reservation.request_id = 0;

    let now = env.ledger().timestamp();
    let mut spot = storage::load_spot(env, reservation.spot_id)?;
    let can_activate =
        spot_still_available && spot.is_available_at(now) && reservation.end_time > now;

    if !can_activate {
        return refund_pending(env, reservation);
    }

    let fee = reservation.deposit / PLATFORM_FEE_DIVISOR;
    reservation.status = ReservationStatus::Active;
    reservation.platform_fee = fee;
    storage::save_reservation(env, &reservation);

    spot.reservation_end = reservation.end_time;
    spot.current_reservation = reservation.id;
    storage::save_spot(env, &spot);

    let mut profile = storage::load_user(env, &reservation.user)?;
    profile.reservation_count += 1;
    storage::save_user(env, &profile);

    storage::add_revenue(env, fee)?;

    events::emit_reservation_confirmed(
        env,
        ReservationConfirmed {
            reservation_id: reservation.id,
            spot_id: reservation.spot_id,
            user: reservation.user,
            end_time: reservation.end_time,
            fee,
        },
    );
    Ok(())
}

pub fn cancel(env: &Env, user: Address, reservation_id: u64) -> Result<(), Error> {
    let mut reservation = storage::load_reservation(env, reservation_id)?;
    if reservation.user != user {
        return Err(Error::NotReservationOwner);
    }

    let refund = match reservation.status {
        ReservationStatus::Pending => {
            close_request(env, reservation.request_id)?;
            reservation.request_id = 0;
            reservation.deposit
        }
        ReservationStatus::Active => {
            let now = env.ledger().timestamp();
            let window_end = reservation.start_time.saturating_add(CANCELLATION_GRACE);
            if now > window_end {
                return Err(Error::CancellationWindowExpired);
            }
            let refund = percent_of(reservation.deposit, ACTIVE_CANCEL_REFUND_PERCENT);
            let retained = reservation.deposit - refund;
            storage::add_revenue(env, retained - reservation.platform_fee)?;
            reservation.platform_fee = retained;
            release_spot(env, reservation.spot_id, reservation.id)?;
            refund
        }
        _ => return Err(Error::InvalidStateTransition),
    };

    reservation.status = ReservationStatus::Cancelled;
    reservation.refunded = refund;
    storage::save_reservation(env, &reservation);

    events::emit_reservation_cancelled(
        env,
        reservation.id,
        user.clone(),
        refund,
        reservation.platform_fee,
    );
    payout::refund(env, reservation.id, &user, refund)?;
    Ok(())
}

pub fn complete(env: &Env, reservation_id: u64) -> Result<(), Error> {
    let mut reservation = storage::load_reservation(env, reservation_id)?;
    if reservation.status != ReservationStatus::Active {
        return Err(Error::InvalidStateTransition);
    }
    if env.ledger().timestamp() < reservation.end_time {
        return Err(Error::ReservationNotEnded);
    }

    finish(env, &mut reservation)?;
    Ok(())
}

/// Time out an unanswered request. Callable by the requester or an operator.
pub fn trigger_timeout(env: &Env, caller: Address, request_id: u64) -> Result<(), Error> {
    let mut request = storage::load_request(env, request_id)?;
    if request.requester != caller {
        rbac::require_operator(env, &caller)?;
    }
    if !request.is_open() {
        return Err(Error::AlreadyProcessed);
    }
    let elapsed = env.ledger().timestamp().saturating_sub(request.created_at);
    if elapsed <= TIMEOUT_PERIOD {
        return Err(Error::TimeoutNotReached);
    }
    let mut reservation = storage::load_reservation(env, request.reservation_id)?;
    if reservation.status != ReservationStatus::Pending {
        return Err(Error::InvalidStateTransition);
    }

    request.timed_out = true;
    storage::save_request(env, &request);
    reservation.request_id = 0;

    events::emit_timeout_triggered(env, reservation.id, request_id, caller);
    refund_pending(env, reservation)
}

// ── Owner overrides ──────────────────────────────────────────────────

/// Free a spot regardless of its reservation window. The covering active
/// reservation, if any, is closed as `Completed`.
pub fn force_release_spot(env: &Env, owner: Address, spot_id: u64) -> Result<(), Error> {
    let spot = storage::load_spot(env, spot_id)?;
    let reservation_id = spot.current_reservation;

    if reservation_id != 0 {
        let mut reservation = storage::load_reservation(env, reservation_id)?;
        if reservation.status == ReservationStatus::Active {
            finish(env, &mut reservation)?;
        }
    }

    // Reload: `finish` may already have written the spot.
    let mut spot = storage::load_spot(env, spot_id)?;
    spot.release();
    storage::save_spot(env, &spot);

    events::emit_spot_released(env, spot_id, reservation_id, owner);
    Ok(())
}

/// Refund the whole deposit of a pending or active reservation, clawing back
/// any fee already booked.
pub fn force_refund(env: &Env, reservation_id: u64) -> Result<(), Error> {
    let mut reservation = storage::load_reservation(env, reservation_id)?;
    match reservation.status {
        ReservationStatus::Pending => {
            close_request(env, reservation.request_id)?;
            reservation.request_id = 0;
        }
        ReservationStatus::Active => {
            storage::take_revenue(env, reservation.platform_fee)?;
            reservation.platform_fee = 0;
            release_spot(env, reservation.spot_id, reservation.id)?;
        }
        _ => return Err(Error::InvalidStateTransition),
    }

    refund_pending(env, reservation)
}

// ── Internal helpers ─────────────────────────────────────────────────

/// Mark `reservation` refunded in full, persist it, then pay out.
fn refund_pending(env: &Env, mut reservation: Reservation) -> Result<(), Error> {
    reservation.status = ReservationStatus::Refunded;
    reservation.refunded = reservation.deposit;
    storage::save_reservation(env, &reservation);

    payout::refund(env, reservation.id, &reservation.user, reservation.deposit)?;
    Ok(())
}

/// Close an active reservation as completed; the remaining deposit is earned.
fn finish(env: &Env, reservation: &mut Reservation) -> Result<(), Error> {
    let earned = reservation.deposit - reservation.platform_fee - reservation.refunded;
    storage::add_revenue(env, earned)?;

    reservation.status = ReservationStatus::Completed;
    reservation.earned = earned;
    storage::save_reservation(env, reservation);
    release_spot(env, reservation.spot_id, reservation.id)?;

    events::emit_reservation_completed(env, reservation.id, reservation.spot_id, earned);
    Ok(())
}

/// Clear the spot only if it is still held by `reservation_id`; a later
/// reservation may already own it.
fn release_spot(env: &Env, spot_id: u64, reservation_id: u64) -> Result<(), Error> {
    let mut spot = storage::load_spot(env, spot_id)?;
    if spot.current_reservation == reservation_id {
        spot.release();
        storage::save_spot(env, &spot);
    }
    Ok(())
}

/// `amount * percent / 100` rounded down, without the intermediate product
/// that would overflow for amounts near `i128::MAX`.
fn percent_of(amount: i128, percent: i128) -> i128 {
    (amount / 100) * percent + (amount % 100) * percent / 100
}

fn close_request(env: &Env, request_id: u64) -> Result<(), Error> {
    if request_id == 0 {
        return Ok(());
    }
    let mut request = storage::load_request(env, request_id)?;
    request.processed = true;
    storage::save_request(env, &request);
    Ok(())
}
