//! # Types
//!
//! Shared data structures used across all modules of the reservation ledger.
//!
//! ## Reservation status as a Finite-State Machine
//!
//! [`ReservationStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Pending ──► Active ──► Completed
//!    │          ├──────► Cancelled
//!    │          └──────► Refunded   (owner override)
//!    ├──► Refunded
//!    └──► Cancelled
//! ```
//!
//! `Pending -> Cancelled` is the user's own cancel before the gateway
//! answers; it refunds in full and closes the pending request. Every other
//! transition is rejected with `Error::InvalidStateTransition`.
//!
//! ## Money accounting
//!
//! A reservation's escrowed `deposit` is split, once it reaches a terminal
//! state, into exactly three buckets:
//!
//! ```text
//! deposit == refunded + platform_fee + earned
//! ```
//!
//! `platform_fee + earned` is what the platform keeps; `refunded` went back to
//! the user, either by direct transfer or as a credit on their
//! `deposit_balance`.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle status of a reservation.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReservationStatus {
    /// Waiting for the confirmation gateway (or a timeout).
    Pending,
    /// Confirmed; the spot is held until `end_time`.
    Active,
    /// Ran to its end; the deposit is fully earned.
    Completed,
    /// Cancelled by its owner.
    Cancelled,
    /// Rejected by the gateway, timed out, or force-refunded.
    Refunded,
}

impl ReservationStatus {
    /// `true` for states that can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled | ReservationStatus::Refunded
        )
    }
}

/// A reservable parking spot.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Spot {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    /// Free-form location label supplied by the operator.
    pub location: String,
    /// Fee per started hour, in token base units.
    pub price: i128,
    /// `false` once deactivated; there is no re-activation.
    pub active: bool,
    /// Temporarily withdrawn from reservation by an operator.
    pub in_maintenance: bool,
    /// End of the confirmed reservation holding the spot, `0` when free.
    pub reservation_end: u64,
    /// Reservation that set `reservation_end`, `0` when free.
    pub current_reservation: u64,
}

impl Spot {
    /// A confirmed reservation still covers `now`.
    pub fn is_reserved_at(&self, now: u64) -> bool {
        self.reservation_end != 0 && self.reservation_end >= now
    }

    /// Active, not in maintenance, and not covered by a confirmed reservation.
    pub fn is_available_at(&self, now: u64) -> bool {
        self.active && !self.in_maintenance && !self.is_reserved_at(now)
    }

    pub(crate) fn release(&mut self) {
        self.reservation_end = 0;
        self.current_reservation = 0;
    }
}

/// A registered user.
///
/// Presence of a profile in storage is what "registered" means; profiles are
/// never removed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserProfile {
    pub address: Address,
    /// Opaque external identity reference.
    pub identity: u64,
    /// Bounded to `[MIN_CREDIT_SCORE, MAX_CREDIT_SCORE]` at registration.
    pub credit_score: u32,
    /// Explicit deposits plus refunds that could not be transferred.
    pub deposit_balance: i128,
    /// Number of reservations that reached `Active`.
    pub reservation_count: u32,
    pub registered_at: u64,
}

/// A time-bounded claim on a spot with an escrowed payment.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reservation {
    pub id: u64,
    pub spot_id: u64,
    pub user: Address,
    pub start_time: u64,
    pub end_time: u64,
    pub status: ReservationStatus,
    /// Payment escrowed at request time.
    pub deposit: i128,
    /// Portion kept by the platform as fee.
    pub platform_fee: i128,
    /// Portion returned to the user.
    pub refunded: i128,
    /// Portion kept on completion.
    pub earned: i128,
    /// Outstanding confirmation request, `0` once it has been settled.
    pub request_id: u64,
}

impl Reservation {
    /// The deposit has been fully distributed across the three buckets.
    pub fn is_settled(&self) -> bool {
        self.refunded + self.platform_fee + self.earned == self.deposit
    }
}

/// Bridge record tracking an outstanding gateway confirmation.
///
/// Exactly one of `processed` / `timed_out` ends up `true`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingRequest {
    pub id: u64,
    pub reservation_id: u64,
    pub requester: Address,
    pub created_at: u64,
    pub processed: bool,
    pub timed_out: bool,
}

impl PendingRequest {
    pub fn is_open(&self) -> bool {
        !self.processed && !self.timed_out
    }
}
