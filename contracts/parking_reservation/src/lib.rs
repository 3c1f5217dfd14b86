//! # Parking Reservation Contract
//!
//! A Soroban contract that rents out parking spots for a bounded duration
//! against an escrowed token payment. Final commitment of a reservation is
//! deferred to an external confirmation gateway, so every reservation passes
//! through a `Pending` state bridged by a pending-request record.
//!
//! | Phase          | Entry Point(s)                                                  |
//! |----------------|-----------------------------------------------------------------|
//! | Bootstrap      | [`ParkingReservation::init`]                                    |
//! | Role admin     | `grant_role`, `revoke_role`, `transfer_ownership`               |
//! | Emergency      | `pause`, `unpause`, `force_release_spot`, `force_refund`        |
//! | Spots          | `add_spot`, `update_spot_price`, `set_maintenance`, `deactivate_spot` |
//! | Users          | `register`, `deposit`, `withdraw`                               |
//! | Reservations   | `request_reservation`, `confirm`, `cancel`, `complete`, `trigger_timeout` |
//! | Treasury       | `platform_revenue`, `withdraw_revenue`                          |
//! | Queries        | `get_spot`, `is_available`, `quote`, `get_user`, `get_reservation`, `get_request`, ... |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], storage access to `storage`, and
//! business rules to `spots`, `users` and `ledger`. Token movement and the
//! refund fallback live in `payout`. This file holds the public entry points:
//! signature checks, role checks, the pause switch and the reentrancy guard.
//!
//! Every entry point returns `Result`; an `Err` reverts all writes of the
//! invocation, so failed calls leave the ledger unchanged.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod events;
mod ledger;
mod payout;
pub mod rbac;
mod spots;
mod storage;
mod types;
mod users;

#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_reservation;

pub use ledger::{
    ACTIVE_CANCEL_REFUND_PERCENT, CANCELLATION_GRACE, MAX_DURATION, MIN_DURATION,
    PLATFORM_FEE_DIVISOR, TIMEOUT_PERIOD,
};
pub use rbac::Role;
pub use spots::{MAX_PRICE, MIN_PRICE};
pub use types::{PendingRequest, Reservation, ReservationStatus, Spot, UserProfile};
pub use users::{MAX_CREDIT_SCORE, MIN_CREDIT_SCORE};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    NotAuthorized = 3,
    RoleNotFound = 4,
    ProtocolPaused = 5,
    InvalidSpot = 6,
    InvalidPrice = 7,
    SpotCurrentlyReserved = 8,
    SpotUnavailable = 9,
    AlreadyRegistered = 10,
    NotRegistered = 11,
    InvalidCreditScore = 12,
    InvalidAmount = 13,
    NoBalance = 14,
    InvalidDuration = 15,
    ReservationNotFound = 16,
    RequestNotFound = 17,
    InvalidStateTransition = 18,
    AlreadyProcessed = 19,
    TimeoutNotReached = 20,
    CancellationWindowExpired = 21,
    ReservationNotEnded = 22,
    NotReservationOwner = 23,
    Reentrant = 24,
    Overflow = 25,
    InsufficientRevenue = 26,
}

#[contract]
pub struct ParkingReservation;

#[contractimpl]
impl ParkingReservation {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract with its owner and payment token.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls fail with `Error::AlreadyInitialized`.
    pub fn init(env: Env, owner: Address, token: Address) -> Result<(), Error> {
        owner.require_auth();
        rbac::init_owner(&env, &owner)?;
        storage::set_token(&env, &token);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `Operator` or `Gateway` to `target`. Owner only.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke the role held by `target`. Owner only; the owner role itself
    /// moves with `transfer_ownership`.
    pub fn revoke_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::revoke_role(&env, &caller, &target)
    }

    pub fn transfer_ownership(env: Env, current_owner: Address, new_owner: Address) -> Result<(), Error> {
        rbac::transfer_ownership(&env, &current_owner, &new_owner)
    }

    pub fn owner(env: Env) -> Result<Address, Error> {
        rbac::owner(&env)
    }

    /// Return the role held by `address`, or `None`.
    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::role_of(&env, address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Emergency control
    // ─────────────────────────────────────────────────────────

    /// Halt new spots, registrations, deposits and reservation requests.
    /// Paths that return funds stay open.
    pub fn pause(env: Env, owner: Address) -> Result<(), Error> {
        owner.require_auth();
        rbac::require_owner(&env, &owner)?;
        storage::set_paused(&env, true);
        events::emit_protocol_paused(&env, owner);
        Ok(())
    }

    pub fn unpause(env: Env, owner: Address) -> Result<(), Error> {
        owner.require_auth();
        rbac::require_owner(&env, &owner)?;
        storage::set_paused(&env, false);
        events::emit_protocol_unpaused(&env, owner);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    /// Free `spot_id` now. A covering active reservation is closed as completed.
    pub fn force_release_spot(env: Env, owner: Address, spot_id: u64) -> Result<(), Error> {
        owner.require_auth();
        rbac::require_owner(&env, &owner)?;
        payout::guarded(&env, || ledger::force_release_spot(&env, owner.clone(), spot_id))
    }

    /// Refund the full deposit of a pending or active reservation.
    pub fn force_refund(env: Env, owner: Address, reservation_id: u64) -> Result<(), Error> {
        owner.require_auth();
        rbac::require_owner(&env, &owner)?;
        payout::guarded(&env, || ledger::force_refund(&env, reservation_id))
    }

    // ─────────────────────────────────────────────────────────
    // Spot registry
    // ─────────────────────────────────────────────────────────

    /// Add a spot priced per started hour. Returns its ID.
    pub fn add_spot(env: Env, operator: Address, price: i128, location: String) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        operator.require_auth();
        rbac::require_operator(&env, &operator)?;
        spots::add_spot(&env, operator, price, location)
    }

    pub fn update_spot_price(env: Env, operator: Address, spot_id: u64, new_price: i128) -> Result<(), Error> {
        operator.require_auth();
        rbac::require_operator(&env, &operator)?;
        spots::update_price(&env, spot_id, new_price)
    }

    pub fn set_maintenance(
        env: Env,
        operator: Address,
        spot_id: u64,
        in_maintenance: bool,
    ) -> Result<(), Error> {
        operator.require_auth();
        rbac::require_operator(&env, &operator)?;
        spots::set_maintenance(&env, spot_id, in_maintenance)
    }

    pub fn deactivate_spot(env: Env, operator: Address, spot_id: u64) -> Result<(), Error> {
        operator.require_auth();
        rbac::require_operator(&env, &operator)?;
        spots::deactivate(&env, operator, spot_id)
    }

    /// `true` iff the spot is active, not in maintenance, and no confirmed
    /// reservation covers the current ledger time. Unknown IDs are unavailable.
    pub fn is_available(env: Env, spot_id: u64) -> bool {
        spots::is_available(&env, spot_id)
    }

    pub fn get_spot(env: Env, spot_id: u64) -> Result<Spot, Error> {
        storage::load_spot(&env, spot_id)
    }

    pub fn spot_count(env: Env) -> u64 {
        storage::spot_count(&env)
    }

    /// Price of `duration` seconds on `spot_id`, charged per started hour.
    pub fn quote(env: Env, spot_id: u64, duration: u64) -> Result<i128, Error> {
        spots::quote(&env, spot_id, duration)
    }

    // ─────────────────────────────────────────────────────────
    // User registry
    // ─────────────────────────────────────────────────────────

    pub fn register(env: Env, user: Address, identity: u64, credit_score: u32) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        user.require_auth();
        users::register(&env, user, identity, credit_score)
    }

    /// Top up the caller's withdrawable balance.
    pub fn deposit(env: Env, user: Address, amount: i128) -> Result<(), Error> {
        Self::require_not_paused(&env)?;
        user.require_auth();
        payout::guarded(&env, || users::deposit(&env, user.clone(), amount))
    }

    /// Pay out and zero the caller's balance. Returns the amount sent.
    pub fn withdraw(env: Env, user: Address) -> Result<i128, Error> {
        user.require_auth();
        payout::guarded(&env, || users::withdraw(&env, user.clone()))
    }

    pub fn get_user(env: Env, user: Address) -> Result<UserProfile, Error> {
        storage::load_user(&env, &user)
    }

    pub fn is_registered(env: Env, user: Address) -> bool {
        storage::has_user(&env, &user)
    }

    pub fn get_user_reservations(env: Env, user: Address) -> Vec<u64> {
        storage::load_user_reservations(&env, &user)
    }

    // ─────────────────────────────────────────────────────────
    // Reservation lifecycle
    // ─────────────────────────────────────────────────────────

    /// Escrow `payment` and open a pending reservation of `duration` seconds
    /// starting now. Returns the reservation ID; its pending request ID is on
    /// the reservation record.
    pub fn request_reservation(
        env: Env,
        user: Address,
        spot_id: u64,
        duration: u64,
        payment: i128,
    ) -> Result<u64, Error> {
        Self::require_not_paused(&env)?;
        user.require_auth();
        payout::guarded(&env, || ledger::request(&env, user.clone(), spot_id, duration, payment))
    }

    /// Gateway callback finalising a pending request.
    pub fn confirm(
        env: Env,
        gateway: Address,
        request_id: u64,
        spot_still_available: bool,
    ) -> Result<(), Error> {
        gateway.require_auth();
        rbac::require_gateway(&env, &gateway)?;
        payout::guarded(&env, || ledger::confirm(&env, request_id, spot_still_available))
    }

    /// Cancel a pending reservation (full refund) or an active one inside the
    /// grace window (partial refund).
    pub fn cancel(env: Env, user: Address, reservation_id: u64) -> Result<(), Error> {
        user.require_auth();
        payout::guarded(&env, || ledger::cancel(&env, user.clone(), reservation_id))
    }

    /// Close an active reservation once its end time has been reached.
    /// Callable by the reservation's user or an operator.
    pub fn complete(env: Env, caller: Address, reservation_id: u64) -> Result<(), Error> {
        caller.require_auth();
        let reservation = storage::load_reservation(&env, reservation_id)?;
        if reservation.user != caller {
            rbac::require_operator(&env, &caller)?;
        }
        ledger::complete(&env, reservation_id)
    }

    /// Refund a pending request the gateway never answered.
    pub fn trigger_timeout(env: Env, caller: Address, request_id: u64) -> Result<(), Error> {
        caller.require_auth();
        payout::guarded(&env, || ledger::trigger_timeout(&env, caller.clone(), request_id))
    }

    pub fn get_reservation(env: Env, reservation_id: u64) -> Result<Reservation, Error> {
        storage::load_reservation(&env, reservation_id)
    }

    pub fn get_request(env: Env, request_id: u64) -> Result<PendingRequest, Error> {
        storage::load_request(&env, request_id)
    }

    // ─────────────────────────────────────────────────────────
    // Treasury
    // ─────────────────────────────────────────────────────────

    /// Fees and completed-reservation earnings held by the contract.
    pub fn platform_revenue(env: Env) -> i128 {
        storage::get_revenue(&env)
    }

    pub fn withdraw_revenue(env: Env, owner: Address, to: Address, amount: i128) -> Result<(), Error> {
        owner.require_auth();
        rbac::require_owner(&env, &owner)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        payout::guarded(&env, || {
            storage::take_revenue(&env, amount)?;
            payout::pay_out(&env, &to, amount)?;
            events::emit_revenue_withdrawn(&env, to.clone(), amount);
            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────

    fn require_not_paused(env: &Env) -> Result<(), Error> {
        if storage::is_paused(env) {
            return Err(Error::ProtocolPaused);
        }
        Ok(())
    }
}
