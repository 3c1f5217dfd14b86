//! # Events
//!
//! Every state change is published as a contract event with the topic tuple
//! `(kind, entity_id)` and a typed payload, so an off-chain indexer can
//! correlate the stream by spot, reservation or user.
//!
//! | Topic       | Entity        | Payload                 |
//! |-------------|---------------|-------------------------|
//! | `spot_add`  | spot id       | [`SpotAdded`]           |
//! | `spot_upd`  | spot id       | [`SpotPriceUpdated`]    |
//! | `spot_mnt`  | spot id       | [`SpotMaintenance`]     |
//! | `spot_off`  | spot id       | operator `Address`      |
//! | `released`  | spot id       | [`SpotReleased`]        |
//! | `user_reg`  | user address  | [`UserRegistered`]      |
//! | `deposit`   | user address  | amount `i128`           |
//! | `withdraw`  | user address  | amount `i128`           |
//! | `requested` | reservation   | [`ReservationRequested`]|
//! | `confirmed` | reservation   | [`ReservationConfirmed`]|
//! | `completed` | reservation   | [`ReservationCompleted`]|
//! | `cancelled` | reservation   | [`ReservationCancelled`]|
//! | `refunded`  | reservation   | [`RefundIssued`]        |
//! | `credited`  | reservation   | [`RefundIssued`]        |
//! | `timeout`   | reservation   | [`TimeoutTriggered`]    |
//! | `rev_out`   | recipient     | amount `i128`           |
//! | `paused`    | none          | owner `Address`         |
//! | `unpaused`  | none          | owner `Address`         |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpotAdded {
    pub spot_id: u64,
    pub operator: Address,
    pub price: i128,
    pub location: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpotPriceUpdated {
    pub spot_id: u64,
    pub old_price: i128,
    pub new_price: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpotMaintenance {
    pub spot_id: u64,
    pub in_maintenance: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpotReleased {
    pub spot_id: u64,
    pub reservation_id: u64,
    pub by: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserRegistered {
    pub user: Address,
    pub identity: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservationRequested {
    pub reservation_id: u64,
    pub request_id: u64,
    pub spot_id: u64,
    pub user: Address,
    pub amount: i128,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservationConfirmed {
    pub reservation_id: u64,
    pub spot_id: u64,
    pub user: Address,
    pub end_time: u64,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservationCompleted {
    pub reservation_id: u64,
    pub spot_id: u64,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReservationCancelled {
    pub reservation_id: u64,
    pub user: Address,
    pub refund: i128,
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RefundIssued {
    pub reservation_id: u64,
    pub user: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeoutTriggered {
    pub reservation_id: u64,
    pub request_id: u64,
    pub by: Address,
}

// ── Spot registry ────────────────────────────────────────────────────

pub fn emit_spot_added(env: &Env, spot_id: u64, operator: Address, price: i128, location: String) {
    env.events().publish(
        (symbol_short!("spot_add"), spot_id),
        SpotAdded {
            spot_id,
            operator,
            price,
            location,
        },
    );
}

pub fn emit_spot_price_updated(env: &Env, spot_id: u64, old_price: i128, new_price: i128) {
    env.events().publish(
        (symbol_short!("spot_upd"), spot_id),
        SpotPriceUpdated {
            spot_id,
            old_price,
            new_price,
        },
    );
}

pub fn emit_spot_maintenance(env: &Env, spot_id: u64, in_maintenance: bool) {
    env.events().publish(
        (symbol_short!("spot_mnt"), spot_id),
        SpotMaintenance {
            spot_id,
            in_maintenance,
        },
    );
}

pub fn emit_spot_deactivated(env: &Env, spot_id: u64, operator: Address) {
    env.events()
        .publish((symbol_short!("spot_off"), spot_id), operator);
}

pub fn emit_spot_released(env: &Env, spot_id: u64, reservation_id: u64, by: Address) {
    env.events().publish(
        (symbol_short!("released"), spot_id),
        SpotReleased {
            spot_id,
            reservation_id,
            by,
        },
    );
}

// ── User registry ────────────────────────────────────────────────────

pub fn emit_user_registered(env: &Env, user: Address, identity: u64) {
    env.events().publish(
        (symbol_short!("user_reg"), user.clone()),
        UserRegistered { user, identity },
    );
}

pub fn emit_balance_deposited(env: &Env, user: Address, amount: i128) {
    env.events().publish((symbol_short!("deposit"), user), amount);
}

pub fn emit_balance_withdrawn(env: &Env, user: Address, amount: i128) {
    env.events().publish((symbol_short!("withdraw"), user), amount);
}

// ── Reservation ledger ───────────────────────────────────────────────

pub fn emit_reservation_requested(env: &Env, event: ReservationRequested) {
    env.events()
        .publish((symbol_short!("requested"), event.reservation_id), event);
}

pub fn emit_reservation_confirmed(env: &Env, event: ReservationConfirmed) {
    env.events()
        .publish((symbol_short!("confirmed"), event.reservation_id), event);
}

pub fn emit_reservation_completed(env: &Env, reservation_id: u64, spot_id: u64, amount: i128) {
    env.events().publish(
        (symbol_short!("completed"), reservation_id),
        ReservationCompleted {
            reservation_id,
            spot_id,
            amount,
        },
    );
}

pub fn emit_reservation_cancelled(
    env: &Env,
    reservation_id: u64,
    user: Address,
    refund: i128,
    fee: i128,
) {
    env.events().publish(
        (symbol_short!("cancelled"), reservation_id),
        ReservationCancelled {
            reservation_id,
            user,
            refund,
            fee,
        },
    );
}

/// Refund paid out directly to the user.
pub fn emit_refund_issued(env: &Env, reservation_id: u64, user: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("refunded"), reservation_id),
        RefundIssued {
            reservation_id,
            user,
            amount,
        },
    );
}

/// Refund that could not be transferred and was credited to the user's balance.
pub fn emit_refund_credited(env: &Env, reservation_id: u64, user: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("credited"), reservation_id),
        RefundIssued {
            reservation_id,
            user,
            amount,
        },
    );
}

pub fn emit_timeout_triggered(env: &Env, reservation_id: u64, request_id: u64, by: Address) {
    env.events().publish(
        (symbol_short!("timeout"), reservation_id),
        TimeoutTriggered {
            reservation_id,
            request_id,
            by,
        },
    );
}

// ── Protocol ─────────────────────────────────────────────────────────

pub fn emit_revenue_withdrawn(env: &Env, to: Address, amount: i128) {
    env.events().publish((symbol_short!("rev_out"), to), amount);
}

pub fn emit_protocol_paused(env: &Env, owner: Address) {
    env.events().publish((symbol_short!("paused"),), owner);
}

pub fn emit_protocol_unpaused(env: &Env, owner: Address) {
    env.events().publish((symbol_short!("unpaused"),), owner);
}
