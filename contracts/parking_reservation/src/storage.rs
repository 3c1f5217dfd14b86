//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key                | Type      | Description                               |
//! |--------------------|-----------|-------------------------------------------|
//! | `Token`            | `Address` | Payment token contract                    |
//! | `SpotCount`        | `u64`     | Last assigned spot ID                     |
//! | `ReservationCount` | `u64`     | Last assigned reservation ID              |
//! | `RequestCount`     | `u64`     | Last assigned pending-request ID          |
//! | `Revenue`          | `i128`    | Fees and earnings not yet withdrawn       |
//! | `Paused`           | `bool`    | Protocol pause switch                     |
//! | `Locked`           | `bool`    | Reentrancy guard                          |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                      | Type             | Description                      |
//! |--------------------------|------------------|----------------------------------|
//! | `Spot(id)`               | `Spot`           | Spot registry entry              |
//! | `User(address)`          | `UserProfile`    | User registry entry              |
//! | `UserReservations(addr)` | `Vec<u64>`       | Reservation IDs owned by a user  |
//! | `Reservation(id)`        | `Reservation`    | Reservation record               |
//! | `Request(id)`            | `PendingRequest` | Gateway confirmation bridge      |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Every loader returns `Result` so entry points can bubble a typed
//! "not found" error with `?`.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{PendingRequest, Reservation, Spot, UserProfile};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys except role assignments (see `rbac::RbacKey`).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Token,
    SpotCount,
    ReservationCount,
    RequestCount,
    Revenue,
    Paused,
    Locked,
    Spot(u64),
    User(Address),
    UserReservations(Address),
    Reservation(u64),
    Request(u64),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Reads, increments, and stores a counter. Returns the *new* value so that
/// IDs start at 1 and `0` can stand for "none".
fn next_id(env: &Env, key: &DataKey) -> u64 {
    bump_instance(env);
    let next = env.storage().instance().get::<_, u64>(key).unwrap_or(0) + 1;
    env.storage().instance().set(key, &next);
    next
}

pub fn next_spot_id(env: &Env) -> u64 {
    next_id(env, &DataKey::SpotCount)
}

pub fn next_reservation_id(env: &Env) -> u64 {
    next_id(env, &DataKey::ReservationCount)
}

pub fn next_request_id(env: &Env) -> u64 {
    next_id(env, &DataKey::RequestCount)
}

pub fn spot_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::SpotCount)
        .unwrap_or(0)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

/// Payment token; only missing before `init`.
pub fn get_token(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub fn get_revenue(env: &Env) -> i128 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Revenue)
        .unwrap_or(0)
}

pub fn add_revenue(env: &Env, amount: i128) -> Result<(), Error> {
    let total = get_revenue(env)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    env.storage().instance().set(&DataKey::Revenue, &total);
    Ok(())
}

/// Remove `amount` from the treasury; never lets it go negative.
pub fn take_revenue(env: &Env, amount: i128) -> Result<(), Error> {
    let current = get_revenue(env);
    if amount > current {
        return Err(Error::InsufficientRevenue);
    }
    env.storage()
        .instance()
        .set(&DataKey::Revenue, &(current - amount));
    Ok(())
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_locked(env: &Env, locked: bool) {
    env.storage().instance().set(&DataKey::Locked, &locked);
}

pub fn is_locked(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Locked)
        .unwrap_or(false)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn save<V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>>(env: &Env, key: DataKey, value: &V) {
    env.storage().persistent().set(&key, value);
    bump_persistent(env, &key);
}

fn load<V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>>(
    env: &Env,
    key: DataKey,
    missing: Error,
) -> Result<V, Error> {
    let value = env.storage().persistent().get(&key).ok_or(missing)?;
    bump_persistent(env, &key);
    Ok(value)
}

pub fn save_spot(env: &Env, spot: &Spot) {
    save(env, DataKey::Spot(spot.id), spot);
}

pub fn load_spot(env: &Env, id: u64) -> Result<Spot, Error> {
    load(env, DataKey::Spot(id), Error::InvalidSpot)
}

pub fn save_user(env: &Env, user: &UserProfile) {
    save(env, DataKey::User(user.address.clone()), user);
}

pub fn load_user(env: &Env, address: &Address) -> Result<UserProfile, Error> {
    load(env, DataKey::User(address.clone()), Error::NotRegistered)
}

pub fn has_user(env: &Env, address: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::User(address.clone()))
}

/// Reservation IDs owned by `address`, oldest first.
pub fn load_user_reservations(env: &Env, address: &Address) -> Vec<u64> {
    let key = DataKey::UserReservations(address.clone());
    match env.storage().persistent().get(&key) {
        Some(ids) => {
            bump_persistent(env, &key);
            ids
        }
        None => Vec::new(env),
    }
}

pub fn push_user_reservation(env: &Env, address: &Address, reservation_id: u64) {
    let mut ids = load_user_reservations(env, address);
    ids.push_back(reservation_id);
    save(env, DataKey::UserReservations(address.clone()), &ids);
}

pub fn save_reservation(env: &Env, reservation: &Reservation) {
    save(env, DataKey::Reservation(reservation.id), reservation);
}

pub fn load_reservation(env: &Env, id: u64) -> Result<Reservation, Error> {
    load(env, DataKey::Reservation(id), Error::ReservationNotFound)
}

pub fn save_request(env: &Env, request: &PendingRequest) {
    save(env, DataKey::Request(request.id), request);
}

pub fn load_request(env: &Env, id: u64) -> Result<PendingRequest, Error> {
    load(env, DataKey::Request(id), Error::RequestNotFound)
}
