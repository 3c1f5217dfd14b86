//! User registry: one profile per address plus a withdrawable balance.

use soroban_sdk::{Address, Env};

use crate::events;
use crate::payout;
use crate::storage;
use crate::types::UserProfile;
use crate::Error;

pub const MIN_CREDIT_SCORE: u32 = 300;
pub const MAX_CREDIT_SCORE: u32 = 850;

pub fn register(env: &Env, user: Address, identity: u64, credit_score: u32) -> Result<(), Error> {
    if storage::has_user(env, &user) {
        return Err(Error::AlreadyRegistered);
    }
    if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&credit_score) {
        return Err(Error::InvalidCreditScore);
    }

    let profile = UserProfile {
        address: user.clone(),
        identity,
        credit_score,
        deposit_balance: 0,
        reservation_count: 0,
        registered_at: env.ledger().timestamp(),
    };
    storage::save_user(env, &profile);

    events::emit_user_registered(env, user, identity);
    Ok(())
}

pub fn deposit(env: &Env, user: Address, amount: i128) -> Result<(), Error> {
    let mut profile = storage::load_user(env, &user)?;
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    payout::collect(env, &user, amount)?;

    profile.deposit_balance = profile
        .deposit_balance
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::save_user(env, &profile);

    events::emit_balance_deposited(env, user, amount);
    Ok(())
}

/// Zero the balance, then transfer the prior value out.
pub fn withdraw(env: &Env, user: Address) -> Result<i128, Error> {
    let mut profile = storage::load_user(env, &user)?;
    let amount = profile.deposit_balance;
    if amount == 0 {
        return Err(Error::NoBalance);
    }

    profile.deposit_balance = 0;
    storage::save_user(env, &profile);

    payout::pay_out(env, &user, amount)?;
    events::emit_balance_withdrawn(env, user, amount);
    Ok(amount)
}
