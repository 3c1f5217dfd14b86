//! # Payouts
//!
//! Token movement in and out of the contract, the refund policy, and the
//! reentrancy guard wrapped around every entry point that moves tokens.
//!
//! ## Refund policy
//!
//! A refund first tries a direct transfer with `try_transfer`. A failed
//! sub-call is rolled back by the host without aborting this invocation, so on
//! failure the amount is credited to the user's `deposit_balance` instead and
//! can be recovered with `withdraw`. Exactly one of the two happens.
//!
//! Callers must have written all of their own state before calling
//! [`refund`] or [`pay_out`].

use soroban_sdk::{log, token, Address, Env};

use crate::events;
use crate::storage;
use crate::Error;

/// How a refund reached the user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefundRoute {
    Transferred,
    Credited,
}

/// Run `f` with the reentrancy flag held. A nested guarded call fails with
/// `Error::Reentrant`.
pub fn guarded<T>(env: &Env, f: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
    if storage::is_locked(env) {
        return Err(Error::Reentrant);
    }
    storage::set_locked(env, true);
    let result = f();
    storage::set_locked(env, false);
    result
}

/// Pull `amount` of the payment token from `from` into the contract.
pub fn collect(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let token = storage::get_token(env)?;
    token::Client::new(env, &token).transfer(from, &env.current_contract_address(), &amount);
    Ok(())
}

/// Send `amount` from the contract to `to`. A failing transfer aborts the
/// whole invocation.
pub fn pay_out(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    let token = storage::get_token(env)?;
    token::Client::new(env, &token).transfer(&env.current_contract_address(), to, &amount);
    Ok(())
}

/// Return `amount` of reservation `reservation_id`'s deposit to `user`.
pub fn refund(
    env: &Env,
    reservation_id: u64,
    user: &Address,
    amount: i128,
) -> Result<RefundRoute, Error> {
    if amount <= 0 {
        return Ok(RefundRoute::Transferred);
    }

    let token = storage::get_token(env)?;
    let client = token::Client::new(env, &token);
    let sent = matches!(
        client.try_transfer(&env.current_contract_address(), user, &amount),
        Ok(Ok(()))
    );

    if sent {
        events::emit_refund_issued(env, reservation_id, user.clone(), amount);
        return Ok(RefundRoute::Transferred);
    }

    log!(
        env,
        "refund transfer failed, crediting balance",
        reservation_id,
        amount
    );
    let mut profile = storage::load_user(env, user)?;
    profile.deposit_balance = profile
        .deposit_balance
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    storage::save_user(env, &profile);
    events::emit_refund_credited(env, reservation_id, user.clone(), amount);
    Ok(RefundRoute::Credited)
}
