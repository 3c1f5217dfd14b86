//! Spot registry: operator-managed parking spots and their availability.

use soroban_sdk::{Address, Env, String};

use crate::events;
use crate::storage;
use crate::types::Spot;
use crate::Error;

pub const MIN_PRICE: i128 = 1;
pub const MAX_PRICE: i128 = 1_000_000_000_000_000;

const SECONDS_PER_HOUR: u64 = 3_600;

fn validate_price(price: i128) -> Result<(), Error> {
    if !(MIN_PRICE..=MAX_PRICE).contains(&price) {
        return Err(Error::InvalidPrice);
    }
    Ok(())
}

/// Load a spot that has not been deactivated.
fn load_active(env: &Env, spot_id: u64) -> Result<Spot, Error> {
    let spot = storage::load_spot(env, spot_id)?;
    if !spot.active {
        return Err(Error::InvalidSpot);
    }
    Ok(spot)
}

pub fn add_spot(env: &Env, operator: Address, price: i128, location: String) -> Result<u64, Error> {
    validate_price(price)?;

    let id = storage::next_spot_id(env);
    let spot = Spot {
        id,
        location: location.clone(),
        price,
        active: true,
        in_maintenance: false,
        reservation_end: 0,
        current_reservation: 0,
    };
    storage::save_spot(env, &spot);

    events::emit_spot_added(env, id, operator, price, location);
    Ok(id)
}

pub fn update_price(env: &Env, spot_id: u64, new_price: i128) -> Result<(), Error> {
    let mut spot = load_active(env, spot_id)?;
    validate_price(new_price)?;

    let old_price = spot.price;
    spot.price = new_price;
    storage::save_spot(env, &spot);

    events::emit_spot_price_updated(env, spot_id, old_price, new_price);
    Ok(())
}

/// Entering maintenance is refused while a confirmed reservation covers now.
pub fn set_maintenance(env: &Env, spot_id: u64, in_maintenance: bool) -> Result<(), Error> {
    let mut spot = load_active(env, spot_id)?;
    if in_maintenance && spot.is_reserved_at(env.ledger().timestamp()) {
        return Err(Error::SpotCurrentlyReserved);
    }

    spot.in_maintenance = in_maintenance;
    storage::save_spot(env, &spot);

    events::emit_spot_maintenance(env, spot_id, in_maintenance);
    Ok(())
}

/// Permanently withdraw a spot. There is no way back.
pub fn deactivate(env: &Env, operator: Address, spot_id: u64) -> Result<(), Error> {
    let mut spot = load_active(env, spot_id)?;
    if spot.is_reserved_at(env.ledger().timestamp()) {
        return Err(Error::SpotCurrentlyReserved);
    }

    spot.active = false;
    storage::save_spot(env, &spot);

    events::emit_spot_deactivated(env, spot_id, operator);
    Ok(())
}

pub fn is_available(env: &Env, spot_id: u64) -> bool {
    storage::load_spot(env, spot_id)
        .map(|spot| spot.is_available_at(env.ledger().timestamp()))
        .unwrap_or(false)
}

/// Price for `duration` seconds, charged per started hour.
pub fn quote(env: &Env, spot_id: u64, duration: u64) -> Result<i128, Error> {
    let spot = load_active(env, spot_id)?;
    let hours = duration.div_ceil(SECONDS_PER_HOUR);
    spot.price
        .checked_mul(hours as i128)
        .ok_or(Error::Overflow)
}
