//! # Role-Based Access Control
//!
//! Three roles, at most one per address:
//!
//! | Role       | Granted by        | Capabilities                                           |
//! |------------|-------------------|--------------------------------------------------------|
//! | `Owner`    | `init` / transfer | Everything below, role admin, pause, overrides, treasury |
//! | `Operator` | Owner             | Add spots, change prices, maintenance, deactivation    |
//! | `Gateway`  | Owner             | Deliver availability confirmations (`confirm`)         |
//!
//! The owner is stored twice: under `RbacKey::Owner` for O(1) lookup and as a
//! regular role assignment so `role_of` answers uniformly.
//!
//! Role changes emit `role_set` / `role_del` events (topic: target address).

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::Error;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Owner,
    Operator,
    Gateway,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum RbacKey {
    Owner,
    Role(Address),
}

fn set_role(env: &Env, target: &Address, role: Role, by: &Address) {
    env.storage()
        .persistent()
        .set(&RbacKey::Role(target.clone()), &role);
    env.events()
        .publish((symbol_short!("role_set"), target.clone(), role), by.clone());
}

fn remove_role(env: &Env, target: &Address, by: &Address) {
    env.storage()
        .persistent()
        .remove(&RbacKey::Role(target.clone()));
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), by.clone());
}

/// Record the first owner. Fails if an owner already exists.
pub fn init_owner(env: &Env, owner: &Address) -> Result<(), Error> {
    if env.storage().instance().has(&RbacKey::Owner) {
        return Err(Error::AlreadyInitialized);
    }
    env.storage().instance().set(&RbacKey::Owner, owner);
    set_role(env, owner, Role::Owner, owner);
    Ok(())
}

pub fn owner(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&RbacKey::Owner)
        .ok_or(Error::NotInitialized)
}

pub fn role_of(env: &Env, address: Address) -> Option<Role> {
    env.storage().persistent().get(&RbacKey::Role(address))
}

pub fn has_role(env: &Env, address: Address, role: Role) -> bool {
    role_of(env, address) == Some(role)
}

pub fn require_owner(env: &Env, caller: &Address) -> Result<(), Error> {
    if owner(env)? != *caller {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

/// Owner or Operator.
pub fn require_operator(env: &Env, caller: &Address) -> Result<(), Error> {
    match role_of(env, caller.clone()) {
        Some(Role::Owner) | Some(Role::Operator) => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

pub fn require_gateway(env: &Env, caller: &Address) -> Result<(), Error> {
    match role_of(env, caller.clone()) {
        Some(Role::Gateway) => Ok(()),
        _ => Err(Error::NotAuthorized),
    }
}

/// Grant `Operator` or `Gateway` to `target`, replacing any previous role.
///
/// The owner's own role cannot be overwritten here; use `transfer_ownership`.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    require_owner(env, caller)?;
    if role == Role::Owner || owner(env)? == *target {
        return Err(Error::NotAuthorized);
    }
    set_role(env, target, role, caller);
    Ok(())
}

pub fn revoke_role(env: &Env, caller: &Address, target: &Address) -> Result<(), Error> {
    caller.require_auth();
    require_owner(env, caller)?;
    match role_of(env, target.clone()) {
        None => Err(Error::RoleNotFound),
        Some(Role::Owner) => Err(Error::NotAuthorized),
        Some(_) => {
            remove_role(env, target, caller);
            Ok(())
        }
    }
}

/// Hand the owner role to `new_owner`; the previous owner keeps no role.
pub fn transfer_ownership(env: &Env, current: &Address, new_owner: &Address) -> Result<(), Error> {
    current.require_auth();
    require_owner(env, current)?;
    if current == new_owner {
        return Ok(());
    }
    remove_role(env, current, current);
    env.storage().instance().set(&RbacKey::Owner, new_owner);
    set_role(env, new_owner, Role::Owner, current);
    Ok(())
}
