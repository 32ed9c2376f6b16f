//! Administrator capability.
//!
//! A single stored address holds every administrative right. Admin entry
//! points take the acting `caller`, require its signature and compare it to
//! the stored admin.

use soroban_sdk::{Address, Env, String};

use crate::{storage, Error};

/// All-zero account strkey; never a valid recipient or asset.
const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    caller.require_auth();
    if *caller != storage::get_admin(env) {
        return Err(Error::NotAuthorized);
    }
    Ok(())
}

pub fn transfer_admin(env: &Env, caller: &Address, new_admin: &Address) -> Result<(), Error> {
    require_admin(env, caller)?;
    require_valid_address(env, new_admin)?;
    storage::set_admin(env, new_admin);
    Ok(())
}

pub fn is_zero_address(env: &Env, address: &Address) -> bool {
    let zero = Address::from_string(&String::from_str(env, ZERO_ACCOUNT));
    *address == zero
}

pub fn require_valid_address(env: &Env, address: &Address) -> Result<(), Error> {
    if is_zero_address(env, address) {
        return Err(Error::InvalidAddress);
    }
    Ok(())
}
