//! # Guard layer
//!
//! Admission checks shared by every mutating entry point:
//!
//! | Check              | Failure            |
//! |--------------------|--------------------|
//! | blacklist          | `Blacklisted`      |
//! | emergency latch    | `EmergencyActive`  |
//! | pause flag         | `Paused`           |
//! | in-flight marker   | `Reentrancy`       |
//! | deposit cooldown   | `CooldownActive`   |
//!
//! The in-flight marker is set on entry and cleared on exit of a guarded call.
//! A nested invocation that reaches a guarded entry point (for instance from a
//! token contract's transfer hook) observes the marker and is refused. When the
//! outer call fails the host discards its writes, the marker included.

use soroban_sdk::{Address, Env};

use crate::storage;
use crate::types::PledgeRecord;
use crate::Error;

/// Run `f` with the in-flight marker held.
pub fn non_reentrant<T, F>(env: &Env, f: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    if storage::is_locked(env) {
        return Err(Error::Reentrancy);
    }
    storage::set_locked(env, true);
    let result = f();
    storage::set_locked(env, false);
    result
}

/// Reject while the emergency latch or the pause flag is set.
///
/// The emergency check comes first so callers can tell the two apart.
pub fn require_operational(env: &Env) -> Result<(), Error> {
    if storage::get_mode(env).is_emergency() {
        return Err(Error::EmergencyActive);
    }
    if storage::is_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}

pub fn require_not_blacklisted(env: &Env, participant: &Address) -> Result<(), Error> {
    if storage::is_blacklisted(env, participant) {
        return Err(Error::Blacklisted);
    }
    Ok(())
}

/// A returning depositor must wait `cooldown_secs` since their last deposit.
pub fn require_cooldown_elapsed(
    record: &PledgeRecord,
    now: u64,
    cooldown_secs: u64,
) -> Result<(), Error> {
    if record.deposit_amount == 0 {
        return Ok(());
    }
    if now.saturating_sub(record.last_deposit_at) < cooldown_secs {
        return Err(Error::CooldownActive);
    }
    Ok(())
}
