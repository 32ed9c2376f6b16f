//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the engine:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key        | Type                 | Description                          |
//! |------------|----------------------|--------------------------------------|
//! | `Admin`    | `Address`            | Administrator                        |
//! | `Config`   | `DistributionConfig` | Immutable construction parameters    |
//! | `Policy`   | `Policy`             | Administrator knobs                  |
//! | `State`    | `AggregateState`     | Phase, totals, ratio and cursor      |
//! | `Mode`     | `SystemMode`         | Normal / Emergency latch             |
//! | `Paused`   | `bool`               | Pause flag                           |
//! | `Lock`     | `bool`               | Reentrancy marker                    |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                 | Type           | Description                     |
//! |---------------------|----------------|---------------------------------|
//! | `Record(addr)`      | `PledgeRecord` | Per-participant pledge          |
//! | `Roster(index)`     | `Address`      | Append-only participant roster  |
//! | `Blacklist(addr)`   | `bool`         | Blacklist status                |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! The roster is an arena of `Roster(i)` entries indexed `0..participant_count`
//! rather than a single vector, so enrolling a participant writes one small
//! entry and a batch reads only the slice it visits.

use soroban_sdk::{contracttype, panic_with_error, Address, Env};

use crate::types::{AggregateState, DistributionConfig, PledgeRecord, Policy, SystemMode};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    Config,
    Policy,
    State,
    Mode,
    Paused,
    Lock,
    Record(Address),
    Roster(u32),
    Blacklist(Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_admin(env: &Env) -> Address {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn save_config(env: &Env, config: &DistributionConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

/// Panics with `NotInitialized` before `init`.
pub fn load_config(env: &Env) -> DistributionConfig {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn save_policy(env: &Env, policy: &Policy) {
    env.storage().instance().set(&DataKey::Policy, policy);
    bump_instance(env);
}

pub fn load_policy(env: &Env) -> Policy {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Policy)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn save_state(env: &Env, state: &AggregateState) {
    env.storage().instance().set(&DataKey::State, state);
    bump_instance(env);
}

pub fn load_state(env: &Env) -> AggregateState {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::State)
        .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
}

pub fn get_mode(env: &Env) -> SystemMode {
    env.storage()
        .instance()
        .get(&DataKey::Mode)
        .unwrap_or(SystemMode::Normal)
}

pub fn set_mode(env: &Env, mode: SystemMode) {
    env.storage().instance().set(&DataKey::Mode, &mode);
    bump_instance(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

pub fn is_locked(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Lock)
        .unwrap_or(false)
}

pub fn set_locked(env: &Env, locked: bool) {
    if locked {
        env.storage().instance().set(&DataKey::Lock, &true);
    } else {
        env.storage().instance().remove(&DataKey::Lock);
    }
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Load a participant's record, or an empty one if they never deposited.
pub fn load_record(env: &Env, participant: &Address) -> PledgeRecord {
    let key = DataKey::Record(participant.clone());
    match env.storage().persistent().get::<_, PledgeRecord>(&key) {
        Some(record) => {
            bump_persistent(env, &key);
            record
        }
        None => PledgeRecord::default(),
    }
}

pub fn save_record(env: &Env, participant: &Address, record: &PledgeRecord) {
    let key = DataKey::Record(participant.clone());
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
}

/// Write `participant` into roster slot `index`. Slots are written once.
pub fn push_roster(env: &Env, index: u32, participant: &Address) {
    let key = DataKey::Roster(index);
    env.storage().persistent().set(&key, participant);
    bump_persistent(env, &key);
}

pub fn roster_at(env: &Env, index: u32) -> Option<Address> {
    let key = DataKey::Roster(index);
    let participant: Option<Address> = env.storage().persistent().get(&key);
    if participant.is_some() {
        bump_persistent(env, &key);
    }
    participant
}

pub fn is_blacklisted(env: &Env, participant: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Blacklist(participant.clone()))
        .unwrap_or(false)
}

pub fn set_blacklisted(env: &Env, participant: &Address, blacklisted: bool) {
    let key = DataKey::Blacklist(participant.clone());
    if blacklisted {
        env.storage().persistent().set(&key, &true);
        bump_persistent(env, &key);
    } else {
        env.storage().persistent().remove(&key);
    }
}
