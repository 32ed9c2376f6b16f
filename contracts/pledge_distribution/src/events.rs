//! # Events
//!
//! Every state change publishes one event. The first topic is a short symbol
//! naming the change; participant-scoped events carry the participant as the
//! second topic so indexers can filter on it. Event data is always one of the
//! `#[contracttype]` structs below.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::types::Policy;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pledged {
    pub participant: Address,
    pub amount: i128,
    pub participant_total: i128,
    pub total_deposited: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Finalized {
    pub total_deposited: i128,
    pub total_payout_required: i128,
    pub scaling_ratio_bps: u32,
    pub participant_count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allocated {
    pub participant: Address,
    pub allocation: i128,
    pub refund: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchProcessed {
    pub start: u32,
    pub end: u32,
    pub allocated: u32,
    pub skipped: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokensMoved {
    pub token: Address,
    pub recipient: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlacklistUpdated {
    pub participant: Address,
    pub blacklisted: bool,
}

pub fn emit_pledged(env: &Env, pledged: Pledged) {
    env.events()
        .publish((symbol_short!("pledged"), pledged.participant.clone()), pledged);
}

pub fn emit_finalized(env: &Env, finalized: Finalized) {
    env.events().publish((symbol_short!("finalized"),), finalized);
}

pub fn emit_allocated(env: &Env, allocated: Allocated) {
    env.events().publish(
        (symbol_short!("allocated"), allocated.participant.clone()),
        allocated,
    );
}

pub fn emit_batch_processed(env: &Env, batch: BatchProcessed) {
    env.events().publish((symbol_short!("batch"),), batch);
}

pub fn emit_completed(env: &Env, participant_count: u32) {
    env.events()
        .publish((symbol_short!("complete"),), participant_count);
}

pub fn emit_emergency(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("emergency"),), caller);
}

pub fn emit_emergency_withdrawal(env: &Env, moved: TokensMoved) {
    env.events().publish((symbol_short!("em_wdraw"),), moved);
}

pub fn emit_recovered(env: &Env, moved: TokensMoved) {
    env.events().publish((symbol_short!("recovered"),), moved);
}

pub fn emit_blacklist(env: &Env, update: BlacklistUpdated) {
    env.events().publish(
        (symbol_short!("blacklist"), update.participant.clone()),
        update,
    );
}

pub fn emit_policy(env: &Env, policy: Policy) {
    env.events().publish((symbol_short!("policy"),), policy);
}

pub fn emit_paused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("paused"),), caller);
}

pub fn emit_unpaused(env: &Env, caller: Address) {
    env.events().publish((symbol_short!("unpaused"),), caller);
}

pub fn emit_admin_transferred(env: &Env, new_admin: Address) {
    env.events().publish((symbol_short!("admin"),), new_admin);
}
