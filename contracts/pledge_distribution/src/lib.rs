//! # Pledge Distribution Contract
//!
//! A two-phase token distribution. Participants pledge a deposit asset during
//! a bounded window; once the administrator finalizes the window, each
//! participant receives a pro-rata share of a capped-supply payout asset, and
//! whatever part of their deposit the cap could not cover is refunded.
//!
//! | Phase        | Entry Point(s)                                           |
//! |--------------|----------------------------------------------------------|
//! | Bootstrap    | [`PledgeDistributor::init`]                              |
//! | Pledge       | [`PledgeDistributor::deposit`]                           |
//! | Finalize     | [`PledgeDistributor::finalize_pledge_phase`]             |
//! | Distribution | [`PledgeDistributor::process_batch`]                     |
//! | Recovery     | `activate_emergency`, `emergency_withdraw`, `recover_stuck_tokens` |
//! | Policy       | `set_blacklisted`, `set_max_per_participant`, `set_dust_floor`, `set_cooldown`, `set_min_phase_duration`, `pause`, `unpause`, `transfer_admin` |
//! | Queries      | `current_phase`, `get_record`, `scaling_ratio`, `total_deposited`, ... |
//!
//! ## Architecture
//!
//! Admission checks live in [`guard`], the administrator capability in
//! [`access`], arithmetic in [`math`], deposits in [`ledger`], the phase
//! machine in [`phase`] and payouts in [`batch`]. Storage access is fully
//! delegated to [`storage`]. This file contains the public entry points and
//! construction-time validation only.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, token, Address, Env};

pub mod access;
pub mod batch;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod math;
pub mod phase;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_batch;
#[cfg(test)]
mod test_events;

use events::{BlacklistUpdated, TokensMoved};
pub use types::{
    AggregateState, BatchOutcome, DistributionConfig, Phase, PledgeRecord, Policy, SystemMode,
};

/// Default policy knobs written by `init`.
const DEFAULT_MAX_PER_PARTICIPANT: i128 = i128::MAX;
const DEFAULT_DUST_FLOOR: i128 = 1_000;
const DEFAULT_COOLDOWN_SECS: u64 = 60;
const DEFAULT_MIN_PHASE_DURATION: u64 = 3_600;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Phase
    WrongPhase = 1,

    // Window / timing
    PledgeWindowClosed = 2,
    CooldownActive = 3,
    PhaseDurationNotMet = 4,

    // Amounts
    InvalidAmount = 5,
    AmountTooLow = 6,
    Overflow = 7,
    ExceedsParticipantCap = 8,
    BelowDustFloor = 9,
    InvalidBatchSize = 10,

    // Authorization
    NotAuthorized = 11,
    Blacklisted = 12,
    EmergencyActive = 13,
    EmergencyOnly = 14,
    Paused = 15,
    Reentrancy = 16,

    // Configuration
    InvalidAddress = 17,
    InvalidRate = 18,
    InvalidTimestamp = 19,
    AlreadyInitialized = 20,
    NotInitialized = 21,

    // Consistency
    AlreadyProcessed = 22,
    DecimalsMismatch = 23,

    // Ratio guard
    ScalingRatioTooLow = 24,

    // Arithmetic invariant
    RefundExceedsDeposit = 25,
}

#[contract]
pub struct PledgeDistributor;

#[contractimpl]
impl PledgeDistributor {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the distribution.
    ///
    /// Must be called exactly once immediately after deployment.
    ///
    /// - `conversion_rate_bps` must be in `1..=10_000`.
    /// - `payout_cap`, `min_deposit` and `pledge_duration` must be non-zero.
    /// - Both tokens must be distinct, non-zero and share decimals.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        env: Env,
        admin: Address,
        deposit_token: Address,
        payout_token: Address,
        conversion_rate_bps: u32,
        payout_cap: i128,
        min_deposit: i128,
        pledge_duration: u64,
    ) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        access::require_valid_address(&env, &admin)?;
        access::require_valid_address(&env, &deposit_token)?;
        access::require_valid_address(&env, &payout_token)?;
        if deposit_token == payout_token {
            return Err(Error::InvalidAddress);
        }
        if conversion_rate_bps == 0 || conversion_rate_bps > math::BPS_DENOMINATOR {
            return Err(Error::InvalidRate);
        }
        if payout_cap <= 0 || min_deposit <= 0 {
            return Err(Error::InvalidAmount);
        }
        if pledge_duration == 0 {
            return Err(Error::InvalidTimestamp);
        }
        let now = env.ledger().timestamp();
        let pledge_deadline = now
            .checked_add(pledge_duration)
            .ok_or(Error::InvalidTimestamp)?;

        let decimals = token::Client::new(&env, &deposit_token).decimals();
        if token::Client::new(&env, &payout_token).decimals() != decimals {
            return Err(Error::DecimalsMismatch);
        }

        storage::set_admin(&env, &admin);
        storage::save_config(
            &env,
            &DistributionConfig {
                deposit_token,
                payout_token,
                conversion_rate_bps,
                payout_cap,
                min_deposit,
                pledge_deadline,
                decimals,
            },
        );
        storage::save_policy(
            &env,
            &Policy {
                max_per_participant: DEFAULT_MAX_PER_PARTICIPANT,
                dust_floor: DEFAULT_DUST_FLOOR,
                cooldown_secs: DEFAULT_COOLDOWN_SECS,
                min_phase_duration: DEFAULT_MIN_PHASE_DURATION,
            },
        );
        storage::save_state(
            &env,
            &AggregateState {
                phase: Phase::Pledge,
                total_deposited: 0,
                scaling_ratio_bps: 0,
                participant_count: 0,
                last_processed_index: 0,
                last_transition_at: now,
            },
        );
        storage::set_mode(&env, SystemMode::Normal);
        storage::set_paused(&env, false);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Participant entry points
    // ─────────────────────────────────────────────────────────

    /// Pledge `amount` of the deposit asset.
    ///
    /// `min_scaling_ratio_bps` is the lowest scaling ratio the participant
    /// accepts, measured against the ratio projected with this deposit
    /// included. Pass `0` to accept any ratio.
    pub fn deposit(
        env: Env,
        participant: Address,
        amount: i128,
        min_scaling_ratio_bps: u32,
    ) -> Result<PledgeRecord, Error> {
        participant.require_auth();
        guard::non_reentrant(&env, || {
            guard::require_not_blacklisted(&env, &participant)?;
            guard::require_operational(&env)?;
            ledger::submit_deposit(&env, &participant, amount, min_scaling_ratio_bps)
        })
    }

    // ─────────────────────────────────────────────────────────
    // Phase transitions
    // ─────────────────────────────────────────────────────────

    /// Close the pledge phase and fix the scaling ratio. Returns the ratio.
    pub fn finalize_pledge_phase(env: Env, caller: Address) -> Result<u32, Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            guard::require_operational(&env)?;
            phase::finalize_pledge_phase(&env).map(|state| state.scaling_ratio_bps)
        })
    }

    /// Pay out up to `batch_size` more roster entries.
    ///
    /// Call repeatedly until the returned outcome reports `completed`.
    pub fn process_batch(
        env: Env,
        caller: Address,
        batch_size: u32,
    ) -> Result<BatchOutcome, Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            guard::require_operational(&env)?;
            let mut budget = batch::VisitBudget::new(batch::MAX_PARTICIPANTS_PER_INVOCATION);
            batch::process_batch(&env, batch_size, &mut budget)
        })
    }

    // ─────────────────────────────────────────────────────────
    // Emergency & recovery
    // ─────────────────────────────────────────────────────────

    /// Latch emergency mode. Also engages the pause flag. Irreversible.
    pub fn activate_emergency(env: Env, caller: Address) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            let mode = storage::get_mode(&env).activate_emergency()?;
            storage::set_mode(&env, mode);
            storage::set_paused(&env, true);
            events::emit_emergency(&env, caller.clone());
            Ok(())
        })
    }

    /// Move any asset out of custody. Only available in emergency mode.
    pub fn emergency_withdraw(
        env: Env,
        caller: Address,
        token: Address,
        recipient: Address,
        amount: i128,
    ) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            if !storage::get_mode(&env).is_emergency() {
                return Err(Error::EmergencyOnly);
            }
            access::require_valid_address(&env, &recipient)?;
            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }
            token::Client::new(&env, &token).transfer(
                &env.current_contract_address(),
                &recipient,
                &amount,
            );
            events::emit_emergency_withdrawal(
                &env,
                TokensMoved {
                    token: token.clone(),
                    recipient: recipient.clone(),
                    amount,
                },
            );
            Ok(())
        })
    }

    /// Sweep leftover balances (dust, unclaimed payout) once distribution completed.
    pub fn recover_stuck_tokens(
        env: Env,
        caller: Address,
        token: Address,
        recipient: Address,
        amount: i128,
    ) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            if storage::load_state(&env).phase != Phase::Completed {
                return Err(Error::WrongPhase);
            }
            access::require_valid_address(&env, &recipient)?;
            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }
            if amount < storage::load_policy(&env).dust_floor {
                return Err(Error::BelowDustFloor);
            }
            token::Client::new(&env, &token).transfer(
                &env.current_contract_address(),
                &recipient,
                &amount,
            );
            events::emit_recovered(
                &env,
                TokensMoved {
                    token: token.clone(),
                    recipient: recipient.clone(),
                    amount,
                },
            );
            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────
    // Administrative policy
    // ─────────────────────────────────────────────────────────

    pub fn set_blacklisted(
        env: Env,
        caller: Address,
        participant: Address,
        blacklisted: bool,
    ) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            storage::set_blacklisted(&env, &participant, blacklisted);
            events::emit_blacklist(
                &env,
                BlacklistUpdated {
                    participant: participant.clone(),
                    blacklisted,
                },
            );
            Ok(())
        })
    }

    /// Cap on one participant's cumulative deposit. Must be positive.
    pub fn set_max_per_participant(env: Env, caller: Address, cap: i128) -> Result<(), Error> {
        Self::update_policy(&env, &caller, |policy| {
            if cap <= 0 {
                return Err(Error::InvalidAmount);
            }
            policy.max_per_participant = cap;
            Ok(())
        })
    }

    pub fn set_dust_floor(env: Env, caller: Address, dust_floor: i128) -> Result<(), Error> {
        Self::update_policy(&env, &caller, |policy| {
            if dust_floor < 0 {
                return Err(Error::InvalidAmount);
            }
            policy.dust_floor = dust_floor;
            Ok(())
        })
    }

    pub fn set_cooldown(env: Env, caller: Address, cooldown_secs: u64) -> Result<(), Error> {
        Self::update_policy(&env, &caller, |policy| {
            policy.cooldown_secs = cooldown_secs;
            Ok(())
        })
    }

    pub fn set_min_phase_duration(env: Env, caller: Address, seconds: u64) -> Result<(), Error> {
        Self::update_policy(&env, &caller, |policy| {
            policy.min_phase_duration = seconds;
            Ok(())
        })
    }

    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            storage::set_paused(&env, true);
            events::emit_paused(&env, caller.clone());
            Ok(())
        })
    }

    /// Clear the pause flag. Refused while the emergency latch is set.
    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        access::require_admin(&env, &caller)?;
        guard::non_reentrant(&env, || {
            storage::get_mode(&env).leave_emergency()?;
            storage::set_paused(&env, false);
            events::emit_unpaused(&env, caller.clone());
            Ok(())
        })
    }

    pub fn transfer_admin(env: Env, caller: Address, new_admin: Address) -> Result<(), Error> {
        guard::non_reentrant(&env, || {
            access::transfer_admin(&env, &caller, &new_admin)?;
            events::emit_admin_transferred(&env, new_admin.clone());
            Ok(())
        })
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn current_phase(env: Env) -> Phase {
        storage::load_state(&env).phase
    }

    /// A participant's record; all zero if they never deposited.
    pub fn get_record(env: Env, participant: Address) -> PledgeRecord {
        storage::load_record(&env, &participant)
    }

    pub fn is_blacklisted(env: Env, participant: Address) -> bool {
        storage::is_blacklisted(&env, &participant)
    }

    pub fn total_deposited(env: Env) -> i128 {
        storage::load_state(&env).total_deposited
    }

    /// 0 until the pledge phase is finalized.
    pub fn scaling_ratio(env: Env) -> u32 {
        storage::load_state(&env).scaling_ratio_bps
    }

    /// The ratio a finalize would fix right now.
    pub fn projected_scaling_ratio(env: Env) -> Result<u32, Error> {
        let state = storage::load_state(&env);
        if state.phase != Phase::Pledge {
            return Ok(state.scaling_ratio_bps);
        }
        phase::projected_ratio(&storage::load_config(&env), state.total_deposited)
    }

    pub fn conversion_rate(env: Env) -> u32 {
        storage::load_config(&env).conversion_rate_bps
    }

    pub fn payout_cap(env: Env) -> i128 {
        storage::load_config(&env).payout_cap
    }

    pub fn min_deposit(env: Env) -> i128 {
        storage::load_config(&env).min_deposit
    }

    pub fn deposit_token(env: Env) -> Address {
        storage::load_config(&env).deposit_token
    }

    pub fn payout_token(env: Env) -> Address {
        storage::load_config(&env).payout_token
    }

    /// Decimal precision shared by both assets.
    pub fn decimals(env: Env) -> u32 {
        storage::load_config(&env).decimals
    }

    pub fn participant_count(env: Env) -> u32 {
        storage::load_state(&env).participant_count
    }

    pub fn participant_at(env: Env, index: u32) -> Option<Address> {
        storage::roster_at(&env, index)
    }

    pub fn pledge_deadline(env: Env) -> u64 {
        storage::load_config(&env).pledge_deadline
    }

    pub fn last_processed_index(env: Env) -> u32 {
        storage::load_state(&env).last_processed_index
    }

    pub fn last_transition_time(env: Env) -> u64 {
        storage::load_state(&env).last_transition_at
    }

    pub fn cooldown(env: Env) -> u64 {
        storage::load_policy(&env).cooldown_secs
    }

    pub fn max_per_participant(env: Env) -> i128 {
        storage::load_policy(&env).max_per_participant
    }

    pub fn dust_floor(env: Env) -> i128 {
        storage::load_policy(&env).dust_floor
    }

    pub fn min_phase_duration(env: Env) -> u64 {
        storage::load_policy(&env).min_phase_duration
    }

    pub fn is_emergency(env: Env) -> bool {
        storage::get_mode(&env).is_emergency()
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    pub fn admin(env: Env) -> Address {
        storage::get_admin(&env)
    }
}

impl PledgeDistributor {
    fn update_policy<F>(env: &Env, caller: &Address, apply: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Policy) -> Result<(), Error>,
    {
        access::require_admin(env, caller)?;
        guard::non_reentrant(env, || {
            let mut policy = storage::load_policy(env);
            apply(&mut policy)?;
            storage::save_policy(env, &policy);
            events::emit_policy(env, policy);
            Ok(())
        })
    }
}
