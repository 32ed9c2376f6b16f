//! # Pledge ledger
//!
//! Records deposits made during the Pledge phase. Each accepted deposit
//! raises the participant's `deposit_amount`, refreshes `last_deposit_at`,
//! raises `total_deposited` and, on a participant's first deposit, appends
//! them to the roster.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. phase is `Pledge`                              → `WrongPhase`
//! 2. the pledge deadline has not passed             → `PledgeWindowClosed`
//! 3. `amount >= min_deposit`                        → `AmountTooLow`
//! 4. `amount` and the new total convert in `i128`   → `Overflow`
//! 5. projected scaling ratio `>= min_ratio`         → `ScalingRatioTooLow`
//! 6. cumulative deposit within the participant cap  → `ExceedsParticipantCap`
//! 7. cooldown since the previous deposit elapsed    → `CooldownActive`
//!
//! State is written before the inbound transfer. If the transfer fails the
//! host aborts the invocation and none of the writes persist.

use soroban_sdk::{token, Address, Env};

use crate::events::{self, Pledged};
use crate::guard;
use crate::math::{self, BPS_DENOMINATOR};
use crate::phase;
use crate::storage;
use crate::types::{Phase, PledgeRecord};
use crate::Error;

pub fn submit_deposit(
    env: &Env,
    participant: &Address,
    amount: i128,
    min_scaling_ratio_bps: u32,
) -> Result<PledgeRecord, Error> {
    let config = storage::load_config(env);
    let policy = storage::load_policy(env);
    let mut state = storage::load_state(env);
    let now = env.ledger().timestamp();

    if state.phase != Phase::Pledge {
        return Err(Error::WrongPhase);
    }
    if now > config.pledge_deadline {
        return Err(Error::PledgeWindowClosed);
    }
    if amount < config.min_deposit {
        return Err(Error::AmountTooLow);
    }
    if amount > math::max_convertible_deposit(config.conversion_rate_bps) {
        return Err(Error::Overflow);
    }

    let total_deposited = state
        .total_deposited
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    if total_deposited > math::max_convertible_deposit(config.conversion_rate_bps) {
        return Err(Error::Overflow);
    }

    if min_scaling_ratio_bps > BPS_DENOMINATOR {
        return Err(Error::InvalidRate);
    }
    let projected = phase::projected_ratio(&config, total_deposited)?;
    if projected < min_scaling_ratio_bps {
        return Err(Error::ScalingRatioTooLow);
    }

    let mut record = storage::load_record(env, participant);
    let participant_total = record
        .deposit_amount
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    if participant_total > policy.max_per_participant {
        return Err(Error::ExceedsParticipantCap);
    }
    guard::require_cooldown_elapsed(&record, now, policy.cooldown_secs)?;

    if record.deposit_amount == 0 {
        storage::push_roster(env, state.participant_count, participant);
        state.participant_count += 1;
    }
    record.deposit_amount = participant_total;
    record.last_deposit_at = now;
    state.total_deposited = total_deposited;

    storage::save_record(env, participant, &record);
    storage::save_state(env, &state);

    token::Client::new(env, &config.deposit_token).transfer(
        participant,
        &env.current_contract_address(),
        &amount,
    );

    events::emit_pledged(
        env,
        Pledged {
            participant: participant.clone(),
            amount,
            participant_total,
            total_deposited,
        },
    );

    Ok(record)
}
