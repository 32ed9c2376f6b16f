//! # Phase state machine
//!
//! `Pledge ──► Distribution ──► Completed`, forward only.
//!
//! * `Pledge → Distribution` happens in [`finalize_pledge_phase`]. It fixes the
//!   scaling ratio once and for all and requires `min_phase_duration` seconds
//!   since the previous transition (construction counts as one).
//! * `Distribution → Completed` happens when the batch cursor reaches the end
//!   of the roster (see [`crate::batch`]).

use soroban_sdk::Env;

use crate::events::{self, Finalized};
use crate::math;
use crate::storage;
use crate::types::{AggregateState, DistributionConfig, Phase};
use crate::Error;

/// Policy floor for the scaling ratio under extreme oversubscription (1%).
pub const MIN_SCALING_RATIO_BPS: u32 = 100;

/// The ratio a finalize would fix if `total_deposited` were the final total.
pub fn projected_ratio(config: &DistributionConfig, total_deposited: i128) -> Result<u32, Error> {
    let required = math::raw_allocation(total_deposited, config.conversion_rate_bps)?;
    math::scaling_ratio(required, config.payout_cap, MIN_SCALING_RATIO_BPS)
}

/// Move `state` to `to`, stamping the transition time.
pub fn advance(state: &mut AggregateState, to: Phase, now: u64) -> Result<(), Error> {
    state.phase = state.phase.transition(to)?;
    state.last_transition_at = now;
    Ok(())
}

pub fn finalize_pledge_phase(env: &Env) -> Result<AggregateState, Error> {
    let config = storage::load_config(env);
    let policy = storage::load_policy(env);
    let mut state = storage::load_state(env);
    let now = env.ledger().timestamp();

    if state.phase != Phase::Pledge {
        return Err(Error::WrongPhase);
    }
    if now.saturating_sub(state.last_transition_at) < policy.min_phase_duration {
        return Err(Error::PhaseDurationNotMet);
    }

    let required = math::raw_allocation(state.total_deposited, config.conversion_rate_bps)?;
    state.scaling_ratio_bps =
        math::scaling_ratio(required, config.payout_cap, MIN_SCALING_RATIO_BPS)?;
    advance(&mut state, Phase::Distribution, now)?;
    storage::save_state(env, &state);

    events::emit_finalized(
        env,
        Finalized {
            total_deposited: state.total_deposited,
            total_payout_required: required,
            scaling_ratio_bps: state.scaling_ratio_bps,
            participant_count: state.participant_count,
        },
    );

    Ok(state)
}
