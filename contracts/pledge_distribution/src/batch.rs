//! # Batch processor
//!
//! Walks the roster from `last_processed_index` in insertion order and pays
//! out each participant's scaled allocation plus any refund.
//!
//! * A participant already `processed`, with no deposit, or blacklisted is
//!   skipped. Skipped entries are passed over for good.
//! * The cursor is persisted after every call and only moves forward.
//! * A [`WorkBudget`] is consulted before each participant. When it runs dry
//!   the batch stops early and the cursor stays at the last participant fully
//!   handled; the next call resumes from there.
//! * When the cursor reaches the roster length the phase becomes `Completed`.
//!
//! For each participant the record is written before the two outbound
//! transfers; a failed transfer aborts the whole invocation.

use soroban_sdk::{token, Env};

use crate::events::{self, Allocated, BatchProcessed};
use crate::math;
use crate::phase;
use crate::storage;
use crate::types::{BatchOutcome, Phase};
use crate::Error;

/// Participants a single `process_batch` invocation may visit.
pub const MAX_PARTICIPANTS_PER_INVOCATION: u32 = 50;

/// Remaining work the batch loop may perform.
pub trait WorkBudget {
    /// Claim one unit of work. `false` when none is left.
    fn consume(&mut self) -> bool;
}

/// Budget of a fixed number of roster visits.
pub struct VisitBudget {
    remaining: u32,
}

impl VisitBudget {
    pub fn new(visits: u32) -> Self {
        Self { remaining: visits }
    }
}

impl WorkBudget for VisitBudget {
    fn consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

pub fn process_batch<B: WorkBudget>(
    env: &Env,
    batch_size: u32,
    budget: &mut B,
) -> Result<BatchOutcome, Error> {
    if batch_size == 0 {
        return Err(Error::InvalidBatchSize);
    }

    let config = storage::load_config(env);
    let mut state = storage::load_state(env);
    if state.phase != Phase::Distribution {
        return Err(Error::WrongPhase);
    }

    let start = state.last_processed_index;
    let end = start
        .saturating_add(batch_size)
        .min(state.participant_count);

    let deposit_token = token::Client::new(env, &config.deposit_token);
    let payout_token = token::Client::new(env, &config.payout_token);
    let custody = env.current_contract_address();

    let mut cursor = start;
    let mut allocated = 0u32;
    let mut skipped = 0u32;

    while cursor < end {
        if !budget.consume() {
            break;
        }

        let Some(participant) = storage::roster_at(env, cursor) else {
            return Err(Error::NotInitialized);
        };
        let mut record = storage::load_record(env, &participant);

        if record.processed
            || record.deposit_amount == 0
            || storage::is_blacklisted(env, &participant)
        {
            skipped += 1;
            cursor += 1;
            continue;
        }

        let allocation = math::scaled_allocation(
            record.deposit_amount,
            config.conversion_rate_bps,
            state.scaling_ratio_bps,
        )?;
        let refund = math::refund(record.deposit_amount, allocation, state.scaling_ratio_bps)?;

        record.settle(allocation)?;
        storage::save_record(env, &participant, &record);

        if allocation > 0 {
            payout_token.transfer(&custody, &participant, &allocation);
        }
        if refund > 0 {
            deposit_token.transfer(&custody, &participant, &refund);
        }

        events::emit_allocated(
            env,
            Allocated {
                participant,
                allocation,
                refund,
            },
        );

        allocated += 1;
        cursor += 1;
    }

    state.last_processed_index = cursor;
    let completed = cursor >= state.participant_count;
    if completed {
        phase::advance(&mut state, Phase::Completed, env.ledger().timestamp())?;
    }
    storage::save_state(env, &state);

    events::emit_batch_processed(
        env,
        BatchProcessed {
            start,
            end: cursor,
            allocated,
            skipped,
        },
    );
    if completed {
        events::emit_completed(env, state.participant_count);
    }

    Ok(BatchOutcome {
        start,
        end: cursor,
        allocated,
        skipped,
        completed,
    })
}
