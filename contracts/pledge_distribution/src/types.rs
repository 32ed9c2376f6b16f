//! # Types
//!
//! Shared data structures used across all modules of the distribution engine.
//!
//! ## Design decisions
//!
//! ### Config / Policy / State split
//!
//! The engine's process-wide data is stored as three separate entries:
//!
//! - [`DistributionConfig`] — written once by `init`; never mutated.
//! - [`Policy`] — administrator knobs, rewritten only by the setters.
//! - [`AggregateState`] — written on every deposit, finalize and batch.
//!
//! Per-participant [`PledgeRecord`]s live in their own persistent entries.
//!
//! ### Phase as a Finite-State Machine
//!
//! [`Phase`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Pledge ──► Distribution ──► Completed
//! ```
//!
//! [`SystemMode`] is orthogonal to the phase and is a one-way latch:
//!
//! ```text
//! Normal ──► Emergency
//! ```

use soroban_sdk::{contracttype, Address};

use crate::Error;

/// Lifecycle phase of the distribution.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Accepting deposits.
    Pledge,
    /// Scaling ratio fixed; allocations being paid out in batches.
    Distribution,
    /// Every enrolled participant has been visited by the batch processor.
    Completed,
}

impl Phase {
    /// The only phase reachable from `self`, if any.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Pledge => Some(Phase::Distribution),
            Phase::Distribution => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    /// Advance to `to`, rejecting anything but the single forward step.
    pub fn transition(self, to: Phase) -> Result<Phase, Error> {
        match self.next() {
            Some(next) if next == to => Ok(to),
            _ => Err(Error::WrongPhase),
        }
    }
}

/// Operating mode. `Emergency` can be entered but never left.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SystemMode {
    Normal,
    Emergency,
}

impl SystemMode {
    /// Latch the emergency mode. Fails if it is already latched.
    pub fn activate_emergency(self) -> Result<SystemMode, Error> {
        match self {
            SystemMode::Normal => Ok(SystemMode::Emergency),
            SystemMode::Emergency => Err(Error::EmergencyActive),
        }
    }

    /// Leaving the emergency mode is never permitted.
    pub fn leave_emergency(self) -> Result<SystemMode, Error> {
        match self {
            SystemMode::Normal => Ok(SystemMode::Normal),
            SystemMode::Emergency => Err(Error::EmergencyActive),
        }
    }

    pub fn is_emergency(self) -> bool {
        self == SystemMode::Emergency
    }
}

/// Immutable configuration, written once by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionConfig {
    /// Asset participants pledge (and get refunded in).
    pub deposit_token: Address,
    /// Capped-supply asset paid out as allocation.
    pub payout_token: Address,
    /// Fraction of the deposit converted to payout asset, in basis points.
    pub conversion_rate_bps: u32,
    /// Maximum total payout the distribution may require before scaling.
    pub payout_cap: i128,
    /// Smallest single deposit accepted.
    pub min_deposit: i128,
    /// Ledger timestamp after which deposits are rejected.
    pub pledge_deadline: u64,
    /// Shared decimal precision of both assets.
    pub decimals: u32,
}

/// Administrator-adjustable knobs.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Policy {
    /// Upper bound on one participant's cumulative deposit.
    pub max_per_participant: i128,
    /// Smallest amount `recover_stuck_tokens` will move.
    pub dust_floor: i128,
    /// Seconds a participant must wait between two deposits.
    pub cooldown_secs: u64,
    /// Seconds that must pass between two phase transitions.
    pub min_phase_duration: u64,
}

/// Process-wide mutable state.
///
/// Kept small so that the write on every deposit stays cheap.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateState {
    pub phase: Phase,
    /// Sum of every participant's `deposit_amount`.
    pub total_deposited: i128,
    /// 0 until fixed at the Pledge -> Distribution transition.
    pub scaling_ratio_bps: u32,
    /// Number of roster entries; also the next free roster index.
    pub participant_count: u32,
    /// Batch cursor into the roster. Never decreases.
    pub last_processed_index: u32,
    pub last_transition_at: u64,
}

/// A single participant's pledge.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PledgeRecord {
    pub deposit_amount: i128,
    /// Meaningful only once `processed` is set.
    pub allocation_amount: i128,
    pub processed: bool,
    pub last_deposit_at: u64,
}

impl PledgeRecord {
    /// Record the final allocation. A record is settled exactly once.
    pub fn settle(&mut self, allocation: i128) -> Result<(), Error> {
        if self.processed {
            return Err(Error::AlreadyProcessed);
        }
        self.allocation_amount = allocation;
        self.processed = true;
        Ok(())
    }
}

/// Summary of one `process_batch` invocation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchOutcome {
    /// Cursor before the batch.
    pub start: u32,
    /// Cursor after the batch.
    pub end: u32,
    /// Participants paid out in this batch.
    pub allocated: u32,
    /// Participants visited but skipped (processed, empty or blacklisted).
    pub skipped: u32,
    /// `true` once the cursor reached the end of the roster.
    pub completed: bool,
}
