#![allow(dead_code)]

extern crate std;

use std::vec::Vec;

use crate::types::{AggregateState, Phase, PledgeRecord};

/// INV-1: `total_deposited` equals the sum of every participant's deposit.
pub fn assert_total_matches_records(state: &AggregateState, records: &[PledgeRecord]) {
    let sum: i128 = records.iter().map(|r| r.deposit_amount).sum();
    assert_eq!(
        state.total_deposited, sum,
        "INV-1 violated: total_deposited {} != sum of deposits {}",
        state.total_deposited, sum
    );
}

/// INV-2: roster length equals the number of participants with a deposit.
pub fn assert_roster_matches_depositors(state: &AggregateState, records: &[PledgeRecord]) {
    let depositors = records.iter().filter(|r| r.deposit_amount > 0).count() as u32;
    assert_eq!(
        state.participant_count, depositors,
        "INV-2 violated: roster holds {} entries for {} depositors",
        state.participant_count, depositors
    );
}

/// INV-3: only forward phase transitions (or staying put) are observable.
pub fn assert_valid_phase_transition(from: Phase, to: Phase) {
    let valid = from == to
        || matches!(
            (from, to),
            (Phase::Pledge, Phase::Distribution) | (Phase::Distribution, Phase::Completed)
        );
    assert!(
        valid,
        "INV-3 violated: invalid phase transition from {:?} to {:?}",
        from, to
    );
}

/// INV-4: the batch cursor never moves backwards and never passes the roster.
pub fn assert_cursor_monotonic(before: &AggregateState, after: &AggregateState) {
    assert!(
        after.last_processed_index >= before.last_processed_index,
        "INV-4 violated: cursor moved back from {} to {}",
        before.last_processed_index,
        after.last_processed_index
    );
    assert!(
        after.last_processed_index <= after.participant_count,
        "INV-4 violated: cursor {} beyond roster length {}",
        after.last_processed_index,
        after.participant_count
    );
}

/// INV-5: an allocation only exists on a processed record.
pub fn assert_allocation_only_when_processed(record: &PledgeRecord) {
    if !record.processed {
        assert_eq!(
            record.allocation_amount, 0,
            "INV-5 violated: unprocessed record carries allocation {}",
            record.allocation_amount
        );
    }
}

/// INV-6: a settled record never changes again.
pub fn assert_settled_record_frozen(before: &PledgeRecord, after: &PledgeRecord) {
    if before.processed {
        assert_eq!(before, after, "INV-6 violated: settled record was mutated");
    }
}

/// INV-7: the scaling ratio is unset during Pledge and within (0, 10_000] afterwards.
pub fn assert_ratio_matches_phase(state: &AggregateState) {
    match state.phase {
        Phase::Pledge => assert_eq!(
            state.scaling_ratio_bps, 0,
            "INV-7 violated: ratio fixed during pledge phase"
        ),
        _ => assert!(
            state.scaling_ratio_bps > 0 && state.scaling_ratio_bps <= 10_000,
            "INV-7 violated: ratio {} out of range",
            state.scaling_ratio_bps
        ),
    }
}

/// Run all stateless invariants over a snapshot.
pub fn assert_all_invariants(state: &AggregateState, records: &Vec<PledgeRecord>) {
    assert_total_matches_records(state, records);
    assert_roster_matches_depositors(state, records);
    assert_ratio_matches_phase(state);
    for record in records {
        assert_allocation_only_when_processed(record);
    }
}
