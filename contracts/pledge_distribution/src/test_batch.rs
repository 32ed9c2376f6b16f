extern crate std;

use std::vec::Vec as StdVec;

use soroban_sdk::Address;

use crate::batch::{self, VisitBudget, WorkBudget};
use crate::invariants;
use crate::storage;
use crate::test::{setup_with, Setup};
use crate::{Error, Phase};

const WEEK: u64 = 7 * 86_400;
const DWELL: u64 = 3_600;

/// Budget that never grants any work.
struct Exhausted;

impl WorkBudget for Exhausted {
    fn consume(&mut self) -> bool {
        false
    }
}

fn finalized_with(participants: usize, amount: i128) -> (Setup<'static>, StdVec<Address>) {
    let s = setup_with(10_000, 1_000_000, 100, WEEK);
    let roster: StdVec<Address> = (0..participants).map(|_| s.pledge(amount)).collect();
    s.warp(DWELL);
    s.client.finalize_pledge_phase(&s.admin);
    s.fund_payout(amount * participants as i128);
    (s, roster)
}

#[test]
fn test_seven_participants_in_two_batches() {
    let (s, roster) = finalized_with(7, 1_000);

    let first = s.client.process_batch(&s.admin, &3);
    assert_eq!(first.start, 0);
    assert_eq!(first.end, 3);
    assert!(!first.completed);
    assert_eq!(s.client.last_processed_index(), 3);
    assert_eq!(s.client.current_phase(), Phase::Distribution);

    let second = s.client.process_batch(&s.admin, &4);
    assert_eq!(second.start, 3);
    assert_eq!(second.end, 7);
    assert!(second.completed);
    assert_eq!(s.client.last_processed_index(), 7);
    assert_eq!(s.client.current_phase(), Phase::Completed);

    for who in roster.iter() {
        assert!(s.client.get_record(who).processed);
        assert_eq!(s.payout.balance(who), 1_000);
    }
}

#[test]
fn test_batches_follow_roster_order() {
    let (s, roster) = finalized_with(4, 500);
    s.client.process_batch(&s.admin, &2);

    for (i, who) in roster.iter().enumerate() {
        assert_eq!(s.client.participant_at(&(i as u32)), Some(who.clone()));
        assert_eq!(s.client.get_record(who).processed, i < 2);
    }
}

#[test]
fn test_oversized_batch_is_clamped_to_roster() {
    let (s, _) = finalized_with(3, 1_000);
    let outcome = s.client.process_batch(&s.admin, &u32::MAX);
    assert_eq!(outcome.end, 3);
    assert_eq!(outcome.allocated, 3);
    assert!(outcome.completed);
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let (s, _) = finalized_with(1, 1_000);
    assert_eq!(
        s.client.try_process_batch(&s.admin, &0),
        Err(Ok(Error::InvalidBatchSize))
    );
}

#[test]
fn test_batch_before_finalize_is_rejected() {
    let s = setup_with(10_000, 1_000_000, 100, WEEK);
    s.pledge(1_000);
    assert_eq!(
        s.client.try_process_batch(&s.admin, &1),
        Err(Ok(Error::WrongPhase))
    );
}

#[test]
fn test_exhausted_budget_stops_early_and_resumes() {
    let (s, roster) = finalized_with(5, 1_000);
    let before = s.state();

    let outcome = s
        .env
        .as_contract(&s.client.address, || {
            batch::process_batch(&s.env, 5, &mut VisitBudget::new(2))
        })
        .unwrap();
    assert_eq!(outcome.end, 2);
    assert_eq!(outcome.allocated, 2);
    assert!(!outcome.completed);

    let after = s.state();
    invariants::assert_cursor_monotonic(&before, &after);
    assert_eq!(after.last_processed_index, 2);
    assert_eq!(after.phase, Phase::Distribution);

    let stalled = s
        .env
        .as_contract(&s.client.address, || {
            batch::process_batch(&s.env, 5, &mut Exhausted)
        })
        .unwrap();
    assert_eq!(stalled.start, 2);
    assert_eq!(stalled.end, 2);
    assert!(!stalled.completed);

    let rest = s.client.process_batch(&s.admin, &5);
    assert_eq!(rest.start, 2);
    assert_eq!(rest.end, 5);
    assert!(rest.completed);
    for who in roster.iter() {
        assert_eq!(s.payout.balance(who), 1_000);
    }
}

#[test]
fn test_processed_participant_is_never_paid_twice() {
    let (s, roster) = finalized_with(3, 1_000);
    let first = roster[0].clone();

    // Settle the first participant out of band, as if an earlier batch had.
    s.env.as_contract(&s.client.address, || {
        let mut record = storage::load_record(&s.env, &first);
        record.settle(777).unwrap();
        storage::save_record(&s.env, &first, &record);
    });
    let settled = s.client.get_record(&first);

    let outcome = s.client.process_batch(&s.admin, &3);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.allocated, 2);

    let after = s.client.get_record(&first);
    invariants::assert_settled_record_frozen(&settled, &after);
    assert_eq!(after.allocation_amount, 777);
    assert_eq!(s.payout.balance(&first), 0);
}

#[test]
fn test_participant_blacklisted_mid_distribution_is_skipped() {
    let (s, roster) = finalized_with(3, 1_000);
    let mallory = roster[1].clone();

    s.client.process_batch(&s.admin, &1);
    s.client.set_blacklisted(&s.admin, &mallory, &true);
    let outcome = s.client.process_batch(&s.admin, &2);

    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.allocated, 1);
    assert!(outcome.completed);

    let record = s.client.get_record(&mallory);
    assert!(!record.processed);
    assert_eq!(record.allocation_amount, 0);
    assert_eq!(s.payout.balance(&mallory), 0);
    assert!(s.client.get_record(&roster[2]).processed);

    // Skipped entries stay skipped even after the blacklist is lifted.
    s.client.set_blacklisted(&s.admin, &mallory, &false);
    assert_eq!(
        s.client.try_process_batch(&s.admin, &3),
        Err(Ok(Error::WrongPhase))
    );
    assert!(!s.client.get_record(&mallory).processed);
}

#[test]
fn test_invariants_hold_through_lifecycle() {
    let s = setup_with(5_000, 1_000_000, 100, WEEK);
    let amounts = [2_000_000i128, 750_000, 333_333, 1_000];
    for amount in amounts {
        s.pledge(amount);
        invariants::assert_all_invariants(&s.state(), &s.records());
    }

    let pledge_state = s.state();
    s.warp(DWELL);
    s.client.finalize_pledge_phase(&s.admin);
    let distribution_state = s.state();
    invariants::assert_valid_phase_transition(pledge_state.phase, distribution_state.phase);
    invariants::assert_all_invariants(&distribution_state, &s.records());

    s.fund_payout(1_000_000);
    let mut previous = distribution_state;
    while s.client.current_phase() == Phase::Distribution {
        s.client.process_batch(&s.admin, &1);
        let next = s.state();
        invariants::assert_cursor_monotonic(&previous, &next);
        invariants::assert_valid_phase_transition(previous.phase, next.phase);
        invariants::assert_all_invariants(&next, &s.records());
        previous = next;
    }

    // Total payout never exceeds the cap when the ratio is not floored.
    let paid: i128 = s.records().iter().map(|r| r.allocation_amount).sum();
    assert!(paid <= 1_000_000);
}
