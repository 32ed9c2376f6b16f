extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, IntoVal, TryIntoVal, Val, Vec,
};

use crate::events::{Allocated, BatchProcessed, BlacklistUpdated, Finalized, Pledged, TokensMoved};
use crate::test::{setup, Setup};

fn last_event(s: &Setup) -> (Address, Vec<Val>, Val) {
    s.env.events().all().last().expect("No events found")
}

#[test]
fn test_pledged_event() {
    let s = setup();
    let alice = s.pledge(2_500);

    let event = last_event(&s);
    assert_eq!(event.0, s.client.address);
    let expected_topics = vec![
        &s.env,
        symbol_short!("pledged").into_val(&s.env),
        alice.into_val(&s.env),
    ];
    assert_eq!(event.1, expected_topics);

    let data: Pledged = event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        Pledged {
            participant: alice.clone(),
            amount: 2_500,
            participant_total: 2_500,
            total_deposited: 2_500,
        }
    );
}

#[test]
fn test_finalized_event() {
    let s = setup();
    s.pledge(2_000_000);
    s.pledge(2_000_000);
    s.warp(3_600);
    s.client.finalize_pledge_phase(&s.admin);

    let event = last_event(&s);
    let expected_topics: Vec<Val> = vec![&s.env, symbol_short!("finalized").into_val(&s.env)];
    assert_eq!(event.1, expected_topics);

    let data: Finalized = event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        Finalized {
            total_deposited: 4_000_000,
            total_payout_required: 2_000_000,
            scaling_ratio_bps: 5_000,
            participant_count: 2,
        }
    );
}

#[test]
fn test_batch_events() {
    let s = setup();
    let alice = s.pledge(2_000_000);
    s.warp(3_600);
    s.client.finalize_pledge_phase(&s.admin);
    s.fund_payout(1_000_000);
    s.client.process_batch(&s.admin, &1);

    let all = s.env.events().all();
    let n = all.len();

    let (_, topics, data) = all.get(n - 1).unwrap();
    let expected: Vec<Val> = vec![&s.env, symbol_short!("complete").into_val(&s.env)];
    assert_eq!(topics, expected);
    let count: u32 = data.try_into_val(&s.env).unwrap();
    assert_eq!(count, 1);

    let (_, topics, data) = all.get(n - 2).unwrap();
    let expected: Vec<Val> = vec![&s.env, symbol_short!("batch").into_val(&s.env)];
    assert_eq!(topics, expected);
    let batch: BatchProcessed = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        batch,
        BatchProcessed {
            start: 0,
            end: 1,
            allocated: 1,
            skipped: 0,
        }
    );

    let (_, topics, data) = all.get(n - 3).unwrap();
    let expected = vec![
        &s.env,
        symbol_short!("allocated").into_val(&s.env),
        alice.into_val(&s.env),
    ];
    assert_eq!(topics, expected);
    let allocated: Allocated = data.try_into_val(&s.env).unwrap();
    assert_eq!(
        allocated,
        Allocated {
            participant: alice.clone(),
            allocation: 1_000_000,
            refund: 0,
        }
    );
}

#[test]
fn test_blacklist_event() {
    let s = setup();
    let mallory = Address::generate(&s.env);
    s.client.set_blacklisted(&s.admin, &mallory, &true);

    let event = last_event(&s);
    let expected_topics = vec![
        &s.env,
        symbol_short!("blacklist").into_val(&s.env),
        mallory.into_val(&s.env),
    ];
    assert_eq!(event.1, expected_topics);
    let data: BlacklistUpdated = event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        BlacklistUpdated {
            participant: mallory.clone(),
            blacklisted: true,
        }
    );
}

#[test]
fn test_emergency_withdraw_event() {
    let s = setup();
    s.pledge(5_000);
    let vault = Address::generate(&s.env);
    s.client.activate_emergency(&s.admin);
    s.client
        .emergency_withdraw(&s.admin, &s.deposit.address, &vault, &5_000);

    let event = last_event(&s);
    let expected_topics: Vec<Val> = vec![&s.env, symbol_short!("em_wdraw").into_val(&s.env)];
    assert_eq!(event.1, expected_topics);
    let data: TokensMoved = event.2.try_into_val(&s.env).unwrap();
    assert_eq!(
        data,
        TokensMoved {
            token: s.deposit.address.clone(),
            recipient: vault.clone(),
            amount: 5_000,
        }
    );
}
