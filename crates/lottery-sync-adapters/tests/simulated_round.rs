mod common;

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use lottery_sync_adapters::{
    Eip1193Adapter, SimulatedConnector, SimulatedLottery, DETERMINISTIC_ACCOUNT,
};
use lottery_sync_core::{
    ClientConfig, ConnectionPhase, ContractSyncClient, LotteryAction, NoticeLevel, WalletPort,
    DEFAULT_ENTRY_FEE_WEI,
};

use common::{other_address, TestClock, SEPOLIA, START_MS};

type SimClient = ContractSyncClient<Eip1193Adapter, SimulatedConnector, TestClock>;

fn fee() -> U256 {
    U256::from(DEFAULT_ENTRY_FEE_WEI)
}

fn simulated(clock: &TestClock, lottery: SimulatedLottery) -> SimClient {
    ContractSyncClient::new(
        Eip1193Adapter::deterministic(),
        lottery.connector(),
        clock.clone(),
        ClientConfig::default(),
    )
}

fn owned_lottery(clock: &TestClock) -> SimulatedLottery {
    SimulatedLottery::with_clock(DETERMINISTIC_ACCOUNT, fee(), Arc::new(clock.clone()))
        .with_round_secs(120)
}

fn switch_account(client: &mut SimClient, account: Address) {
    client
        .wallet
        .debug_inject_accounts_changed(vec![account])
        .expect("inject account");
    client.pump();
    assert_eq!(client.session().map(|s| s.account), Some(account));
}

#[test]
fn full_round_from_start_to_withdrawal() {
    let clock = TestClock::at(START_MS);
    let lottery = owned_lottery(&clock);
    let mut client = simulated(&clock, lottery.clone());

    // deterministic wallet starts on mainnet and has never seen Sepolia
    client.connect().expect("connect");
    assert_eq!(client.phase(), ConnectionPhase::Connected);
    assert!(client.session().is_some_and(|s| s.is_owner));
    assert_eq!(client.subscription_count(), 4);
    assert_eq!(lottery.live_subscriptions(), 4);
    client.take_notices();

    client.submit_action(LotteryAction::Start).expect("start");
    let panel = client.view().status().cloned().expect("status");
    assert!(panel.open);
    assert_eq!(panel.countdown.as_deref(), Some("0h 2m 0s"));
    clock.advance(1_000);
    client.pump();
    assert_eq!(client.ui().countdown.as_deref(), Some("0h 1m 59s"));

    switch_account(&mut client, other_address());
    assert_eq!(lottery.live_subscriptions(), 4);
    assert!(client.session().is_some_and(|s| !s.is_owner));
    client.submit_action(LotteryAction::Enter).expect("enter");
    let panel = client.view().status().cloned().expect("status");
    assert_eq!(panel.prize_pool, "0.01");
    assert_eq!(panel.players, vec![other_address()]);
    assert!(!panel.actions.enter);

    switch_account(&mut client, DETERMINISTIC_ACCOUNT);
    client.submit_action(LotteryAction::End).expect("end");
    assert!(client.is_randomness_poll_armed());
    assert!(client.snapshot().is_some_and(|s| s.pending_randomness));

    // oracle has not answered yet
    clock.advance(5_000);
    client.pump();
    assert!(client.is_randomness_poll_armed());
    assert_eq!(client.snapshot().and_then(|s| s.winner), None);

    assert_eq!(lottery.fulfill_randomness().expect("fulfill"), other_address());
    clock.advance(5_000);
    client.pump();
    assert!(!client.is_randomness_poll_armed());
    assert_eq!(
        client.snapshot().and_then(|s| s.winner),
        Some(other_address())
    );
    assert!(client
        .take_notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Success && n.message == "Winner selected!"));

    switch_account(&mut client, other_address());
    assert!(client.view().status().is_some_and(|p| p.actions.withdraw));
    client.submit_action(LotteryAction::Withdraw).expect("withdraw");
    assert_eq!(lottery.paid_out(other_address()), fee());
    assert_eq!(
        client.view().status().map(|p| p.prize_pool.clone()),
        Some("0.0".to_owned())
    );
}

#[test]
fn entering_a_closed_round_surfaces_the_revert_reason() {
    let clock = TestClock::at(START_MS);
    let mut client = simulated(&clock, owned_lottery(&clock));
    client.connect().expect("connect");

    let err = client
        .submit_action(LotteryAction::Enter)
        .expect_err("closed round");
    assert_eq!(
        err.user_message(),
        "Failed to enter lottery: execution reverted: Lottery is not open"
    );
    assert_eq!(
        client.view().error.as_deref(),
        Some("Failed to enter lottery: execution reverted: Lottery is not open")
    );
    assert!(!client.view().loading);
}

#[test]
fn non_owner_cannot_start() {
    let clock = TestClock::at(START_MS);
    let mut client = simulated(&clock, owned_lottery(&clock));
    client.connect().expect("connect");
    switch_account(&mut client, other_address());

    let err = client
        .submit_action(LotteryAction::Start)
        .expect_err("not the owner");
    assert_eq!(
        err.user_message(),
        "Failed to start lottery: execution reverted: Only owner"
    );
}

#[test]
fn auto_fulfill_settles_after_delay() {
    let clock = TestClock::at(START_MS);
    let lottery = owned_lottery(&clock).with_auto_fulfill(12_000);
    let mut client = simulated(&clock, lottery.clone());
    client.connect().expect("connect");
    client.submit_action(LotteryAction::Start).expect("start");
    client.submit_action(LotteryAction::Enter).expect("owner enters");
    client.submit_action(LotteryAction::End).expect("end");

    clock.advance(5_000);
    client.pump();
    clock.advance(5_000);
    client.pump();
    assert!(client.is_randomness_poll_armed());

    clock.advance(5_000);
    client.pump();
    assert!(!client.is_randomness_poll_armed());
    assert_eq!(
        client.snapshot().and_then(|s| s.winner),
        Some(DETERMINISTIC_ACCOUNT)
    );
    assert!(lottery.fulfill_randomness().is_err());
}

#[test]
fn wallet_reaches_sepolia_and_teardown_releases_listeners() {
    let clock = TestClock::at(START_MS);
    let lottery = owned_lottery(&clock);
    let mut client = simulated(&clock, lottery.clone());
    client.connect().expect("connect");
    assert_eq!(client.wallet.chain_id().expect("chain"), SEPOLIA);

    client.shutdown();
    assert_eq!(lottery.live_subscriptions(), 0);
}
