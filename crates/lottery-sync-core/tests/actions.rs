mod common;

use alloy::primitives::U256;
use lottery_sync_core::{
    ActionEligibility, ClientError, ConnectionPhase, LotteryAction, LotterySnapshot, NoticeLevel,
    PortError, Session, DEFAULT_ENTRY_FEE_WEI, INTERNAL_ERROR_CODE, USER_REJECTED_CODE,
};

use common::{
    connected_client, new_client, other_address, owner_address, player_address, SEPOLIA,
};

#[test]
fn actions_require_a_connected_session() {
    let mut client = new_client(player_address());
    let err = client
        .submit_action(LotteryAction::Enter)
        .expect_err("not connected");
    assert_eq!(err, ClientError::NotReady);
    assert!(client.take_notices().is_empty());
    assert!(client.connector.with(|s| s.submitted.is_empty()));
}

#[test]
fn actions_are_refused_on_network_mismatch() {
    let mut client = connected_client(player_address());
    client.wallet.emit_chain_changed(1);
    client.pump();
    assert!(matches!(
        client.phase(),
        ConnectionPhase::NetworkMismatch { .. }
    ));

    let err = client
        .submit_action(LotteryAction::Enter)
        .expect_err("wrong network");
    assert_eq!(err, ClientError::NotReady);
}

#[test]
fn enter_pays_the_entry_fee_and_refreshes() {
    let mut client = connected_client(player_address());
    client.connector.with(|s| s.open = true);
    client.refresh_snapshot();

    client
        .submit_action(LotteryAction::Enter)
        .expect("enter succeeds");

    let submitted = client.connector.with(|s| s.submitted.clone());
    assert_eq!(
        submitted,
        vec![(
            player_address(),
            LotteryAction::Enter,
            U256::from(DEFAULT_ENTRY_FEE_WEI)
        )]
    );
    assert_eq!(client.config().entry_fee_wei, U256::from(10_000_000_000_000_000u64));

    let snapshot = client.snapshot().expect("snapshot");
    assert!(snapshot.caller_is_member);
    assert_eq!(snapshot.prize_pool_ether(), "0.01");
    assert!(!client.view().loading);

    let notices = client.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "Entered lottery successfully!");
}

#[test]
fn non_payable_actions_send_no_value() {
    let mut client = connected_client(owner_address());
    client
        .submit_action(LotteryAction::Start)
        .expect("start succeeds");
    client.submit_action(LotteryAction::End).expect("end succeeds");

    let values: Vec<U256> = client
        .connector
        .with(|s| s.submitted.iter().map(|(_, _, v)| *v).collect());
    assert_eq!(values, vec![U256::ZERO, U256::ZERO]);

    let notices = client.take_notices();
    assert_eq!(notices[0].message, "Lottery started successfully!");
    assert_eq!(notices[1].level, NoticeLevel::Info);
    assert_eq!(
        notices[1].message,
        "Lottery ended, waiting for randomness callback..."
    );
}

#[test]
fn rejected_transaction_clears_busy_flag() {
    let mut client = connected_client(player_address());
    client.connector.with(|s| {
        s.submit_error = Some(PortError::provider(
            USER_REJECTED_CODE,
            "User denied transaction signature",
        ))
    });

    let err = client
        .submit_action(LotteryAction::Enter)
        .expect_err("rejected");
    assert_eq!(
        err,
        ClientError::TxRejected {
            action: LotteryAction::Enter
        }
    );
    let view = client.view();
    assert!(!view.loading);
    assert_eq!(view.error.as_deref(), Some("Transaction rejected by user"));
}

#[test]
fn internal_error_reads_as_insufficient_funds() {
    let mut client = connected_client(player_address());
    client.connector.with(|s| {
        s.submit_error = Some(PortError::provider(
            INTERNAL_ERROR_CODE,
            "insufficient funds for gas * price + value",
        ))
    });

    client
        .submit_action(LotteryAction::Enter)
        .expect_err("insufficient funds");
    assert_eq!(
        client.view().error.as_deref(),
        Some("Insufficient funds or transaction failed")
    );
}

#[test]
fn other_failures_name_the_action() {
    let mut client = connected_client(owner_address());
    client.connector.with(|s| {
        s.confirm_error = Some(PortError::provider(3, "execution reverted: Lottery not open"))
    });

    client
        .submit_action(LotteryAction::End)
        .expect_err("reverted");
    let view = client.view();
    assert!(!view.loading);
    assert_eq!(
        view.error.as_deref(),
        Some("Failed to end lottery: execution reverted: Lottery not open")
    );
}

#[test]
fn new_action_clears_previous_error() {
    let mut client = connected_client(player_address());
    client.connector.with(|s| {
        s.open = true;
        s.submit_error = Some(PortError::provider(USER_REJECTED_CODE, "denied"));
    });
    client.submit_action(LotteryAction::Enter).expect_err("denied");
    assert!(client.view().error.is_some());

    client.submit_action(LotteryAction::Enter).expect("retry");
    assert!(client.view().error.is_none());
}

#[test]
fn owner_never_sees_enter_as_member() {
    let session = Session {
        account: owner_address(),
        is_owner: true,
        network_ok: true,
    };
    let open = LotterySnapshot {
        open: true,
        caller_is_member: true,
        ..LotterySnapshot::default()
    };
    let actions = ActionEligibility::derive(&session, &open);
    assert_eq!(actions.visible(), vec![LotteryAction::End]);

    let closed = LotterySnapshot::default();
    let actions = ActionEligibility::derive(&session, &closed);
    assert_eq!(actions.visible(), vec![LotteryAction::Start]);
}

#[test]
fn eligibility_follows_membership_and_winner() {
    let player = Session {
        account: player_address(),
        is_owner: false,
        network_ok: true,
    };

    let open = LotterySnapshot {
        open: true,
        ..LotterySnapshot::default()
    };
    assert_eq!(
        ActionEligibility::derive(&player, &open).visible(),
        vec![LotteryAction::Enter]
    );

    let entered = LotterySnapshot {
        caller_is_member: true,
        ..open.clone()
    };
    assert!(ActionEligibility::derive(&player, &entered)
        .visible()
        .is_empty());

    let won = LotterySnapshot {
        winner: Some(player_address()),
        ..LotterySnapshot::default()
    };
    assert_eq!(
        ActionEligibility::derive(&player, &won).visible(),
        vec![LotteryAction::Withdraw]
    );

    let lost = LotterySnapshot {
        winner: Some(other_address()),
        ..LotterySnapshot::default()
    };
    assert!(!ActionEligibility::derive(&player, &lost).withdraw);
}

#[test]
fn status_panel_reflects_eligibility() {
    let mut client = connected_client(owner_address());
    let panel = client.view().status().cloned().expect("status panel");
    assert!(panel.is_owner);
    assert!(panel.actions.start);
    assert_eq!(panel.entry_fee, "0.01");
    assert_eq!(client.wallet.with(|s| s.chain_id), SEPOLIA);

    client
        .submit_action(LotteryAction::Start)
        .expect("start succeeds");
    let panel = client.view().status().cloned().expect("status panel");
    assert!(panel.open);
    assert!(panel.actions.end);
    assert!(!panel.actions.start);
}
