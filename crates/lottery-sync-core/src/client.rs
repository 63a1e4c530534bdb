//! Mirrors the lottery contract into local state and drives user actions.
//!
//! The client is single-owner and cooperative: nothing happens between calls.
//! A driver calls [`ContractSyncClient::pump`] on a fixed cadence to deliver
//! wallet events, contract events and due timers.

use alloy::primitives::{Address, B256, U256};

use crate::config::ClientConfig;
use crate::countdown::Countdown;
use crate::domain::{
    format_ether, winner_from_raw, LotteryAction, LotterySnapshot, Session, WalletEvent,
};
use crate::error::ClientError;
use crate::ports::{
    ClockPort, ContractConnector, LotteryContractPort, PortError, WalletPort,
    UNRECOGNIZED_CHAIN_CODE,
};
use crate::subscription::SubscriptionSet;
use crate::timer::RecurringTimer;
use crate::view::{ClientView, ConnectionPhase, Notice, Screen, StatusPanel, UiState};

/// Identifies one snapshot read; commits older than the last applied one are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub epoch: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { revision: u64 },
    Failed,
    Stale,
    Skipped,
}

struct ActiveSession<C: LotteryContractPort> {
    session: Session,
    contract: C,
    subscriptions: SubscriptionSet,
    snapshot: Option<LotterySnapshot>,
    epoch: u64,
    issued: u64,
    committed: u64,
    randomness_poll: RecurringTimer,
    countdown: RecurringTimer,
    countdown_end: Option<u64>,
}

impl<C: LotteryContractPort> ActiveSession<C> {
    fn new(session: Session, contract: C, epoch: u64, config: &ClientConfig) -> Self {
        Self {
            session,
            contract,
            subscriptions: SubscriptionSet::default(),
            snapshot: None,
            epoch,
            issued: 0,
            committed: 0,
            randomness_poll: RecurringTimer::new(config.randomness_poll_interval_ms),
            countdown: RecurringTimer::new(config.countdown_interval_ms),
            countdown_end: None,
        }
    }

    fn close(mut self) {
        self.randomness_poll.disarm();
        self.countdown.disarm();
        self.subscriptions.close(&self.contract);
    }
}

pub struct ContractSyncClient<W, N, K>
where
    W: WalletPort,
    N: ContractConnector,
    K: ClockPort,
{
    pub wallet: W,
    pub connector: N,
    pub clock: K,
    config: ClientConfig,
    phase: ConnectionPhase,
    session: Option<ActiveSession<N::Contract>>,
    ui: UiState,
    next_epoch: u64,
    shut_down: bool,
}

impl<W, N, K> ContractSyncClient<W, N, K>
where
    W: WalletPort,
    N: ContractConnector,
    K: ClockPort,
{
    pub fn new(wallet: W, connector: N, clock: K, config: ClientConfig) -> Self {
        Self {
            wallet,
            connector,
            clock,
            config,
            phase: ConnectionPhase::Disconnected,
            session: None,
            ui: UiState::default(),
            next_epoch: 0,
            shut_down: false,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().map(|a| &a.session)
    }

    pub fn snapshot(&self) -> Option<&LotterySnapshot> {
        self.session.as_ref().and_then(|a| a.snapshot.as_ref())
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn subscription_count(&self) -> usize {
        self.session.as_ref().map_or(0, |a| a.subscriptions.len())
    }

    pub fn is_randomness_poll_armed(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|a| a.randomness_poll.is_armed())
    }

    pub fn is_countdown_armed(&self) -> bool {
        self.session.as_ref().is_some_and(|a| a.countdown.is_armed())
    }

    pub fn connect(&mut self) -> Result<(), ClientError> {
        if self.shut_down {
            return Err(ClientError::NotReady);
        }
        if !self.wallet.is_available() {
            let err = ClientError::WalletAbsent;
            self.report(&err);
            return Err(err);
        }

        self.end_session();
        self.phase = ConnectionPhase::Connecting;
        tracing::info!(contract = %self.config.contract_address, "connecting wallet");

        match self.establish_session() {
            Ok(account) => {
                tracing::info!(%account, "wallet connected");
                self.ui
                    .push_notice(Notice::success("Wallet connected successfully!"));
                Ok(())
            }
            Err(err) => {
                if self.phase == ConnectionPhase::Connecting {
                    self.phase = ConnectionPhase::Disconnected;
                }
                self.report(&err);
                Err(err)
            }
        }
    }

    /// One-click switch (or add) to the expected network, then a full connect.
    pub fn switch_network(&mut self) -> Result<(), ClientError> {
        if self.shut_down {
            return Err(ClientError::NotReady);
        }
        if !self.wallet.is_available() {
            let err = ClientError::WalletAbsent;
            self.report(&err);
            return Err(err);
        }
        if let Err(err) = self.switch_to_expected() {
            self.report(&err);
            return Err(err);
        }
        self.connect()
    }

    pub fn disconnect(&mut self) {
        self.end_session();
        self.phase = ConnectionPhase::Disconnected;
    }

    /// Tears everything down; later calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.end_session();
        self.phase = ConnectionPhase::Disconnected;
        self.shut_down = true;
        tracing::info!("lottery client shut down");
    }

    pub fn refresh_snapshot(&mut self) -> RefreshOutcome {
        let Some(ticket) = self.begin_refresh() else {
            return RefreshOutcome::Skipped;
        };
        let result = match self.session.as_ref() {
            Some(active) => read_snapshot(&active.contract, active.session.account),
            None => return RefreshOutcome::Skipped,
        };
        self.commit_refresh(ticket, result)
    }

    pub fn begin_refresh(&mut self) -> Option<RefreshTicket> {
        let active = self.session.as_mut()?;
        active.issued += 1;
        Some(RefreshTicket {
            epoch: active.epoch,
            sequence: active.issued,
        })
    }

    pub fn commit_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<LotterySnapshot, ClientError>,
    ) -> RefreshOutcome {
        let Some(active) = self.session.as_mut() else {
            return RefreshOutcome::Stale;
        };
        if ticket.epoch != active.epoch || ticket.sequence <= active.committed {
            tracing::debug!(
                epoch = ticket.epoch,
                sequence = ticket.sequence,
                committed = active.committed,
                "discarding stale snapshot read"
            );
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(mut snapshot) => {
                let revision = active.snapshot.as_ref().map_or(1, |s| s.revision + 1);
                snapshot.revision = revision;
                active.committed = ticket.sequence;
                active.snapshot = Some(snapshot);
                self.sync_timers();
                RefreshOutcome::Applied { revision }
            }
            Err(err) => {
                self.report(&err);
                RefreshOutcome::Failed
            }
        }
    }

    pub fn submit_action(&mut self, action: LotteryAction) -> Result<B256, ClientError> {
        if !self.is_ready() {
            tracing::debug!(?action, "ignoring action, client not ready");
            return Err(ClientError::NotReady);
        }

        self.ui.loading = true;
        self.ui.error = None;
        let result = self.execute_action(action);
        self.ui.loading = false;

        match result {
            Ok(tx_hash) => {
                tracing::info!(?action, %tx_hash, "transaction confirmed");
                self.ui.push_notice(completion_notice(action));
                Ok(tx_hash)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// One turn of the event loop: wallet events, contract events, due timers.
    pub fn pump(&mut self) {
        if self.shut_down {
            return;
        }
        self.process_wallet_events();
        self.process_contract_events();
        match self.clock.now_ms() {
            Ok(now_ms) => self.fire_timers(now_ms),
            Err(e) => tracing::warn!(error = %e, "clock unavailable, skipping timers"),
        }
    }

    pub fn view(&self) -> ClientView {
        let screen = match (self.phase, self.session.as_ref()) {
            (ConnectionPhase::Connected, Some(active)) => {
                let snapshot = active.snapshot.clone().unwrap_or_default();
                Screen::Status(Box::new(StatusPanel::derive(
                    &active.session,
                    &snapshot,
                    self.ui.countdown.clone(),
                    format_ether(self.config.entry_fee_wei),
                )))
            }
            (ConnectionPhase::NetworkMismatch { account }, _) => Screen::NetworkMismatch {
                account,
                network_name: self.config.network.chain_name.clone(),
            },
            (phase, _) => Screen::ConnectPrompt {
                connecting: phase == ConnectionPhase::Connecting,
            },
        };
        ClientView {
            screen,
            loading: self.ui.loading,
            error: self.ui.error.clone(),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.ui.take_notices()
    }

    fn establish_session(&mut self) -> Result<Address, ClientError> {
        let accounts = self
            .wallet
            .request_accounts()
            .map_err(ClientError::from_wallet)?;
        let account = accounts.first().copied().ok_or(ClientError::NoAccounts)?;
        self.ensure_network(account)?;

        let contract = self
            .connector
            .bind(self.config.contract_address, account)
            .map_err(ClientError::from_wallet)?;
        let owner = contract.owner().map_err(ClientError::from_wallet)?;
        // Address compares bytes, so checksum casing never matters.
        let is_owner = owner == account;

        self.next_epoch += 1;
        let session = Session {
            account,
            is_owner,
            network_ok: true,
        };
        let mut active = ActiveSession::new(session, contract, self.next_epoch, &self.config);
        match SubscriptionSet::open(&active.contract) {
            Ok(set) => active.subscriptions = set,
            Err(e) => self.report(&ClientError::ListenerSetupFailed(e)),
        }

        self.session = Some(active);
        self.phase = ConnectionPhase::Connected;
        self.ui.error = None;
        self.refresh_snapshot();
        Ok(account)
    }

    fn ensure_network(&mut self, account: Address) -> Result<(), ClientError> {
        let expected = self.config.network.chain_id;
        let current = self.wallet.chain_id().map_err(ClientError::from_wallet)?;
        if current == expected {
            return Ok(());
        }

        tracing::info!(current, expected, "wallet on unexpected chain, requesting switch");
        if let Err(err) = self.switch_to_expected() {
            self.phase = ConnectionPhase::NetworkMismatch { account };
            return Err(err);
        }
        let current = self.wallet.chain_id().map_err(ClientError::from_wallet)?;
        if current != expected {
            self.phase = ConnectionPhase::NetworkMismatch { account };
            return Err(self.wrong_network(current));
        }
        Ok(())
    }

    fn switch_to_expected(&self) -> Result<(), ClientError> {
        let network = &self.config.network;
        match self.wallet.switch_chain(network.chain_id) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some(UNRECOGNIZED_CHAIN_CODE) => {
                tracing::info!(chain_id = network.chain_id, "wallet does not know chain, adding it");
                self.wallet
                    .add_chain(network)
                    .map_err(|e| self.switch_failure(e, true))
            }
            Err(e) => Err(self.switch_failure(e, false)),
        }
    }

    fn switch_failure(&self, err: PortError, adding: bool) -> ClientError {
        match err {
            PortError::Unavailable(_) => ClientError::WalletAbsent,
            e if e.is_user_rejection() => ClientError::UserRejected,
            e => ClientError::NetworkSwitchFailed {
                network_name: self.config.network.chain_name.clone(),
                adding,
                reason: e.to_string(),
            },
        }
    }

    fn wrong_network(&self, actual: u64) -> ClientError {
        ClientError::WrongNetwork {
            expected: self.config.network.chain_id,
            actual,
            network_name: self.config.network.chain_name.clone(),
        }
    }

    fn is_ready(&self) -> bool {
        !self.shut_down
            && self.phase == ConnectionPhase::Connected
            && self.session.as_ref().is_some_and(|a| {
                a.session.network_ok && a.contract.signer() == a.session.account
            })
    }

    fn execute_action(&mut self, action: LotteryAction) -> Result<B256, ClientError> {
        let value = if action.is_payable() {
            self.config.entry_fee_wei
        } else {
            U256::ZERO
        };
        let active = self.session.as_ref().ok_or(ClientError::NotReady)?;
        let tx_hash = active
            .contract
            .submit(action, value)
            .map_err(|e| ClientError::write(action, e))?;
        tracing::info!(?action, %tx_hash, "transaction submitted, awaiting confirmation");
        active
            .contract
            .wait_for_confirmation(tx_hash)
            .map_err(|e| ClientError::write(action, e))?;
        self.refresh_snapshot();
        Ok(tx_hash)
    }

    fn known_account(&self) -> Option<Address> {
        match self.phase {
            ConnectionPhase::NetworkMismatch { account } => Some(account),
            _ => self.session().map(|s| s.account),
        }
    }

    fn process_wallet_events(&mut self) {
        let events = match self.wallet.drain_events() {
            Ok(events) => events,
            Err(PortError::Unavailable(_)) => return,
            Err(e) => {
                tracing::warn!(error = %e, "draining wallet events failed");
                return;
            }
        };
        for event in events {
            tracing::debug!(sequence = event.sequence(), kind = ?event.kind(), "wallet event");
            match event {
                WalletEvent::ChainChanged { chain_id, .. } => self.on_chain_changed(chain_id),
                WalletEvent::AccountsChanged { accounts, .. } => {
                    self.on_accounts_changed(&accounts)
                }
            }
        }
    }

    fn on_chain_changed(&mut self, chain_id: u64) {
        if chain_id != self.config.network.chain_id {
            let Some(account) = self.known_account() else {
                tracing::debug!(chain_id, "chain changed while disconnected");
                return;
            };
            tracing::warn!(chain_id, "wallet moved to unexpected chain");
            self.end_session();
            self.phase = ConnectionPhase::NetworkMismatch { account };
            let err = self.wrong_network(chain_id);
            self.report(&err);
            return;
        }
        if !self.wallet.is_available() {
            return;
        }
        tracing::info!(chain_id, "chain changed, reconnecting");
        let _ = self.connect();
    }

    fn on_accounts_changed(&mut self, accounts: &[Address]) {
        match accounts.first() {
            None => {
                let Some(current) = self.known_account() else {
                    return;
                };
                tracing::info!(account = %current, "wallet reported no accounts, ending session");
                self.disconnect();
                self.report(&ClientError::NoAccounts);
            }
            Some(next) => {
                if !self.wallet.is_available() {
                    return;
                }
                tracing::info!(to = %next, "accounts changed, reconnecting");
                let _ = self.connect();
            }
        }
    }

    fn process_contract_events(&mut self) {
        let events = match self.session.as_ref() {
            Some(active) => match active.contract.drain_events() {
                Ok(events) => events
                    .into_iter()
                    .filter(|e| active.subscriptions.contains(e.subscription))
                    .collect::<Vec<_>>(),
                Err(e) => {
                    tracing::warn!(error = %e, "draining contract events failed");
                    return;
                }
            },
            None => return,
        };
        for event in events {
            tracing::info!(
                event = event.kind.event_name(),
                block = ?event.block_number,
                "contract event, refreshing snapshot"
            );
            self.refresh_snapshot();
        }
    }

    fn fire_timers(&mut self, now_ms: u64) {
        let (countdown_due, poll_due) = match self.session.as_mut() {
            Some(active) => (
                active.countdown.fire_if_due(now_ms),
                active.randomness_poll.fire_if_due(now_ms),
            ),
            None => return,
        };
        if countdown_due {
            self.update_countdown(now_ms);
        }
        if poll_due {
            self.poll_winner();
        }
    }

    fn update_countdown(&mut self, now_ms: u64) {
        let Some(active) = self.session.as_mut() else {
            return;
        };
        let Some(end_time) = active.countdown_end else {
            active.countdown.disarm();
            return;
        };
        let countdown = Countdown::between(now_ms / 1_000, end_time);
        if countdown.is_terminal() {
            active.countdown.disarm();
        }
        self.ui.countdown = Some(countdown.to_string());
    }

    fn poll_winner(&mut self) {
        let Some(active) = self.session.as_ref() else {
            return;
        };
        match active.contract.winner() {
            Ok(raw) => {
                if let Some(winner) = winner_from_raw(raw) {
                    self.settle_randomness(winner);
                }
            }
            Err(e) => self.report(&ClientError::WinnerCheckFailed(e)),
        }
    }

    fn settle_randomness(&mut self, winner: Address) {
        let Some(active) = self.session.as_mut() else {
            return;
        };
        let Some(current) = active.snapshot.as_ref() else {
            return;
        };
        let mut next = current.with_winner_resolved(winner);
        next.revision = current.revision + 1;
        active.snapshot = Some(next);
        tracing::info!(%winner, "randomness fulfilled, winner selected");
        self.ui.push_notice(Notice::success("Winner selected!"));
        self.sync_timers();
    }

    /// Re-derives both timers from the current snapshot.
    fn sync_timers(&mut self) {
        let now_ms = match self.clock.now_ms() {
            Ok(now_ms) => now_ms,
            Err(e) => {
                tracing::warn!(error = %e, "clock unavailable, timers left as-is");
                return;
            }
        };
        let Some(active) = self.session.as_mut() else {
            return;
        };
        let Some((pending, open, end_time)) = active
            .snapshot
            .as_ref()
            .map(|s| (s.pending_randomness, s.open, s.end_time))
        else {
            return;
        };

        if pending {
            if active.randomness_poll.arm(now_ms) {
                tracing::info!("randomness pending, polling winner");
            }
        } else if active.randomness_poll.is_armed() {
            tracing::debug!("randomness no longer pending, stopping winner poll");
            active.randomness_poll.disarm();
        }

        let countdown_end = (open && end_time > 0).then_some(end_time);
        if countdown_end == active.countdown_end {
            return;
        }
        active.countdown_end = countdown_end;
        active.countdown.disarm();
        match countdown_end {
            Some(end_time) => {
                let countdown = Countdown::between(now_ms / 1_000, end_time);
                if !countdown.is_terminal() {
                    active.countdown.arm(now_ms);
                }
                self.ui.countdown = Some(countdown.to_string());
            }
            None => self.ui.countdown = None,
        }
    }

    fn end_session(&mut self) {
        if let Some(active) = self.session.take() {
            tracing::info!(account = %active.session.account, "closing session");
            active.close();
        }
        self.ui.countdown = None;
    }

    fn report(&mut self, err: &ClientError) {
        tracing::warn!(error = %err, "lottery client error");
        let message = err.user_message();
        if err.is_inline() {
            self.ui.error = Some(message.clone());
        }
        self.ui.push_notice(Notice::error(message));
    }
}

impl<W, N, K> Drop for ContractSyncClient<W, N, K>
where
    W: WalletPort,
    N: ContractConnector,
    K: ClockPort,
{
    fn drop(&mut self) {
        self.end_session();
    }
}

/// Reads every snapshot field; the first failing read aborts the whole set.
pub fn read_snapshot<C: LotteryContractPort>(
    contract: &C,
    account: Address,
) -> Result<LotterySnapshot, ClientError> {
    let read = |field: &'static str| move |source: PortError| ClientError::ReadFailed { field, source };

    let open = contract.lottery_open().map_err(read("lotteryOpen"))?;
    let players = contract.players().map_err(read("getPlayers"))?;
    let winner = contract.winner().map_err(read("winner"))?;
    let caller_is_member = contract.is_member(account).map_err(read("isMember"))?;
    let prize_pool_wei = contract.balance().map_err(read("getBalance"))?;
    let pending_randomness = contract.pending_randomness().map_err(read("pendingVRF"))?;
    let end_time = contract.end_time().map_err(read("endTime"))?;

    Ok(LotterySnapshot {
        open,
        players,
        winner: winner_from_raw(winner),
        caller_is_member,
        prize_pool_wei,
        pending_randomness,
        end_time,
        revision: 0,
    })
}

fn completion_notice(action: LotteryAction) -> Notice {
    match action {
        LotteryAction::Enter => Notice::success("Entered lottery successfully!"),
        LotteryAction::Start => Notice::success("Lottery started successfully!"),
        LotteryAction::End => Notice::info("Lottery ended, waiting for randomness callback..."),
        LotteryAction::Withdraw => Notice::success("Prize withdrawn successfully!"),
    }
}
