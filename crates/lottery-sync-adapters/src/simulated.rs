//! In-memory lottery for the deterministic runtime.
//!
//! Mirrors the deployed contract's rules closely enough to drive a full round
//! from the GUI: owner-only start/end, a fixed entry fee, one entry per
//! account, and a randomness callback that settles the winner some time after
//! `endLottery`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{keccak256, Address, B256, U256};

use lottery_sync_core::{
    ClockPort, ContractConnector, ContractEvent, ContractEventKind, LotteryAction,
    LotteryContractPort, PortError, SubscriptionId,
};

use crate::SystemClockAdapter;

/// JSON-RPC code wallets report for a reverted `eth_call`/`eth_estimateGas`.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug)]
struct Subscription {
    kind: ContractEventKind,
    /// Index into the event log of the next undelivered entry.
    cursor: usize,
}

#[derive(Debug)]
struct ChainState {
    owner: Address,
    entry_fee: U256,
    round_secs: u64,
    fulfill_delay_ms: Option<u64>,
    open: bool,
    players: Vec<Address>,
    winner: Address,
    balance: U256,
    pending: bool,
    end_time: u64,
    ended_at_ms: u64,
    block: u64,
    log: Vec<(u64, ContractEventKind)>,
    mined: BTreeSet<B256>,
    next_subscription: u64,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    paid_out: BTreeMap<Address, U256>,
}

impl ChainState {
    fn mine(&mut self, signer: Address, action: LotteryAction, events: &[ContractEventKind]) -> B256 {
        self.block += 1;
        for kind in events {
            self.log.push((self.block, *kind));
        }
        let mut seed = Vec::with_capacity(48);
        seed.extend_from_slice(&self.block.to_be_bytes());
        seed.extend_from_slice(signer.as_slice());
        seed.extend_from_slice(action.method_name().as_bytes());
        let hash = keccak256(seed);
        self.mined.insert(hash);
        hash
    }

    fn settle(&mut self) {
        if !self.pending {
            return;
        }
        self.winner = match self.players.len() {
            0 => Address::ZERO,
            n => {
                let seed = keccak256(self.block.to_be_bytes());
                let pick = U256::from_be_bytes(seed.0) % U256::from(n);
                self.players[pick.saturating_to::<usize>()]
            }
        };
        self.pending = false;
        self.block += 1;
        tracing::info!(winner = %self.winner, "simulated randomness fulfilled");
    }
}

fn revert(reason: &str) -> PortError {
    PortError::provider(EXECUTION_REVERTED_CODE, format!("execution reverted: {reason}"))
}

/// Shared handle to the simulated chain state.
#[derive(Clone)]
pub struct SimulatedLottery {
    state: Arc<Mutex<ChainState>>,
    clock: Arc<dyn ClockPort + Send + Sync>,
}

impl std::fmt::Debug for SimulatedLottery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedLottery").finish_non_exhaustive()
    }
}

impl SimulatedLottery {
    pub fn new(owner: Address, entry_fee: U256) -> Self {
        Self::with_clock(owner, entry_fee, Arc::new(SystemClockAdapter))
    }

    pub fn with_clock(
        owner: Address,
        entry_fee: U256,
        clock: Arc<dyn ClockPort + Send + Sync>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                owner,
                entry_fee,
                round_secs: 300,
                fulfill_delay_ms: None,
                open: false,
                players: Vec::new(),
                winner: Address::ZERO,
                balance: U256::ZERO,
                pending: false,
                end_time: 0,
                ended_at_ms: 0,
                block: 1,
                log: Vec::new(),
                mined: BTreeSet::new(),
                next_subscription: 0,
                subscriptions: BTreeMap::new(),
                paid_out: BTreeMap::new(),
            })),
            clock,
        }
    }

    pub fn with_round_secs(self, secs: u64) -> Self {
        if let Ok(mut g) = self.state.lock() {
            g.round_secs = secs;
        }
        self
    }

    /// Settle randomness on the first winner read at least `delay_ms` after `endLottery`.
    pub fn with_auto_fulfill(self, delay_ms: u64) -> Self {
        if let Ok(mut g) = self.state.lock() {
            g.fulfill_delay_ms = Some(delay_ms);
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChainState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("simulated chain lock poisoned: {e}")))
    }

    /// The oracle callback: picks a winner among the players and clears the pending flag.
    pub fn fulfill_randomness(&self) -> Result<Address, PortError> {
        let mut g = self.lock()?;
        if !g.pending {
            return Err(revert("No pending request"));
        }
        g.settle();
        Ok(g.winner)
    }

    pub fn live_subscriptions(&self) -> usize {
        self.state.lock().map_or(0, |g| g.subscriptions.len())
    }

    pub fn paid_out(&self, account: Address) -> U256 {
        self.state
            .lock()
            .ok()
            .and_then(|g| g.paid_out.get(&account).copied())
            .unwrap_or(U256::ZERO)
    }

    pub fn connector(&self) -> SimulatedConnector {
        SimulatedConnector {
            lottery: self.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    lottery: SimulatedLottery,
}

impl SimulatedConnector {
    pub fn lottery(&self) -> &SimulatedLottery {
        &self.lottery
    }
}

impl ContractConnector for SimulatedConnector {
    type Contract = SimulatedContract;

    fn bind(&self, address: Address, signer: Address) -> Result<SimulatedContract, PortError> {
        Ok(SimulatedContract {
            lottery: self.lottery.clone(),
            address,
            signer,
            owned: Mutex::new(BTreeSet::new()),
        })
    }
}

#[derive(Debug)]
pub struct SimulatedContract {
    lottery: SimulatedLottery,
    address: Address,
    signer: Address,
    owned: Mutex<BTreeSet<SubscriptionId>>,
}

impl SimulatedContract {
    fn owned(&self) -> Result<MutexGuard<'_, BTreeSet<SubscriptionId>>, PortError> {
        self.owned
            .lock()
            .map_err(|e| PortError::Transport(format!("subscription lock poisoned: {e}")))
    }
}

impl LotteryContractPort for SimulatedContract {
    fn address(&self) -> Address {
        self.address
    }

    fn signer(&self) -> Address {
        self.signer
    }

    fn owner(&self) -> Result<Address, PortError> {
        Ok(self.lottery.lock()?.owner)
    }

    fn lottery_open(&self) -> Result<bool, PortError> {
        Ok(self.lottery.lock()?.open)
    }

    fn players(&self) -> Result<Vec<Address>, PortError> {
        Ok(self.lottery.lock()?.players.clone())
    }

    fn winner(&self) -> Result<Address, PortError> {
        let now_ms = self.lottery.clock.now_ms()?;
        let mut g = self.lottery.lock()?;
        if let Some(delay) = g.fulfill_delay_ms {
            if g.pending && now_ms >= g.ended_at_ms.saturating_add(delay) {
                g.settle();
            }
        }
        Ok(g.winner)
    }

    fn is_member(&self, account: Address) -> Result<bool, PortError> {
        Ok(self.lottery.lock()?.players.contains(&account))
    }

    fn balance(&self) -> Result<U256, PortError> {
        Ok(self.lottery.lock()?.balance)
    }

    fn pending_randomness(&self) -> Result<bool, PortError> {
        Ok(self.lottery.lock()?.pending)
    }

    fn end_time(&self) -> Result<u64, PortError> {
        Ok(self.lottery.lock()?.end_time)
    }

    fn submit(&self, action: LotteryAction, value: U256) -> Result<B256, PortError> {
        let now_ms = self.lottery.clock.now_ms()?;
        let signer = self.signer;
        let mut g = self.lottery.lock()?;
        if value != U256::ZERO && !action.is_payable() {
            return Err(revert("function is not payable"));
        }
        let event = match action {
            LotteryAction::Enter => {
                if !g.open {
                    return Err(revert("Lottery is not open"));
                }
                if value != g.entry_fee {
                    return Err(revert("Incorrect entry fee"));
                }
                if g.players.contains(&signer) {
                    return Err(revert("Already entered"));
                }
                g.players.push(signer);
                g.balance += value;
                ContractEventKind::Entered
            }
            LotteryAction::Start => {
                if signer != g.owner {
                    return Err(revert("Only owner"));
                }
                if g.open || g.pending {
                    return Err(revert("Lottery already running"));
                }
                g.open = true;
                g.players.clear();
                g.winner = Address::ZERO;
                g.end_time = now_ms / 1_000 + g.round_secs;
                ContractEventKind::LotteryStarted
            }
            LotteryAction::End => {
                if signer != g.owner {
                    return Err(revert("Only owner"));
                }
                if !g.open {
                    return Err(revert("Lottery is not open"));
                }
                g.open = false;
                g.pending = true;
                g.ended_at_ms = now_ms;
                ContractEventKind::LotteryEnded
            }
            LotteryAction::Withdraw => {
                if g.winner != signer || signer == Address::ZERO {
                    return Err(revert("Only winner"));
                }
                if g.balance == U256::ZERO {
                    return Err(revert("No prize to withdraw"));
                }
                let prize = std::mem::take(&mut g.balance);
                *g.paid_out.entry(signer).or_default() += prize;
                ContractEventKind::PrizeWithdrawn
            }
        };
        Ok(g.mine(signer, action, &[event]))
    }

    fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), PortError> {
        if self.lottery.lock()?.mined.contains(&tx_hash) {
            Ok(())
        } else {
            Err(PortError::NotFound(format!("transaction {tx_hash}")))
        }
    }

    fn subscribe(&self, kind: ContractEventKind) -> Result<SubscriptionId, PortError> {
        let mut g = self.lottery.lock()?;
        g.next_subscription += 1;
        let id = SubscriptionId(g.next_subscription);
        let cursor = g.log.len();
        g.subscriptions.insert(id, Subscription { kind, cursor });
        self.owned()?.insert(id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        self.owned()?.remove(&id);
        match self.lottery.lock()?.subscriptions.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PortError::NotFound(format!("subscription {}", id.0))),
        }
    }

    fn drain_events(&self) -> Result<Vec<ContractEvent>, PortError> {
        let owned = self.owned()?.clone();
        let mut g = self.lottery.lock()?;
        let state = &mut *g;
        let mut events = Vec::new();
        for id in owned {
            let Some(sub) = state.subscriptions.get_mut(&id) else {
                continue;
            };
            for (block, kind) in &state.log[sub.cursor..] {
                if *kind == sub.kind {
                    events.push(ContractEvent {
                        subscription: id,
                        kind: *kind,
                        block_number: Some(*block),
                    });
                }
            }
            sub.cursor = state.log.len();
        }
        events.sort_by_key(|e| (e.block_number, e.subscription));
        Ok(events)
    }
}
