#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, B256, U256};

use lottery_sync_core::{
    ClientConfig, ClockPort, ContractConnector, ContractEvent, ContractEventKind,
    ContractSyncClient, LotteryAction, LotteryContractPort, NetworkDefinition, PortError,
    SubscriptionId, WalletEvent, WalletPort,
};

pub const SEPOLIA: u64 = 11_155_111;
pub const START_MS: u64 = 1_739_750_400_000;

#[derive(Debug, Clone, Default)]
pub struct TestClock {
    now: Arc<AtomicU64>,
}

impl TestClock {
    pub fn at(now_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn now_secs(&self) -> u64 {
        self.now.load(Ordering::SeqCst) / 1_000
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

#[derive(Debug)]
pub struct WalletState {
    pub available: bool,
    pub accounts: Vec<Address>,
    pub chain_id: u64,
    pub known_chains: HashSet<u64>,
    pub failures: HashMap<&'static str, PortError>,
    pub events: Vec<WalletEvent>,
    pub sequence: u64,
    pub calls: Vec<&'static str>,
    /// Acknowledge chain switches without moving.
    pub stuck: bool,
}

#[derive(Debug, Clone)]
pub struct FakeWallet {
    pub state: Arc<Mutex<WalletState>>,
}

impl FakeWallet {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState {
                available: true,
                accounts: vec![account],
                chain_id,
                known_chains: HashSet::from([1, SEPOLIA]),
                failures: HashMap::new(),
                events: Vec::new(),
                sequence: 0,
                calls: Vec::new(),
                stuck: false,
            })),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> R {
        let mut g = self.state.lock().expect("wallet lock");
        f(&mut g)
    }

    pub fn fail(&self, method: &'static str, err: PortError) {
        self.with(|s| s.failures.insert(method, err));
    }

    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        self.with(|s| {
            s.accounts = accounts.clone();
            s.sequence += 1;
            let sequence = s.sequence;
            s.events.push(WalletEvent::AccountsChanged { sequence, accounts });
        });
    }

    pub fn emit_chain_changed(&self, chain_id: u64) {
        self.with(|s| {
            s.chain_id = chain_id;
            s.sequence += 1;
            let sequence = s.sequence;
            s.events.push(WalletEvent::ChainChanged { sequence, chain_id });
        });
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.with(|s| s.calls.clone())
    }

    fn enter(&self, method: &'static str) -> Result<(), PortError> {
        self.with(|s| {
            s.calls.push(method);
            if !s.available {
                return Err(PortError::Unavailable("no provider".to_owned()));
            }
            match s.failures.remove(method) {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

impl WalletPort for FakeWallet {
    fn is_available(&self) -> bool {
        self.with(|s| s.available)
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.enter("eth_requestAccounts")?;
        Ok(self.with(|s| s.accounts.clone()))
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        self.enter("eth_chainId")?;
        Ok(self.with(|s| s.chain_id))
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.enter("wallet_switchEthereumChain")?;
        self.with(|s| {
            if !s.known_chains.contains(&chain_id) {
                return Err(PortError::provider(4902, "Unrecognized chain ID"));
            }
            if !s.stuck {
                s.chain_id = chain_id;
            }
            Ok(())
        })
    }

    fn add_chain(&self, network: &NetworkDefinition) -> Result<(), PortError> {
        self.enter("wallet_addEthereumChain")?;
        self.with(|s| {
            s.known_chains.insert(network.chain_id);
            s.chain_id = network.chain_id;
        });
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError> {
        Ok(self.with(|s| std::mem::take(&mut s.events)))
    }
}

#[derive(Debug)]
pub struct LotteryState {
    pub owner: Address,
    pub open: bool,
    pub players: Vec<Address>,
    pub winner: Address,
    pub winner_script: VecDeque<Address>,
    pub balance: U256,
    pub pending: bool,
    pub end_time: u64,
    pub failing_reads: HashSet<&'static str>,
    pub reads: Vec<&'static str>,
    pub submit_error: Option<PortError>,
    pub confirm_error: Option<PortError>,
    pub submitted: Vec<(Address, LotteryAction, U256)>,
    pub next_subscription: u64,
    pub live_subscriptions: BTreeMap<SubscriptionId, ContractEventKind>,
    pub subscribe_error: Option<PortError>,
    pub queued_events: Vec<ContractEventKind>,
}

impl LotteryState {
    fn read(&mut self, field: &'static str) -> Result<(), PortError> {
        self.reads.push(field);
        if self.failing_reads.contains(field) {
            return Err(PortError::Transport(format!("{field} call reverted")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeConnector {
    pub state: Arc<Mutex<LotteryState>>,
}

impl FakeConnector {
    pub fn new(owner: Address) -> Self {
        Self {
            state: Arc::new(Mutex::new(LotteryState {
                owner,
                open: false,
                players: Vec::new(),
                winner: Address::ZERO,
                winner_script: VecDeque::new(),
                balance: U256::ZERO,
                pending: false,
                end_time: 0,
                failing_reads: HashSet::new(),
                reads: Vec::new(),
                submit_error: None,
                confirm_error: None,
                submitted: Vec::new(),
                next_subscription: 0,
                live_subscriptions: BTreeMap::new(),
                subscribe_error: None,
                queued_events: Vec::new(),
            })),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut LotteryState) -> R) -> R {
        let mut g = self.state.lock().expect("lottery lock");
        f(&mut g)
    }

    pub fn reads_of(&self, field: &str) -> usize {
        self.with(|s| s.reads.iter().filter(|r| **r == field).count())
    }

    pub fn live_subscriptions(&self) -> usize {
        self.with(|s| s.live_subscriptions.len())
    }

    pub fn emit(&self, kind: ContractEventKind) {
        self.with(|s| s.queued_events.push(kind));
    }
}

impl ContractConnector for FakeConnector {
    type Contract = FakeContract;

    fn bind(&self, address: Address, signer: Address) -> Result<FakeContract, PortError> {
        Ok(FakeContract {
            state: Arc::clone(&self.state),
            address,
            signer,
        })
    }
}

#[derive(Debug)]
pub struct FakeContract {
    state: Arc<Mutex<LotteryState>>,
    address: Address,
    signer: Address,
}

impl FakeContract {
    fn with<R>(&self, f: impl FnOnce(&mut LotteryState) -> R) -> R {
        let mut g = self.state.lock().expect("lottery lock");
        f(&mut g)
    }
}

impl LotteryContractPort for FakeContract {
    fn address(&self) -> Address {
        self.address
    }

    fn signer(&self) -> Address {
        self.signer
    }

    fn owner(&self) -> Result<Address, PortError> {
        self.with(|s| s.read("owner").map(|_| s.owner))
    }

    fn lottery_open(&self) -> Result<bool, PortError> {
        self.with(|s| s.read("lotteryOpen").map(|_| s.open))
    }

    fn players(&self) -> Result<Vec<Address>, PortError> {
        self.with(|s| s.read("getPlayers").map(|_| s.players.clone()))
    }

    fn winner(&self) -> Result<Address, PortError> {
        self.with(|s| {
            s.read("winner")?;
            if let Some(next) = s.winner_script.pop_front() {
                s.winner = next;
            }
            Ok(s.winner)
        })
    }

    fn is_member(&self, account: Address) -> Result<bool, PortError> {
        self.with(|s| s.read("isMember").map(|_| s.players.contains(&account)))
    }

    fn balance(&self) -> Result<U256, PortError> {
        self.with(|s| s.read("getBalance").map(|_| s.balance))
    }

    fn pending_randomness(&self) -> Result<bool, PortError> {
        self.with(|s| s.read("pendingVRF").map(|_| s.pending))
    }

    fn end_time(&self) -> Result<u64, PortError> {
        self.with(|s| s.read("endTime").map(|_| s.end_time))
    }

    fn submit(&self, action: LotteryAction, value: U256) -> Result<B256, PortError> {
        let signer = self.signer;
        self.with(|s| {
            if let Some(err) = s.submit_error.take() {
                return Err(err);
            }
            s.submitted.push((signer, action, value));
            match action {
                LotteryAction::Enter => {
                    s.players.push(signer);
                    s.balance += value;
                }
                LotteryAction::Start => s.open = true,
                LotteryAction::End => {
                    s.open = false;
                    s.pending = true;
                }
                LotteryAction::Withdraw => s.balance = U256::ZERO,
            }
            Ok(keccak256(s.submitted.len().to_be_bytes()))
        })
    }

    fn wait_for_confirmation(&self, _tx_hash: B256) -> Result<(), PortError> {
        self.with(|s| match s.confirm_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        })
    }

    fn subscribe(&self, kind: ContractEventKind) -> Result<SubscriptionId, PortError> {
        self.with(|s| {
            if let Some(err) = s.subscribe_error.take() {
                return Err(err);
            }
            s.next_subscription += 1;
            let id = SubscriptionId(s.next_subscription);
            s.live_subscriptions.insert(id, kind);
            Ok(id)
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError> {
        self.with(|s| {
            s.live_subscriptions.remove(&id);
        });
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<ContractEvent>, PortError> {
        self.with(|s| {
            let queued = std::mem::take(&mut s.queued_events);
            let mut out = Vec::new();
            for kind in queued {
                for (id, live_kind) in &s.live_subscriptions {
                    if *live_kind == kind {
                        out.push(ContractEvent {
                            subscription: *id,
                            kind,
                            block_number: None,
                        });
                    }
                }
            }
            Ok(out)
        })
    }
}

pub type TestClient = ContractSyncClient<FakeWallet, FakeConnector, TestClock>;

pub fn player_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid player address")
}

pub fn owner_address() -> Address {
    "0x00000000000000000000000000000000000000aa"
        .parse()
        .expect("valid owner address")
}

pub fn other_address() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("valid other address")
}

pub fn new_client(account: Address) -> TestClient {
    ContractSyncClient::new(
        FakeWallet::new(account, SEPOLIA),
        FakeConnector::new(owner_address()),
        TestClock::at(START_MS),
        ClientConfig::default(),
    )
}

pub fn connected_client(account: Address) -> TestClient {
    let mut client = new_client(account);
    client.connect().expect("connect");
    client.take_notices();
    client
}
