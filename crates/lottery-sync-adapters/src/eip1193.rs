use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy::primitives::{address, keccak256, Address};
use serde_json::{json, Value};

use lottery_sync_core::{
    NetworkDefinition, PortError, WalletEvent, WalletPort, UNRECOGNIZED_CHAIN_CODE,
};

use crate::rpc::{parse_accounts, parse_quantity, quantity, HttpJsonRpc, RpcPort};
use crate::LotteryAdapterConfig;

/// Wallet boundary speaking EIP-1193 method names.
///
/// `Proxy` forwards every request to a JSON-RPC wallet bridge. `Deterministic`
/// answers from in-process state and is what demos and tests run against.
#[derive(Debug, Clone)]
pub struct Eip1193Adapter {
    mode: ProviderMode,
    state: Arc<Mutex<WalletState>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    Proxy(Arc<HttpJsonRpc>),
}

#[derive(Debug)]
struct WalletState {
    accounts: Vec<Address>,
    chain_id: u64,
    known_chains: Vec<u64>,
    event_seq: u64,
    events: Vec<WalletEvent>,
    fail_next: Vec<(String, PortError)>,
    sent: Vec<Value>,
    /// False until the cache holds something read from the wallet.
    primed: bool,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            accounts: vec![DETERMINISTIC_ACCOUNT],
            chain_id: 1,
            known_chains: vec![1],
            event_seq: 0,
            events: Vec::new(),
            fail_next: Vec::new(),
            sent: Vec::new(),
            primed: true,
        }
    }
}

impl WalletState {
    /// Nothing known yet; the first poll against a bridge only records a baseline.
    fn unknown() -> Self {
        Self {
            accounts: Vec::new(),
            chain_id: 0,
            known_chains: Vec::new(),
            primed: false,
            ..Self::default()
        }
    }

    fn record(&mut self, event: impl FnOnce(u64) -> WalletEvent) {
        self.event_seq = self.event_seq.saturating_add(1);
        let seq = self.event_seq;
        self.events.push(event(seq));
    }
}

/// Account the deterministic wallet starts with.
pub const DETERMINISTIC_ACCOUNT: Address = address!("1000000000000000000000000000000000000001");

impl Default for Eip1193Adapter {
    fn default() -> Self {
        Self::with_config(LotteryAdapterConfig::default())
    }
}

impl Eip1193Adapter {
    pub fn with_config(config: LotteryAdapterConfig) -> Self {
        let mode = match config.wallet_proxy_url {
            Some(ref url) => {
                let timeout = Duration::from_millis(config.rpc_timeout_ms);
                match HttpJsonRpc::new(url.clone(), timeout) {
                    Ok(rpc) => ProviderMode::Proxy(Arc::new(rpc)),
                    Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                        "failed to initialize wallet proxy in production profile: {e}"
                    )),
                    Err(e) => {
                        tracing::warn!(error = %e, "wallet proxy unavailable, using deterministic wallet");
                        ProviderMode::Deterministic
                    }
                }
            }
            None if config.strict_runtime_required() => ProviderMode::Disabled(
                "wallet proxy URL not configured in production runtime profile".to_owned(),
            ),
            None => ProviderMode::Deterministic,
        };
        tracing::info!(mode = mode.label(), "wallet adapter ready");
        let state = match mode {
            ProviderMode::Deterministic => WalletState::default(),
            _ => WalletState::unknown(),
        };
        Self {
            mode,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Deterministic wallet regardless of profile.
    pub fn deterministic() -> Self {
        Self {
            mode: ProviderMode::Deterministic,
            state: Arc::new(Mutex::new(WalletState::default())),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self.mode, ProviderMode::Deterministic)
    }

    pub fn mode_label(&self) -> &'static str {
        self.mode.label()
    }

    fn lock(&self) -> Result<MutexGuard<'_, WalletState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("wallet lock poisoned: {e}")))
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Unavailable(reason.clone()));
        }
        Ok(())
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.accounts = accounts.clone();
        g.record(|sequence| WalletEvent::AccountsChanged { sequence, accounts });
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.chain_id = chain_id;
        if !g.known_chains.contains(&chain_id) {
            g.known_chains.push(chain_id);
        }
        g.record(|sequence| WalletEvent::ChainChanged { sequence, chain_id });
        Ok(())
    }

    /// The next deterministic call to `method` fails with `err`.
    pub fn debug_fail_next(&self, method: &str, err: PortError) -> Result<(), PortError> {
        self.lock()?.fail_next.push((method.to_owned(), err));
        Ok(())
    }

    /// Transactions accepted by the deterministic wallet.
    pub fn debug_sent_transactions(&self) -> Result<Vec<Value>, PortError> {
        Ok(self.lock()?.sent.clone())
    }

    fn deterministic_request(&self, method: &str, params: &Value) -> Result<Value, PortError> {
        let mut g = self.lock()?;
        if let Some(idx) = g.fail_next.iter().position(|(m, _)| m == method) {
            let (_, err) = g.fail_next.remove(idx);
            return Err(err);
        }
        match method {
            "eth_requestAccounts" | "eth_accounts" => Ok(json!(g
                .accounts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>())),
            "eth_chainId" => Ok(json!(quantity(g.chain_id))),
            "wallet_switchEthereumChain" => {
                let chain_id = requested_chain_id(params)?;
                if !g.known_chains.contains(&chain_id) {
                    return Err(PortError::provider(
                        UNRECOGNIZED_CHAIN_CODE,
                        format!("Unrecognized chain ID \"{}\"", quantity(chain_id)),
                    ));
                }
                g.chain_id = chain_id;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let chain_id = requested_chain_id(params)?;
                if !g.known_chains.contains(&chain_id) {
                    g.known_chains.push(chain_id);
                }
                g.chain_id = chain_id;
                Ok(Value::Null)
            }
            "eth_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or(Value::Null);
                let canonical = serde_json::to_vec(&json!([g.sent.len(), &tx])).map_err(|e| {
                    PortError::Validation(format!("tx payload serialization failed: {e}"))
                })?;
                g.sent.push(tx);
                Ok(json!(keccak256(canonical).to_string()))
            }
            _ => Err(PortError::NotImplemented(
                "method not supported by the deterministic wallet",
            )),
        }
    }

    /// Polls the bridge and queues events for anything that moved since the last look.
    fn poll_proxy_changes(&self) -> Result<(), PortError> {
        let accounts = parse_accounts(&self.request("eth_accounts", json!([]))?)?;
        let chain_id = parse_quantity(&self.request("eth_chainId", json!([]))?, "chain id")?;
        let mut g = self.lock()?;
        if !g.primed {
            g.accounts = accounts;
            g.chain_id = chain_id;
            g.primed = true;
            return Ok(());
        }
        if g.accounts != accounts {
            g.accounts = accounts.clone();
            g.record(|sequence| WalletEvent::AccountsChanged { sequence, accounts });
        }
        if g.chain_id != chain_id {
            g.chain_id = chain_id;
            g.record(|sequence| WalletEvent::ChainChanged { sequence, chain_id });
        }
        Ok(())
    }
}

impl ProviderMode {
    fn label(&self) -> &'static str {
        match self {
            ProviderMode::Disabled(_) => "disabled",
            ProviderMode::Deterministic => "deterministic",
            ProviderMode::Proxy(_) => "proxy",
        }
    }
}

impl RpcPort for Eip1193Adapter {
    fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        match &self.mode {
            ProviderMode::Disabled(reason) => Err(PortError::Unavailable(reason.clone())),
            ProviderMode::Proxy(rpc) => rpc.request(method, params),
            ProviderMode::Deterministic => self.deterministic_request(method, &params),
        }
    }
}

impl WalletPort for Eip1193Adapter {
    fn is_available(&self) -> bool {
        self.check_mode().is_ok()
    }

    fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        let accounts = parse_accounts(&self.request("eth_requestAccounts", json!([]))?)?;
        let mut g = self.lock()?;
        g.accounts = accounts.clone();
        g.primed = true;
        Ok(accounts)
    }

    fn chain_id(&self) -> Result<u64, PortError> {
        let chain_id = parse_quantity(&self.request("eth_chainId", json!([]))?, "chain id")?;
        self.lock()?.chain_id = chain_id;
        Ok(chain_id)
    }

    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": quantity(chain_id) }]),
        )?;
        Ok(())
    }

    fn add_chain(&self, network: &NetworkDefinition) -> Result<(), PortError> {
        self.request("wallet_addEthereumChain", network.add_chain_params())?;
        Ok(())
    }

    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError> {
        self.check_mode()?;
        if matches!(self.mode, ProviderMode::Proxy(_)) {
            self.poll_proxy_changes()?;
        }
        Ok(std::mem::take(&mut self.lock()?.events))
    }
}

fn requested_chain_id(params: &Value) -> Result<u64, PortError> {
    let raw = params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .ok_or_else(|| PortError::Validation("chainId parameter missing".to_owned()))?;
    parse_quantity(raw, "chain id")
}
