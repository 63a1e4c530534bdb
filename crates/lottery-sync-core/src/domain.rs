use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// One wei-denominated ether, `10^18`.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// The connected wallet identity for the lifetime of one connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account: Address,
    pub is_owner: bool,
    pub network_ok: bool,
}

/// Cached mirror of the remote lottery contract.
///
/// Always replaced as a whole; `revision` counts replacements within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotterySnapshot {
    pub open: bool,
    pub players: Vec<Address>,
    pub winner: Option<Address>,
    pub caller_is_member: bool,
    pub prize_pool_wei: U256,
    pub pending_randomness: bool,
    pub end_time: u64,
    pub revision: u64,
}

impl LotterySnapshot {
    pub fn prize_pool_ether(&self) -> String {
        format_ether(self.prize_pool_wei)
    }

    /// Copy of this snapshot with the randomness request settled on `winner`.
    pub fn with_winner_resolved(&self, winner: Address) -> Self {
        Self {
            winner: winner_from_raw(winner),
            pending_randomness: false,
            ..self.clone()
        }
    }
}

/// Maps the contract's zero-address sentinel to `None`.
pub fn winner_from_raw(raw: Address) -> Option<Address> {
    if raw == Address::ZERO {
        None
    } else {
        Some(raw)
    }
}

/// Decimal ether string with trailing zeros trimmed, keeping one fractional digit.
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(WEI_PER_ETHER);
    let whole = wei / unit;
    let frac = wei % unit;
    let mut frac_digits = format!("{:0>18}", frac.to_string());
    while frac_digits.len() > 1 && frac_digits.ends_with('0') {
        frac_digits.pop();
    }
    format!("{whole}.{frac_digits}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LotteryAction {
    Enter,
    Start,
    End,
    Withdraw,
}

impl LotteryAction {
    pub const ALL: [LotteryAction; 4] = [
        LotteryAction::Enter,
        LotteryAction::Start,
        LotteryAction::End,
        LotteryAction::Withdraw,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            LotteryAction::Enter => "enter",
            LotteryAction::Start => "startLottery",
            LotteryAction::End => "endLottery",
            LotteryAction::Withdraw => "withdrawPrize",
        }
    }

    /// Verb phrase used in failure messages ("Failed to {verb}: ...").
    pub fn verb(self) -> &'static str {
        match self {
            LotteryAction::Enter => "enter lottery",
            LotteryAction::Start => "start lottery",
            LotteryAction::End => "end lottery",
            LotteryAction::Withdraw => "withdraw prize",
        }
    }

    pub fn is_payable(self) -> bool {
        matches!(self, LotteryAction::Enter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractEventKind {
    Entered,
    LotteryStarted,
    LotteryEnded,
    PrizeWithdrawn,
}

impl ContractEventKind {
    pub const ALL: [ContractEventKind; 4] = [
        ContractEventKind::Entered,
        ContractEventKind::LotteryStarted,
        ContractEventKind::LotteryEnded,
        ContractEventKind::PrizeWithdrawn,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            ContractEventKind::Entered => "Entered",
            ContractEventKind::LotteryStarted => "LotteryStarted",
            ContractEventKind::LotteryEnded => "LotteryEnded",
            ContractEventKind::PrizeWithdrawn => "PrizeWithdrawn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub subscription: SubscriptionId,
    pub kind: ContractEventKind,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEventKind {
    AccountsChanged,
    ChainChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    AccountsChanged { sequence: u64, accounts: Vec<Address> },
    ChainChanged { sequence: u64, chain_id: u64 },
}

impl WalletEvent {
    pub fn sequence(&self) -> u64 {
        match self {
            WalletEvent::AccountsChanged { sequence, .. }
            | WalletEvent::ChainChanged { sequence, .. } => *sequence,
        }
    }

    pub fn kind(&self) -> WalletEventKind {
        match self {
            WalletEvent::AccountsChanged { .. } => WalletEventKind::AccountsChanged,
            WalletEvent::ChainChanged { .. } => WalletEventKind::ChainChanged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Network parameters in the shape `wallet_addEthereumChain` expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDefinition {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDefinition {
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11_155_111,
            chain_name: "Sepolia Testnet".to_owned(),
            rpc_urls: vec!["https://rpc.sepolia.org".to_owned()],
            native_currency: NativeCurrency {
                name: "Sepolia ETH".to_owned(),
                symbol: "ETH".to_owned(),
                decimals: 18,
            },
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_owned()],
        }
    }

    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "rpcUrls": self.rpc_urls,
            "nativeCurrency": self.native_currency,
            "blockExplorerUrls": self.block_explorer_urls,
        }])
    }
}
