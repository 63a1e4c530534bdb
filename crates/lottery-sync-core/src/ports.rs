use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{
    ContractEvent, ContractEventKind, LotteryAction, NetworkDefinition, SubscriptionId,
    WalletEvent,
};

/// EIP-1193 `4001`: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326 `4902`: the wallet does not know the requested chain.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC internal error; wallets report insufficient funds with it.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{message}")]
    Provider { code: i64, message: String },
}

impl PortError {
    pub fn provider(code: i64, message: impl Into<String>) -> Self {
        PortError::Provider {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            PortError::Provider { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(USER_REJECTED_CODE)
    }
}

/// Wallet-side half of an EIP-1193 provider.
pub trait WalletPort {
    fn is_available(&self) -> bool;
    fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    fn chain_id(&self) -> Result<u64, PortError>;
    fn switch_chain(&self, chain_id: u64) -> Result<(), PortError>;
    fn add_chain(&self, network: &NetworkDefinition) -> Result<(), PortError>;
    fn drain_events(&self) -> Result<Vec<WalletEvent>, PortError>;
}

/// A lottery contract bound to one address and one signing account.
pub trait LotteryContractPort {
    fn address(&self) -> Address;
    fn signer(&self) -> Address;

    fn owner(&self) -> Result<Address, PortError>;
    fn lottery_open(&self) -> Result<bool, PortError>;
    fn players(&self) -> Result<Vec<Address>, PortError>;
    fn winner(&self) -> Result<Address, PortError>;
    fn is_member(&self, account: Address) -> Result<bool, PortError>;
    fn balance(&self) -> Result<U256, PortError>;
    fn pending_randomness(&self) -> Result<bool, PortError>;
    fn end_time(&self) -> Result<u64, PortError>;

    fn submit(&self, action: LotteryAction, value: U256) -> Result<B256, PortError>;
    fn wait_for_confirmation(&self, tx_hash: B256) -> Result<(), PortError>;

    fn subscribe(&self, kind: ContractEventKind) -> Result<SubscriptionId, PortError>;
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), PortError>;
    /// Events delivered since the last drain, for live subscriptions only.
    fn drain_events(&self) -> Result<Vec<ContractEvent>, PortError>;
}

pub trait ContractConnector {
    type Contract: LotteryContractPort;

    fn bind(&self, address: Address, signer: Address) -> Result<Self::Contract, PortError>;
}

pub trait ClockPort {
    fn now_ms(&self) -> Result<u64, PortError>;
}
