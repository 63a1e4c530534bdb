use alloy::primitives::{address, Address, U256};

use crate::domain::NetworkDefinition;

/// Deployed lottery on Sepolia.
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("9FDBBBeda4495fc63A2E90886D6EDeFf52343233");
/// 0.01 ETH.
pub const DEFAULT_ENTRY_FEE_WEI: u128 = 10_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub contract_address: Address,
    pub network: NetworkDefinition,
    pub entry_fee_wei: U256,
    pub randomness_poll_interval_ms: u64,
    pub countdown_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            network: NetworkDefinition::sepolia(),
            entry_fee_wei: U256::from(DEFAULT_ENTRY_FEE_WEI),
            randomness_poll_interval_ms: 5_000,
            countdown_interval_ms: 1_000,
        }
    }
}
