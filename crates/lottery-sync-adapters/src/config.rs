use alloy::primitives::Address;
use thiserror::Error;

use lottery_sync_core::{ClientConfig, DEFAULT_CONTRACT_ADDRESS};

pub const ENV_CONTRACT_ADDRESS: &str = "LOTTERY_CONTRACT_ADDRESS";
pub const ENV_WALLET_PROXY_URL: &str = "LOTTERY_WALLET_PROXY_URL";
pub const ENV_RUNTIME_PROFILE: &str = "LOTTERY_RUNTIME_PROFILE";
pub const ENV_RPC_TIMEOUT_MS: &str = "LOTTERY_RPC_TIMEOUT_MS";
pub const ENV_RECEIPT_TIMEOUT_MS: &str = "LOTTERY_RECEIPT_TIMEOUT_MS";
pub const ENV_PUMP_INTERVAL_MS: &str = "LOTTERY_PUMP_INTERVAL_MS";

/// Development falls back to the in-process wallet; Production insists on a real one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(RuntimeProfile::Development),
            "prod" | "production" => Ok(RuntimeProfile::Production),
            other => Err(ConfigError::Invalid {
                key: ENV_RUNTIME_PROFILE,
                value: other.to_owned(),
                reason: "expected development or production".to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct LotteryAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub contract_address: Address,
    pub wallet_proxy_url: Option<String>,
    pub rpc_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_timeout_ms: u64,
    pub pump_interval_ms: u64,
    /// Simulated lottery only: round length set by `startLottery`.
    pub simulated_round_secs: u64,
    /// Simulated lottery only: delay before the randomness callback lands.
    pub simulated_fulfill_delay_ms: u64,
}

impl Default for LotteryAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            wallet_proxy_url: None,
            rpc_timeout_ms: 15_000,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_ms: 120_000,
            pump_interval_ms: 250,
            simulated_round_secs: 300,
            simulated_fulfill_delay_ms: 12_000,
        }
    }
}

impl LotteryAdapterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(raw) = get(ENV_RUNTIME_PROFILE) {
            cfg.runtime_profile = RuntimeProfile::parse(&raw)?;
        }
        if let Some(raw) = get(ENV_CONTRACT_ADDRESS) {
            cfg.contract_address = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: ENV_CONTRACT_ADDRESS,
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        cfg.wallet_proxy_url = get(ENV_WALLET_PROXY_URL).map(|v| v.trim().to_owned());
        if let Some(raw) = get(ENV_RPC_TIMEOUT_MS) {
            cfg.rpc_timeout_ms = parse_millis(ENV_RPC_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_RECEIPT_TIMEOUT_MS) {
            cfg.receipt_timeout_ms = parse_millis(ENV_RECEIPT_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_PUMP_INTERVAL_MS) {
            cfg.pump_interval_ms = parse_millis(ENV_PUMP_INTERVAL_MS, &raw)?;
        }
        Ok(cfg)
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            contract_address: self.contract_address,
            ..ClientConfig::default()
        }
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::Invalid {
            key,
            value: raw.to_owned(),
            reason: "expected a positive number of milliseconds".to_owned(),
        }),
        Ok(ms) => Ok(ms),
    }
}
