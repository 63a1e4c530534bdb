pub mod clock;
pub mod config;
pub mod contract;
pub mod eip1193;
pub mod rpc;
pub mod simulated;

pub use clock::SystemClockAdapter;
pub use config::{ConfigError, LotteryAdapterConfig, RuntimeProfile};
pub use contract::{
    action_calldata, event_kind, event_signature, ILottery, ReceiptPolicy, RpcContractConnector,
    RpcLotteryContract,
};
pub use eip1193::{Eip1193Adapter, DETERMINISTIC_ACCOUNT};
pub use rpc::{parse_accounts, parse_quantity, quantity, rpc_error, HttpJsonRpc, RpcPort};
pub use simulated::{SimulatedConnector, SimulatedContract, SimulatedLottery, EXECUTION_REVERTED_CODE};
