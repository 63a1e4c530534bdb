pub mod client;
pub mod config;
pub mod countdown;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod ports;
pub mod subscription;
pub mod timer;
pub mod view;

pub use client::{read_snapshot, ContractSyncClient, RefreshOutcome, RefreshTicket};
pub use config::{ClientConfig, DEFAULT_CONTRACT_ADDRESS, DEFAULT_ENTRY_FEE_WEI};
pub use countdown::{countdown_for, Countdown, AWAITING_RESULTS};
pub use domain::{
    format_ether, winner_from_raw, ContractEvent, ContractEventKind, LotteryAction,
    LotterySnapshot, NativeCurrency, NetworkDefinition, Session, SubscriptionId, WalletEvent,
    WalletEventKind,
};
pub use eligibility::ActionEligibility;
pub use error::ClientError;
pub use ports::{
    ClockPort, ContractConnector, LotteryContractPort, PortError, WalletPort,
    INTERNAL_ERROR_CODE, UNRECOGNIZED_CHAIN_CODE, USER_REJECTED_CODE,
};
pub use subscription::SubscriptionSet;
pub use timer::RecurringTimer;
pub use view::{
    short_address, ClientView, ConnectionPhase, Notice, NoticeLevel, Screen, StatusPanel,
    UiState,
};
