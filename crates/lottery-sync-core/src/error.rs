use thiserror::Error;

use crate::domain::LotteryAction;
use crate::ports::{PortError, INTERNAL_ERROR_CODE};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("no wallet provider available")]
    WalletAbsent,
    #[error("user rejected the wallet request")]
    UserRejected,
    #[error("wallet returned no accounts")]
    NoAccounts,
    #[error("wrong network: expected chain {expected}, wallet is on {actual}")]
    WrongNetwork {
        expected: u64,
        actual: u64,
        network_name: String,
    },
    #[error("network switch failed (adding={adding}): {reason}")]
    NetworkSwitchFailed {
        network_name: String,
        adding: bool,
        reason: String,
    },
    #[error("wallet request failed: {0}")]
    Rpc(PortError),
    #[error("read of {field} failed: {source}")]
    ReadFailed {
        field: &'static str,
        source: PortError,
    },
    #[error("winner check failed: {0}")]
    WinnerCheckFailed(PortError),
    #[error("{action:?} rejected by user")]
    TxRejected { action: LotteryAction },
    #[error("{action:?} failed, insufficient funds: {reason}")]
    InsufficientFunds {
        action: LotteryAction,
        reason: String,
    },
    #[error("{action:?} failed: {reason}")]
    WriteFailed {
        action: LotteryAction,
        reason: String,
    },
    #[error("event listener setup failed: {0}")]
    ListenerSetupFailed(PortError),
    #[error("client is not connected to the lottery")]
    NotReady,
}

impl ClientError {
    /// Classifies a wallet-level failure outside of transaction submission.
    pub fn from_wallet(err: PortError) -> Self {
        match err {
            PortError::Unavailable(_) => ClientError::WalletAbsent,
            e if e.is_user_rejection() => ClientError::UserRejected,
            e => ClientError::Rpc(e),
        }
    }

    pub fn write(action: LotteryAction, err: PortError) -> Self {
        if err.is_user_rejection() {
            return ClientError::TxRejected { action };
        }
        if err.code() == Some(INTERNAL_ERROR_CODE) {
            return ClientError::InsufficientFunds {
                action,
                reason: err.to_string(),
            };
        }
        ClientError::WriteFailed {
            action,
            reason: err.to_string(),
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ClientError::WalletAbsent => "Please install MetaMask!".to_owned(),
            ClientError::UserRejected => "User rejected request".to_owned(),
            ClientError::NoAccounts => "No accounts detected".to_owned(),
            ClientError::WrongNetwork { network_name, .. } => {
                format!("Please switch to {network_name}")
            }
            ClientError::NetworkSwitchFailed {
                network_name,
                adding: true,
                reason,
            } => format!("Failed to add {network_name} network: {reason}"),
            ClientError::NetworkSwitchFailed { reason, .. } => {
                format!("Failed to switch network: {reason}")
            }
            ClientError::Rpc(e) => format!("Failed to connect wallet: {e}"),
            ClientError::ReadFailed { source, .. } => format!("Failed to update state: {source}"),
            ClientError::WinnerCheckFailed(e) => format!("Failed to check winner: {e}"),
            ClientError::TxRejected { .. } => "Transaction rejected by user".to_owned(),
            ClientError::InsufficientFunds { .. } => {
                "Insufficient funds or transaction failed".to_owned()
            }
            ClientError::WriteFailed { action, reason } => {
                format!("Failed to {}: {reason}", action.verb())
            }
            ClientError::ListenerSetupFailed(e) => {
                format!("Failed to subscribe to lottery events: {e}")
            }
            ClientError::NotReady => "Connect your wallet first".to_owned(),
        }
    }

    /// Whether the message also belongs in the inline error line, not only a toast.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            ClientError::WrongNetwork { .. }
                | ClientError::NetworkSwitchFailed { .. }
                | ClientError::TxRejected { .. }
                | ClientError::InsufficientFunds { .. }
                | ClientError::WriteFailed { .. }
        )
    }
}
