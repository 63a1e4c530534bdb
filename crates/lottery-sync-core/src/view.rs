//! Presentation model derived from the client state.

use alloy::primitives::Address;

use crate::domain::{LotterySnapshot, Session};
use crate::eligibility::ActionEligibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Toast-style notice, shown once and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub loading: bool,
    pub error: Option<String>,
    pub countdown: Option<String>,
    pub notices: Vec<Notice>,
}

impl UiState {
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    NetworkMismatch { account: Address },
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPanel {
    pub account: Address,
    pub is_owner: bool,
    pub open: bool,
    pub prize_pool: String,
    pub winner: Option<Address>,
    pub players: Vec<Address>,
    pub countdown: Option<String>,
    pub pending_randomness: bool,
    pub actions: ActionEligibility,
    pub entry_fee: String,
}

impl StatusPanel {
    pub fn derive(
        session: &Session,
        snapshot: &LotterySnapshot,
        countdown: Option<String>,
        entry_fee: String,
    ) -> Self {
        Self {
            account: session.account,
            is_owner: session.is_owner,
            open: snapshot.open,
            prize_pool: snapshot.prize_pool_ether(),
            winner: snapshot.winner,
            players: snapshot.players.clone(),
            // the countdown line only shows while the round is open
            countdown: countdown.filter(|_| snapshot.open),
            pending_randomness: snapshot.pending_randomness,
            actions: ActionEligibility::derive(session, snapshot),
            entry_fee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    ConnectPrompt { connecting: bool },
    NetworkMismatch { account: Address, network_name: String },
    Status(Box<StatusPanel>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    pub screen: Screen,
    pub loading: bool,
    pub error: Option<String>,
}

impl ClientView {
    pub fn status(&self) -> Option<&StatusPanel> {
        match &self.screen {
            Screen::Status(panel) => Some(panel),
            _ => None,
        }
    }
}

/// `0x1234...abcd`
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
