use crate::domain::{LotteryAction, LotterySnapshot, Session};

/// Which action buttons the status panel offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionEligibility {
    pub enter: bool,
    pub start: bool,
    pub end: bool,
    pub withdraw: bool,
}

impl ActionEligibility {
    pub fn derive(session: &Session, snapshot: &LotterySnapshot) -> Self {
        Self {
            enter: !snapshot.caller_is_member && snapshot.open,
            start: session.is_owner && !snapshot.open,
            end: session.is_owner && snapshot.open,
            withdraw: snapshot.winner == Some(session.account),
        }
    }

    pub fn allows(&self, action: LotteryAction) -> bool {
        match action {
            LotteryAction::Enter => self.enter,
            LotteryAction::Start => self.start,
            LotteryAction::End => self.end,
            LotteryAction::Withdraw => self.withdraw,
        }
    }

    pub fn visible(&self) -> Vec<LotteryAction> {
        LotteryAction::ALL
            .into_iter()
            .filter(|a| self.allows(*a))
            .collect()
    }
}
