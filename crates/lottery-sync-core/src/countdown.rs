//! Remaining-time text for an open round.

use std::fmt;

pub const AWAITING_RESULTS: &str = "Lottery ended, awaiting results...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining { hours: u64, minutes: u64, seconds: u64 },
    AwaitingResults,
}

impl Countdown {
    pub fn between(now_secs: u64, end_time: u64) -> Self {
        if end_time <= now_secs {
            return Countdown::AwaitingResults;
        }
        let remaining = end_time - now_secs;
        Countdown::Remaining {
            hours: remaining / 3_600,
            minutes: (remaining % 3_600) / 60,
            seconds: remaining % 60,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Countdown::AwaitingResults)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Remaining {
                hours,
                minutes,
                seconds,
            } => write!(f, "{hours}h {minutes}m {seconds}s"),
            Countdown::AwaitingResults => f.write_str(AWAITING_RESULTS),
        }
    }
}

/// `None` when there is nothing to count down to: round closed or end time unknown.
pub fn countdown_for(open: bool, end_time: u64, now_secs: u64) -> Option<Countdown> {
    if !open || end_time == 0 {
        return None;
    }
    Some(Countdown::between(now_secs, end_time))
}
