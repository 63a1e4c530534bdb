/// A single owned interval timer driven by an external clock.
///
/// Arming an armed timer keeps its schedule, so callers can re-assert the
/// guarding condition on every state change without stacking timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringTimer {
    interval_ms: u64,
    next_due_ms: Option<u64>,
}

impl RecurringTimer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.next_due_ms
    }

    /// Returns `true` if the timer was idle and is now scheduled.
    pub fn arm(&mut self, now_ms: u64) -> bool {
        if self.next_due_ms.is_some() {
            return false;
        }
        self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
        true
    }

    pub fn disarm(&mut self) {
        self.next_due_ms = None;
    }

    /// Fires at most once per call; missed periods collapse into one tick.
    pub fn fire_if_due(&mut self, now_ms: u64) -> bool {
        match self.next_due_ms {
            Some(due) if due <= now_ms => {
                self.next_due_ms = Some(now_ms.saturating_add(self.interval_ms));
                true
            }
            _ => false,
        }
    }
}
