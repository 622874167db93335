use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Fault-rate detector over a fixed number of recent fault timestamps
///
/// Holds exactly `capacity` slots; every fault shifts the window by one and the
/// oldest timestamp falls off. The encoder is considered to be storming once
/// `capacity` faults fit inside `window`, i.e. the oldest retained fault is
/// still within `window` of now.
#[derive(Debug, Clone)]
pub struct ErrorStormDetector {
    slots: VecDeque<Option<Instant>>,
    window: Duration,
}

impl ErrorStormDetector {
    pub fn new(capacity: usize, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: std::iter::repeat(None).take(capacity).collect(),
            window,
        }
    }

    pub fn record_fault(&mut self, now: Instant) {
        self.slots.pop_front();
        self.slots.push_back(Some(now));
    }

    pub fn is_storming(&self, now: Instant) -> bool {
        match self.slots.front() {
            Some(Some(oldest)) => now.saturating_duration_since(*oldest) <= self.window,
            _ => false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}
