//! Guard that stops the feed from hammering a provider that refuses it.
//!
//! A refusal (HTTP 403) opens the breaker at once; consecutive failures open it
//! at the threshold. While open, requests are refused until the cooldown ends.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed { failures: u32 },
    Open { since: Instant },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    cooldown: Duration,
    threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_threshold(cooldown, 3)
    }

    pub fn with_threshold(cooldown: Duration, threshold: u32) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
            cooldown,
            threshold: threshold.max(1),
        }
    }

    /// 30-minute cooldown after 3 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    fn state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state, closing the breaker first if its cooldown has run out.
    pub fn snapshot(&self) -> BreakerState {
        let mut state = self.state();
        if let BreakerState::Open { since } = *state {
            if since.elapsed() >= self.cooldown {
                info!("provider breaker closed after cooldown");
                *state = BreakerState::Closed { failures: 0 };
            }
        }
        *state
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.snapshot(), BreakerState::Closed { .. })
    }

    pub fn record_success(&self) {
        let mut state = self.state();
        if let BreakerState::Closed { failures } = &mut *state {
            *failures = 0;
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state();
        let BreakerState::Closed { failures } = *state else {
            return;
        };
        let failures = failures + 1;
        *state = if failures >= self.threshold {
            warn!(failures, cooldown_secs = self.cooldown.as_secs(), "provider breaker opened");
            BreakerState::Open { since: Instant::now() }
        } else {
            BreakerState::Closed { failures }
        };
    }

    /// Open immediately, e.g. on 403 Forbidden.
    pub fn trip(&self) {
        warn!(cooldown_secs = self.cooldown.as_secs(), "provider refused requests, breaker opened");
        *self.state() = BreakerState::Open { since: Instant::now() };
    }

    pub fn remaining_cooldown(&self) -> Duration {
        match self.snapshot() {
            BreakerState::Closed { .. } => Duration::ZERO,
            BreakerState::Open { since } => self.cooldown.saturating_sub(since.elapsed()),
        }
    }
}
