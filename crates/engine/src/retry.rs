//! Bounded polling.
//!
//! Used where the engine has asked the host for something that lands
//! asynchronously: a scrolled-to row becoming materialized, rows created by
//! a hook showing up in the row model. Polls a probe at a fixed interval and
//! gives a definite answer after `max_attempts`.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval: Duration::from_millis(interval_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Probe succeeded on this attempt (1-based)
    Ready { attempts: u32 },
    Exhausted,
}

impl RetryOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, RetryOutcome::Ready { .. })
    }
}

/// Poll `probe` until it returns true or the attempts run out. The first
/// probe runs immediately; later ones wait `policy.interval`.
pub async fn retry_until(policy: RetryPolicy, mut probe: impl FnMut() -> bool) -> RetryOutcome {
    let max = policy.max_attempts.max(1);
    for attempt in 1..=max {
        if probe() {
            return RetryOutcome::Ready { attempts: attempt };
        }
        if attempt < max {
            smol::Timer::after(policy.interval).await;
        }
    }
    log::debug!("gave up after {} attempts", max);
    RetryOutcome::Exhausted
}
