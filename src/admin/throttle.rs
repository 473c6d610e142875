use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Sliding-window limit on failed admin logins.
///
/// After `max_failures` failures inside `window`, attempts are refused until
/// the oldest failure falls out of the window. `max_failures == 0` disables it.
///
/// Every admitted attempt is counted as a failure up front, so guesses that
/// are still being verified already use up the budget. A successful login
/// calls [`AdminThrottle::reset`].
pub struct AdminThrottle {
    max_failures: usize,
    window: Duration,
    failures: Mutex<VecDeque<Instant>>,
}

impl AdminThrottle {
    pub fn new(max_failures: u32, window: Duration) -> Self {
        Self {
            max_failures: max_failures as usize,
            window,
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Admit one attempt, or `Err(retry_after)` while locked out.
    pub fn begin_attempt(&self, now: Instant) -> Result<(), Duration> {
        if self.max_failures == 0 {
            return Ok(());
        }
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut failures, now);
        if failures.len() < self.max_failures {
            failures.push_back(now);
            return Ok(());
        }
        let oldest = failures.front().copied().unwrap_or(now);
        Err(self.window.saturating_sub(now.saturating_duration_since(oldest)))
    }

    pub fn reset(&self) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn prune(&self, failures: &mut VecDeque<Instant>, now: Instant) {
        while failures
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= self.window)
        {
            failures.pop_front();
        }
    }
}
