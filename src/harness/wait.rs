//! Polling synchronizer.
//!
//! Every wait in the harness goes through `Waiter::until`: re-evaluate a
//! predicate against the live page until it holds or the timeout elapses.
//! Transient driver errors (DOM not settled) count as "not yet true".

use std::thread;
use std::time::{Duration, Instant};

use crate::browser::{DriverResult, PageBackend};
use crate::harness::types::{HarnessError, HarnessResult};

/// Default pause between predicate evaluations
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Floor for the poll interval; polling never busy-spins
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Bounded wait with a fixed poll interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Block until `predicate` returns `Ok(true)`.
    ///
    /// The predicate is evaluated at least once, even with a zero timeout.
    /// Non-transient driver errors are returned immediately.
    pub fn until<B, F>(&self, page: &mut B, description: &str, mut predicate: F) -> HarnessResult<()>
    where
        B: PageBackend + ?Sized,
        F: FnMut(&mut B) -> DriverResult<bool>,
    {
        let start = Instant::now();
        let mut last_error = None;
        let mut polls = 0u32;

        loop {
            polls += 1;
            match predicate(page) {
                Ok(true) => {
                    tracing::debug!(description, polls, elapsed = ?start.elapsed(), "condition met");
                    return Ok(());
                }
                Ok(false) => {}
                Err(err) if err.is_transient() => {
                    tracing::debug!(description, error = %err, "page not settled, polling again");
                    last_error = Some(err.to_string());
                }
                Err(err) => return Err(err.into()),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(HarnessError::Timeout {
                    description: description.to_string(),
                    waited: self.timeout,
                    last_error,
                });
            }
            thread::sleep(self.poll_interval.min(self.timeout - elapsed).max(MIN_POLL_INTERVAL));
        }
    }
}

/// Wait for `predicate` with a one-off `Waiter`
pub fn await_condition<B, F>(
    page: &mut B,
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
    predicate: F,
) -> HarnessResult<()>
where
    B: PageBackend + ?Sized,
    F: FnMut(&mut B) -> DriverResult<bool>,
{
    Waiter::new(timeout)
        .poll_interval(poll_interval)
        .until(page, description, predicate)
}

/// Sleep for a fixed settle delay (no-op when zero)
pub fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
