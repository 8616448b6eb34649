//! Retry schedule for live (un)indexing jobs.
//!
//! A failed attempt `n` is retried after `retry_times[n]` as long as
//! `n < max_retries`. The table and the bound are separate settings; the
//! bound is validated against the table once, at construction.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use fjord_types::RetrySettings;

use crate::error::IndexingError;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Enqueue a new attempt after `delay`
    Retry { next_attempt: u32, delay: Duration },
    /// Propagate the failure
    GiveUp,
}

/// Backoff table plus retry bound.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retry_times: Vec<Duration>,
    max_retries: u32,
    max_jitter_secs: u64,
}

impl RetryPolicy {
    /// Build a policy from settings, rejecting a bound the table cannot serve.
    pub fn from_settings(settings: &RetrySettings) -> Result<Self, IndexingError> {
        settings.validate().map_err(IndexingError::Config)?;
        Ok(Self {
            retry_times: settings
                .times_secs
                .iter()
                .copied()
                .map(Duration::from_secs)
                .collect(),
            max_retries: settings.max_retries,
            max_jitter_secs: settings.max_jitter_secs,
        })
    }

    /// Decide the follow-up for a failure on attempt number `attempt`
    /// (0 for the first try).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        match self.retry_times.get(attempt as usize) {
            Some(base) => {
                let delay = base.saturating_add(self.jitter());
                debug!(attempt, delay_secs = delay.as_secs(), "Scheduling retry");
                RetryDecision::Retry {
                    next_attempt: attempt + 1,
                    delay,
                }
            }
            None => RetryDecision::GiveUp,
        }
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter_secs == 0 {
            return Duration::ZERO;
        }
        let jitter_ms = rand::rng().random_range(0..self.max_jitter_secs.saturating_mul(1000));
        Duration::from_millis(jitter_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        let settings = RetrySettings::default();
        Self {
            retry_times: settings
                .times_secs
                .into_iter()
                .map(Duration::from_secs)
                .collect(),
            max_retries: settings.max_retries,
            max_jitter_secs: settings.max_jitter_secs,
        }
    }
}
