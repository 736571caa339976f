// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded, fixed-interval polling of asynchronous cluster state.
//!
//! [`Poller::poll`] repeatedly reads a value and classifies it with a check.
//! A check that is not yet satisfied is retried after the interval until the
//! attempt budget runs out. Errors from the read or the check are never
//! retried: they abort the poll at once.

pub mod waits;

use crate::config::PollSettings;
use crate::constants::poll::{DEFAULT_ATTEMPTS, DEFAULT_INTERVAL_SECS};
use crate::error::{HarnessError, Result};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub use waits::{wait_all_deleted, wait_deleted, wait_phase, wait_ready};

/// Verdict of a check on one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollSignal {
    Satisfied,
    NotYetSatisfied,
    /// A terminal state that will never become satisfied
    Stop(String),
}

/// Result of a poll that ran to completion without errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The check was satisfied on the `attempts`-th read
    Observed { attempts: u32 },
    /// Every read in the budget was inspected and none satisfied the check
    TimedOut { attempts: u32 },
    /// The check reported a terminal state on the `attempts`-th read
    Stopped { attempts: u32, reason: String },
}

impl PollOutcome {
    pub fn is_observed(&self) -> bool {
        matches!(self, PollOutcome::Observed { .. })
    }

    /// Number of reads performed
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Observed { attempts }
            | PollOutcome::TimedOut { attempts }
            | PollOutcome::Stopped { attempts, .. } => *attempts,
        }
    }

    /// Turn anything but `Observed` into an assertion failure about `what`
    pub fn ensure_observed(self, what: &str) -> Result<()> {
        match self {
            PollOutcome::Observed { .. } => Ok(()),
            PollOutcome::TimedOut { attempts } => Err(HarnessError::Assertion(format!(
                "{} not observed after {} attempts",
                what, attempts
            ))),
            PollOutcome::Stopped { attempts, reason } => Err(HarnessError::Assertion(format!(
                "{} will not be observed (attempt {}): {}",
                what, attempts, reason
            ))),
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Observed { attempts } => write!(f, "observed after {} attempt(s)", attempts),
            PollOutcome::TimedOut { attempts } => write!(f, "timed out after {} attempt(s)", attempts),
            PollOutcome::Stopped { attempts, reason } => {
                write!(f, "stopped at attempt {}: {}", attempts, reason)
            }
        }
    }
}

/// Attempt budget and interval shared by every wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    max_attempts: u32,
    interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, Duration::from_secs(DEFAULT_INTERVAL_SECS))
    }
}

impl From<PollSettings> for Poller {
    fn from(settings: PollSettings) -> Self {
        Self::new(settings.attempts, settings.interval)
    }
}

impl Poller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep one interval
    pub async fn settle(&self) {
        sleep(self.interval).await;
    }

    /// Read and check up to `max_attempts` times, sleeping `interval` between reads.
    ///
    /// Returns as soon as the check is satisfied or stops. No sleep follows the
    /// last attempt.
    pub async fn poll<T, R, Fut, P>(&self, mut read: R, mut check: P) -> Result<PollOutcome>
    where
        R: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: FnMut(&T) -> Result<PollSignal>,
    {
        for attempt in 1..=self.max_attempts {
            let value = read().await?;

            match check(&value)? {
                PollSignal::Satisfied => {
                    debug!(attempt, "Condition observed");
                    return Ok(PollOutcome::Observed { attempts: attempt });
                }
                PollSignal::Stop(reason) => {
                    warn!(attempt, %reason, "Condition can no longer be observed");
                    return Ok(PollOutcome::Stopped {
                        attempts: attempt,
                        reason,
                    });
                }
                PollSignal::NotYetSatisfied => {
                    if attempt < self.max_attempts {
                        info!(
                            attempt,
                            max_attempts = self.max_attempts,
                            "Condition not yet observed, waiting {:?}...",
                            self.interval
                        );
                        sleep(self.interval).await;
                    }
                }
            }
        }

        warn!(max_attempts = self.max_attempts, "Condition not observed within budget");
        Ok(PollOutcome::TimedOut {
            attempts: self.max_attempts,
        })
    }
}
