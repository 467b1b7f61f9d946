//! Bounded exponential backoff around a [`PageFetcher`].
//!
//! The loop is an explicit state machine:
//!
//! ```text
//! Attempting(n, i) --page-->  Succeeded
//! Attempting(n, i) --empty--> BackingOff(n, i) --sleep i--> Attempting(n + 1, 2i)
//! Attempting(max, _) --empty--> Exhausted
//! ```
//!
//! Exhaustion is fatal for the whole run: a silently skipped card would
//! leave a hole in the table.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{CardId, RetryConfig};
use crate::services::fetcher::PageFetcher;
use crate::utils::Sleeper;

/// Retry ceiling and initial backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
}

impl RetryPolicy {
    pub fn start(&self) -> RetryState {
        RetryState::Attempting {
            attempt: 1,
            interval: self.initial_interval,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_interval: config.initial_interval(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Where a retried fetch currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// About to make fetch attempt `attempt`.
    Attempting { attempt: u32, interval: Duration },
    /// Attempt `attempt` came back empty; wait `interval` before the next one.
    BackingOff { attempt: u32, interval: Duration },
    Succeeded { attempt: u32, body: String },
    Exhausted { attempts: u32 },
}

impl RetryState {
    /// Fold the result of the current attempt into the next state.
    ///
    /// Only meaningful from `Attempting`; any other state is returned unchanged.
    pub fn record(self, fetched: Option<String>, policy: &RetryPolicy) -> Self {
        let Self::Attempting { attempt, interval } = self else {
            return self;
        };

        match fetched {
            Some(body) if !body.is_empty() => Self::Succeeded { attempt, body },
            _ if attempt >= policy.max_attempts => Self::Exhausted { attempts: attempt },
            _ => Self::BackingOff { attempt, interval },
        }
    }

    /// Leave `BackingOff` for the next attempt with a doubled interval.
    pub fn resume(self) -> Self {
        match self {
            Self::BackingOff { attempt, interval } => Self::Attempting {
                attempt: attempt + 1,
                interval: interval.saturating_mul(2),
            },
            other => other,
        }
    }
}

/// Drives a [`PageFetcher`] through the retry state machine.
pub struct RetryCoordinator<F, S> {
    fetcher: F,
    sleeper: S,
    policy: RetryPolicy,
}

impl<F, S> RetryCoordinator<F, S> {
    pub fn new(fetcher: F, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            sleeper,
            policy,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<F: PageFetcher, S: Sleeper> RetryCoordinator<F, S> {
    /// Fetch a card page, retrying empty results with exponential backoff.
    ///
    /// Returns a non-empty body, or [`AppError::RetriesExhausted`] once the
    /// ceiling is reached.
    pub async fn fetch_with_retry(&self, id: CardId) -> Result<String> {
        let mut state = self.policy.start();

        loop {
            state = match state {
                attempting @ RetryState::Attempting { .. } => {
                    let fetched = self.fetcher.fetch(id).await;
                    attempting.record(fetched, &self.policy)
                }
                backing_off @ RetryState::BackingOff { attempt, interval } => {
                    log::info!(
                        "Failed to fetch card {id} (attempt {attempt}/{}), retrying in {interval:?}",
                        self.policy.max_attempts
                    );
                    self.sleeper.sleep(interval).await;
                    backing_off.resume()
                }
                RetryState::Succeeded { body, .. } => return Ok(body),
                RetryState::Exhausted { attempts } => {
                    log::error!("Card {id}: all {attempts} fetch attempts failed, aborting run");
                    return Err(AppError::RetriesExhausted { id, attempts });
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::utils::testing::RecordingSleeper;

    /// Plays back a fixed sequence of fetch results, then `None` forever.
    struct ScriptedFetcher {
        script: Mutex<VecDeque<Option<String>>>,
        calls: AtomicU32,
    }

    impl ScriptedFetcher {
        fn new(script: Vec<Option<&str>>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().map(|s| s.map(String::from)).collect()),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, _id: CardId) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().unwrap().pop_front().flatten()
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 10,
            initial_interval: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_record_success() {
        let state = policy().start().record(Some("<html>".into()), &policy());
        assert_eq!(
            state,
            RetryState::Succeeded {
                attempt: 1,
                body: "<html>".into()
            }
        );
    }

    #[test]
    fn test_empty_body_counts_as_failure() {
        let state = policy().start().record(Some(String::new()), &policy());
        assert_eq!(
            state,
            RetryState::BackingOff {
                attempt: 1,
                interval: Duration::from_secs(2)
            }
        );
    }

    #[test]
    fn test_resume_doubles_interval() {
        let state = RetryState::BackingOff {
            attempt: 3,
            interval: Duration::from_secs(8),
        }
        .resume();
        assert_eq!(
            state,
            RetryState::Attempting {
                attempt: 4,
                interval: Duration::from_secs(16)
            }
        );
    }

    #[test]
    fn test_failure_at_ceiling_is_exhausted() {
        let state = RetryState::Attempting {
            attempt: 10,
            interval: Duration::from_secs(1024),
        }
        .record(None, &policy());
        assert_eq!(state, RetryState::Exhausted { attempts: 10 });
    }

    #[tokio::test]
    async fn test_success_on_third_attempt() {
        let fetcher = ScriptedFetcher::new(vec![None, Some(""), Some("<html>ok</html>")]);
        let sleeper = RecordingSleeper::default();
        let coordinator = RetryCoordinator::new(fetcher, sleeper.clone(), policy());

        let body = coordinator.fetch_with_retry(CardId(5)).await.unwrap();

        assert_eq!(body, "<html>ok</html>");
        assert_eq!(coordinator.fetcher.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.durations(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_first_attempt_success_never_sleeps() {
        let fetcher = ScriptedFetcher::new(vec![Some("page")]);
        let sleeper = RecordingSleeper::default();
        let coordinator = RetryCoordinator::new(fetcher, sleeper.clone(), policy());

        assert_eq!(coordinator.fetch_with_retry(CardId(1)).await.unwrap(), "page");
        assert!(sleeper.durations().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_stops_at_ceiling() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let sleeper = RecordingSleeper::default();
        let coordinator = RetryCoordinator::new(fetcher, sleeper.clone(), policy());

        let result = coordinator.fetch_with_retry(CardId(99)).await;

        assert!(matches!(
            result,
            Err(AppError::RetriesExhausted {
                id: CardId(99),
                attempts: 10
            })
        ));
        assert_eq!(coordinator.fetcher.calls.load(Ordering::SeqCst), 10);

        let slept = sleeper.durations();
        assert_eq!(slept.len(), 9);
        assert_eq!(slept[0], Duration::from_secs(2));
        assert_eq!(slept[8], Duration::from_secs(512));
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let fetcher = ScriptedFetcher::new(vec![None, Some("late")]);
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy {
            max_attempts: 1,
            initial_interval: Duration::from_millis(10),
        };
        let coordinator = RetryCoordinator::new(fetcher, sleeper.clone(), policy);

        assert!(coordinator.fetch_with_retry(CardId(3)).await.is_err());
        assert_eq!(coordinator.fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.durations().is_empty());
    }
}
