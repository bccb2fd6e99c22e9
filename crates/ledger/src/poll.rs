//! Waiting on the ledger.
//!
//! Fetchers have no channel to the processors; the only signal that a file is
//! done is its timestamp turning non-null in the status table. So a fetcher
//! polls: reload the table, act on whatever newly finished, sleep, repeat.
//! The sleeper is injected so the unit tests drive the loop without real
//! time passing.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::error::Error;
use crate::table::StatusTable;

/// The interval fetchers have always used against this ledger.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[derive(Debug, Clone)]
pub struct Poller<S = TokioSleeper> {
    interval: Duration,
    deadline: Option<Duration>,
    sleeper: S,
}

impl Poller<TokioSleeper> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            sleeper: TokioSleeper,
        }
    }
}

impl Default for Poller<TokioSleeper> {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl<S: Sleeper> Poller<S> {
    /// Caps the total slept time; once the next sleep would cross the cap the
    /// wait ends in [`Error::PollTimeout`]. Without a deadline the wait is
    /// unbounded, which is the historical fetcher behavior. A zero interval
    /// cannot sleep toward the cap at all, so a set deadline then ends the
    /// wait after the first incomplete pass.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Poller<T> {
        Poller {
            interval: self.interval,
            deadline: self.deadline,
            sleeper,
        }
    }

    /// Polls `reload` until every wanted file shows a processed timestamp,
    /// calling `on_ready` exactly once per file as it turns ready.
    ///
    /// Files absent from the table count as not ready; nothing marks them
    /// processed while they are missing, so they hold the wait open (and are
    /// warned about once). An `on_ready` failure aborts the whole wait, and
    /// the file it failed on is not considered handled.
    pub async fn await_ready<Src, SrcFut, F, FFut>(
        &self,
        wanted: &[String],
        mut reload: Src,
        mut on_ready: F,
    ) -> Result<(), Error>
    where
        Src: FnMut() -> SrcFut,
        SrcFut: Future<Output = Result<StatusTable, Error>>,
        F: FnMut(String) -> FFut,
        FFut: Future<Output = Result<(), Error>>,
    {
        let wanted: Vec<&str> = {
            let mut seen = HashSet::new();
            wanted
                .iter()
                .map(String::as_str)
                .filter(|f| seen.insert(*f))
                .collect()
        };
        if wanted.is_empty() {
            return Ok(());
        }

        let mut invoked: HashSet<&str> = HashSet::new();
        let mut warned_missing = false;
        let mut waited = Duration::ZERO;

        loop {
            let table = reload().await?;

            if !warned_missing {
                let missing: Vec<&str> = wanted
                    .iter()
                    .copied()
                    .filter(|f| !table.contains(f))
                    .collect();
                if !missing.is_empty() {
                    tracing::warn!(files = ?missing, "wanted files have no ledger row yet");
                    warned_missing = true;
                }
            }

            for filename in &wanted {
                if invoked.contains(filename) {
                    continue;
                }
                if table.get(filename).is_some_and(|r| r.is_processed()) {
                    on_ready(filename.to_string()).await?;
                    invoked.insert(filename);
                }
            }

            if invoked.len() == wanted.len() {
                return Ok(());
            }

            if let Some(deadline) = self.deadline {
                // A zero interval never advances `waited`, so it must not be
                // allowed to out-wait the deadline.
                if self.interval.is_zero() || waited + self.interval > deadline {
                    return Err(Error::PollTimeout {
                        waited,
                        pending: wanted.len() - invoked.len(),
                    });
                }
            }

            self.sleeper.sleep(self.interval).await;
            waited += self.interval;
        }
    }
}
