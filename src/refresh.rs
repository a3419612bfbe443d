use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::credentials::load_api_key;
use crate::event::AppEvent;
use crate::osu::{FetchError, Lookup, StatusFetcher};
use crate::scheduler::RefreshSpawner;

/// What a running check wants the status line to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    Checking,
    StillBanned { player: String },
    Unbanned { player: String, username: String },
    Failed(String),
}

/// A report tagged with the spawn that produced it. Higher generations were
/// requested later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub generation: u64,
    pub report: StatusReport,
}

/// Where checks post their reports. Must not touch UI state directly.
pub trait ReportSink: Send + Sync {
    fn post(&self, update: StatusUpdate);
}

/// Forwards reports into the UI thread's event queue.
pub struct ChannelSink {
    tx: Sender<AppEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl ReportSink for ChannelSink {
    fn post(&self, update: StatusUpdate) {
        // The UI may already be gone during shutdown
        let _ = self.tx.send(AppEvent::Status(update));
    }
}

/// Bounded exponential backoff for transient fetch failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

struct Checker {
    fetcher: Arc<dyn StatusFetcher>,
    key_file: PathBuf,
    retry: RetryPolicy,
    sink: Arc<dyn ReportSink>,
}

impl Checker {
    fn run(&self, generation: u64, player: &str) {
        let post = |report| self.sink.post(StatusUpdate { generation, report });

        let api_key = match load_api_key(&self.key_file) {
            Ok(key) => key,
            Err(err) => {
                log::warn!("refresh #{generation}: {err}");
                post(StatusReport::Failed(err.to_string()));
                return;
            }
        };

        post(StatusReport::Checking);

        let report = match self.fetch_with_retry(generation, &api_key, player) {
            Ok(Lookup::NotFound) => StatusReport::StillBanned {
                player: player.to_string(),
            },
            Ok(Lookup::Found { username }) => StatusReport::Unbanned {
                player: player.to_string(),
                username,
            },
            Err(err) if err.is_transient() => StatusReport::Failed(format!(
                "Check failed after {} attempts ({err})",
                self.retry.max_attempts
            )),
            Err(err) => StatusReport::Failed(err.to_string()),
        };
        log::info!("refresh #{generation} for {player:?}: {report:?}");
        post(report);
    }

    fn fetch_with_retry(
        &self,
        generation: u64,
        api_key: &str,
        player: &str,
    ) -> Result<Lookup, FetchError> {
        let mut attempt = 1;
        loop {
            match self.fetcher.fetch(api_key, player) {
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    log::warn!(
                        "refresh #{generation}: attempt {attempt}/{} failed: {err}, retrying in {delay:?}",
                        self.retry.max_attempts
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Runs each requested check on its own detached thread.
///
/// Used both by the scheduler and by the manual "check now" key. Every spawn
/// takes the next generation number.
pub struct RefreshExecutor {
    checker: Arc<Checker>,
    generation: AtomicU64,
}

impl RefreshExecutor {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        key_file: PathBuf,
        retry: RetryPolicy,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            checker: Arc::new(Checker {
                fetcher,
                key_file,
                retry,
                sink,
            }),
            generation: AtomicU64::new(0),
        }
    }
}

impl RefreshSpawner for RefreshExecutor {
    fn spawn_refresh(&self, identifier: String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let checker = Arc::clone(&self.checker);

        let spawned = thread::Builder::new()
            .name(format!("refresh-{generation}"))
            .spawn(move || checker.run(generation, &identifier));

        if let Err(err) = spawned {
            log::error!("could not start refresh #{generation}: {err}");
            self.checker.sink.post(StatusUpdate {
                generation,
                report: StatusReport::Failed(format!("Could not start check ({err})")),
            });
        }
    }
}
