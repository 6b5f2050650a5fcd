//! Periodic cleanup of lapsed usage windows and expired temp files.

use std::sync::Arc;
use std::time::Duration;

use careerguard_limiter::TokenGuard;
use careerguard_store::TemporaryFileStorage;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest interval the sweeper will run at.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What one sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Usage records dropped because their window lapsed.
    pub usage_records: usize,
    /// Temp files deleted because their TTL passed.
    pub files: usize,
}

/// Handle to the background sweep task.
///
/// Dropping the handle leaves the task running; call
/// [`shutdown`](Self::shutdown) to stop it and delete whatever has expired.
#[derive(Debug)]
pub struct Sweeper {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
    files: Arc<TemporaryFileStorage>,
}

impl Sweeper {
    /// Spawn a task that sweeps `limiter` and `files` every `interval`.
    ///
    /// The first sweep runs one full interval after spawning. Intervals
    /// under a second are raised to one second.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(
        limiter: Arc<TokenGuard>,
        files: Arc<TemporaryFileStorage>,
        interval: Duration,
    ) -> Self {
        let period = interval.max(MIN_INTERVAL);
        let task_files = Arc::clone(&files);
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately
            ticker.tick().await;

            loop {
                // A sweep in progress always runs to completion
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                sweep_once(&limiter, &task_files).await;
            }
            debug!("Sweep task exiting");
        });

        info!("Sweeper started with {:?} interval", period);
        Self {
            handle,
            cancel,
            files,
        }
    }

    /// Returns true once the task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the task and delete every expired temp file.
    ///
    /// Waits for a sweep that is already running to finish, so no file is
    /// left deleted on disk but still tracked. Returns the number of files
    /// removed by the final cleanup.
    pub async fn shutdown(self) -> usize {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("Sweep task ended abnormally: {}", e);
        }

        let removed = self.files.cleanup().await;
        info!("Sweeper stopped, final cleanup removed {} files", removed);
        removed
    }
}

/// Run one sweep over both components.
pub async fn sweep_once(limiter: &TokenGuard, files: &TemporaryFileStorage) -> SweepReport {
    let report = SweepReport {
        usage_records: limiter.reset_usage(),
        files: files.cleanup().await,
    };
    debug!(
        "Sweep dropped {} usage records and {} files",
        report.usage_records, report.files
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use careerguard_clock::ManualClock;
    use careerguard_limiter::LimiterConfig;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_once() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::epoch();
        let limiter = TokenGuard::with_clock(LimiterConfig::default(), clock.shared());
        let files = TemporaryFileStorage::with_root(dir.path()).with_clock(clock.shared());

        limiter.check_limit("ada", 10);
        files
            .store_file(b"x", "draft.pdf", ChronoDuration::minutes(30))
            .await
            .unwrap();

        assert_eq!(sweep_once(&limiter, &files).await, SweepReport::default());

        clock.advance(ChronoDuration::hours(2));
        assert_eq!(
            sweep_once(&limiter, &files).await,
            SweepReport {
                usage_records: 1,
                files: 1
            }
        );
        assert_eq!(limiter.tracked_users(), 0);
        assert!(files.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_sweeper_runs_on_interval() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::epoch();
        let limiter = Arc::new(TokenGuard::with_clock(
            LimiterConfig::default(),
            clock.shared(),
        ));
        let files = Arc::new(TemporaryFileStorage::with_root(dir.path()));

        limiter.check_limit("ada", 10);
        clock.advance(ChronoDuration::hours(2));

        let sweeper = Sweeper::spawn(Arc::clone(&limiter), files, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(limiter.tracked_users(), 1);

        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(limiter.tracked_users(), 0);

        assert_eq!(sweeper.shutdown().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_task() {
        let dir = TempDir::new().unwrap();
        let clock = ManualClock::epoch();
        let limiter = Arc::new(TokenGuard::with_clock(
            LimiterConfig::default(),
            clock.shared(),
        ));
        let files = Arc::new(TemporaryFileStorage::with_root(dir.path()).with_clock(clock.shared()));

        limiter.check_limit("ada", 10);
        let record = files
            .store_file(b"x", "draft.pdf", ChronoDuration::minutes(30))
            .await
            .unwrap();
        clock.advance(ChronoDuration::hours(2));

        let sweeper = Sweeper::spawn(
            Arc::clone(&limiter),
            Arc::clone(&files),
            Duration::from_secs(60),
        );
        assert!(!sweeper.is_finished());

        // Final cleanup still runs
        assert_eq!(sweeper.shutdown().await, 1);
        assert!(!record.filepath.exists());
        assert!(files.is_empty());

        // No sweep after shutdown
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(limiter.tracked_users(), 1);
    }
}
