//! Single-flight periodic task.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

tokio::task_local! {
    static RUNNING_TASK: u64;
}

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Runs an async callback every `period` on a dedicated tokio task.
///
/// The first run happens one full period after [`PeriodicTask::start`].
/// Runs never overlap: the callback is awaited inside the timer loop, and
/// ticks missed while it was running are skipped rather than replayed.
pub struct PeriodicTask {
    id: u64,
    name: String,
    shutdown_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTask {
    /// Spawn the timer loop. Must be called from within a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn start<F, Fut>(name: impl Into<String>, period: Duration, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        assert!(!period.is_zero(), "periodic task period must be non-zero");
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        let name = name.into();
        let (shutdown_tx, mut rx) = watch::channel(false);

        let task_name = name.clone();
        let handle = tokio::spawn(RUNNING_TASK.scope(id, async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::debug!(task = %task_name, ?period, "Periodic task started");

            loop {
                tokio::select! {
                    biased;
                    // Also fires when the sender is dropped.
                    _ = rx.changed() => break,
                    _ = ticker.tick() => f().await,
                }
            }

            tracing::debug!(task = %task_name, "Periodic task stopped");
        }));

        Self {
            id,
            name,
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Cancel the timer and wait for an in-flight run to finish.
    ///
    /// Idempotent; concurrent callers all return only after the loop has
    /// exited. Called from inside the callback it only requests cancellation,
    /// since waiting there would wait on itself.
    pub async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let inside_callback = RUNNING_TASK
            .try_with(|running| *running == self.id)
            .unwrap_or(false);
        if inside_callback {
            tracing::debug!(task = %self.name, "Stop requested from within the periodic task");
            return;
        }

        // The handle stays in the slot until the join completes, so a caller
        // that gives up mid-wait leaves it for the next one.
        let mut handle = self.handle.lock().await;
        if let Some(join) = handle.as_mut() {
            if let Err(e) = join.await {
                tracing::error!(task = %self.name, error = %e, "Periodic task terminated abnormally");
            }
            *handle = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, OnceLock};

    #[derive(Default)]
    struct RunTracker {
        started: AtomicUsize,
        finished: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RunTracker {
        async fn run(&self, work: Duration) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(work).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked_task(tracker: &Arc<RunTracker>, period: Duration, work: Duration) -> PeriodicTask {
        let tracker = tracker.clone();
        PeriodicTask::start("tracked", period, move || {
            let tracker = tracker.clone();
            async move { tracker.run(work).await }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_run_after_one_period() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 3);

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_runs_do_not_overlap() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::from_millis(2500));

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        task.stop().await;

        assert_eq!(tracker.max_in_flight.load(Ordering::SeqCst), 1);
        let started = tracker.started.load(Ordering::SeqCst);
        assert!(started >= 2 && started <= 4, "started {started} runs");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_run() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 0);

        task.stop().await;
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 1);
        assert!(task.is_stopped());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_stop_still_lets_next_stop_wait() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);

        let gave_up = tokio::time::timeout(Duration::from_millis(100), task.stop()).await;
        assert!(gave_up.is_err());
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 0);

        task.stop().await;
        assert_eq!(tracker.finished.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_period_rejected() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let _ = PeriodicTask::start("zero", Duration::ZERO, || async {});
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::ZERO);
        task.stop().await;
        task.stop().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_from_inside_callback() {
        let runs = Arc::new(AtomicUsize::new(0));
        let slot: Arc<OnceLock<Arc<PeriodicTask>>> = Arc::new(OnceLock::new());

        let task = {
            let runs = runs.clone();
            let slot = slot.clone();
            Arc::new(PeriodicTask::start("self-stop", Duration::from_secs(1), move || {
                let runs = runs.clone();
                let slot = slot.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    if let Some(task) = slot.get() {
                        task.stop().await;
                    }
                }
            }))
        };
        let _ = slot.set(task.clone());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(task.is_stopped());

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_task_ends_loop() {
        let tracker = Arc::new(RunTracker::default());
        let task = tracked_task(&tracker, Duration::from_secs(1), Duration::ZERO);
        drop(task);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tracker.started.load(Ordering::SeqCst), 0);
    }
}
