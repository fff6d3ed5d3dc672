use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Monotonic session clock.
///
/// Counts whole seconds while started and freezes (without resetting) when
/// stopped, so the final duration of a finished call stays inspectable.
/// The ticking task is aborted the moment the timer stops or is dropped.
pub struct SessionTimer {
    elapsed_secs: Arc<AtomicU64>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            elapsed_secs: Arc::new(AtomicU64::new(0)),
            ticker: Mutex::new(None),
        }
    }

    /// Start counting from zero. Replaces any previous ticking task.
    pub fn start(&self) {
        self.elapsed_secs.store(0, Ordering::SeqCst);

        let elapsed = Arc::clone(&self.elapsed_secs);
        let task = tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the
            // counter stays at zero for the first full second.
            interval.tick().await;
            loop {
                interval.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        });

        if let Some(previous) = self.lock_ticker().replace(task) {
            previous.abort();
        }
    }

    /// Stop counting. The elapsed value is frozen, not reset.
    pub fn stop(&self) {
        if let Some(task) = self.lock_ticker().take() {
            task.abort();
        }
    }

    /// Stop counting and zero the clock, for a fresh session attempt.
    pub fn reset(&self) {
        self.stop();
        self.elapsed_secs.store(0, Ordering::SeqCst);
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.lock_ticker().is_some()
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Format a duration in whole seconds as `minutes:seconds` with
/// zero-padded seconds, e.g. `3:07`.
pub fn format_elapsed(total_secs: u64) -> String {
    let mins = total_secs / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}", mins, secs)
}
