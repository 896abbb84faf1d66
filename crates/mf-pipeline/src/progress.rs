//! Batch progress tracking.
//!
//! Workers call [`ProgressReporter::increment`] from any thread. Subscribers
//! receive updates whose `completed` value strictly increases within a
//! batch, so the percentage never moves backwards even when workers race.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::observer::{Observers, SubscriptionId};

/// A progress notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    /// `100 * completed / total`, in `0.0..=100.0`.
    pub percent: f32,
}

impl ProgressUpdate {
    fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            (completed as f32 / total as f32 * 100.0).min(100.0)
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    /// Whether every job of the batch is accounted for.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }
}

/// Thread-safe completed/total counter for one batch at a time.
#[derive(Debug)]
pub struct ProgressReporter {
    total: AtomicUsize,
    completed: AtomicUsize,
    /// Last `completed` value handed to subscribers. Held while notifying so
    /// emissions are serialized.
    last_emitted: Mutex<usize>,
    observers: RwLock<Observers<ProgressUpdate>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    /// A reporter with no batch yet.
    pub fn new() -> Self {
        Self {
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            last_emitted: Mutex::new(0),
            observers: RwLock::new(Observers::new()),
        }
    }

    /// Start a new batch of `total` jobs. Resets the counter; emits nothing.
    pub fn init(&self, total: usize) {
        let mut last = self.last_emitted.lock();
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        *last = 0;
    }

    /// Record one finished job (successful or not) and notify subscribers.
    ///
    /// Returns the emitted update, or `None` when nothing new was emitted
    /// (no batch initialized, or a racing worker already reported a higher
    /// count).
    pub fn increment(&self) -> Option<ProgressUpdate> {
        self.completed.fetch_add(1, Ordering::SeqCst);

        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return None;
        }

        let mut last = self.last_emitted.lock();
        let completed = self.completed.load(Ordering::SeqCst).min(total);
        if completed <= *last {
            return None;
        }
        *last = completed;

        let update = ProgressUpdate::new(completed, total);
        self.observers.read().notify(update);
        Some(update)
    }

    /// Jobs finished so far in the current batch.
    pub fn completed(&self) -> usize {
        self.completed
            .load(Ordering::SeqCst)
            .min(self.total.load(Ordering::SeqCst))
    }

    /// Size of the current batch.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Current percentage without emitting.
    pub fn percent(&self) -> f32 {
        ProgressUpdate::new(self.completed(), self.total()).percent
    }

    /// Register a callback for progress updates.
    ///
    /// Callbacks run on worker threads and must not call back into the
    /// reporter.
    pub fn subscribe(
        &self,
        callback: impl Fn(ProgressUpdate) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.write().subscribe(callback)
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.write().unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder(reporter: &ProgressReporter) -> Arc<Mutex<Vec<ProgressUpdate>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        reporter.subscribe(move |u| s.lock().push(u));
        seen
    }

    #[test]
    fn init_does_not_emit() {
        let reporter = ProgressReporter::new();
        let seen = recorder(&reporter);
        reporter.init(4);
        assert!(seen.lock().is_empty());
        assert_eq!(reporter.percent(), 0.0);
    }

    #[test]
    fn percentages_step_to_one_hundred() {
        let reporter = ProgressReporter::new();
        let seen = recorder(&reporter);
        reporter.init(4);
        for _ in 0..4 {
            reporter.increment();
        }
        let percents: Vec<f32> = seen.lock().iter().map(|u| u.percent).collect();
        assert_eq!(percents, vec![25.0, 50.0, 75.0, 100.0]);
        assert!(seen.lock().last().unwrap().is_complete());
    }

    #[test]
    fn increment_without_batch_is_silent() {
        let reporter = ProgressReporter::new();
        let seen = recorder(&reporter);
        assert!(reporter.increment().is_none());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn extra_increments_are_clamped() {
        let reporter = ProgressReporter::new();
        reporter.init(1);
        assert_eq!(reporter.increment().unwrap().percent, 100.0);
        assert!(reporter.increment().is_none());
        assert_eq!(reporter.completed(), 1);
    }

    #[test]
    fn init_resets_between_batches() {
        let reporter = ProgressReporter::new();
        reporter.init(2);
        reporter.increment();
        reporter.increment();
        reporter.init(3);
        assert_eq!(reporter.completed(), 0);
        assert_eq!(reporter.increment().unwrap().completed, 1);
    }

    #[test]
    fn concurrent_increments_are_monotonic() {
        let reporter = Arc::new(ProgressReporter::new());
        let seen = recorder(&reporter);
        reporter.init(400);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let r = Arc::clone(&reporter);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        r.increment();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let seen = seen.lock();
        assert!(seen.windows(2).all(|w| w[0].completed < w[1].completed));
        assert_eq!(seen.last().unwrap().completed, 400);
        assert_eq!(seen.last().unwrap().percent, 100.0);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let reporter = ProgressReporter::new();
        let seen = Arc::new(Mutex::new(0usize));
        let s = Arc::clone(&seen);
        let id = reporter.subscribe(move |_| *s.lock() += 1);
        reporter.init(2);
        reporter.increment();
        assert!(reporter.unsubscribe(id));
        reporter.increment();
        assert_eq!(*seen.lock(), 1);
    }
}
