//! Minimal observer list shared by the worklist and the progress reporter.

use std::fmt;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn Fn(T) + Send + Sync>;

/// A list of callbacks invoked with a copy of each notification.
pub(crate) struct Observers<T> {
    entries: Vec<(SubscriptionId, Callback<T>)>,
    next_id: u64,
}

impl<T: Copy> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn subscribe(
        &mut self,
        callback: impl Fn(T) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&self, value: T) {
        for (_, callback) in &self.entries {
            callback(value);
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn notify_and_unsubscribe() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut observers = Observers::new();

        let s = Arc::clone(&seen);
        let id = observers.subscribe(move |n: usize| {
            s.fetch_add(n, Ordering::SeqCst);
        });

        observers.notify(2);
        observers.notify(3);
        assert_eq!(seen.load(Ordering::SeqCst), 5);

        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.notify(10);
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }
}
