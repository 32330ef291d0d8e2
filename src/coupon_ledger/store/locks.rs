//! Per-coupon mutual exclusion.
//!
//! [`KeyLocks`] hands out one mutex per coupon id. The table itself sits
//! behind a short-lived outer lock that is only held while an entry is looked
//! up, created or pruned; the per-id critical section runs without it, so
//! work on one coupon never waits on work on another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut table = self.table();
            Arc::clone(table.entry(key.to_string()).or_default())
        };

        let out = {
            // The guarded value is `()`, so a panic in another holder cannot
            // leave anything half-updated.
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        self.release(key, entry);
        out
    }

    /// Number of ids that currently have a lock entry.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Drops the table entry once nobody else holds or waits on it. Every clone
    // of an entry is taken under the table lock, so a count of two (the table
    // plus ours) means no other caller can reach it.
    fn release(&self, key: &str, entry: Arc<Mutex<()>>) {
        let mut table = self.table();
        if Arc::strong_count(&entry) == 2 {
            table.remove(key);
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn entries_are_pruned_after_use() {
        let locks = KeyLocks::new();
        locks.with_lock("C1", || ());
        locks.with_lock("C2", || ());
        assert!(locks.is_empty());
    }

    #[test]
    fn same_key_is_serialized() {
        let locks = KeyLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        locks.with_lock("C1", || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            inside.fetch_sub(1, Ordering::SeqCst);
                        });
                    }
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = &KeyLocks::new();
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|s| {
            s.spawn(move || {
                locks.with_lock("slow", || {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                });
            });

            held_rx.recv().unwrap();

            let (done_tx, done_rx) = mpsc::channel();
            s.spawn(move || {
                locks.with_lock("fast", || ());
                done_tx.send(()).unwrap();
            });
            done_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("lock on another key was blocked");

            release_tx.send(()).unwrap();
        });

        assert!(locks.is_empty());
    }

    #[test]
    fn waiting_caller_keeps_the_entry_alive() {
        let locks = &KeyLocks::new();
        let order = &Mutex::new(Vec::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        thread::scope(|s| {
            s.spawn(move || {
                locks.with_lock("C1", || {
                    held_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    order.lock().unwrap().push("first");
                });
            });
            held_rx.recv().unwrap();

            s.spawn(move || {
                locks.with_lock("C1", || order.lock().unwrap().push("second"));
            });

            // Give the second caller time to start waiting before releasing.
            thread::sleep(Duration::from_millis(50));
            release_tx.send(()).unwrap();
        });

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert!(locks.is_empty());
    }
}
