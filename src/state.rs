use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::usage::CoreSample;

/// Contents of the shared CPU table. Overwritten wholesale on every reader
/// tick; only the most recent value matters (last-value-wins, no history).
#[derive(Debug, Clone, PartialEq)]
pub enum TableData {
    /// Raw counter pair for the delta-based sampler variant. Both vectors are
    /// indexed by core id and have the same length as the core-name list.
    Counters {
        prev: Vec<CoreSample>,
        curr: Vec<CoreSample>,
    },
    /// Pre-aggregated percentages for the pass-through sampler variant.
    Percentages(Vec<f64>),
    /// Startup state before the first tick lands.
    Empty,
}

/// Shared CPU table plus the readiness signal and the one-way running flag.
///
/// One instance is built at startup and handed by `Arc` to every loop; there
/// is no ambient global state. The reader is the only writer of the table,
/// consumers block on the condition variable and re-read the latest table on
/// every wake. Notification is a broadcast, not delivery of data by value: a
/// slow consumer may observe a table already overwritten by a later tick.
pub struct SharedState {
    names: Vec<String>,
    table: Mutex<TableData>,
    data_ready: Condvar,
    running: AtomicBool,
}

impl SharedState {
    pub fn new(num_cpus: usize) -> Self {
        Self {
            names: (0..num_cpus).map(|i| format!("cpu{}", i)).collect(),
            table: Mutex::new(TableData::Empty),
            data_ready: Condvar::new(),
            running: AtomicBool::new(true),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_cpus(&self) -> usize {
        self.names.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // A panicking writer must not wedge the watchdog or the consumers, so
    // poisoned locks are recovered rather than propagated.
    fn lock_table(&self) -> MutexGuard<'_, TableData> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the table and wake every blocked consumer. Reader-only.
    pub fn publish(&self, data: TableData) {
        let mut table = self.lock_table();
        *table = data;
        self.data_ready.notify_all();
    }

    /// Wake every blocked consumer without touching the table. The watchdog
    /// uses this to guarantee liveness when the reader stalls. The lock is
    /// taken so the broadcast cannot slip between a consumer's flag check and
    /// its wait.
    pub fn force_wake(&self) {
        let _table = self.lock_table();
        self.data_ready.notify_all();
    }

    /// Flip the running flag (terminal, never reset) and wake every waiter so
    /// it can observe the flag and exit.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let _table = self.lock_table();
        self.data_ready.notify_all();
    }

    /// Block until the next readiness broadcast and return a copy of the
    /// latest table, or `None` once shutdown has been requested.
    ///
    /// The flag is checked both before and after the wait: before, so that no
    /// consumer re-enters a blocking wait after shutdown; after, so that a
    /// spurious or final-shutdown wakeup is never mistaken for fresh data.
    pub fn wait_for_update(&self) -> Option<TableData> {
        let table = self.lock_table();
        if !self.is_running() {
            return None;
        }
        let table = self
            .data_ready
            .wait(table)
            .unwrap_or_else(PoisonError::into_inner);
        if !self.is_running() {
            return None;
        }
        Some(table.clone())
    }

    /// Non-blocking copy of the latest table, for loops not gated by the
    /// readiness signal.
    pub fn snapshot(&self) -> TableData {
        self.lock_table().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::CoreSample;
    use crossbeam::channel;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn counters(user: u64) -> TableData {
        TableData::Counters {
            prev: vec![CoreSample::default()],
            curr: vec![CoreSample {
                user,
                ..Default::default()
            }],
        }
    }

    #[test]
    fn core_names_are_ordered_by_id() {
        let state = SharedState::new(3);
        assert_eq!(state.names(), ["cpu0", "cpu1", "cpu2"]);
        assert_eq!(state.num_cpus(), 3);
    }

    #[test]
    fn publish_fans_out_identical_tables_to_all_waiters() {
        let state = Arc::new(SharedState::new(1));
        let (tx, rx) = channel::bounded(2);

        let consumers: Vec<_> = (0..2)
            .map(|_| {
                let state = Arc::clone(&state);
                let tx = tx.clone();
                thread::spawn(move || {
                    if let Some(table) = state.wait_for_update() {
                        tx.send(table).unwrap();
                    }
                })
            })
            .collect();

        // Keep broadcasting until both consumers have reported; a single
        // publish could fire before a consumer reaches its wait.
        let mut seen = Vec::new();
        while seen.len() < 2 {
            state.publish(counters(7));
            if let Ok(table) = rx.recv_timeout(Duration::from_millis(20)) {
                seen.push(table);
            }
        }

        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], counters(7));
        state.shutdown();
        for handle in consumers {
            handle.join().unwrap();
        }
    }

    #[test]
    fn shutdown_wakes_blocked_waiter() {
        let state = Arc::new(SharedState::new(1));
        let waiter = {
            let state = Arc::clone(&state);
            thread::spawn(move || state.wait_for_update())
        };

        thread::sleep(Duration::from_millis(50));
        state.shutdown();
        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn wait_never_blocks_again_after_shutdown() {
        let state = SharedState::new(1);
        state.shutdown();
        // Returns immediately instead of re-entering the wait.
        assert_eq!(state.wait_for_update(), None);
        assert!(!state.is_running());
    }

    #[test]
    fn force_wake_releases_waiter_without_new_data() {
        let state = Arc::new(SharedState::new(1));
        let (tx, rx) = channel::bounded(1);
        let waiter = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                tx.send(state.wait_for_update()).unwrap();
            })
        };

        let woken = loop {
            state.force_wake();
            match rx.recv_timeout(Duration::from_millis(20)) {
                Ok(table) => break table,
                Err(_) => continue,
            }
        };

        // Woken while running, but the table never advanced past startup.
        assert_eq!(woken, Some(TableData::Empty));
        waiter.join().unwrap();
    }

    #[test]
    fn snapshot_returns_latest_publish() {
        let state = SharedState::new(1);
        assert_eq!(state.snapshot(), TableData::Empty);
        state.publish(counters(1));
        state.publish(counters(2));
        assert_eq!(state.snapshot(), counters(2));
    }
}
