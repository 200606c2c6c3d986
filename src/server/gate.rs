use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::watch;

/// Single-fire latch: goes from pending to fired once and stays fired.
///
/// Any number of tasks may call [`FetchGate::fire`] concurrently; exactly one
/// of them wins. Waiters that arrive after the gate fired return immediately.
#[derive(Debug)]
pub struct FetchGate {
    fired: AtomicBool,
    hits: AtomicUsize,
    tx: watch::Sender<bool>,
}

impl Default for FetchGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchGate {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            fired: AtomicBool::new(false),
            hits: AtomicUsize::new(0),
            tx,
        }
    }

    /// Fire the gate. Returns `true` only for the call that performed the transition.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.tx.send_replace(true);
        true
    }

    /// Count a fetch and fire on the first one.
    pub fn record_fetch(&self) -> bool {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.fire()
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    pub fn fetch_count(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Resolves once the gate has fired.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}
