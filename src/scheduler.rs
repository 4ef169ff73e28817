//! Delayed side effects tagged by submission.
//!
//! Every timer the pipeline starts (node highlights) is registered here with
//! the sequence number of the submission that owns it, so effects belonging
//! to a superseded submission can be cancelled before they fire.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

#[derive(Debug)]
struct Entry {
    seq: u64,
    token: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    entries: Arc<Mutex<Vec<Entry>>>,
    tracker: TaskTracker,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `effect` after `delay` unless submission `seq` is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, seq: u64, delay: Duration, effect: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut entries = self.lock();
            entries.retain(|e| !e.token.is_cancelled());
            entries.push(Entry {
                seq,
                token: token.clone(),
            });
        }

        self.tracker.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    effect();
                    // A fired task is no longer pending.
                    token.cancel();
                }
            }
        });
    }

    /// Cancel every pending effect owned by a submission older than `seq`.
    pub fn cancel_before(&self, seq: u64) -> usize {
        self.cancel_where(|e| e.seq < seq)
    }

    pub fn cancel_all(&self) -> usize {
        self.cancel_where(|_| true)
    }

    /// Number of effects that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|e| !e.token.is_cancelled()).count()
    }

    /// Wait until every effect scheduled so far has fired or been cancelled.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn cancel_where(&self, pred: impl Fn(&Entry) -> bool) -> usize {
        let mut entries = self.lock();
        let mut cancelled = 0;
        entries.retain(|e| {
            if e.token.is_cancelled() {
                return false;
            }
            if pred(e) {
                e.token.cancel();
                cancelled += 1;
                return false;
            }
            true
        });
        if cancelled > 0 {
            debug!(target: "scheduler", cancelled, "cancelled delayed effects");
        }
        cancelled
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
