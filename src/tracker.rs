// Copyright (C) 2020-2024 Andy Kurnia.

use std::sync::Arc;
use tokio::sync::watch;

/// Counts participants that have joined but not yet left.
///
/// `register` and the matching finish (dropping the returned
/// `Participant`) can interleave in any order from any task; `wait`
/// resolves once the count is back to zero.
#[derive(Debug, Clone)]
pub struct CompletionTracker {
    outstanding: Arc<watch::Sender<usize>>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionTracker {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            outstanding: Arc::new(outstanding),
        }
    }

    pub fn register(&self) -> Participant {
        self.outstanding.send_modify(|n| *n += 1);
        Participant {
            tracker: self.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.outstanding.subscribe();
        // the sender lives in self, so this cannot see a closed channel
        let _ = rx.wait_for(|&n| n == 0).await;
    }

    fn finish(&self) {
        self.outstanding.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// One registration. Finishes when dropped.
#[derive(Debug)]
pub struct Participant {
    tracker: CompletionTracker,
}

impl Participant {
    pub fn finish(self) {}
}

impl Drop for Participant {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
