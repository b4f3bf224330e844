//! Per-sender mutual exclusion.

use std::sync::Arc;

use {
    dashmap::DashMap,
    receptionist_common::SenderKey,
    tokio::sync::{Mutex, OwnedMutexGuard},
};

/// One async mutex per sender key.
///
/// Messages from the same sender are handled one at a time; different
/// senders never wait on each other. An entry lives only while someone holds
/// or waits for it.
#[derive(Debug, Clone, Default)]
pub struct SenderLocks {
    locks: Arc<DashMap<SenderKey, Arc<Mutex<()>>>>,
}

/// Held while a message from one sender is being handled.
#[derive(Debug)]
pub struct SenderGuard {
    guard: Option<OwnedMutexGuard<()>>,
    sender: SenderKey,
    locks: Arc<DashMap<SenderKey, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sender`.
    pub async fn acquire(&self, sender: &SenderKey) -> SenderGuard {
        let lock = Arc::clone(&self.locks.entry(sender.clone()).or_default());
        SenderGuard {
            guard: Some(lock.lock_owned().await),
            sender: sender.clone(),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl Drop for SenderGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones are only taken under the shard lock, so a count of one here
        // means no holder and no waiter.
        self.locks
            .remove_if(&self.sender, |_, lock| Arc::strong_count(lock) == 1);
    }
}
