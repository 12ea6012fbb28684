use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutexes keyed by channel id.
///
/// Voice events for the same room (or the same creator channel) are handled
/// one at a time; unrelated rooms proceed concurrently.
#[derive(Default)]
pub struct RoomLocks {
    locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: u64) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let mutex = self.locks.entry(key).or_default().clone();
        mutex.lock_owned().await
    }

    /// Drops the entry once nobody else holds or waits on it.
    pub fn forget(&self, key: u64) {
        self.locks
            .remove_if(&key, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}
