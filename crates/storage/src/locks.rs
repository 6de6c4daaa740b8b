use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use progress_core::model::ProgressKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 1024;

/// One async lock per progress key, so updates to a record run one at a time
/// while different records proceed in parallel.
///
/// Shared through [`crate::repository::Storage`] so every writer built over
/// the same backend waits on the same table.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<ProgressKey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    /// Wait for exclusive access to `key`; released when the guard drops.
    pub async fn acquire(&self, key: &ProgressKey) -> OwnedMutexGuard<()> {
        let lock = {
            // The table only holds lock handles, so a poisoned guard is still usable.
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if table.len() >= SWEEP_THRESHOLD {
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
