use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::domain::IssueKey;

/// Per-issue async mutexes so load, mutate, and persist of one issue's state never interleave.
#[derive(Debug, Default)]
pub struct IssueLocks {
    slots: Mutex<HashMap<IssueKey, Arc<AsyncMutex<()>>>>,
}

impl IssueLocks {
    pub async fn acquire(&self, issue_key: &IssueKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(issue_key.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
