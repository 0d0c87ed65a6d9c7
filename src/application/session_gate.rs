//! Per-session-key turn serialization.
//!
//! Voice transcription and SMS webhooks can deliver two utterances for the
//! same caller nearly simultaneously. Each session key gets its own async
//! mutex so turns for one caller apply in arrival order while different
//! callers proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::ports::SessionKey;

/// One async mutex per session key.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    locks: Arc<Mutex<HashMap<SessionKey, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `key`, waiting behind any in-flight turn for
    /// the same key. The guard releases on drop.
    pub async fn acquire(&self, key: &SessionKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(
                locks
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drops gate entries nobody is waiting on. Called opportunistically
    /// when a conversation ends.
    pub fn prune(&self) {
        let mut locks = self.locks.lock().unwrap();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
