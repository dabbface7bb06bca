//! Per-resource upload lock
//!
//! In-process keyed mutexes. Each key maps to a `tokio::sync::Mutex`; entries are
//! dropped again once nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tessera_core::AppError;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// Lock name for uploads to a resource.
pub fn upload_lock_key(resource_id: Uuid) -> String {
    format!("{}_upload_lock", resource_id)
}

#[derive(Clone, Default)]
pub struct UploadLocks {
    locks: Arc<StdMutex<LockMap>>,
}

impl UploadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the upload lock for a resource, waiting at most `timeout`.
    pub async fn acquire(
        &self,
        resource_id: Uuid,
        timeout: Duration,
    ) -> Result<UploadLockGuard, AppError> {
        let key = upload_lock_key(resource_id);
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match tokio::time::timeout(timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(UploadLockGuard {
                guard: Some(guard),
                key,
                locks: self.locks.clone(),
            }),
            Err(_) => {
                self.prune(&key);
                tracing::warn!(resource_id = %resource_id, timeout_ms = timeout.as_millis() as u64, "Upload lock acquisition timed out");
                Err(AppError::Locked(
                    "Another upload to this resource is in progress, try again later.".to_string(),
                ))
            }
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn prune(&self, key: &str) {
        prune_key(&self.locks, key);
    }
}

fn prune_key(locks: &StdMutex<LockMap>, key: &str) {
    let mut locks = locks.lock().unwrap_or_else(|e| e.into_inner());
    // Only the map itself still references the mutex.
    if locks.get(key).is_some_and(|m| Arc::strong_count(m) == 1) {
        locks.remove(key);
    }
}

/// Held while an upload runs. Releases on drop.
pub struct UploadLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<StdMutex<LockMap>>,
}

impl UploadLockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for UploadLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        prune_key(&self.locks, &self.key);
    }
}
