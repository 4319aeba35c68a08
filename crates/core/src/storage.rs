// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Durable client storage and debounced persisted values.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StorageError;

/// A string key/value store that survives reloads.
pub trait DurableStorage: Send + Sync + 'static {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storage. Used by tests and as a fallback when no state
/// directory is configured.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes and removals performed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whether `key` currently holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }
}

impl DurableStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        lock(&self.entries).remove(key);
        Ok(())
    }
}

#[derive(Debug)]
enum WriteOp {
    Put(String),
    Remove,
}

#[derive(Debug, Default)]
struct Pending {
    op: Option<WriteOp>,
    timer: Option<JoinHandle<()>>,
}

struct PersistShared {
    key: String,
    storage: Arc<dyn DurableStorage>,
    pending: Mutex<Pending>,
}

impl PersistShared {
    /// Writes the pending operation, if any.
    ///
    /// The storage write happens under the lock so a late timer can never
    /// overwrite a newer value.
    fn flush_pending(&self, abort_timer: bool) -> Result<(), StorageError> {
        let mut pending: MutexGuard<'_, Pending> = lock(&self.pending);
        if let Some(timer) = pending.timer.take()
            && abort_timer
        {
            timer.abort();
        }
        match pending.op.take() {
            Some(WriteOp::Put(value)) => self.storage.write(&self.key, &value),
            Some(WriteOp::Remove) => self.storage.remove(&self.key),
            None => Ok(()),
        }
    }
}

/// A value persisted under one storage key with debounced writes.
///
/// Every [`PersistedState::store`] replaces the pending value and restarts
/// the debounce timer; only the last value within the window is written.
/// Outside a tokio runtime writes happen immediately. Dropping the handle
/// flushes any pending write.
pub struct PersistedState<T> {
    shared: Arc<PersistShared>,
    delay: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for PersistedState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedState")
            .field("key", &self.shared.key)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> PersistedState<T> {
    /// Creates a handle for `key`.
    ///
    /// # Arguments
    ///
    /// * `storage` - The backing storage
    /// * `key` - The storage key
    /// * `delay` - Debounce window for writes
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>, key: impl Into<String>, delay: Duration) -> Self {
        Self {
            shared: Arc::new(PersistShared {
                key: key.into(),
                storage,
                pending: Mutex::new(Pending::default()),
            }),
            delay,
            _marker: PhantomData,
        }
    }

    /// Returns the storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.shared.key
    }

    /// Reads the stored value.
    ///
    /// A missing key, a read failure or an unparsable value all yield
    /// `None`; the latter two are logged.
    #[must_use]
    pub fn load(&self) -> Option<T> {
        let raw: String = match self.shared.storage.read(&self.shared.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.shared.key, error = %e, "Failed to read persisted state");
                return None;
            }
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %self.shared.key, error = %e, "Discarding unparsable persisted state");
                None
            }
        }
    }

    /// Schedules `value` to be written after the debounce window.
    pub fn store(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.schedule(WriteOp::Put(json)),
            Err(e) => {
                warn!(key = %self.shared.key, error = %e, "Failed to serialize persisted state");
            }
        }
    }

    /// Removes the stored value immediately, discarding any pending write.
    pub fn remove(&self) {
        {
            let mut pending: MutexGuard<'_, Pending> = lock(&self.shared.pending);
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.op = Some(WriteOp::Remove);
        }
        if let Err(e) = self.shared.flush_pending(true) {
            warn!(key = %self.shared.key, error = %e, "Failed to remove persisted state");
        }
    }

    /// Writes any pending value now.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.shared.flush_pending(true)
    }

    /// Whether a write is waiting for its debounce window.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        lock(&self.shared.pending).op.is_some()
    }

    fn schedule(&self, op: WriteOp) {
        let mut pending: MutexGuard<'_, Pending> = lock(&self.shared.pending);
        pending.op = Some(op);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let Ok(handle) = Handle::try_current() else {
            drop(pending);
            if let Err(e) = self.shared.flush_pending(false) {
                warn!(key = %self.shared.key, error = %e, "Failed to write persisted state");
            }
            return;
        };

        let shared: Arc<PersistShared> = Arc::clone(&self.shared);
        let delay: Duration = self.delay;
        pending.timer = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(key = %shared.key, "Writing debounced persisted state");
            if let Err(e) = shared.flush_pending(false) {
                warn!(key = %shared.key, error = %e, "Failed to write persisted state");
            }
        }));
    }
}

impl<T> Drop for PersistedState<T> {
    fn drop(&mut self) {
        if let Err(e) = self.shared.flush_pending(true) {
            warn!(key = %self.shared.key, error = %e, "Failed to flush persisted state on drop");
        }
    }
}
