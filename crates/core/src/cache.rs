// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster_domain::{FetchKey, StudentPage};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Default freshness window for cached list pages.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CacheEntry {
    page: StudentPage,
    fetched_at: Instant,
}

/// Shared cache of list pages keyed by query parameters.
///
/// One instance is created by the owner of the list views and handed to
/// every controller that should share results.
#[derive(Debug)]
pub struct QueryCache {
    ttl: Duration,
    entries: Mutex<HashMap<FetchKey, CacheEntry>>,
}

impl QueryCache {
    /// Creates an empty cache whose entries stay fresh for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<FetchKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a fresh entry for `key`. Stale entries are evicted.
    #[must_use]
    pub fn get(&self, key: &FetchKey) -> Option<StudentPage> {
        let mut entries = self.entries();
        let fresh: bool = entries
            .get(key)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl);
        if fresh {
            entries.get(key).map(|entry| entry.page.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Stores `page` as the current result for `key`, dropping any entry
    /// that has gone stale.
    pub fn insert(&self, key: FetchKey, page: StudentPage) {
        let mut entries = self.entries();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                page,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops every entry, e.g. after a mutation changed the backend.
    pub fn invalidate(&self) {
        self.entries().clear();
    }

    /// Number of entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
