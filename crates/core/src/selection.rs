// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Records selected across pages, with the snapshots needed to act on them.

use roster_domain::{SelectionSnapshot, StudentId, StudentRecord};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::events::{ConsoleEvent, EventBroadcaster};
use crate::storage::{DurableStorage, PersistedState};

/// Storage key of the ordered selected-id list.
pub const SELECTED_IDS_KEY: &str = "roster.selection.ids";

/// Storage key of the id to snapshot map.
pub const SNAPSHOTS_KEY: &str = "roster.selection.snapshots";

/// Persistence and batching settings for a [`SelectionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Debounce window for storage writes.
    pub persist_debounce: Duration,
    /// Records selected between two scheduler yields.
    pub batch_size: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            persist_debounce: Duration::from_millis(100),
            batch_size: 50,
        }
    }
}

/// Result of toggling the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToggle {
    /// This many records were added to the selection.
    Selected(usize),
    /// The whole page was already selected; this many were removed.
    Deselected(usize),
}

/// Selection state that survives page changes and reloads.
///
/// Every selected id has a snapshot captured at selection time, except
/// when storage was tampered with; such ids are reported by
/// [`SelectionStore::selected_data_with_missing`].
#[derive(Debug)]
pub struct SelectionStore {
    order: Vec<StudentId>,
    members: HashSet<StudentId>,
    snapshots: BTreeMap<StudentId, SelectionSnapshot>,
    ids_state: PersistedState<Vec<StudentId>>,
    snapshots_state: PersistedState<BTreeMap<StudentId, SelectionSnapshot>>,
    batch_size: usize,
    events: Option<EventBroadcaster>,
}

impl SelectionStore {
    /// Creates a store, hydrating from `storage` when a selection was saved.
    ///
    /// Missing or unreadable keys yield an empty selection.
    #[must_use]
    pub fn mount(storage: Arc<dyn DurableStorage>, config: &SelectionConfig) -> Self {
        let ids_state: PersistedState<Vec<StudentId>> = PersistedState::new(
            Arc::clone(&storage),
            SELECTED_IDS_KEY,
            config.persist_debounce,
        );
        let snapshots_state: PersistedState<BTreeMap<StudentId, SelectionSnapshot>> =
            PersistedState::new(storage, SNAPSHOTS_KEY, config.persist_debounce);

        let stored_ids: Vec<StudentId> = ids_state.load().unwrap_or_default();
        let mut snapshots: BTreeMap<StudentId, SelectionSnapshot> =
            snapshots_state.load().unwrap_or_default();

        let mut order: Vec<StudentId> = Vec::with_capacity(stored_ids.len());
        let mut members: HashSet<StudentId> = HashSet::with_capacity(stored_ids.len());
        for id in stored_ids {
            if members.insert(id.clone()) {
                order.push(id);
            }
        }
        snapshots.retain(|id, _| members.contains(id));
        if !order.is_empty() {
            debug!(count = order.len(), "Restored selection");
        }

        Self {
            order,
            members,
            snapshots,
            ids_state,
            snapshots_state,
            batch_size: config.batch_size.max(1),
            events: None,
        }
    }

    /// Reports selection changes to `events`.
    #[must_use]
    pub fn with_events(mut self, events: EventBroadcaster) -> Self {
        self.events = Some(events);
        self
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &StudentId) -> bool {
        self.members.contains(id)
    }

    /// Number of selected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn selected_ids(&self) -> &[StudentId] {
        &self.order
    }

    /// Selects `record`, capturing its snapshot.
    ///
    /// Returns `false` when it was already selected; the existing snapshot
    /// is kept.
    pub fn select(&mut self, record: &StudentRecord) -> bool {
        let added: bool = self.insert(record);
        if added {
            self.changed();
        }
        added
    }

    /// Deselects `id`. Returns `false` when it was not selected.
    pub fn deselect(&mut self, id: &StudentId) -> bool {
        let removed: bool = self.remove(id);
        if removed {
            self.changed();
        }
        removed
    }

    /// Flips the selection of `record`. Returns whether it is now selected.
    pub fn toggle(&mut self, record: &StudentRecord) -> bool {
        if self.is_selected(&record.id) {
            self.deselect(&record.id);
            false
        } else {
            self.select(record);
            true
        }
    }

    /// Selects every record of the current page, or deselects exactly those
    /// records when all of them are already selected.
    ///
    /// Large pages are processed in batches, yielding to the scheduler
    /// between batches.
    pub async fn select_all_on_current_page(&mut self, records: &[StudentRecord]) -> PageToggle {
        if !records.is_empty() && records.iter().all(|r| self.is_selected(&r.id)) {
            let mut removed: usize = 0;
            for record in records {
                if self.remove(&record.id) {
                    removed += 1;
                }
            }
            self.changed();
            return PageToggle::Deselected(removed);
        }

        let pending: Vec<&StudentRecord> = records
            .iter()
            .filter(|r| !self.is_selected(&r.id))
            .collect();
        let mut added: usize = 0;
        for (idx, batch) in pending.chunks(self.batch_size).enumerate() {
            if idx > 0 {
                tokio::task::yield_now().await;
            }
            for record in batch {
                if self.insert(record) {
                    added += 1;
                }
            }
        }
        if added > 0 {
            self.changed();
        }
        PageToggle::Selected(added)
    }

    /// Empties the selection and removes the persisted copy.
    pub fn clear_all(&mut self) {
        self.order.clear();
        self.members.clear();
        self.snapshots.clear();
        self.ids_state.remove();
        self.snapshots_state.remove();
        self.notify();
    }

    /// Snapshots of the selected records in selection order.
    ///
    /// Ids without a snapshot are skipped and logged.
    #[must_use]
    pub fn selected_data(&self) -> Vec<SelectionSnapshot> {
        self.selected_data_with_missing().0
    }

    /// Snapshots of the selected records, plus the ids that have none.
    #[must_use]
    pub fn selected_data_with_missing(&self) -> (Vec<SelectionSnapshot>, Vec<StudentId>) {
        let mut data: Vec<SelectionSnapshot> = Vec::with_capacity(self.order.len());
        let mut missing: Vec<StudentId> = Vec::new();
        for id in &self.order {
            match self.snapshots.get(id) {
                Some(snapshot) => data.push(snapshot.clone()),
                None => {
                    warn!(student_id = %id, "Selected student has no snapshot, skipping");
                    missing.push(id.clone());
                }
            }
        }
        (data, missing)
    }

    /// Writes pending changes to storage now.
    ///
    /// # Errors
    ///
    /// Returns an error if either storage write fails.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.ids_state.flush()?;
        self.snapshots_state.flush()
    }

    fn insert(&mut self, record: &StudentRecord) -> bool {
        if !self.members.insert(record.id.clone()) {
            return false;
        }
        self.order.push(record.id.clone());
        self.snapshots.insert(record.id.clone(), record.snapshot());
        true
    }

    fn remove(&mut self, id: &StudentId) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        self.order.retain(|selected| selected != id);
        self.snapshots.remove(id);
        true
    }

    fn changed(&self) {
        self.ids_state.store(&self.order);
        self.snapshots_state.store(&self.snapshots);
        self.notify();
    }

    fn notify(&self) {
        if let Some(events) = &self.events {
            events.broadcast(&ConsoleEvent::SelectionChanged {
                count: self.order.len(),
            });
        }
    }
}
