// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transient notifications for the operator.
//!
//! Events describe what just happened (a page loaded, a fetch failed, a bulk
//! run finished). They are informational only; the controller and the
//! selection store remain the source of truth.

use roster_domain::BulkStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::FetchErrorKind;

/// Maximum number of events to buffer in the broadcast channel.
/// Slow subscribers lose the oldest events.
const EVENT_BUFFER_SIZE: usize = 100;

/// Notification emitted by the console components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleEvent {
    /// A list fetch was applied.
    PageLoaded {
        /// The page now shown.
        page: u32,
        /// Total pages.
        pages: u32,
        /// Total matching records.
        total: u32,
    },
    /// A list fetch failed; the previous page stays visible.
    FetchFailed {
        /// The failure classification.
        kind: FetchErrorKind,
        /// Human-readable description.
        message: String,
    },
    /// The selection changed.
    SelectionChanged {
        /// Number of selected records.
        count: usize,
    },
    /// A bulk run finished.
    BulkCompleted {
        /// The overall status.
        status: BulkStatus,
        /// One-line summary for the operator.
        summary: String,
    },
}

/// Fan-out of [`ConsoleEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<ConsoleEvent>,
}

impl EventBroadcaster {
    /// Creates a new event broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { tx }
    }

    /// Broadcasts an event. Without subscribers the event is dropped.
    pub fn broadcast(&self, event: &ConsoleEvent) {
        match self.tx.send(event.clone()) {
            Ok(count) => {
                debug!(?event, receivers = count, "Broadcast console event");
            }
            Err(_) => {
                debug!(?event, "No receivers for console event");
            }
        }
    }

    /// Subscribes to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
