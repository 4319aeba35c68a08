// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The operator's session, decoupled from where it is stored.

use roster_domain::{SchoolId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::storage::{DurableStorage, PersistedState};

/// Storage key of the persisted session.
pub const SESSION_KEY: &str = "roster.session";

const SESSION_EVENT_BUFFER: usize = 16;

/// An authenticated operator session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token sent with every backend request.
    pub token: String,
    /// The signed-in account.
    pub user_id: UserId,
    /// The school the account administers.
    pub school_id: SchoolId,
    /// The account's role, as reported by the backend.
    pub role: String,
    /// When the token stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Whether the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Session lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was stored.
    SignedIn {
        /// The signed-in account.
        user_id: UserId,
    },
    /// The session was cleared explicitly.
    Cleared,
    /// The session was found expired and dropped.
    Expired {
        /// The account whose session expired.
        user_id: UserId,
    },
}

/// Owns the current session and announces every invalidation.
pub struct SessionProvider {
    state: PersistedState<Session>,
    current: Mutex<Option<Session>>,
    tx: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionProvider")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionProvider {
    /// Creates a provider, restoring any stored session.
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        let state: PersistedState<Session> =
            PersistedState::new(storage, SESSION_KEY, Duration::ZERO);
        let current: Option<Session> = state.load();
        if let Some(session) = &current {
            debug!(user_id = %session.user_id, "Restored session");
        }
        let (tx, _rx) = broadcast::channel(SESSION_EVENT_BUFFER);
        Self {
            state,
            current: Mutex::new(current),
            tx,
        }
    }

    fn current(&self) -> MutexGuard<'_, Option<Session>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the session if it is still valid.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.get_at(OffsetDateTime::now_utc())
    }

    /// Returns the session if it is still valid at `now`.
    ///
    /// An expired session is dropped and [`SessionEvent::Expired`] is sent.
    #[must_use]
    pub fn get_at(&self, now: OffsetDateTime) -> Option<Session> {
        let mut current = self.current();
        let expired: bool = current.as_ref().is_some_and(|s| s.is_expired_at(now));
        if !expired {
            return current.clone();
        }
        if let Some(session) = current.take() {
            drop(current);
            info!(user_id = %session.user_id, "Session expired");
            self.state.remove();
            self.send(SessionEvent::Expired {
                user_id: session.user_id,
            });
        }
        None
    }

    /// Returns the bearer token of a valid session.
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        self.get().map(|s| s.token)
    }

    /// Stores a new session.
    pub fn set(&self, session: Session) {
        self.state.store(&session);
        if let Err(e) = self.state.flush() {
            warn!(error = %e, "Failed to persist session");
        }
        let user_id: UserId = session.user_id.clone();
        *self.current() = Some(session);
        self.send(SessionEvent::SignedIn { user_id });
    }

    /// Drops the session.
    pub fn clear(&self) {
        let had_session: bool = self.current().take().is_some();
        self.state.remove();
        if had_session {
            self.send(SessionEvent::Cleared);
        }
    }

    /// Subscribes to session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("No receivers for session event");
        }
    }
}
