// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod backend;
mod cache;
mod controller;
mod coordinator;
mod error;
mod events;
mod selection;
mod session;
mod storage;

#[cfg(test)]
mod tests;

// Re-export public types and functions
pub use backend::{GroupMutator, MutationResponse, StudentDirectory, StudentResult};
pub use cache::{DEFAULT_CACHE_TTL, QueryCache};
pub use controller::{ControllerConfig, ControllerView, FetchOutcome, QueryController};
pub use coordinator::{BulkMutationCoordinator, BulkPhase, CoordinatorConfig, Dispatch};
pub use error::{
    BackendError, FetchError, FetchErrorKind, FilterError, InvalidPageRequest, StorageError,
};
pub use events::{ConsoleEvent, EventBroadcaster};
pub use selection::{PageToggle, SELECTED_IDS_KEY, SNAPSHOTS_KEY, SelectionConfig, SelectionStore};
pub use session::{SESSION_KEY, Session, SessionEvent, SessionProvider};
pub use storage::{DurableStorage, MemoryStorage, PersistedState};
