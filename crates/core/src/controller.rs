// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Filter, search and pagination state of a student list, and the fetches
//! that keep it in sync with the backend.
//!
//! # Ordering
//!
//! Every issued fetch takes a sequence number. Only the completion carrying
//! the latest number is applied; older completions are discarded when they
//! arrive, whatever their arrival order. Superseded requests are not
//! cancelled on the network.
//!
//! # Debounce
//!
//! Filter changes schedule a fetch after a short window (longer for typed
//! search text). A new change within the window aborts the pending timer and
//! starts a fresh one, so only the last value is fetched.

use roster_domain::{
    ChangeOrigin, FetchKey, FilterKey, Pagination, QueryState, StudentPage, StudentRecord,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::StudentDirectory;
use crate::cache::QueryCache;
use crate::error::{BackendError, FetchError, FetchErrorKind, FilterError, InvalidPageRequest};
use crate::events::{ConsoleEvent, EventBroadcaster};

/// Debounce and paging settings for a [`QueryController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Window applied to free-text search changes.
    pub search_debounce: Duration,
    /// Window applied to structured filter changes.
    pub filter_debounce: Duration,
    /// Initial page size.
    pub page_size: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(500),
            filter_debounce: Duration::from_millis(100),
            page_size: roster_domain::DEFAULT_PAGE_SIZE,
        }
    }
}

/// What happened to a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// An identical fetch was pending or already satisfied.
    Skipped,
    /// The result is now displayed.
    Applied,
    /// A newer fetch was issued before this one completed.
    Discarded,
    /// The fetch failed; the previous page is still displayed.
    Failed(FetchError),
}

/// A read-only copy of the controller state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerView {
    /// The current query.
    pub query: QueryState,
    /// The records of the last applied page.
    pub records: Vec<StudentRecord>,
    /// Pagination of the last applied page.
    pub pagination: Option<Pagination>,
    /// Whether any page has been applied.
    pub loaded: bool,
    /// The most recent failure, cleared by the next success.
    pub last_error: Option<FetchError>,
    /// Whether a fetch is in flight.
    pub fetching: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyStatus {
    Pending,
    Satisfied,
    Failed,
}

#[derive(Debug)]
struct FetchTicket {
    seq: u64,
    key: FetchKey,
    query: QueryState,
    force: bool,
}

#[derive(Debug)]
struct ControllerState {
    query: QueryState,
    records: Vec<StudentRecord>,
    pagination: Option<Pagination>,
    loaded: bool,
    last_error: Option<FetchError>,
    /// Sequence number of the most recently issued fetch.
    issued: u64,
    last_key: Option<(FetchKey, KeyStatus)>,
    in_flight: usize,
    /// Sequence number of an in-flight fetch started by a page change.
    page_fetch: Option<u64>,
    debounce: Option<JoinHandle<()>>,
    debounce_generation: u64,
}

impl ControllerState {
    fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.debounce.is_none()
    }
}

struct Shared<D> {
    directory: Arc<D>,
    config: ControllerConfig,
    state: Mutex<ControllerState>,
    idle: Notify,
    events: EventBroadcaster,
    cache: Option<Arc<QueryCache>>,
}

/// Owns the query state of one list view and the fetches it triggers.
///
/// Cloning is cheap; clones share the same state.
pub struct QueryController<D> {
    shared: Arc<Shared<D>>,
}

impl<D> Clone for QueryController<D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<D: StudentDirectory> QueryController<D> {
    /// Creates a controller with its own event broadcaster and no cache.
    #[must_use]
    pub fn new(directory: Arc<D>, config: ControllerConfig) -> Self {
        Self::with_parts(directory, config, EventBroadcaster::new(), None)
    }

    /// Creates a controller that reports to `events` and optionally shares
    /// `cache` with other controllers.
    #[must_use]
    pub fn with_parts(
        directory: Arc<D>,
        config: ControllerConfig,
        events: EventBroadcaster,
        cache: Option<Arc<QueryCache>>,
    ) -> Self {
        let query: QueryState = QueryState::with_page_size(config.page_size);
        Self {
            shared: Arc::new(Shared {
                directory,
                config,
                state: Mutex::new(ControllerState {
                    query,
                    records: Vec::new(),
                    pagination: None,
                    loaded: false,
                    last_error: None,
                    issued: 0,
                    last_key: None,
                    in_flight: 0,
                    page_fetch: None,
                    debounce: None,
                    debounce_generation: 0,
                }),
                idle: Notify::new(),
                events,
                cache,
            }),
        }
    }

    /// Returns the broadcaster this controller reports to.
    #[must_use]
    pub fn events(&self) -> &EventBroadcaster {
        &self.shared.events
    }

    async fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.shared.state.lock().await
    }

    /// Returns a copy of the current state.
    pub async fn view(&self) -> ControllerView {
        let state = self.lock().await;
        ControllerView {
            query: state.query.clone(),
            records: state.records.clone(),
            pagination: state.pagination,
            loaded: state.loaded,
            last_error: state.last_error.clone(),
            fetching: state.in_flight > 0,
        }
    }

    /// Returns the current query.
    pub async fn query(&self) -> QueryState {
        self.lock().await.query.clone()
    }

    /// Sets one filter and schedules a debounced fetch.
    ///
    /// Any key other than the page resets the page to 1. A page value is
    /// handed to [`Self::set_page`] and fetched without debounce.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is invalid for `key`, or if a page
    /// change is refused by [`Self::set_page`]; nothing is scheduled in
    /// either case.
    pub async fn set_filter(&self, key: FilterKey, value: &str) -> Result<(), FilterError> {
        if matches!(key, FilterKey::Page) {
            let mut requested: QueryState = self.query().await;
            requested.apply_filter(&key, value)?;
            self.set_page(requested.page).await?;
            return Ok(());
        }

        let mut state = self.lock().await;
        state.query.apply_filter(&key, value)?;
        let delay: Duration = match key.origin() {
            ChangeOrigin::FreeText => self.shared.config.search_debounce,
            ChangeOrigin::Structured => self.shared.config.filter_debounce,
        };
        debug!(filter = key.param_name(), ?delay, "Filter changed");
        self.schedule_locked(&mut state, delay);
        Ok(())
    }

    /// Moves to `page` and fetches it right away.
    ///
    /// # Errors
    ///
    /// The request is ignored, and the reason returned, when the page count
    /// is unknown, `page` is out of range, or a previous page change is still
    /// being fetched.
    pub async fn set_page(&self, page: u32) -> Result<(), InvalidPageRequest> {
        let ticket: Option<FetchTicket> = {
            let mut state = self.lock().await;
            let Some(pagination) = state.pagination else {
                debug!(page, "Ignoring page change before first load");
                return Err(InvalidPageRequest::TotalUnknown);
            };
            if !pagination.contains(page) {
                debug!(page, pages = pagination.last_page(), "Ignoring out-of-range page");
                return Err(InvalidPageRequest::OutOfRange {
                    requested: page,
                    pages: pagination.last_page(),
                });
            }
            if state.page_fetch.is_some() {
                debug!(page, "Ignoring page change while another is in flight");
                return Err(InvalidPageRequest::PaginationInFlight);
            }
            state.query.page = page;
            let ticket: Option<FetchTicket> = Self::begin_fetch_locked(&mut state, false);
            if let Some(ticket) = &ticket {
                state.page_fetch = Some(ticket.seq);
            }
            ticket
        };
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }
        Ok(())
    }

    /// Fetches the current query now.
    ///
    /// Without `force`, the fetch is skipped when the same parameters are
    /// already pending or displayed.
    pub async fn fetch(&self, force: bool) -> FetchOutcome {
        let ticket: Option<FetchTicket> = {
            let mut state = self.lock().await;
            Self::begin_fetch_locked(&mut state, force)
        };
        let Some(ticket) = ticket else {
            return FetchOutcome::Skipped;
        };
        // Run detached so a dropped caller cannot leave the fetch half-done.
        let controller: Self = self.clone();
        match tokio::spawn(async move { controller.run_fetch(ticket).await }).await {
            Ok(outcome) => outcome,
            Err(e) => FetchOutcome::Failed(FetchError {
                kind: FetchErrorKind::Interrupted,
                message: e.to_string(),
            }),
        }
    }

    /// Drops cached pages and refetches the current query.
    pub async fn refresh(&self) -> FetchOutcome {
        if let Some(cache) = &self.shared.cache {
            cache.invalidate();
        }
        self.fetch(true).await
    }

    /// Cancels a pending debounced fetch, e.g. when leaving the view.
    pub async fn cancel_pending(&self) {
        let mut state = self.lock().await;
        if let Some(timer) = state.debounce.take() {
            timer.abort();
            state.debounce_generation += 1;
        }
        drop(state);
        self.shared.idle.notify_waiters();
    }

    /// Resolves once no debounce timer is pending and no fetch is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.lock().await.is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn schedule_locked(&self, state: &mut ControllerState, delay: Duration) {
        if let Some(timer) = state.debounce.take() {
            timer.abort();
        }
        state.debounce_generation += 1;
        let generation: u64 = state.debounce_generation;
        let controller: Self = self.clone();
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            controller.fire_debounce(generation).await;
        }));
    }

    async fn fire_debounce(&self, generation: u64) {
        let ticket: Option<FetchTicket> = {
            let mut state = self.lock().await;
            if state.debounce_generation != generation {
                return;
            }
            state.debounce = None;
            Self::begin_fetch_locked(&mut state, false)
        };
        match ticket {
            Some(ticket) => self.spawn_fetch(ticket),
            None => self.shared.idle.notify_waiters(),
        }
    }

    fn begin_fetch_locked(state: &mut ControllerState, force: bool) -> Option<FetchTicket> {
        let key: FetchKey = state.query.fetch_key();
        if !force
            && let Some((last, status)) = &state.last_key
            && *last == key
            && matches!(status, KeyStatus::Pending | KeyStatus::Satisfied)
        {
            debug!(%key, ?status, "Skipping duplicate fetch");
            return None;
        }
        state.issued += 1;
        state.last_key = Some((key.clone(), KeyStatus::Pending));
        state.in_flight += 1;
        Some(FetchTicket {
            seq: state.issued,
            key,
            query: state.query.clone(),
            force,
        })
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let controller: Self = self.clone();
        tokio::spawn(async move {
            controller.run_fetch(ticket).await;
        });
    }

    async fn run_fetch(&self, ticket: FetchTicket) -> FetchOutcome {
        let cached: Option<StudentPage> = match &self.shared.cache {
            Some(cache) if !ticket.force => cache.get(&ticket.key),
            _ => None,
        };
        let result: Result<StudentPage, BackendError> = match cached {
            Some(page) => {
                debug!(key = %ticket.key, "Serving page from cache");
                Ok(page)
            }
            None => {
                let result: Result<StudentPage, BackendError> =
                    self.shared.directory.list_students(&ticket.query).await;
                if let (Ok(page), Some(cache)) = (&result, &self.shared.cache) {
                    cache.insert(ticket.key.clone(), page.clone());
                }
                result
            }
        };
        self.complete_fetch(ticket, result).await
    }

    async fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: Result<StudentPage, BackendError>,
    ) -> FetchOutcome {
        let mut follow_up: Option<FetchTicket> = None;
        let mut state = self.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        if state.page_fetch == Some(ticket.seq) {
            state.page_fetch = None;
        }

        let outcome: FetchOutcome = if ticket.seq == state.issued {
            match result {
                Ok(page) => {
                    state.last_key = Some((ticket.key, KeyStatus::Satisfied));
                    state.records = page.records;
                    state.pagination = Some(page.pagination);
                    state.loaded = true;
                    state.last_error = None;
                    self.shared.events.broadcast(&ConsoleEvent::PageLoaded {
                        page: page.pagination.page,
                        pages: page.pagination.pages,
                        total: page.pagination.total,
                    });
                    if !page.pagination.contains(state.query.page) {
                        let clamped: u32 = page.pagination.clamp_page(state.query.page);
                        debug!(
                            from = state.query.page,
                            to = clamped,
                            "Current page no longer exists, moving back"
                        );
                        state.query.page = clamped;
                        follow_up = Self::begin_fetch_locked(&mut state, false);
                    }
                    FetchOutcome::Applied
                }
                Err(e) => {
                    warn!(error = %e, key = %ticket.key, "Student list fetch failed");
                    let error: FetchError = FetchError::from(&e);
                    state.last_key = Some((ticket.key, KeyStatus::Failed));
                    state.last_error = Some(error.clone());
                    self.shared.events.broadcast(&ConsoleEvent::FetchFailed {
                        kind: error.kind,
                        message: error.message.clone(),
                    });
                    FetchOutcome::Failed(error)
                }
            }
        } else {
            debug!(
                seq = ticket.seq,
                latest = state.issued,
                "Discarding superseded fetch result"
            );
            FetchOutcome::Discarded
        };
        drop(state);

        if let Some(ticket) = follow_up {
            self.spawn_fetch(ticket);
        }
        self.shared.idle.notify_waiters();
        outcome
    }
}
