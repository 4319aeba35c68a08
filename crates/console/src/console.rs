// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::{Context, bail};
use roster::{
    BulkMutationCoordinator, ConsoleEvent, ControllerConfig, ControllerView, CoordinatorConfig,
    DurableStorage, EventBroadcaster, GroupMutator, PageToggle, QueryController, SelectionConfig,
    SelectionStore, Session, SessionProvider, StudentDirectory,
};
use roster_api::{export_page_csv, export_selection_csv};
use roster_domain::{BulkAction, BulkReport, ClassId, SchoolId, StudentId, UserId};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cli::{Command, ViewArgs, scope_for};
use crate::render::{render_page, render_report, render_selection, render_session, render_toggle};

/// One console invocation: the list controller, the persisted selection
/// and the bulk coordinator wired to a single backend.
pub struct Console<B> {
    controller: QueryController<B>,
    selection: SelectionStore,
    coordinator: BulkMutationCoordinator<B>,
    session: Arc<SessionProvider>,
}

impl<B: StudentDirectory + GroupMutator> Console<B> {
    /// Wires the console to `backend`, restoring the selection from
    /// `storage`.
    pub fn new(
        backend: Arc<B>,
        storage: Arc<dyn DurableStorage>,
        session: Arc<SessionProvider>,
    ) -> Self {
        let events: EventBroadcaster = EventBroadcaster::new();
        tokio::spawn(log_events(events.subscribe()));

        // Each command sets its filters at once, so there is nothing to
        // debounce.
        let config: ControllerConfig = ControllerConfig {
            search_debounce: Duration::ZERO,
            filter_debounce: Duration::ZERO,
            ..ControllerConfig::default()
        };
        let controller: QueryController<B> =
            QueryController::with_parts(Arc::clone(&backend), config, events.clone(), None);
        let selection: SelectionStore =
            SelectionStore::mount(storage, &SelectionConfig::default()).with_events(events.clone());
        let coordinator: BulkMutationCoordinator<B> =
            BulkMutationCoordinator::new(backend, CoordinatorConfig::default(), events);

        Self {
            controller,
            selection,
            coordinator,
            session,
        }
    }

    /// Runs `command` and returns the text to print.
    ///
    /// The selection is written back to storage before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be loaded, an argument is invalid,
    /// a file cannot be written, or the selection cannot be saved.
    pub async fn run(&mut self, command: Command) -> Result<String> {
        let output: String = match command {
            Command::List(view) => {
                let page: ControllerView = self.load(&view).await?;
                render_page(&page, &self.selection)
            }
            Command::Select {
                ids,
                all_on_page,
                view,
            } => self.select(&ids, all_on_page, &view).await?,
            Command::Deselect { ids } => {
                let mut removed: usize = 0;
                for id in &ids {
                    if self.selection.deselect(&StudentId::parse(id)?) {
                        removed += 1;
                    }
                }
                format!(
                    "Deselected {removed} students ({} selected)",
                    self.selection.len()
                )
            }
            Command::Selection => {
                let (snapshots, missing) = self.selection.selected_data_with_missing();
                render_selection(&snapshots, &missing)
            }
            Command::Clear => {
                let cleared: usize = self.selection.len();
                self.selection.clear_all();
                format!("Cleared {cleared} selected students")
            }
            Command::Transfer { to, class } => {
                let action: BulkAction = BulkAction::Transfer {
                    target: ClassId::parse(&to)?,
                };
                self.bulk(action, class.as_deref()).await?
            }
            Command::Remove { class } => self.bulk(BulkAction::Remove, class.as_deref()).await?,
            Command::Export {
                out,
                current_page,
                view,
            } => self.export(&out, current_page, &view).await?,
            Command::Login {
                token,
                user,
                school,
                role,
                ttl_minutes,
            } => {
                let session: Session = Session {
                    token,
                    user_id: UserId::parse(&user)?,
                    school_id: SchoolId::parse(&school)?,
                    role,
                    expires_at: OffsetDateTime::now_utc()
                        + time::Duration::minutes(i64::from(ttl_minutes)),
                };
                self.session.set(session);
                render_session(self.session.get().as_ref())
            }
            Command::Logout => {
                self.session.clear();
                String::from("Signed out")
            }
            Command::Whoami => render_session(self.session.get().as_ref()),
        };

        self.selection
            .flush()
            .wrap_err("Failed to save the selection")?;
        Ok(output)
    }

    /// Applies the view's filters, loads it, then moves to its page.
    async fn load(&self, view: &ViewArgs) -> Result<ControllerView> {
        for (key, value) in view.filters() {
            self.controller.set_filter(key, &value).await?;
        }
        self.controller.wait_idle().await;
        self.controller.fetch(false).await;

        if let Some(page) = view.page {
            self.controller.set_page(page).await?;
            self.controller.wait_idle().await;
        }

        let loaded: ControllerView = self.controller.view().await;
        if let Some(err) = &loaded.last_error {
            bail!("Failed to load students: {err}");
        }
        debug!(
            page = loaded.query.page,
            records = loaded.records.len(),
            "Loaded page"
        );
        Ok(loaded)
    }

    async fn select(
        &mut self,
        ids: &[String],
        all_on_page: bool,
        view: &ViewArgs,
    ) -> Result<String> {
        let page: ControllerView = self.load(view).await?;
        if all_on_page {
            let toggle: PageToggle = self
                .selection
                .select_all_on_current_page(&page.records)
                .await;
            return Ok(render_toggle(toggle, page.query.page));
        }

        let mut added: usize = 0;
        let mut not_on_page: Vec<String> = Vec::new();
        for raw in ids {
            let id: StudentId = StudentId::parse(raw)?;
            match page.records.iter().find(|r| r.id == id) {
                Some(record) => {
                    if self.selection.select(record) {
                        added += 1;
                    }
                }
                None => not_on_page.push(id.to_string()),
            }
        }

        let mut out: String = format!(
            "Selected {added} students ({} selected)",
            self.selection.len()
        );
        if !not_on_page.is_empty() {
            warn!(count = not_on_page.len(), "Some students are not on this page");
            out.push_str("\nNot on this page: ");
            out.push_str(&not_on_page.join(", "));
        }
        Ok(out)
    }

    async fn bulk(&mut self, action: BulkAction, class: Option<&str>) -> Result<String> {
        if self.selection.is_empty() {
            return Ok(String::from("No students selected"));
        }
        let report: BulkReport = self
            .coordinator
            .run(action, scope_for(class), &mut self.selection, &self.controller)
            .await?;
        Ok(render_report(&report))
    }

    async fn export(&self, out: &Path, current_page: bool, view: &ViewArgs) -> Result<String> {
        // A failed load must leave `out` untouched.
        let written: usize = if current_page {
            let page: ControllerView = self.load(view).await?;
            export_page_csv(create(out)?, &page.records)?
        } else {
            let (snapshots, missing) = self.selection.selected_data_with_missing();
            if !missing.is_empty() {
                warn!(
                    count = missing.len(),
                    "Selected students without details are not exported"
                );
            }
            export_selection_csv(create(out)?, &snapshots)?
        };
        info!(path = %out.display(), rows = written, "Exported students");
        Ok(format!("Exported {written} students to {}", out.display()))
    }
}

fn create(out: &Path) -> Result<File> {
    File::create(out).wrap_err_with(|| format!("Failed to create {}", out.display()))
}

async fn log_events(mut rx: broadcast::Receiver<ConsoleEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => debug!(?event, "Console event"),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                debug!(skipped = n, "Console event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
