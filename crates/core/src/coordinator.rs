// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk actions over the current selection.
//!
//! A run moves through `Idle → Collecting → Dispatching → Settled → Idle`.
//! The report is only produced once every group call has settled, and the
//! return to `Idle` happens even if the run is cancelled.

use futures::future::join_all;
use roster_domain::{
    BulkAction, BulkReport, BulkStatus, ClassId, DomainError, GroupOutcome, GroupScope,
    GroupedMutationPlan, SelectionSnapshot, StudentId, plan_by_group,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::backend::{GroupMutator, MutationResponse, StudentDirectory};
use crate::controller::QueryController;
use crate::events::{ConsoleEvent, EventBroadcaster};
use crate::selection::SelectionStore;

/// How group calls are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// All group calls at once.
    #[default]
    Concurrent,
    /// One group call after another.
    Sequential,
}

/// Settings for a [`BulkMutationCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorConfig {
    /// How group calls are issued.
    pub dispatch: Dispatch,
}

/// Where a bulk run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkPhase {
    /// No run in progress.
    Idle,
    /// Reading the selection and building the plan.
    Collecting {
        /// The grouping context of the run.
        scope: GroupScope,
    },
    /// Group calls are in flight.
    Dispatching {
        /// Number of group calls issued.
        groups: usize,
    },
    /// Every call has settled.
    Settled(BulkStatus),
}

/// Returns the phase to `Idle` when a run ends, however it ends.
struct IdleOnDrop<'a>(&'a watch::Sender<BulkPhase>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(BulkPhase::Idle);
    }
}

/// Routes bulk actions on the selection to per-class backend calls.
pub struct BulkMutationCoordinator<M> {
    mutator: Arc<M>,
    config: CoordinatorConfig,
    phase: watch::Sender<BulkPhase>,
    events: EventBroadcaster,
}

impl<M: GroupMutator> BulkMutationCoordinator<M> {
    /// Creates a coordinator that reports to `events`.
    #[must_use]
    pub fn new(mutator: Arc<M>, config: CoordinatorConfig, events: EventBroadcaster) -> Self {
        let (phase, _rx) = watch::channel(BulkPhase::Idle);
        Self {
            mutator,
            config,
            phase,
            events,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> BulkPhase {
        self.phase.borrow().clone()
    }

    /// Subscribes to phase changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BulkPhase> {
        self.phase.subscribe()
    }

    /// Applies `action` to the current selection.
    ///
    /// With [`GroupScope::Single`] one call carries every selected student.
    /// With [`GroupScope::AllGroups`] students are partitioned by their own
    /// class and one call is issued per class; students without a class are
    /// skipped and listed in the report.
    ///
    /// Afterwards the selection is cleared and the list refetched, whatever
    /// the outcome.
    ///
    /// # Arguments
    ///
    /// * `action` - The action to apply
    /// * `scope` - The grouping context of the current view
    /// * `selection` - The selection to act on
    /// * `controller` - The list to refresh afterwards
    ///
    /// # Errors
    ///
    /// Returns an error, before touching the selection, when a transfer
    /// targets the single class the view is scoped to.
    pub async fn run<D: StudentDirectory>(
        &self,
        action: BulkAction,
        scope: GroupScope,
        selection: &mut SelectionStore,
        controller: &QueryController<D>,
    ) -> Result<BulkReport, DomainError> {
        let _idle: IdleOnDrop<'_> = IdleOnDrop(&self.phase);

        if let (BulkAction::Transfer { target }, GroupScope::Single(source)) = (&action, &scope)
            && target == source
        {
            return Err(DomainError::TransferTargetIsSource {
                class_id: source.to_string(),
            });
        }

        self.phase.send_replace(BulkPhase::Collecting {
            scope: scope.clone(),
        });
        let (snapshots, missing) = selection.selected_data_with_missing();
        let actionable: Vec<&SelectionSnapshot> =
            snapshots.iter().filter(|s| action.applies_to(s)).collect();

        let (groups, skipped): (Vec<(ClassId, Vec<StudentId>)>, Vec<StudentId>) = match &scope {
            GroupScope::Single(class_id) => {
                let ids: Vec<StudentId> = actionable.iter().map(|s| s.id.clone()).collect();
                let groups: Vec<(ClassId, Vec<StudentId>)> = if ids.is_empty() {
                    Vec::new()
                } else {
                    vec![(class_id.clone(), ids)]
                };
                (groups, Vec::new())
            }
            GroupScope::AllGroups => {
                let plan: GroupedMutationPlan = plan_by_group(actionable.iter().copied());
                for id in plan.skipped() {
                    warn!(student_id = %id, "Student has no class, excluding from bulk action");
                }
                let (groups, skipped) = plan.into_parts();
                (groups.into_iter().collect(), skipped)
            }
        };

        info!(
            action = action.verb(),
            groups = groups.len(),
            students = groups.iter().map(|(_, ids)| ids.len()).sum::<usize>(),
            "Dispatching bulk action"
        );
        self.phase.send_replace(BulkPhase::Dispatching {
            groups: groups.len(),
        });

        let outcomes: Vec<GroupOutcome> = match self.config.dispatch {
            Dispatch::Concurrent => {
                join_all(
                    groups
                        .into_iter()
                        .map(|(group, ids)| self.dispatch_group(&action, group, ids)),
                )
                .await
            }
            Dispatch::Sequential => {
                let mut outcomes: Vec<GroupOutcome> = Vec::with_capacity(groups.len());
                for (group, ids) in groups {
                    outcomes.push(self.dispatch_group(&action, group, ids).await);
                }
                outcomes
            }
        };

        let report: BulkReport = BulkReport::from_outcomes(action, outcomes, skipped, missing);
        self.phase.send_replace(BulkPhase::Settled(report.status));
        info!(status = %report.status, summary = %report.summary(), "Bulk action settled");

        selection.clear_all();
        controller.refresh().await;

        self.events.broadcast(&ConsoleEvent::BulkCompleted {
            status: report.status,
            summary: report.summary(),
        });
        Ok(report)
    }

    async fn dispatch_group(
        &self,
        action: &BulkAction,
        group: ClassId,
        ids: Vec<StudentId>,
    ) -> GroupOutcome {
        match self.mutator.mutate_group(&group, action, &ids).await {
            Ok(response) if response.success => interpret_success(group, ids, &response),
            Ok(response) => {
                let message: String = response
                    .message
                    .unwrap_or_else(|| String::from("Request rejected"));
                error!(class_id = %group, error = %message, "Bulk call rejected");
                GroupOutcome::failed(group, ids, message)
            }
            Err(e) => {
                error!(class_id = %group, error = %e, "Bulk call failed");
                GroupOutcome::failed(group, ids, e.to_string())
            }
        }
    }
}

/// Turns a successful response into an outcome, honouring per-student
/// details when the backend sends them.
fn interpret_success(
    group: ClassId,
    ids: Vec<StudentId>,
    response: &MutationResponse,
) -> GroupOutcome {
    let Some(details) = &response.details else {
        return GroupOutcome::succeeded_all(group, ids.len());
    };

    let mut affected: usize = 0;
    let mut failed_ids: Vec<StudentId> = Vec::new();
    for id in &ids {
        match details.iter().find(|d| &d.student_id == id) {
            Some(detail) if !detail.success => failed_ids.push(id.clone()),
            Some(detail) if detail.affected() => affected += 1,
            Some(_) => {}
            None => affected += 1,
        }
    }
    if !failed_ids.is_empty() {
        warn!(
            class_id = %group,
            failed = failed_ids.len(),
            "Bulk call succeeded with per-student failures"
        );
    }
    GroupOutcome {
        group,
        requested: ids.len(),
        affected,
        failed_ids,
        error: None,
    }
}
