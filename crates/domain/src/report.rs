// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::grouping::BulkAction;
use crate::types::{ClassId, StudentId};
use serde::{Deserialize, Serialize};

/// The result of the backend call for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOutcome {
    /// The class the call was issued for.
    pub group: ClassId,
    /// Number of students sent.
    pub requested: usize,
    /// Number of students the backend reports as changed.
    pub affected: usize,
    /// Students that were not changed. For a failed call, every requested id.
    pub failed_ids: Vec<StudentId>,
    /// Error message when the whole call failed.
    pub error: Option<String>,
}

impl GroupOutcome {
    /// A call that succeeded for every requested student.
    #[must_use]
    pub const fn succeeded_all(group: ClassId, requested: usize) -> Self {
        Self {
            group,
            requested,
            affected: requested,
            failed_ids: Vec::new(),
            error: None,
        }
    }

    /// A call that failed as a whole.
    #[must_use]
    pub fn failed(group: ClassId, ids: Vec<StudentId>, error: impl Into<String>) -> Self {
        Self {
            group,
            requested: ids.len(),
            affected: 0,
            failed_ids: ids,
            error: Some(error.into()),
        }
    }

    /// Whether the call itself succeeded. Individual students may still
    /// appear in `failed_ids`.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Overall status of a bulk run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkStatus {
    /// Every group call succeeded.
    AllSucceeded,
    /// Some group calls succeeded and some failed.
    Partial {
        /// Number of successful group calls.
        succeeded_groups: usize,
        /// Number of group calls issued.
        total_groups: usize,
    },
    /// Every group call failed.
    AllFailed,
    /// There was nothing to send.
    NothingToDo,
}

impl BulkStatus {
    /// Whether at least one group was updated.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::AllSucceeded | Self::Partial { .. })
    }
}

impl std::fmt::Display for BulkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllSucceeded => f.write_str("all succeeded"),
            Self::Partial {
                succeeded_groups,
                total_groups,
            } => write!(f, "partial ({succeeded_groups} of {total_groups})"),
            Self::AllFailed => f.write_str("all failed"),
            Self::NothingToDo => f.write_str("nothing to do"),
        }
    }
}

/// The final summary of a bulk run shown to the operator.
///
/// Built from every group outcome so no group can go unreported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// The action that was applied.
    pub action: BulkAction,
    /// Overall status.
    pub status: BulkStatus,
    /// One entry per issued call, in dispatch order.
    pub groups: Vec<GroupOutcome>,
    /// Students changed.
    pub success_count: usize,
    /// Students not changed because their call or their own entry failed.
    pub failure_count: usize,
    /// Students left out because they had no class.
    pub skipped: Vec<StudentId>,
    /// Selected students whose snapshot was missing.
    pub missing_snapshots: Vec<StudentId>,
}

impl BulkReport {
    /// Derives status and counts from the group outcomes.
    #[must_use]
    pub fn from_outcomes(
        action: BulkAction,
        groups: Vec<GroupOutcome>,
        skipped: Vec<StudentId>,
        missing_snapshots: Vec<StudentId>,
    ) -> Self {
        let total_groups: usize = groups.len();
        let succeeded_groups: usize = groups.iter().filter(|g| g.succeeded()).count();
        let success_count: usize = groups
            .iter()
            .filter(|g| g.succeeded())
            .map(|g| g.affected)
            .sum();
        let failure_count: usize = groups.iter().map(|g| g.failed_ids.len()).sum();

        let status: BulkStatus = if total_groups == 0 {
            BulkStatus::NothingToDo
        } else if succeeded_groups == total_groups {
            BulkStatus::AllSucceeded
        } else if succeeded_groups == 0 {
            BulkStatus::AllFailed
        } else {
            BulkStatus::Partial {
                succeeded_groups,
                total_groups,
            }
        };

        Self {
            action,
            status,
            groups,
            success_count,
            failure_count,
            skipped,
            missing_snapshots,
        }
    }

    /// Returns the groups whose call failed.
    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupOutcome> {
        self.groups.iter().filter(|g| !g.succeeded())
    }

    /// Human-readable one-line summary, e.g.
    /// `"3 of 5 groups updated; 2 failed (12 students moved, 4 failed)"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let verb: &str = self.action.verb();
        let total: usize = self.groups.len();
        let mut line: String = match self.status {
            BulkStatus::NothingToDo => String::from("No students to update"),
            BulkStatus::AllSucceeded => format!(
                "{total} of {total} groups updated ({} students {verb})",
                self.success_count
            ),
            BulkStatus::Partial {
                succeeded_groups,
                total_groups,
            } => format!(
                "{succeeded_groups} of {total_groups} groups updated; {} failed ({} students {verb}, {} failed)",
                total_groups - succeeded_groups,
                self.success_count,
                self.failure_count
            ),
            BulkStatus::AllFailed => format!(
                "0 of {total} groups updated; {total} failed ({} students not {verb})",
                self.failure_count
            ),
        };
        if !self.skipped.is_empty() {
            line.push_str(&format!(
                "; {} skipped without a class",
                self.skipped.len()
            ));
        }
        if !self.missing_snapshots.is_empty() {
            line.push_str(&format!(
                "; {} skipped with missing data",
                self.missing_snapshots.len()
            ));
        }
        line
    }
}
