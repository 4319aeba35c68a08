// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{ClassId, SelectionSnapshot, StudentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mutation applied to a set of students of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BulkAction {
    /// Move the students into another class.
    Transfer {
        /// The destination class.
        target: ClassId,
    },
    /// Take the students out of their class.
    Remove,
}

impl BulkAction {
    /// Short verb used in logs and summaries.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "moved",
            Self::Remove => "removed",
        }
    }

    /// Whether acting on `snapshot` would change anything.
    ///
    /// Transferring a student into the class they are already in is a no-op.
    #[must_use]
    pub fn applies_to(&self, snapshot: &SelectionSnapshot) -> bool {
        match self {
            Self::Transfer { target } => snapshot.class_id.as_ref() != Some(target),
            Self::Remove => true,
        }
    }
}

/// The grouping context a bulk action runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupScope {
    /// The view is filtered to one class; every selected record belongs to it.
    Single(ClassId),
    /// The view shows every class; records are routed by their own class.
    AllGroups,
}

/// Selected students partitioned by the class they currently belong to.
///
/// Each group becomes exactly one backend call. Records without a class are
/// kept aside in `skipped` and never placed in a group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupedMutationPlan {
    groups: BTreeMap<ClassId, Vec<StudentId>>,
    skipped: Vec<StudentId>,
}

impl GroupedMutationPlan {
    /// Returns the groups in class order.
    #[must_use]
    pub const fn groups(&self) -> &BTreeMap<ClassId, Vec<StudentId>> {
        &self.groups
    }

    /// Returns the records left out because they had no class.
    #[must_use]
    pub fn skipped(&self) -> &[StudentId] {
        &self.skipped
    }

    /// Number of groups, i.e. backend calls.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of records that will be sent.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Whether no call needs to be issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consumes the plan, yielding the groups and the skipped records.
    #[must_use]
    pub fn into_parts(self) -> (BTreeMap<ClassId, Vec<StudentId>>, Vec<StudentId>) {
        (self.groups, self.skipped)
    }
}

/// Partitions snapshots by their captured class.
///
/// Input order is preserved within each group. A snapshot listed twice is
/// only sent once.
#[must_use]
pub fn plan_by_group<'a, I>(snapshots: I) -> GroupedMutationPlan
where
    I: IntoIterator<Item = &'a SelectionSnapshot>,
{
    let mut plan: GroupedMutationPlan = GroupedMutationPlan::default();
    for snapshot in snapshots {
        match &snapshot.class_id {
            Some(class_id) => {
                let members: &mut Vec<StudentId> =
                    plan.groups.entry(class_id.clone()).or_default();
                if !members.contains(&snapshot.id) {
                    members.push(snapshot.id.clone());
                }
            }
            None => {
                if !plan.skipped.contains(&snapshot.id) {
                    plan.skipped.push(snapshot.id.clone());
                }
            }
        }
    }
    plan
}
