// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Seams to the REST backend.
//!
//! The controller and coordinator only ever talk to these traits; the HTTP
//! implementation lives in the api crate and tests use scripted fakes.

use roster_domain::{BulkAction, ClassId, QueryState, StudentId, StudentPage};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::BackendError;

/// Source of paginated, filtered student lists.
pub trait StudentDirectory: Send + Sync + 'static {
    /// Fetches the page described by `query`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success response or an
    /// undecodable body.
    fn list_students(
        &self,
        query: &QueryState,
    ) -> impl Future<Output = Result<StudentPage, BackendError>> + Send;
}

/// Applies a bulk action to the students of one class.
pub trait GroupMutator: Send + Sync + 'static {
    /// Sends one call for `ids`, all of which belong to `group`.
    ///
    /// # Errors
    ///
    /// Returns an error when the call could not be completed.
    fn mutate_group(
        &self,
        group: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> impl Future<Output = Result<MutationResponse, BackendError>> + Send;
}

/// Per-student detail returned by a bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentResult {
    /// The student this entry is about.
    pub student_id: StudentId,
    /// Whether the backend processed the student without error.
    pub success: bool,
    /// Whether anything changed. Absent means "changed if successful".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    /// Optional explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StudentResult {
    /// Whether this student counts as affected.
    #[must_use]
    pub fn affected(&self) -> bool {
        self.success && self.changed.unwrap_or(true)
    }
}

/// Response of a bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationResponse {
    /// The backend's overall success flag.
    pub success: bool,
    /// Optional message, usually set on failure.
    pub message: Option<String>,
    /// Optional per-student details.
    pub details: Option<Vec<StudentResult>>,
}

impl MutationResponse {
    /// A successful response without details.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
            details: None,
        }
    }

    /// A rejected response.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            details: None,
        }
    }
}
