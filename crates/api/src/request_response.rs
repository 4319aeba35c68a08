// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Wire envelopes exchanged with the backend.
//!
//! Field names follow the backend's camelCase JSON.

use roster::{MutationResponse, StudentResult};
use roster_domain::{BulkAction, ClassId, Pagination, StudentId, StudentRecord};
use serde::{Deserialize, Serialize};

/// Response body of `GET /students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEnvelope {
    /// Whether the request succeeded.
    pub success: bool,
    /// The records of the requested page.
    #[serde(default)]
    pub data: Vec<StudentRecord>,
    /// Pagination of the requested page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Error or informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ListEnvelope {
    /// A successful page.
    #[must_use]
    pub const fn page(data: Vec<StudentRecord>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
            message: None,
        }
    }

    /// A failed request.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            pagination: None,
            message: Some(message.into()),
        }
    }
}

/// The action name carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireAction {
    /// Move students into `targetClassId`.
    Transfer,
    /// Take students out of the class.
    Remove,
}

/// Request body of `POST /classes/{classId}/students/bulk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMutationRequest {
    /// What to do with the students.
    pub action: WireAction,
    /// Destination class of a transfer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class_id: Option<ClassId>,
    /// The students to act on.
    pub student_ids: Vec<StudentId>,
}

impl BulkMutationRequest {
    /// Builds the wire body for `action` on `ids`.
    #[must_use]
    pub fn new(action: &BulkAction, ids: &[StudentId]) -> Self {
        let (action, target_class_id): (WireAction, Option<ClassId>) = match action {
            BulkAction::Transfer { target } => (WireAction::Transfer, Some(target.clone())),
            BulkAction::Remove => (WireAction::Remove, None),
        };
        Self {
            action,
            target_class_id,
            student_ids: ids.to_vec(),
        }
    }

    /// Converts the wire body back into an action.
    ///
    /// Returns `None` for a transfer without a target.
    #[must_use]
    pub fn bulk_action(&self) -> Option<BulkAction> {
        match (self.action, &self.target_class_id) {
            (WireAction::Transfer, Some(target)) => Some(BulkAction::Transfer {
                target: target.clone(),
            }),
            (WireAction::Transfer, None) => None,
            (WireAction::Remove, _) => Some(BulkAction::Remove),
        }
    }
}

/// Response body of the bulk endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    /// Whether the call as a whole succeeded.
    pub success: bool,
    /// Per-student results, when the backend reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<StudentResult>>,
    /// Error or informational message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<MutationEnvelope> for MutationResponse {
    fn from(envelope: MutationEnvelope) -> Self {
        Self {
            success: envelope.success,
            message: envelope.message,
            details: envelope.data,
        }
    }
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Number of students held by the server.
    pub students: usize,
}
