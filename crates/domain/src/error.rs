// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur while building or mutating domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier was empty or contained only whitespace.
    EmptyIdentifier {
        /// The kind of identifier (e.g. "student", "class").
        kind: &'static str,
    },
    /// A page number could not be parsed or was zero.
    InvalidPage(String),
    /// A page size could not be parsed or was outside the allowed range.
    InvalidPageSize {
        /// The rejected value as supplied.
        value: String,
        /// The maximum page size accepted.
        max: u32,
    },
    /// A filter value was rejected.
    InvalidFilterValue {
        /// The filter that was being set.
        filter: String,
        /// A human-readable description of the problem.
        reason: String,
    },
    /// A bulk action targeted the class the records are already in.
    TransferTargetIsSource {
        /// The class involved.
        class_id: String,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentifier { kind } => write!(f, "Empty {kind} identifier"),
            Self::InvalidPage(value) => {
                write!(f, "Invalid page '{value}': must be a positive integer")
            }
            Self::InvalidPageSize { value, max } => {
                write!(
                    f,
                    "Invalid page size '{value}': must be between 1 and {max}"
                )
            }
            Self::InvalidFilterValue { filter, reason } => {
                write!(f, "Invalid value for filter '{filter}': {reason}")
            }
            Self::TransferTargetIsSource { class_id } => {
                write!(
                    f,
                    "Cannot transfer students from class '{class_id}' into itself"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
