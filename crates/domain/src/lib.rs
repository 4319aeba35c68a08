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

mod error;
mod grouping;
mod query;
mod report;
mod types;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use grouping::{BulkAction, GroupScope, GroupedMutationPlan, plan_by_group};
pub use query::{
    ALL_CLASSES, ChangeOrigin, ClassFilter, DEFAULT_PAGE_SIZE, FetchKey, FilterKey,
    MAX_PAGE_SIZE, Pagination, QueryState, StudentPage,
};
pub use report::{BulkReport, BulkStatus, GroupOutcome};
pub use types::{
    ClassId, ImageState, SchoolId, SelectionSnapshot, StudentId, StudentRecord, UserId,
};
