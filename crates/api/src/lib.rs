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
    clippy::all
)]

mod client;
mod error;
mod export;
mod file_storage;
mod request_response;

#[cfg(test)]
mod tests;

pub use client::{DEFAULT_TIMEOUT, HttpBackend};
pub use error::{ApiError, translate_status, translate_transport_error};
pub use export::{export_page_csv, export_selection_csv};
pub use file_storage::FileStorage;
pub use request_response::{
    BulkMutationRequest, HealthResponse, ListEnvelope, MutationEnvelope, WireAction,
};
