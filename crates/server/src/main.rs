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
#![allow(clippy::multiple_crate_versions)]

mod session;
mod store;

use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use roster_api::{BulkMutationRequest, HealthResponse, ListEnvelope, MutationEnvelope};
use roster_domain::{BulkAction, ClassId, DomainError, FilterKey, QueryState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::session::Authorized;
use crate::store::RosterStore;

/// Roster Server - reference backend for the roster console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Number of students to generate
    #[arg(long, default_value_t = 25)]
    seed: usize,

    /// Number of classes to spread the students over
    #[arg(long, default_value_t = 3)]
    classes: usize,

    /// Bearer token required on roster requests. Open access when unset.
    #[arg(long, env = "ROSTER_SERVER_TOKEN")]
    token: Option<String>,
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    /// The roster.
    store: Arc<Mutex<RosterStore>>,
    /// Token every roster request must carry, if any.
    token: Option<Arc<str>>,
}

/// Query string of `GET /students`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    class_id: Option<String>,
    grade: Option<String>,
}

impl ListQuery {
    /// Validates the query string into a query state.
    fn into_query_state(self) -> Result<QueryState, DomainError> {
        let mut query: QueryState = QueryState::default();
        let fields: [(FilterKey, Option<String>); 5] = [
            (FilterKey::PageSize, self.limit),
            (FilterKey::Search, self.search),
            (FilterKey::Class, self.class_id),
            (FilterKey::Grade, self.grade),
            // Page last: every other key resets it.
            (FilterKey::Page, self.page),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                query.apply_filter(&key, &value)?;
            }
        }
        Ok(query)
    }
}

/// Error response type.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorResponse {
    /// Always `false`.
    success: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            success: false,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<DomainError> for HttpError {
    fn from(err: DomainError) -> Self {
        let status: StatusCode = match err {
            DomainError::TransferTargetIsSource { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Handler for GET `/students` endpoint.
///
/// Lists one page of students matching the filters.
async fn handle_list_students(
    _auth: Authorized,
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListEnvelope>, HttpError> {
    let query: QueryState = query.into_query_state()?;
    info!(key = %query.fetch_key(), "Handling list_students request");

    let store = app_state.store.lock().await;
    let (records, pagination) = store.list(&query);
    drop(store);

    Ok(Json(ListEnvelope::page(records, pagination)))
}

/// Handler for POST `/classes/{class_id}/students/bulk` endpoint.
///
/// Transfers or removes the listed students that belong to the class.
async fn handle_bulk(
    _auth: Authorized,
    AxumState(app_state): AxumState<AppState>,
    Path(class_id): Path<String>,
    Json(request): Json<BulkMutationRequest>,
) -> Result<Json<MutationEnvelope>, HttpError> {
    let class_id: ClassId = ClassId::parse(&class_id)?;
    let action: BulkAction = request.bulk_action().ok_or_else(|| HttpError {
        status: StatusCode::BAD_REQUEST,
        message: String::from("A transfer requires targetClassId"),
    })?;
    if matches!(&action, BulkAction::Transfer { target } if *target == class_id) {
        return Err(DomainError::TransferTargetIsSource {
            class_id: class_id.to_string(),
        }
        .into());
    }
    info!(
        class_id = %class_id,
        action = action.verb(),
        students = request.student_ids.len(),
        "Handling bulk request"
    );

    let mut store = app_state.store.lock().await;
    let results = store.apply_bulk(&class_id, &action, &request.student_ids);
    drop(store);

    let changed: usize = results.iter().filter(|r| r.affected()).count();
    let failed: usize = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        warn!(class_id = %class_id, failed, "Bulk request had unknown students");
    }
    Ok(Json(MutationEnvelope {
        success: true,
        message: Some(format!(
            "{changed} of {} students {}",
            results.len(),
            action.verb()
        )),
        data: Some(results),
    }))
}

/// Handler for GET `/health` endpoint.
async fn handle_health(AxumState(app_state): AxumState<AppState>) -> Json<HealthResponse> {
    let students: usize = app_state.store.lock().await.len();
    Json(HealthResponse {
        status: String::from("ok"),
        students,
    })
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/students", get(handle_list_students))
        .route("/classes/{class_id}/students/bulk", post(handle_bulk))
        .route("/health", get(handle_health))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Roster Server");

    let store: RosterStore = RosterStore::seeded(args.seed, args.classes);
    info!(
        students = store.len(),
        classes = args.classes,
        "Seeded roster"
    );
    if args.token.is_some() {
        info!("Roster requests require a bearer token");
    }

    let app_state: AppState = AppState {
        store: Arc::new(Mutex::new(store)),
        token: args.token.map(Arc::from),
    };

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
