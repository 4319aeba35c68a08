// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use roster::{
    BackendError, ControllerConfig, ControllerView, FetchOutcome, GroupMutator, MutationResponse,
    QueryController, StudentDirectory, StudentResult,
};
use roster_domain::{BulkAction, ClassId, Pagination, QueryState, StudentId, StudentPage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::helpers::{closed_port, create_test_record, serve, signed_in_provider};
use crate::{ApiError, HttpBackend, ListEnvelope, MutationEnvelope};

const TOTAL: u32 = 25;

#[derive(Debug, Default)]
struct Recorded {
    queries: Vec<HashMap<String, String>>,
    auth: Vec<Option<String>>,
    bulk: Vec<(String, serde_json::Value)>,
}

type Shared = Arc<Mutex<Recorded>>;

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn list_students(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<ListEnvelope> {
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: u32 = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    {
        let mut recorded = recorded.lock().unwrap();
        recorded.queries.push(params);
        recorded.auth.push(bearer(&headers));
    }
    let first: u32 = (page - 1) * limit + 1;
    let last: u32 = (page * limit).min(TOTAL);
    let data = (first..=last)
        .map(|i| create_test_record(&format!("s-{i}"), Some("c-1")))
        .collect();
    Json(ListEnvelope::page(data, Pagination::for_total(page, limit, TOTAL)))
}

async fn bulk(
    State(recorded): State<Shared>,
    Path(class_id): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Json<MutationEnvelope> {
    let ids: Vec<StudentId> =
        serde_json::from_value(body["studentIds"].clone()).unwrap_or_default();
    recorded.lock().unwrap().bulk.push((class_id, body));
    Json(MutationEnvelope {
        success: true,
        data: Some(
            ids.into_iter()
                .map(|id| StudentResult {
                    student_id: id,
                    success: true,
                    changed: Some(true),
                    message: None,
                })
                .collect(),
        ),
        message: None,
    })
}

async fn recording_backend() -> (String, Shared) {
    let recorded: Shared = Arc::new(Mutex::new(Recorded::default()));
    let router: Router = Router::new()
        .route("/students", get(list_students))
        .route("/classes/{class_id}/students/bulk", post(bulk))
        .with_state(Arc::clone(&recorded));
    (serve(router).await, recorded)
}

async fn answering(status: StatusCode, body: &'static str) -> String {
    let handler = move || async move { (status, body) };
    let router: Router = Router::new()
        .route("/students", get(handler))
        .route("/classes/{class_id}/students/bulk", post(handler));
    serve(router).await
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_rejects_non_http_base_url() {
    let result: Result<HttpBackend, ApiError> = HttpBackend::new("ftp://example.com");
    assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));

    let result: Result<HttpBackend, ApiError> = HttpBackend::new("not a url");
    assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
}

#[test]
fn test_trailing_slash_is_ignored() {
    let backend: HttpBackend = HttpBackend::new("http://127.0.0.1:3000/api/").unwrap();
    assert_eq!(backend.base_url().as_str(), "http://127.0.0.1:3000/api");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_sends_query_parameters() {
    let (base, recorded) = recording_backend().await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();
    let mut query: QueryState = QueryState::default();
    query.page = 2;
    query.search = String::from("  ada ");

    let page: StudentPage = backend.list_students(&query).await.unwrap();

    assert_eq!(page.records.len(), 10);
    assert_eq!(page.records[0].id.as_str(), "s-11");
    assert_eq!(page.pagination.pages, 3);
    let recorded = recorded.lock().unwrap();
    let params: &HashMap<String, String> = &recorded.queries[0];
    assert_eq!(params["page"], "2");
    assert_eq!(params["limit"], "10");
    assert_eq!(params["search"], "ada");
    assert_eq!(params["classId"], "all");
    assert!(!params.contains_key("grade"));
    assert_eq!(recorded.auth[0], None);
}

#[tokio::test]
async fn test_session_token_is_sent_as_bearer() {
    let (base, recorded) = recording_backend().await;
    let backend: HttpBackend = HttpBackend::new(&base)
        .unwrap()
        .with_session(signed_in_provider("token-abc"));

    backend.list_students(&QueryState::default()).await.unwrap();

    assert_eq!(
        recorded.lock().unwrap().auth[0].as_deref(),
        Some("Bearer token-abc")
    );
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let base: String = answering(StatusCode::UNAUTHORIZED, "").await;
    let session = signed_in_provider("token-abc");
    let backend: HttpBackend = HttpBackend::new(&base)
        .unwrap()
        .with_session(Arc::clone(&session));

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert_eq!(result, Err(BackendError::Unauthorized));
    assert!(session.get().is_none());
}

#[tokio::test]
async fn test_error_status_uses_envelope_message() {
    let base: String = answering(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"success":false,"message":"Database unavailable"}"#,
    )
    .await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert_eq!(
        result,
        Err(BackendError::Rejected(String::from(
            "500 Database unavailable"
        )))
    );
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let base: String = answering(
        StatusCode::OK,
        r#"{"success":false,"message":"Unknown class"}"#,
    )
    .await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert_eq!(
        result,
        Err(BackendError::Rejected(String::from("Unknown class")))
    );
}

#[tokio::test]
async fn test_malformed_body_is_a_decode_error() {
    let base: String = answering(StatusCode::OK, "<html>gateway</html>").await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[tokio::test]
async fn test_missing_pagination_is_a_decode_error() {
    let base: String = answering(StatusCode::OK, r#"{"success":true,"data":[]}"#).await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert!(matches!(result, Err(BackendError::Decode(_))));
}

#[tokio::test]
async fn test_connection_failure_is_a_transport_error() {
    let backend: HttpBackend = HttpBackend::new(&closed_port().await).unwrap();

    let result: Result<StudentPage, BackendError> =
        backend.list_students(&QueryState::default()).await;

    assert!(matches!(result, Err(BackendError::Transport(_))));
}

// ============================================================================
// Bulk calls
// ============================================================================

#[tokio::test]
async fn test_transfer_posts_wire_body_to_class_endpoint() {
    let (base, recorded) = recording_backend().await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();
    let ids: Vec<StudentId> = vec![StudentId::new("s-1"), StudentId::new("s-2")];

    let response: MutationResponse = backend
        .mutate_group(
            &ClassId::new("class a"),
            &BulkAction::Transfer {
                target: ClassId::new("c-2"),
            },
            &ids,
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.details.unwrap().len(), 2);
    let recorded = recorded.lock().unwrap();
    let (class_id, body) = &recorded.bulk[0];
    assert_eq!(class_id, "class a");
    assert_eq!(
        body,
        &serde_json::json!({
            "action": "transfer",
            "targetClassId": "c-2",
            "studentIds": ["s-1", "s-2"]
        })
    );
}

#[tokio::test]
async fn test_remove_omits_target() {
    let (base, recorded) = recording_backend().await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    backend
        .mutate_group(
            &ClassId::new("c-1"),
            &BulkAction::Remove,
            &[StudentId::new("s-1")],
        )
        .await
        .unwrap();

    let recorded = recorded.lock().unwrap();
    assert_eq!(
        recorded.bulk[0].1,
        serde_json::json!({ "action": "remove", "studentIds": ["s-1"] })
    );
}

#[tokio::test]
async fn test_rejected_bulk_call_is_an_unsuccessful_response() {
    let base: String = answering(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"success":false,"message":"Class is locked"}"#,
    )
    .await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let response: MutationResponse = backend
        .mutate_group(&ClassId::new("c-1"), &BulkAction::Remove, &[])
        .await
        .unwrap();

    assert_eq!(response, MutationResponse::rejected("Class is locked"));
}

#[tokio::test]
async fn test_bulk_error_without_envelope_is_an_error() {
    let base: String = answering(StatusCode::BAD_GATEWAY, "upstream down").await;
    let backend: HttpBackend = HttpBackend::new(&base).unwrap();

    let result: Result<MutationResponse, BackendError> = backend
        .mutate_group(&ClassId::new("c-1"), &BulkAction::Remove, &[])
        .await;

    assert_eq!(
        result,
        Err(BackendError::Rejected(String::from("502 Bad Gateway")))
    );
}

// ============================================================================
// Controller over HTTP
// ============================================================================

#[tokio::test]
async fn test_controller_pages_through_http_backend() {
    let (base, recorded) = recording_backend().await;
    let backend: Arc<HttpBackend> = Arc::new(HttpBackend::new(&base).unwrap());
    let controller: QueryController<HttpBackend> =
        QueryController::new(backend, ControllerConfig::default());

    assert_eq!(controller.fetch(false).await, FetchOutcome::Applied);
    controller.set_page(3).await.unwrap();
    controller.wait_idle().await;

    let view: ControllerView = controller.view().await;
    assert_eq!(view.records.len(), 5);
    assert_eq!(view.records[0].id.as_str(), "s-21");
    assert_eq!(recorded.lock().unwrap().queries.len(), 2);
}
