// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP implementation of the backend seams.

use reqwest::{RequestBuilder, StatusCode, Url};
use roster::{BackendError, GroupMutator, MutationResponse, SessionProvider, StudentDirectory};
use roster_domain::{BulkAction, ClassId, QueryState, StudentId, StudentPage};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ApiError, translate_status, translate_transport_error};
use crate::request_response::{BulkMutationRequest, ListEnvelope, MutationEnvelope};

/// Request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to the REST backend.
///
/// When a [`SessionProvider`] is attached every request carries its bearer
/// token, and a `401` response clears the session.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    session: Option<Arc<SessionProvider>>,
}

impl HttpBackend {
    /// Creates a backend rooted at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a backend rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or the
    /// client cannot be built.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let trimmed: &str = base_url.trim().trim_end_matches('/');
        let parsed: Url = Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: String::from("expected an absolute http:// or https:// URL"),
            });
        }
        let client: reqwest::Client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self {
            client,
            base_url: parsed,
            session: None,
        })
    }

    /// Attaches a session whose token is sent with every request.
    #[must_use]
    pub fn with_session(mut self, session: Arc<SessionProvider>) -> Self {
        self.session = Some(session);
        self
    }

    /// The backend root.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url: Url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::Transport(String::from("Backend URL cannot carry a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.as_ref().and_then(|s| s.bearer_token()) {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn session_rejected(&self) {
        if let Some(session) = &self.session {
            warn!("Backend rejected the session, signing out");
            session.clear();
        }
    }

    async fn fetch_page(&self, query: QueryState) -> Result<StudentPage, BackendError> {
        let url: Url = self.endpoint(&["students"])?;
        let params: Vec<(String, String)> = query.to_params().into_iter().collect();
        debug!(%url, page = query.page, "Fetching student page");

        let response: reqwest::Response = self
            .authorize(self.client.get(url).query(&params))
            .send()
            .await
            .map_err(|e| translate_transport_error(&e))?;
        let status: StatusCode = response.status();
        let body: Result<ListEnvelope, reqwest::Error> = response.json().await;

        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.session_rejected();
            }
            return Err(translate_status(status, body.ok().and_then(|b| b.message)));
        }
        let envelope: ListEnvelope = body.map_err(|e| translate_transport_error(&e))?;
        if !envelope.success {
            return Err(BackendError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| String::from("List request failed")),
            ));
        }
        let Some(pagination) = envelope.pagination else {
            return Err(BackendError::Decode(String::from(
                "Response is missing pagination",
            )));
        };
        Ok(StudentPage {
            records: envelope.data,
            pagination,
        })
    }

    async fn post_bulk(
        &self,
        group: ClassId,
        body: BulkMutationRequest,
    ) -> Result<MutationResponse, BackendError> {
        let url: Url = self.endpoint(&["classes", group.as_str(), "students", "bulk"])?;
        info!(
            %url,
            action = ?body.action,
            students = body.student_ids.len(),
            "Sending bulk request"
        );

        let response: reqwest::Response = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await
            .map_err(|e| translate_transport_error(&e))?;
        let status: StatusCode = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session_rejected();
            return Err(BackendError::Unauthorized);
        }
        let envelope: Result<MutationEnvelope, reqwest::Error> = response.json().await;

        match envelope {
            Ok(envelope) if status.is_success() => Ok(envelope.into()),
            // An error status with a readable envelope is a rejected group.
            Ok(envelope) => Ok(MutationResponse::rejected(envelope.message.unwrap_or_else(
                || translate_status(status, None).to_string(),
            ))),
            Err(_) if !status.is_success() => Err(translate_status(status, None)),
            Err(e) => Err(translate_transport_error(&e)),
        }
    }
}

impl StudentDirectory for HttpBackend {
    fn list_students(
        &self,
        query: &QueryState,
    ) -> impl Future<Output = Result<StudentPage, BackendError>> + Send {
        self.fetch_page(query.clone())
    }
}

impl GroupMutator for HttpBackend {
    fn mutate_group(
        &self,
        group: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> impl Future<Output = Result<MutationResponse, BackendError>> + Send {
        self.post_bulk(group.clone(), BulkMutationRequest::new(action, ids))
    }
}
