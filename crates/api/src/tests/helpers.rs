// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use axum::Router;
use roster::{MemoryStorage, Session, SessionProvider};
use roster_domain::{ClassId, SchoolId, StudentId, StudentRecord, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use time::{Duration, OffsetDateTime};
use tokio::net::TcpListener;

pub fn create_test_record(id: &str, class_id: Option<&str>) -> StudentRecord {
    StudentRecord {
        id: StudentId::new(id),
        user_id: UserId::new(format!("user-{id}")),
        school_id: SchoolId::new("school-1"),
        class_id: class_id.map(ClassId::new),
        class_name: class_id.map(|c| format!("Class {c}")),
        first_name: String::from("Test"),
        last_name: format!("Student {id}"),
        grade: Some(String::from("5")),
        photo_url: None,
    }
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub async fn closed_port() -> String {
    let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn signed_in_provider(token: &str) -> Arc<SessionProvider> {
    let provider: SessionProvider = SessionProvider::new(Arc::new(MemoryStorage::new()));
    provider.set(Session {
        token: token.to_string(),
        user_id: UserId::new("admin-1"),
        school_id: SchoolId::new("school-1"),
        role: String::from("school_admin"),
        expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
    });
    Arc::new(provider)
}

/// A fresh, not yet created directory under the system temp dir.
pub fn temp_dir(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "roster-api-{}-{name}-{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
