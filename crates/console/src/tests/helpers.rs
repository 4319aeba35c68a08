// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster::{
    BackendError, DurableStorage, GroupMutator, MemoryStorage, MutationResponse, SessionProvider,
    StudentDirectory,
};
use roster_domain::{
    BulkAction, ClassFilter, ClassId, Pagination, QueryState, SchoolId, StudentId, StudentPage,
    StudentRecord, UserId,
};
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::console::Console;

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

/// An in-memory roster of `s-1..=s-count` spread over `c-1..=c-classes`.
#[derive(Debug, Default)]
pub struct RosterBackend {
    roster: Mutex<Vec<StudentRecord>>,
    mutate_calls: Mutex<Vec<ClassId>>,
    failing_class: Mutex<Option<ClassId>>,
}

impl RosterBackend {
    pub fn with_students(count: usize, classes: usize) -> Arc<Self> {
        let roster: Vec<StudentRecord> = (1..=count)
            .map(|i| {
                let class: String = format!("c-{}", (i - 1) % classes + 1);
                create_test_record(&format!("s-{i}"), Some(&class))
            })
            .collect();
        Arc::new(Self {
            roster: Mutex::new(roster),
            ..Self::default()
        })
    }

    pub fn mutate_calls(&self) -> Vec<ClassId> {
        self.mutate_calls.lock().unwrap().clone()
    }

    pub fn class_of(&self, id: &str) -> Option<ClassId> {
        self.roster
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_str() == id)
            .and_then(|r| r.class_id.clone())
    }

    pub fn fail_class(&self, class_id: &str) {
        *self.failing_class.lock().unwrap() = Some(ClassId::new(class_id));
    }
}

impl StudentDirectory for RosterBackend {
    fn list_students(
        &self,
        query: &QueryState,
    ) -> impl Future<Output = Result<StudentPage, BackendError>> + Send {
        let matching: Vec<StudentRecord> = self
            .roster
            .lock()
            .unwrap()
            .iter()
            .filter(|r| match &query.class_filter {
                ClassFilter::All => true,
                ClassFilter::Class(c) => r.class_id.as_ref() == Some(c),
            })
            .cloned()
            .collect();
        let total: u32 = u32::try_from(matching.len()).unwrap();
        let offset: usize = ((query.page - 1) * query.page_size) as usize;
        let page: StudentPage = StudentPage {
            records: matching
                .into_iter()
                .skip(offset)
                .take(query.page_size as usize)
                .collect(),
            pagination: Pagination::for_total(query.page, query.page_size, total),
        };
        async move { Ok(page) }
    }
}

impl GroupMutator for RosterBackend {
    fn mutate_group(
        &self,
        group: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> impl Future<Output = Result<MutationResponse, BackendError>> + Send {
        self.mutate_calls.lock().unwrap().push(group.clone());
        let failing: bool = self.failing_class.lock().unwrap().as_ref() == Some(group);
        if !failing {
            let mut roster = self.roster.lock().unwrap();
            for record in roster
                .iter_mut()
                .filter(|r| ids.contains(&r.id) && r.class_id.as_ref() == Some(group))
            {
                record.class_id = match action {
                    BulkAction::Transfer { target } => Some(target.clone()),
                    BulkAction::Remove => None,
                };
            }
        }
        async move {
            if failing {
                Err(BackendError::Transport(String::from("connection reset")))
            } else {
                Ok(MutationResponse::ok())
            }
        }
    }
}

/// A console over `backend` whose state lives in `storage`.
pub fn console(
    backend: &Arc<RosterBackend>,
    storage: &Arc<MemoryStorage>,
) -> Console<RosterBackend> {
    let storage: Arc<dyn DurableStorage> = Arc::clone(storage) as Arc<dyn DurableStorage>;
    let session: Arc<SessionProvider> = Arc::new(SessionProvider::new(Arc::clone(&storage)));
    Console::new(Arc::clone(backend), storage, session)
}

/// A fresh, not yet created file path under the system temp dir.
pub fn temp_file(name: &str) -> std::path::PathBuf {
    let path: std::path::PathBuf =
        std::env::temp_dir().join(format!("rosterctl-{}-{name}", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}
