// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster_domain::{
    BulkAction, ClassFilter, ClassId, Pagination, QueryState, SchoolId, StudentId, StudentPage,
    StudentRecord, UserId,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::backend::{GroupMutator, MutationResponse, StudentDirectory, StudentResult};
use crate::error::BackendError;

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

/// Builds `count` students `s-1..=s-count`, spread round-robin over
/// classes `c-1..=c-classes`.
pub fn create_roster(count: usize, classes: usize) -> Vec<StudentRecord> {
    (1..=count)
        .map(|i| {
            let class: String = format!("c-{}", (i - 1) % classes.max(1) + 1);
            create_test_record(&format!("s-{i}"), Some(&class))
        })
        .collect()
}

/// How a scripted group call fails.
#[derive(Debug, Clone)]
pub enum GroupFailure {
    Transport,
    Rejected(String),
}

/// An in-memory backend that serves a mutable roster, records every call
/// and can be told to fail or hold responses.
#[derive(Debug, Default)]
pub struct FakeBackend {
    roster: Mutex<Vec<StudentRecord>>,
    list_calls: Mutex<Vec<QueryState>>,
    mutate_calls: Mutex<Vec<(ClassId, BulkAction, Vec<StudentId>)>>,
    page_gates: Mutex<HashMap<u32, Arc<Notify>>>,
    group_gates: Mutex<HashMap<ClassId, Arc<Notify>>>,
    list_failures: AtomicUsize,
    group_failures: Mutex<HashMap<ClassId, GroupFailure>>,
    send_details: AtomicBool,
}

impl FakeBackend {
    pub fn new(roster: Vec<StudentRecord>) -> Arc<Self> {
        Arc::new(Self {
            roster: Mutex::new(roster),
            ..Self::default()
        })
    }

    pub fn with_students(count: usize, classes: usize) -> Arc<Self> {
        Self::new(create_roster(count, classes))
    }

    pub fn list_calls(&self) -> Vec<QueryState> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn mutate_calls(&self) -> Vec<(ClassId, BulkAction, Vec<StudentId>)> {
        self.mutate_calls.lock().unwrap().clone()
    }

    pub fn record(&self, id: &str) -> StudentRecord {
        self.roster
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id.as_str() == id)
            .cloned()
            .unwrap()
    }

    pub fn retain(&self, keep: impl Fn(&StudentRecord) -> bool) {
        self.roster.lock().unwrap().retain(|r| keep(r));
    }

    /// Holds every list response for `page` until the returned gate is
    /// notified once per held call.
    pub fn gate_page(&self, page: u32) -> Arc<Notify> {
        let gate: Arc<Notify> = Arc::new(Notify::new());
        self.page_gates
            .lock()
            .unwrap()
            .insert(page, Arc::clone(&gate));
        gate
    }

    /// Holds the response of every call for `class_id` until the returned
    /// gate is notified once per held call.
    pub fn gate_group(&self, class_id: &str) -> Arc<Notify> {
        let gate: Arc<Notify> = Arc::new(Notify::new());
        self.group_gates
            .lock()
            .unwrap()
            .insert(ClassId::new(class_id), Arc::clone(&gate));
        gate
    }

    pub fn fail_next_lists(&self, count: usize) {
        self.list_failures.store(count, Ordering::SeqCst);
    }

    pub fn fail_group(&self, class_id: &str, failure: GroupFailure) {
        self.group_failures
            .lock()
            .unwrap()
            .insert(ClassId::new(class_id), failure);
    }

    pub fn send_details(&self, enabled: bool) {
        self.send_details.store(enabled, Ordering::SeqCst);
    }

    fn take_list_failure(&self) -> bool {
        self.list_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn page_for(&self, query: &QueryState) -> StudentPage {
        let needle: String = query.search.trim().to_lowercase();
        let matching: Vec<StudentRecord> = self
            .roster
            .lock()
            .unwrap()
            .iter()
            .filter(|r| match &query.class_filter {
                ClassFilter::All => true,
                ClassFilter::Class(c) => r.class_id.as_ref() == Some(c),
            })
            .filter(|r| needle.is_empty() || r.display_name().to_lowercase().contains(&needle))
            .cloned()
            .collect();

        let total: u32 = u32::try_from(matching.len()).unwrap();
        let pagination: Pagination = Pagination::for_total(query.page, query.page_size, total);
        let offset: usize = ((query.page - 1) * query.page_size) as usize;
        let records: Vec<StudentRecord> = matching
            .into_iter()
            .skip(offset)
            .take(query.page_size as usize)
            .collect();
        StudentPage {
            records,
            pagination,
        }
    }

    fn apply_mutation(
        &self,
        group: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> Vec<StudentResult> {
        let mut roster = self.roster.lock().unwrap();
        ids.iter()
            .map(|id| {
                let record: Option<&mut StudentRecord> = roster
                    .iter_mut()
                    .find(|r| &r.id == id && r.class_id.as_ref() == Some(group));
                let changed: bool = match (record, action) {
                    (Some(record), BulkAction::Transfer { target }) => {
                        record.class_id = Some(target.clone());
                        true
                    }
                    (Some(record), BulkAction::Remove) => {
                        record.class_id = None;
                        true
                    }
                    (None, _) => false,
                };
                StudentResult {
                    student_id: id.clone(),
                    success: true,
                    changed: Some(changed),
                    message: None,
                }
            })
            .collect()
    }
}

impl StudentDirectory for FakeBackend {
    fn list_students(
        &self,
        query: &QueryState,
    ) -> impl Future<Output = Result<StudentPage, BackendError>> + Send {
        self.list_calls.lock().unwrap().push(query.clone());
        let gate: Option<Arc<Notify>> = self.page_gates.lock().unwrap().get(&query.page).cloned();
        let result: Result<StudentPage, BackendError> = if self.take_list_failure() {
            Err(BackendError::Transport(String::from("connection refused")))
        } else {
            Ok(self.page_for(query))
        };
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }
    }
}

impl GroupMutator for FakeBackend {
    fn mutate_group(
        &self,
        group: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> impl Future<Output = Result<MutationResponse, BackendError>> + Send {
        self.mutate_calls
            .lock()
            .unwrap()
            .push((group.clone(), action.clone(), ids.to_vec()));
        let gate: Option<Arc<Notify>> = self.group_gates.lock().unwrap().get(group).cloned();
        let failure: Option<GroupFailure> = self.group_failures.lock().unwrap().get(group).cloned();
        let result: Result<MutationResponse, BackendError> = match failure {
            Some(GroupFailure::Transport) => {
                Err(BackendError::Transport(String::from("connection reset")))
            }
            Some(GroupFailure::Rejected(message)) => Ok(MutationResponse::rejected(message)),
            None => {
                let details: Vec<StudentResult> = self.apply_mutation(group, action, ids);
                let mut response: MutationResponse = MutationResponse::ok();
                if self.send_details.load(Ordering::SeqCst) {
                    response.details = Some(details);
                }
                Ok(response)
            }
        };
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        }
    }
}
