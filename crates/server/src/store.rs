// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory student roster backing the reference server.

use roster::StudentResult;
use roster_domain::{
    BulkAction, ClassFilter, ClassId, MAX_PAGE_SIZE, Pagination, QueryState, SchoolId, StudentId,
    StudentRecord, UserId,
};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "Ken", "Radia", "Dennis",
    "Margaret",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Thompson", "Perlman",
    "Ritchie", "Hamilton", "Kay", "Lamport",
];

/// Every n-th seeded student has no class.
const UNASSIGNED_EVERY: usize = 7;

/// The server's roster.
#[derive(Debug, Clone, Default)]
pub struct RosterStore {
    students: Vec<StudentRecord>,
}

impl RosterStore {
    /// Generates `count` students spread over `classes` classes.
    ///
    /// Every seventh student has no class.
    #[must_use]
    pub fn seeded(count: usize, classes: usize) -> Self {
        let classes: usize = classes.max(1);
        let students: Vec<StudentRecord> = (1..=count)
            .map(|i| {
                let class: Option<usize> = if i % UNASSIGNED_EVERY == 0 {
                    None
                } else {
                    Some((i - 1) % classes + 1)
                };
                StudentRecord {
                    id: StudentId::new(format!("s-{i}")),
                    user_id: UserId::new(format!("u-{i}")),
                    school_id: SchoolId::new("school-1"),
                    class_id: class.map(|c| ClassId::new(format!("c-{c}"))),
                    class_name: class.map(|c| format!("Class {c}")),
                    first_name: FIRST_NAMES[(i - 1) % FIRST_NAMES.len()].to_string(),
                    last_name: LAST_NAMES[(i - 1) % LAST_NAMES.len()].to_string(),
                    grade: Some(((i - 1) % 6 + 1).to_string()),
                    photo_url: (i % 2 == 0).then(|| format!("/photos/s-{i}.jpg")),
                }
            })
            .collect();
        Self { students }
    }

    /// Number of students.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.students.len()
    }

    /// Returns the page described by `query` and its pagination.
    ///
    /// A page past the end is empty; `pages` is at least 1.
    #[must_use]
    pub fn list(&self, query: &QueryState) -> (Vec<StudentRecord>, Pagination) {
        let needle: String = query.search.trim().to_lowercase();
        let matching: Vec<&StudentRecord> = self
            .students
            .iter()
            .filter(|s| match &query.class_filter {
                ClassFilter::All => true,
                ClassFilter::Class(class_id) => s.class_id.as_ref() == Some(class_id),
            })
            .filter(|s| {
                query
                    .grade_filter
                    .as_ref()
                    .is_none_or(|grade| s.grade.as_ref() == Some(grade))
            })
            .filter(|s| needle.is_empty() || s.display_name().to_lowercase().contains(&needle))
            .collect();

        let limit: u32 = query.page_size.clamp(1, MAX_PAGE_SIZE);
        let total: u32 = u32::try_from(matching.len()).unwrap_or(u32::MAX);
        let mut pagination: Pagination = Pagination::for_total(query.page, limit, total);
        pagination.pages = pagination.last_page();

        let offset: usize = (query.page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        let records: Vec<StudentRecord> = matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect();
        (records, pagination)
    }

    /// Applies `action` to the students of `ids` that belong to `class_id`.
    ///
    /// Ids in another class are reported unchanged; unknown ids fail.
    pub fn apply_bulk(
        &mut self,
        class_id: &ClassId,
        action: &BulkAction,
        ids: &[StudentId],
    ) -> Vec<StudentResult> {
        ids.iter()
            .map(|id| {
                let Some(student) = self.students.iter_mut().find(|s| &s.id == id) else {
                    return StudentResult {
                        student_id: id.clone(),
                        success: false,
                        changed: Some(false),
                        message: Some(String::from("Student not found")),
                    };
                };
                if student.class_id.as_ref() != Some(class_id) {
                    return StudentResult {
                        student_id: id.clone(),
                        success: true,
                        changed: Some(false),
                        message: Some(format!("Student is not in class '{class_id}'")),
                    };
                }
                match action {
                    BulkAction::Transfer { target } => {
                        student.class_id = Some(target.clone());
                        student.class_name = None;
                    }
                    BulkAction::Remove => {
                        student.class_id = None;
                        student.class_name = None;
                    }
                }
                StudentResult {
                    student_id: id.clone(),
                    success: true,
                    changed: Some(true),
                    message: None,
                }
            })
            .collect()
    }
}
