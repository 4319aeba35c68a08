// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use crate::{ClassId, SchoolId, SelectionSnapshot, StudentId, StudentRecord, UserId};

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

pub fn create_test_snapshot(id: &str, class_id: Option<&str>) -> SelectionSnapshot {
    create_test_record(id, class_id).snapshot()
}
