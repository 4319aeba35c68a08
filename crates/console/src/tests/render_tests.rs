// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster::{ControllerView, MemoryStorage, PageToggle, SelectionConfig, SelectionStore};
use roster_domain::{
    BulkAction, BulkReport, ClassId, GroupOutcome, Pagination, QueryState, StudentId,
    StudentRecord,
};
use std::sync::Arc;

use super::helpers::create_test_record;
use crate::render::{
    initials, render_page, render_report, render_selection, render_session, render_toggle,
};

fn view_of(records: Vec<StudentRecord>) -> ControllerView {
    let total: u32 = u32::try_from(records.len()).unwrap();
    ControllerView {
        query: QueryState::default(),
        records,
        pagination: Some(Pagination::for_total(1, 10, total)),
        loaded: true,
        last_error: None,
        fetching: false,
    }
}

// ============================================================================
// Pages
// ============================================================================

#[test]
fn test_page_marks_selected_rows() {
    let records: Vec<StudentRecord> = vec![
        create_test_record("s-1", Some("c-1")),
        create_test_record("s-2", Some("c-1")),
    ];
    let mut selection: SelectionStore =
        SelectionStore::mount(Arc::new(MemoryStorage::new()), &SelectionConfig::default());
    selection.select(&records[0]);

    let out: String = render_page(&view_of(records), &selection);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "[x]  s-1  Test Student s-1  Class c-1  5      TS");
    assert_eq!(lines[2], "[ ]  s-2  Test Student s-2  Class c-1  5      TS");
    assert_eq!(lines[3], "Page 1 of 1 (2 students, 1 selected)");
}

#[test]
fn test_page_shows_photo_and_missing_class() {
    let mut record: StudentRecord = create_test_record("s-1", None);
    record.photo_url = Some(String::from("/photos/s-1.jpg"));
    let selection: SelectionStore =
        SelectionStore::mount(Arc::new(MemoryStorage::new()), &SelectionConfig::default());

    let out: String = render_page(&view_of(vec![record]), &selection);

    let row: &str = out.lines().nth(1).unwrap();
    assert!(row.contains("  -  "));
    assert!(row.ends_with("/photos/s-1.jpg"));
}

#[test]
fn test_empty_page_message() {
    let selection: SelectionStore =
        SelectionStore::mount(Arc::new(MemoryStorage::new()), &SelectionConfig::default());

    let out: String = render_page(&view_of(Vec::new()), &selection);

    assert_eq!(out, "No students match the current filters");
}

#[test]
fn test_initials() {
    assert_eq!(initials("ada", "lovelace"), "AL");
    assert_eq!(initials("", "Knuth"), "K");
    assert_eq!(initials(" ", ""), "");
}

// ============================================================================
// Selection and toggles
// ============================================================================

#[test]
fn test_selection_lists_missing_details() {
    let snapshot = create_test_record("s-1", Some("c-1")).snapshot();

    let out: String = render_selection(&[snapshot], &[StudentId::new("s-9")]);

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "s-1  Test Student s-1       c-1");
    assert_eq!(lines[2], "s-9  (details unavailable)  -");
    assert_eq!(lines[3], "2 selected");
}

#[test]
fn test_empty_selection_message() {
    assert_eq!(render_selection(&[], &[]), "No students selected");
}

#[test]
fn test_toggle_messages() {
    assert_eq!(
        render_toggle(PageToggle::Selected(4), 2),
        "Selected 4 students on page 2"
    );
    assert_eq!(
        render_toggle(PageToggle::Deselected(10), 1),
        "Deselected 10 students on page 1"
    );
}

// ============================================================================
// Reports and sessions
// ============================================================================

#[test]
fn test_report_lists_failed_groups_and_skipped() {
    let report: BulkReport = BulkReport::from_outcomes(
        BulkAction::Transfer {
            target: ClassId::new("c-9"),
        },
        vec![
            GroupOutcome::succeeded_all(ClassId::new("c-1"), 2),
            GroupOutcome::failed(ClassId::new("c-2"), vec![StudentId::new("s-3")], "timeout"),
        ],
        vec![StudentId::new("s-7")],
        Vec::new(),
    );

    let out: String = render_report(&report);

    assert_eq!(
        out,
        "1 of 2 groups updated; 1 failed (2 students moved, 1 failed); 1 skipped without a class\n  c-2: timeout\n  s-7: no class"
    );
}

#[test]
fn test_no_session() {
    assert_eq!(render_session(None), "Not signed in");
}

#[test]
fn test_report_lists_per_student_failures() {
    let report: BulkReport = BulkReport::from_outcomes(
        BulkAction::Remove,
        vec![GroupOutcome {
            group: ClassId::new("c-1"),
            requested: 3,
            affected: 2,
            failed_ids: vec![StudentId::new("s-2")],
            error: None,
        }],
        Vec::new(),
        Vec::new(),
    );

    let out: String = render_report(&report);

    assert!(out.ends_with("\n  c-1: 1 of 3 students not removed"));
}
