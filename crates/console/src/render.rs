// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Plain-text rendering of console output.

use std::fmt::Write as _;

use roster::{ControllerView, PageToggle, SelectionStore, Session};
use roster_domain::{BulkReport, ImageState, SelectionSnapshot, StudentId, StudentRecord};
use time::format_description::well_known::Rfc3339;

const NO_CLASS: &str = "-";

/// Renders the loaded page with a selection marker per row.
pub fn render_page(view: &ControllerView, selection: &SelectionStore) -> String {
    if view.records.is_empty() {
        return String::from("No students match the current filters");
    }

    let rows: Vec<[String; 6]> = view
        .records
        .iter()
        .map(|record| {
            let marker: &str = if selection.is_selected(&record.id) {
                "[x]"
            } else {
                "[ ]"
            };
            [
                marker.to_string(),
                record.id.to_string(),
                record.display_name(),
                record
                    .class_name
                    .clone()
                    .or_else(|| record.class_id.as_ref().map(ToString::to_string))
                    .unwrap_or_else(|| NO_CLASS.to_string()),
                record.grade.clone().unwrap_or_default(),
                photo_cell(record),
            ]
        })
        .collect();
    let header: [String; 6] = ["", "ID", "NAME", "CLASS", "GRADE", "PHOTO"].map(String::from);

    let mut out: String = table(&header, &rows);
    if let Some(pagination) = &view.pagination {
        let _ = write!(
            out,
            "\nPage {} of {} ({} students, {} selected)",
            pagination.page,
            pagination.last_page(),
            pagination.total,
            selection.len()
        );
    }
    out
}

/// The photo column: the photo path, or initials when there is none.
fn photo_cell(record: &StudentRecord) -> String {
    match record.initial_image_state() {
        ImageState::Failed => initials(&record.first_name, &record.last_name),
        ImageState::Loading | ImageState::Loaded => record.photo_url.clone().unwrap_or_default(),
    }
}

pub fn initials(first_name: &str, last_name: &str) -> String {
    [first_name, last_name]
        .iter()
        .filter_map(|name| name.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Renders the selected students, including ids whose details were lost.
pub fn render_selection(snapshots: &[SelectionSnapshot], missing: &[StudentId]) -> String {
    if snapshots.is_empty() && missing.is_empty() {
        return String::from("No students selected");
    }

    let mut rows: Vec<[String; 3]> = snapshots
        .iter()
        .map(|s| {
            [
                s.id.to_string(),
                s.display_name(),
                s.class_id
                    .as_ref()
                    .map_or_else(|| NO_CLASS.to_string(), ToString::to_string),
            ]
        })
        .collect();
    rows.extend(missing.iter().map(|id| {
        [
            id.to_string(),
            String::from("(details unavailable)"),
            NO_CLASS.to_string(),
        ]
    }));
    let header: [String; 3] = ["ID", "NAME", "CLASS"].map(String::from);

    let mut out: String = table(&header, &rows);
    let _ = write!(out, "\n{} selected", snapshots.len() + missing.len());
    out
}

/// Renders the outcome of a page toggle.
pub fn render_toggle(toggle: PageToggle, page: u32) -> String {
    match toggle {
        PageToggle::Selected(n) => format!("Selected {n} students on page {page}"),
        PageToggle::Deselected(n) => format!("Deselected {n} students on page {page}"),
    }
}

/// Renders a bulk report: the summary line, then one line per group with
/// students left unchanged.
pub fn render_report(report: &BulkReport) -> String {
    let mut out: String = report.summary();
    for group in report.groups.iter().filter(|g| !g.failed_ids.is_empty()) {
        let reason: String = group.error.clone().unwrap_or_else(|| {
            format!(
                "{} of {} students not {}",
                group.failed_ids.len(),
                group.requested,
                report.action.verb()
            )
        });
        let _ = write!(out, "\n  {}: {reason}", group.group);
    }
    for id in &report.skipped {
        let _ = write!(out, "\n  {id}: no class");
    }
    out
}

/// Renders the stored session.
pub fn render_session(session: Option<&Session>) -> String {
    let Some(session) = session else {
        return String::from("Not signed in");
    };
    let expires: String = session
        .expires_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| session.expires_at.to_string());
    format!(
        "Signed in as {} ({}, {}) until {expires}",
        session.user_id, session.school_id, session.role
    )
}

/// Left-aligned columns separated by two spaces.
fn table<const N: usize>(header: &[String; N], rows: &[[String; N]]) -> String {
    let mut widths: [usize; N] = header.each_ref().map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String; N]| -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(line(header))
        .chain(rows.iter().map(line))
        .collect::<Vec<String>>()
        .join("\n")
}
