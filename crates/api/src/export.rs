// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV export of student lists.
//!
//! A header row is always written, so an empty export is still a valid
//! file.

use csv::{Writer, WriterBuilder};
use roster_domain::{SelectionSnapshot, StudentRecord};
use serde::Serialize;
use std::io::Write;

use crate::error::ApiError;

const SELECTION_HEADERS: &[&str] = &[
    "student_id",
    "first_name",
    "last_name",
    "class_id",
    "user_id",
    "school_id",
];

const PAGE_HEADERS: &[&str] = &[
    "student_id",
    "first_name",
    "last_name",
    "class_id",
    "class_name",
    "grade",
];

#[derive(Serialize)]
struct SelectionRow<'a> {
    student_id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    class_id: &'a str,
    user_id: &'a str,
    school_id: &'a str,
}

#[derive(Serialize)]
struct PageRow<'a> {
    student_id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    class_id: &'a str,
    class_name: &'a str,
    grade: &'a str,
}

fn writer_with_headers<W: Write>(out: W, headers: &[&str]) -> Result<Writer<W>, ApiError> {
    let mut writer: Writer<W> = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(headers)?;
    Ok(writer)
}

/// Writes the selected students as CSV. Returns the number of data rows.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn export_selection_csv<W: Write>(
    out: W,
    snapshots: &[SelectionSnapshot],
) -> Result<usize, ApiError> {
    let mut writer: Writer<W> = writer_with_headers(out, SELECTION_HEADERS)?;
    for snapshot in snapshots {
        writer.serialize(SelectionRow {
            student_id: snapshot.id.as_str(),
            first_name: &snapshot.first_name,
            last_name: &snapshot.last_name,
            class_id: snapshot.class_id.as_ref().map_or("", |c| c.as_str()),
            user_id: snapshot.user_id.as_str(),
            school_id: snapshot.school_id.as_str(),
        })?;
    }
    writer
        .flush()
        .map_err(|e| ApiError::Export(e.to_string()))?;
    Ok(snapshots.len())
}

/// Writes one page of records as CSV. Returns the number of data rows.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn export_page_csv<W: Write>(out: W, records: &[StudentRecord]) -> Result<usize, ApiError> {
    let mut writer: Writer<W> = writer_with_headers(out, PAGE_HEADERS)?;
    for record in records {
        writer.serialize(PageRow {
            student_id: record.id.as_str(),
            first_name: &record.first_name,
            last_name: &record.last_name,
            class_id: record.class_id.as_ref().map_or("", |c| c.as_str()),
            class_name: record.class_name.as_deref().unwrap_or_default(),
            grade: record.grade.as_deref().unwrap_or_default(),
        })?;
    }
    writer
        .flush()
        .map_err(|e| ApiError::Export(e.to_string()))?;
    Ok(records.len())
}
