// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from its backend representation.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Creates a new identifier, rejecting blank values.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty after trimming.
            pub fn parse(value: &str) -> Result<Self, DomainError> {
                let trimmed: &str = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::EmptyIdentifier { kind: $kind });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifies a student record.
    StudentId,
    "student"
);
string_id!(
    /// Identifies a class. Classes are the grouping key for bulk operations.
    ClassId,
    "class"
);
string_id!(
    /// Identifies a school.
    SchoolId,
    "school"
);
string_id!(
    /// Identifies the login account behind a student record.
    UserId,
    "user"
);

/// A student as returned by the list endpoint.
///
/// Carries a denormalized copy of the fields needed for display and for
/// bulk operations, so acting on a record never requires a second fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// The student identifier.
    #[serde(alias = "_id")]
    pub id: StudentId,
    /// The login account for this student.
    pub user_id: UserId,
    /// The school the student is enrolled in.
    pub school_id: SchoolId,
    /// The class the student currently belongs to, if any.
    #[serde(default)]
    pub class_id: Option<ClassId>,
    /// Display name of the current class.
    #[serde(default)]
    pub class_name: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Grade level, when the school records one.
    #[serde(default)]
    pub grade: Option<String>,
    /// Profile photo location.
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl StudentRecord {
    /// Returns the full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Captures the fields needed to act on this record later.
    #[must_use]
    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            id: self.id.clone(),
            class_id: self.class_id.clone(),
            user_id: self.user_id.clone(),
            school_id: self.school_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Initial photo state for this record.
    #[must_use]
    pub const fn initial_image_state(&self) -> ImageState {
        if self.photo_url.is_some() {
            ImageState::Loading
        } else {
            ImageState::Failed
        }
    }
}

/// A copy of a record's fields taken at selection time.
///
/// Snapshots are not refreshed while the record stays selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSnapshot {
    /// The student identifier.
    pub id: StudentId,
    /// The class at selection time.
    #[serde(default)]
    pub class_id: Option<ClassId>,
    /// The login account.
    pub user_id: UserId,
    /// The school.
    pub school_id: SchoolId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl SelectionSnapshot {
    /// Returns the full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Load state of a record's profile photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageState {
    /// The image has been requested.
    #[default]
    Loading,
    /// The image is available.
    Loaded,
    /// The image failed to load, or there is none; show initials instead.
    Failed,
}

impl ImageState {
    /// Transition after the image finished loading.
    ///
    /// A failed image stays failed until [`ImageState::reset`].
    #[must_use]
    pub const fn on_loaded(self) -> Self {
        match self {
            Self::Loading | Self::Loaded => Self::Loaded,
            Self::Failed => Self::Failed,
        }
    }

    /// Transition after the image failed to load.
    #[must_use]
    pub const fn on_error(self) -> Self {
        Self::Failed
    }

    /// Restart loading, e.g. after the photo URL changed.
    #[must_use]
    pub const fn reset(self) -> Self {
        Self::Loading
    }

    /// Whether the initials placeholder should be shown.
    #[must_use]
    pub const fn shows_placeholder(self) -> bool {
        !matches!(self, Self::Loaded)
    }
}
