// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::{ClassId, StudentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Default number of records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Wire value used for "every class".
pub const ALL_CLASSES: &str = "all";

/// Class filter for the student list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ClassFilter {
    /// Students from every class, including unassigned ones.
    #[default]
    All,
    /// Students of one class.
    Class(ClassId),
}

impl ClassFilter {
    /// Parses a wire value. Empty and `"all"` mean every class.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        let trimmed: &str = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_CLASSES) {
            Self::All
        } else {
            Self::Class(ClassId::new(trimmed))
        }
    }

    /// Returns the wire value.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        match self {
            Self::All => ALL_CLASSES,
            Self::Class(id) => id.as_str(),
        }
    }
}

/// Where a query change came from. Decides the debounce applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// Typed text, e.g. the search box.
    FreeText,
    /// Dropdowns, pagination and other discrete controls.
    Structured,
}

/// A field of [`QueryState`] that can be set individually.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// The 1-based page number.
    Page,
    /// Records per page.
    PageSize,
    /// Free-text search on names.
    Search,
    /// Class filter.
    Class,
    /// Grade filter.
    Grade,
    /// Any additional backend filter, passed through verbatim.
    Other(String),
}

impl FilterKey {
    /// Classifies the origin of a change to this key.
    #[must_use]
    pub const fn origin(&self) -> ChangeOrigin {
        match self {
            Self::Search => ChangeOrigin::FreeText,
            _ => ChangeOrigin::Structured,
        }
    }

    /// Returns the query parameter name used on the wire.
    #[must_use]
    pub fn param_name(&self) -> &str {
        match self {
            Self::Page => "page",
            Self::PageSize => "limit",
            Self::Search => "search",
            Self::Class => "classId",
            Self::Grade => "grade",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for FilterKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(DomainError::InvalidFilterValue {
                filter: String::new(),
                reason: String::from("filter name cannot be empty"),
            }),
            "page" => Ok(Self::Page),
            "limit" | "pageSize" | "page_size" => Ok(Self::PageSize),
            "search" => Ok(Self::Search),
            "classId" | "class" | "class_id" => Ok(Self::Class),
            "grade" => Ok(Self::Grade),
            other => Ok(Self::Other(other.to_string())),
        }
    }
}

/// The current filter, search and pagination state of a list view.
///
/// Changing any field other than the page resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// The 1-based page number.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
    /// Free-text search as typed.
    pub search: String,
    /// Class filter.
    pub class_filter: ClassFilter,
    /// Grade filter.
    pub grade_filter: Option<String>,
    /// Additional backend filters.
    pub extra: BTreeMap<String, String>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            class_filter: ClassFilter::All,
            grade_filter: None,
            extra: BTreeMap::new(),
        }
    }
}

impl QueryState {
    /// Creates a query state with the given page size and default filters.
    #[must_use]
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            ..Self::default()
        }
    }

    /// Sets one field from its textual value.
    ///
    /// Any key other than [`FilterKey::Page`] resets the page to 1. On error
    /// the state is left unchanged.
    ///
    /// # Arguments
    ///
    /// * `key` - The field to set
    /// * `value` - The new value as it would appear in a query string
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The page is not a positive integer
    /// - The page size is not an integer between 1 and [`MAX_PAGE_SIZE`]
    pub fn apply_filter(&mut self, key: &FilterKey, value: &str) -> Result<(), DomainError> {
        match key {
            FilterKey::Page => {
                self.page = parse_page(value)?;
                return Ok(());
            }
            FilterKey::PageSize => self.page_size = parse_page_size(value)?,
            FilterKey::Search => self.search = value.to_string(),
            FilterKey::Class => self.class_filter = ClassFilter::from_wire(value),
            FilterKey::Grade => {
                let trimmed: &str = value.trim();
                self.grade_filter = if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
                    None
                } else {
                    Some(trimmed.to_string())
                };
            }
            FilterKey::Other(name) => {
                if value.trim().is_empty() {
                    self.extra.remove(name);
                } else {
                    self.extra.insert(name.clone(), value.trim().to_string());
                }
            }
        }
        self.page = 1;
        Ok(())
    }

    /// Builds the backend query parameters, sorted by name.
    #[must_use]
    pub fn to_params(&self) -> BTreeMap<String, String> {
        let mut params: BTreeMap<String, String> = self.extra.clone();
        params.insert(String::from("page"), self.page.to_string());
        params.insert(String::from("limit"), self.page_size.to_string());
        params.insert(String::from("search"), self.search.trim().to_string());
        params.insert(
            String::from("classId"),
            self.class_filter.as_wire().to_string(),
        );
        if let Some(grade) = &self.grade_filter {
            params.insert(String::from("grade"), grade.clone());
        }
        params
    }

    /// Derives the key used to deduplicate fetches for this state.
    #[must_use]
    pub fn fetch_key(&self) -> FetchKey {
        FetchKey::from_params(self.to_params())
    }
}

fn parse_page(value: &str) -> Result<u32, DomainError> {
    match value.trim().parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => Err(DomainError::InvalidPage(value.to_string())),
    }
}

fn parse_page_size(value: &str) -> Result<u32, DomainError> {
    match value.trim().parse::<u32>() {
        Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
        _ => Err(DomainError::InvalidPageSize {
            value: value.to_string(),
            max: MAX_PAGE_SIZE,
        }),
    }
}

/// Order-independent identity of a query's parameters.
///
/// Two query states with equal parameters always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey(Vec<(String, String)>);

impl FetchKey {
    /// Builds a key from arbitrary parameters.
    #[must_use]
    pub fn from_params<I>(params: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let sorted: BTreeMap<String, String> = params.into_iter().collect();
        Self(sorted.into_iter().collect())
    }

    /// Returns the parameters in key order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.0
    }
}

impl std::fmt::Display for FetchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (idx, (name, value)) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("&")?;
            }
            write!(f, "{name}={value:?}")?;
        }
        Ok(())
    }
}

/// Pagination metadata returned by the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// The page that was returned.
    pub page: u32,
    /// The page size used.
    pub limit: u32,
    /// Total matching records.
    pub total: u32,
    /// Total pages; zero when nothing matched.
    pub pages: u32,
}

impl Pagination {
    /// Builds pagination metadata for `total` records at `limit` per page.
    #[must_use]
    pub const fn for_total(page: u32, limit: u32, total: u32) -> Self {
        let pages: u32 = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    /// The highest valid page number. An empty result still has page 1.
    #[must_use]
    pub const fn last_page(&self) -> u32 {
        if self.pages == 0 { 1 } else { self.pages }
    }

    /// Whether `page` is a valid page number.
    #[must_use]
    pub const fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.last_page()
    }

    /// Limits `page` to the valid range.
    #[must_use]
    pub const fn clamp_page(&self, page: u32) -> u32 {
        if page < 1 {
            1
        } else if page > self.last_page() {
            self.last_page()
        } else {
            page
        }
    }
}

/// One page of students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentPage {
    /// The records on this page.
    pub records: Vec<StudentRecord>,
    /// Pagination metadata.
    pub pagination: Pagination,
}
