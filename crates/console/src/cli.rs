// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use clap::Subcommand;
use roster_domain::{ClassFilter, FilterKey, GroupScope};

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Show one page of students
    #[command(visible_alias = "ls")]
    List(ViewArgs),

    /// Add students of a page to the selection
    Select {
        /// Students to select; they must be on the page described below
        #[arg(required_unless_present = "all_on_page", conflicts_with = "all_on_page")]
        ids: Vec<String>,

        /// Select the whole page, or deselect it when already fully selected
        #[arg(long)]
        all_on_page: bool,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Remove students from the selection
    Deselect {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the selected students
    Selection,

    /// Clear the selection
    Clear,

    /// Move the selected students to another class
    Transfer {
        /// Destination class
        #[arg(long)]
        to: String,

        /// Class the selection was made in; omit to route each student by its own class
        #[arg(long)]
        class: Option<String>,
    },

    /// Take the selected students out of their class
    Remove {
        /// Class the selection was made in; omit to route each student by its own class
        #[arg(long)]
        class: Option<String>,
    },

    /// Write the selection, or one page, as CSV
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,

        /// Export the page described below instead of the selection
        #[arg(long)]
        current_page: bool,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Store a session token for backend requests
    Login {
        /// Bearer token issued by the backend
        #[arg(long, env = "ROSTER_TOKEN")]
        token: String,

        /// The signed-in account
        #[arg(long)]
        user: String,

        /// The school the account administers
        #[arg(long)]
        school: String,

        /// The account's role
        #[arg(long, default_value = "school_admin")]
        role: String,

        /// Minutes until the session expires
        #[arg(long, default_value_t = 480)]
        ttl_minutes: u32,
    },

    /// Drop the stored session
    Logout,

    /// Show the stored session
    Whoami,
}

/// Filters and page of the list view a command works on.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct ViewArgs {
    /// Page number, starting at 1
    #[arg(long)]
    pub page: Option<u32>,

    /// Students per page
    #[arg(long)]
    pub limit: Option<u32>,

    /// Search on student names
    #[arg(long)]
    pub search: Option<String>,

    /// Only students of this class ("all" for every class)
    #[arg(long)]
    pub class: Option<String>,

    /// Only students of this grade
    #[arg(long)]
    pub grade: Option<String>,
}

impl ViewArgs {
    /// The filters to apply before loading, page excluded.
    pub fn filters(&self) -> Vec<(FilterKey, String)> {
        [
            (FilterKey::PageSize, self.limit.map(|l| l.to_string())),
            (FilterKey::Search, self.search.clone()),
            (FilterKey::Class, self.class.clone()),
            (FilterKey::Grade, self.grade.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Grouping context for a bulk action started from a view filtered to
/// `class`.
pub fn scope_for(class: Option<&str>) -> GroupScope {
    match class.map_or(ClassFilter::All, ClassFilter::from_wire) {
        ClassFilter::All => GroupScope::AllGroups,
        ClassFilter::Class(class_id) => GroupScope::Single(class_id),
    }
}
