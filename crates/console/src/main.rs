// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # rosterctl
//!
//! Operator console for the student roster. Every invocation loads the
//! persisted selection and session from the state directory, runs one
//! command against the backend and writes the selection back.
//!
//! ```text
//! rosterctl login --token abc --user admin-1 --school school-1
//! rosterctl list --class c-1 --page 2
//! rosterctl select s-3 s-4 --class c-1 --page 2
//! rosterctl transfer --to c-2
//! ```

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

mod cli;
mod console;
mod render;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use color_eyre::Result;
use roster::{DurableStorage, SessionProvider};
use roster_api::{FileStorage, HttpBackend};
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

use crate::cli::Command;
use crate::console::Console;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match args.run().await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Roster console - browse students and move them between classes
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the roster backend
    #[arg(
        long,
        global = true,
        env = "ROSTER_BACKEND_URL",
        default_value = "http://127.0.0.1:3000"
    )]
    backend: String,

    /// Directory holding the selection and session between runs
    #[arg(long, global = true, env = "ROSTER_STATE_DIR", default_value = ".roster")]
    state_dir: PathBuf,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

impl Args {
    async fn run(self) -> Result<String> {
        let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(&self.state_dir));
        let session: Arc<SessionProvider> = Arc::new(SessionProvider::new(Arc::clone(&storage)));
        let backend: HttpBackend =
            HttpBackend::new(&self.backend)?.with_session(Arc::clone(&session));

        let mut console: Console<HttpBackend> = Console::new(Arc::new(backend), storage, session);
        console.run(self.command).await
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}
