//! # Tracker - Project Tracking Web App
//!
//! A single-user project tracker. Each project holds a list of tasks and a free-text
//! activity log; the dashboard shows completion progress per project and flags projects
//! that have gone quiet for longer than their stall period.
//!
//! ## Key Features
//!
//! - **Progress**: percentage of completed tasks, rounded down
//! - **Stall Detection**: per-project stall period; a recent activity entry, task creation
//!   or task completion keeps a project from being flagged
//! - **Lifecycle Groups**: active, postponed and cancelled lists, each ordered by priority
//! - **Local File Storage**: the whole collection lives in one indented JSON file,
//!   rewritten in full on every change
//! - **Terminal Views**: `list` prints the dashboard, `ui` opens it as a TUI
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the dashboard on http://127.0.0.1:5000
//! tracker serve
//!
//! # Same, with a different data file and bind address
//! tracker --db ~/notes/projects.json serve --bind 0.0.0.0:8080
//!
//! # Print stalled active projects
//! tracker list --group active --stalled
//!
//! # Browse projects in the terminal
//! tracker ui
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info` for `serve`).

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod policy;
pub mod project;
pub mod server;
pub mod task;
pub mod views;
pub mod tui {
    pub mod colors;
    pub mod dashboard;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();

    // The TUI owns the terminal, so keep log output to real problems there.
    let default_level = match cli.command {
        None | Some(Commands::Serve(_)) => "info",
        Some(Commands::Ui) => "error",
        _ => "warn",
    };
    init_tracing(default_level);

    match cli.command {
        None => cmd_serve(config, ServeArgs::from_env()?.bind),
        Some(Commands::Serve(args)) => cmd_serve(config, args.bind),
        Some(Commands::List { group, stalled }) => {
            cmd_list(&config, group, stalled);
            Ok(())
        }
        Some(Commands::Ui) => cmd_ui(&config),
        Some(Commands::Completions { shell }) => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
