//! Command implementations for the CLI interface.
//!
//! `serve` runs the web application; `list` and `ui` are read-only views over the same
//! data file, computed with the same policy engine the dashboard page uses.

use std::io;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::config::{Config, DEFAULT_BIND};
use crate::db::{FileStore, Store};
use crate::fields::Group;
use crate::policy::{Policy, ProjectSummary};
use crate::server::run_server;
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the web dashboard (the default).
    Serve(ServeArgs),

    /// Print projects grouped by lifecycle and ordered by priority.
    List {
        /// Only show one group.
        #[arg(long, value_enum)]
        group: Option<Group>,
        /// Only show stalled projects.
        #[arg(long)]
        stalled: bool,
    },

    /// Launch the terminal dashboard.
    Ui,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options for `serve`.
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PROJECT_TRACKER_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,
}

impl ServeArgs {
    /// Resolve the options `serve` would get with no flags: environment, then defaults.
    /// Used when the binary runs without a subcommand.
    pub fn from_env() -> Result<Self, clap::Error> {
        ServeArgs::try_parse_from(["serve"])
    }
}

/// Start the HTTP server on a fresh tokio runtime.
pub fn cmd_serve(config: Config, bind: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(run_server(config, bind))
}

/// Print the dashboard as plain-text tables.
pub fn cmd_list(config: &Config, group: Option<Group>, stalled_only: bool) {
    let db = FileStore::new(&config.data_file).load();
    let policy = Policy::from_config(config);
    let dash = policy.dashboard(&db, Local::now().date_naive());
    if dash.is_empty() {
        println!("No projects in {}", config.data_file.display());
        return;
    }

    let groups: Vec<Group> = match group {
        Some(g) => vec![g],
        None => Group::ALL.to_vec(),
    };
    for (i, g) in groups.into_iter().enumerate() {
        let rows: Vec<&ProjectSummary<'_>> = dash
            .group(g)
            .iter()
            .filter(|s| !stalled_only || s.stalled)
            .collect();
        if i > 0 {
            println!();
        }
        println!("{} ({})", g.title(), rows.len());
        print_table(&rows);
    }
    if group.is_none() && !stalled_only {
        println!();
        println!("{} projects", dash.len());
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(config: &Config) -> Result<()> {
    run_tui(config).context("UI error")
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Print project summaries in a fixed-width table.
pub fn print_table(rows: &[&ProjectSummary<'_>]) {
    println!(
        "{:<5} {:<8} {:>5} {:<8} {:<7} {}",
        "ID", "Priority", "Done", "Stalled", "Tasks", "Name"
    );
    for s in rows {
        let p = s.project;
        let done = p.tasks.iter().filter(|t| t.completed).count();
        println!(
            "{:<5} {:<8} {:>4}% {:<8} {:<7} {}",
            truncate(s.id, 5),
            truncate(p.priority.as_str(), 8),
            s.progress,
            if s.stalled { "yes" } else { "-" },
            format!("{}/{}", done, p.tasks.len()),
            p.name
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("High", 8), "High");
        assert_eq!(truncate("Eventually", 8), "Eventua…");
        assert_eq!(truncate("", 3), "");
    }
}
