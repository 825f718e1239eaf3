//! Runtime configuration.
//!
//! Built once from the command line (see `cli.rs`) and handed to the store, the policy
//! engine and the server. Nothing reads configuration from globals.

use std::path::PathBuf;

/// Data file used when `--db` is not given.
pub const DEFAULT_DATA_FILE: &str = "projects_data.json";

/// Days without a task or activity before a project is flagged as stalled.
pub const DEFAULT_STALL_PERIOD: i64 = 3;

/// Address the web server binds when `--bind` is not given.
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the JSON data file holding every project.
    pub data_file: PathBuf,
    /// Stall period applied to projects that carry none of their own.
    pub default_stall_period: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            default_stall_period: DEFAULT_STALL_PERIOD,
        }
    }
}
