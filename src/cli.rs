use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::config::{Config, DEFAULT_DATA_FILE, DEFAULT_STALL_PERIOD};

/// Single-user project tracker.
/// Storage defaults to ./projects_data.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tracker", version, about = "Project tracker with stall detection")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true, env = "PROJECT_TRACKER_DB", default_value = DEFAULT_DATA_FILE)]
    pub db: PathBuf,

    /// Stall period in days for projects that do not set their own.
    #[arg(
        long,
        global = true,
        env = "PROJECT_TRACKER_STALL_PERIOD",
        default_value_t = DEFAULT_STALL_PERIOD,
        allow_negative_numbers = true
    )]
    pub stall_period: i64,

    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            data_file: self.db.clone(),
            default_stall_period: self.stall_period,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::ServeArgs;
    use crate::config::DEFAULT_BIND;
    use crate::fields::Group;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tracker"]).unwrap();
        let config = cli.config();
        assert_eq!(config.data_file, PathBuf::from("projects_data.json"));
        assert_eq!(config.default_stall_period, 3);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tracker", "list", "--group", "postponed", "--db", "/tmp/p.json", "--stall-period", "7",
        ])
        .unwrap();
        assert_eq!(cli.config().default_stall_period, 7);
        assert_eq!(cli.db, PathBuf::from("/tmp/p.json"));
        match cli.command {
            Some(Commands::List { group, stalled }) => {
                assert_eq!(group, Some(Group::Postponed));
                assert!(!stalled);
            }
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_serve_bind() {
        let cli = Cli::try_parse_from(["tracker", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => assert_eq!(args.bind.port(), 8080),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_bare_invocation_reads_bind_from_env() {
        let cli = Cli::try_parse_from(["tracker"]).unwrap();
        assert!(cli.command.is_none());

        std::env::set_var("PROJECT_TRACKER_BIND", "127.0.0.1:6123");
        let from_env = ServeArgs::from_env();
        std::env::remove_var("PROJECT_TRACKER_BIND");
        assert_eq!(from_env.unwrap().bind.port(), 6123);

        // Without the variable the listener falls back to the default address.
        assert_eq!(ServeArgs::from_env().unwrap().bind.to_string(), DEFAULT_BIND);
    }
}
