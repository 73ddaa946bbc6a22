//! Command-line options and the run configuration resolved from them.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::storage::{ConfigStore, APP_NAME};

pub const CATALOG_FILE: &str = "catalog.toml";
pub const LOG_FILE: &str = "do-my-job.log";
pub const DEFAULT_EXIT_DELAY_MS: u64 = 500;

#[derive(Debug, Parser)]
#[command(
    name = APP_NAME,
    version,
    about = "Run administrative SQL scripts against configured servers"
)]
pub struct Cli {
    /// Directory holding per-server JSON configs (default: ~/.config/do-my-job)
    #[arg(long, value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// Script catalog (default: <config-dir>/catalog.toml)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Log file (default: <config-dir>/do-my-job.log)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// How long the final frame stays up before exit
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_EXIT_DELAY_MS)]
    pub exit_delay_ms: u64,
}

/// Resolved once at startup and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub log_path: PathBuf,
    pub exit_delay: Duration,
}

impl Settings {
    pub fn from_cli(cli: Cli) -> Self {
        let config_dir = cli.config_dir.unwrap_or_else(ConfigStore::default_dir);
        Self {
            catalog_path: cli.catalog.unwrap_or_else(|| config_dir.join(CATALOG_FILE)),
            log_path: cli.log_file.unwrap_or_else(|| config_dir.join(LOG_FILE)),
            exit_delay: Duration::from_millis(cli.exit_delay_ms),
            config_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_default_under_config_dir() {
        let cli = Cli::try_parse_from(["do-my-job", "--config-dir", "/srv/ops"]).unwrap();
        let settings = Settings::from_cli(cli);
        assert_eq!(settings.catalog_path, PathBuf::from("/srv/ops/catalog.toml"));
        assert_eq!(settings.log_path, PathBuf::from("/srv/ops/do-my-job.log"));
        assert_eq!(settings.exit_delay, Duration::from_millis(DEFAULT_EXIT_DELAY_MS));
    }

    #[test]
    fn explicit_paths_win() {
        let cli = Cli::try_parse_from([
            "do-my-job",
            "--config-dir",
            "/srv/ops",
            "--catalog",
            "/etc/scripts.toml",
            "--log-file",
            "/var/log/dmj.log",
            "--exit-delay-ms",
            "0",
        ])
        .unwrap();
        let settings = Settings::from_cli(cli);
        assert_eq!(settings.catalog_path, PathBuf::from("/etc/scripts.toml"));
        assert_eq!(settings.log_path, PathBuf::from("/var/log/dmj.log"));
        assert_eq!(settings.exit_delay, Duration::ZERO);
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        assert!(ConfigStore::default_dir().ends_with(".config/do-my-job"));
    }
}
