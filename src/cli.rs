//! Command-line argument parsing for query-gate.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// A guarded, read-only SQL execution gateway.
#[derive(Parser, Debug, Default)]
#[command(name = "query-gate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(short = 'b', long, value_name = "ADDR", env = "QUERY_GATE_BIND")]
    pub bind: Option<String>,

    /// Append LIMIT/OFFSET to queries and answer in the paginated shape
    #[arg(long, env = "QUERY_GATE_PAGINATE")]
    pub paginate: bool,

    /// Log file path (overrides logging.file)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI overrides on top of the loaded configuration.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if self.paginate {
            config.server.paginate = true;
        }
        if let Some(log_file) = &self.log_file {
            config.logging.file = log_file.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "query-gate",
            "--config",
            "/etc/query-gate.toml",
            "--bind",
            "0.0.0.0:9000",
            "--paginate",
            "--log-file",
            "/var/log/gate.log",
        ])
        .unwrap();

        assert_eq!(cli.config_path(), PathBuf::from("/etc/query-gate.toml"));
        assert_eq!(cli.bind.as_deref(), Some("0.0.0.0:9000"));
        assert!(cli.paginate);
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli {
            bind: Some("0.0.0.0:1".to_string()),
            paginate: true,
            log_file: Some(PathBuf::from("x.log")),
            ..Default::default()
        };
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.server.bind, "0.0.0.0:1");
        assert!(config.server.paginate);
        assert_eq!(config.logging.file, PathBuf::from("x.log"));
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let mut config = Config::default();
        config.server.paginate = true;
        Cli::default().apply_to(&mut config);
        assert!(config.server.paginate);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::default();
        assert!(cli.config_path().ends_with("query-gate/config.toml"));
    }
}
