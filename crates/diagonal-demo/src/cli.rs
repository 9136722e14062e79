#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;
use diagonal_runtime::{Cadence, DiagonalConfig};

use crate::app;
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "diagonal",
    about = "Scroll source code and prose diagonally across the terminal",
    version
)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Rows in the code panel.
    #[arg(long, value_name = "N")]
    pub code_rows: Option<usize>,

    /// Rows in the writing panel.
    #[arg(long, value_name = "N")]
    pub writing_rows: Option<usize>,

    /// Tick interval for both panels, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// How the advance and reload steps share ticks (alternating, combined).
    #[arg(long)]
    pub cadence: Option<Cadence>,

    /// Seed for document selection.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Paint one truncated frame per panel instead of animating.
    #[arg(long = "static")]
    pub static_mode: bool,

    /// Stop after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub duration_secs: Option<u64>,

    /// Write logs to this file. Logging is off without it.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Load the config file (if any), apply flag overrides, and validate.
    pub fn config(&self) -> Result<DiagonalConfig> {
        let mut config = match &self.config {
            Some(path) => DiagonalConfig::from_toml_file(path)?,
            None => DiagonalConfig::default(),
        };
        if let Some(rows) = self.code_rows {
            config.code.rows = rows;
        }
        if let Some(rows) = self.writing_rows {
            config.writing.rows = rows;
        }
        if let Some(ms) = self.interval_ms {
            config.code.interval_ms = ms;
            config.writing.interval_ms = ms;
        }
        if let Some(cadence) = self.cadence {
            config.code.cadence = cadence;
            config.writing.cadence = cadence;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.check()?;
        Ok(config)
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    app::run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use diagonal_runtime::ConfigError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("diagonal").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_means_defaults() {
        let cli = parse(&[]);
        assert!(!cli.static_mode);
        assert_eq!(cli.log_level, "info");
        assert_eq!(cli.config().unwrap(), DiagonalConfig::default());
    }

    #[test]
    fn flags_override_both_panels() {
        let cli = parse(&[
            "--code-rows",
            "12",
            "--writing-rows",
            "5",
            "--interval-ms",
            "100",
            "--cadence",
            "combined",
            "--seed",
            "4",
            "--static",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.code.rows, 12);
        assert_eq!(config.writing.rows, 5);
        assert_eq!(config.code.interval_ms, 100);
        assert_eq!(config.writing.interval_ms, 100);
        assert_eq!(config.writing.cadence, Cadence::Combined);
        assert_eq!(config.seed, Some(4));
        assert!(cli.static_mode);
    }

    #[test]
    fn invalid_overrides_are_config_errors() {
        let err = parse(&["--code-rows", "0"]).config().unwrap_err();
        assert!(matches!(err, DemoError::Config(ConfigError::Validation(_))));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_cadence_is_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["diagonal", "--cadence", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_config_file_is_an_io_error() {
        let err = parse(&["--config", "/definitely/not/here.toml"])
            .config()
            .unwrap_err();
        assert!(matches!(err, DemoError::Config(ConfigError::Io(_))));
    }
}
