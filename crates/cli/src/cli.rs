//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Intent Snippets - turn recorded parking episodes into intent-prediction training data
#[derive(Parser, Debug)]
#[command(
    name = "intent-snippets",
    author,
    version,
    about = "Parking-intent snippet generation",
    long_about = "Reconstructs the ego trajectory of recorded parking episodes, labels it \n\
                  with the goal spot the driver reached, and slices it into fixed-length \n\
                  history/future snippets for intent-prediction training."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "INTENT_SNIPPETS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "INTENT_SNIPPETS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate snippets from episode logs
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "INTENT_SNIPPETS_CONFIG"
    )]
    pub config: PathBuf,

    /// Episode logs (`*.json` files, or directories containing them)
    #[arg(short, long, required = true, num_args = 1.., env = "INTENT_SNIPPETS_EPISODES", value_delimiter = ',')]
    pub episodes: Vec<PathBuf>,

    /// Output directory for file-based sinks (adds a training-set sink when none is configured)
    #[arg(short, long, env = "INTENT_SNIPPETS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Override history length (samples)
    #[arg(long)]
    pub n_hist: Option<usize>,

    /// Override future length (samples)
    #[arg(long)]
    pub n_pred: Option<usize>,

    /// Override stride between reference times (samples)
    #[arg(long)]
    pub n_skip: Option<usize>,

    /// Override sample period (seconds)
    #[arg(long)]
    pub dt: Option<f64>,

    /// Override agent-frame output
    #[arg(long)]
    pub ego_frame: Option<bool>,

    /// Abort on the first episode that fails instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,

    /// Episodes processed concurrently (0 = available parallelism)
    #[arg(short, long, default_value = "0", env = "INTENT_SNIPPETS_JOBS")]
    pub jobs: usize,

    /// Channel buffer size between processing and sinks
    #[arg(long, default_value = "100", env = "INTENT_SNIPPETS_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "INTENT_SNIPPETS_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and list episodes without processing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "INTENT_SNIPPETS_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "INTENT_SNIPPETS_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "intent-snippets",
            "run",
            "--config",
            "pipeline.toml",
            "--episodes",
            "data/a",
            "data/b.json",
            "--n-hist",
            "10",
            "--ego-frame",
            "true",
            "--fail-fast",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("pipeline.toml"));
        assert_eq!(args.episodes.len(), 2);
        assert_eq!(args.n_hist, Some(10));
        assert_eq!(args.ego_frame, Some(true));
        assert!(args.fail_fast);
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_run_requires_episodes() {
        assert!(Cli::try_parse_from(["intent-snippets", "run"]).is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["intent-snippets", "-q", "-v", "info"]).is_err());
    }
}
