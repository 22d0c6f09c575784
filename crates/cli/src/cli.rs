//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Feeder - extracts domain events and delivers them to a sink in batches
#[derive(Parser, Debug)]
#[command(
    name = "feeder",
    author,
    version,
    about = "Batched event feeder",
    long_about = "Fans a request out into one work unit per (dimension, subject), runs the \n\
                  units concurrently, reports size-bounded progress and converges into a \n\
                  single result. Every run is recorded so it can be inspected or resumed."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FEEDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FEEDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a run, or resume one with --run-id
    Run(RunArgs),

    /// Show the state of a run
    Status(StatusArgs),

    /// List recorded runs
    List(ListArgs),

    /// Delete the history of a run
    Purge(PurgeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Path to the blueprint, shared by every command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArg {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "feeder.toml",
        env = "FEEDER_CONFIG"
    )]
    pub config: PathBuf,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Comma-separated dimensions or aliases, e.g. "SiteA,SiteB"
    #[arg(short, long, required_unless_present = "run_id")]
    pub dimensions: Option<String>,

    /// Comma-separated subjects, or "all"
    #[arg(short, long, required_unless_present = "run_id")]
    pub subjects: Option<String>,

    /// Resume this run, or start it under this id if unknown
    #[arg(long)]
    pub run_id: Option<String>,

    /// Override the executor concurrency from configuration
    #[arg(long, env = "FEEDER_MAX_CONCURRENT_UNITS")]
    pub max_concurrent_units: Option<usize>,

    /// Override the sink from configuration
    #[arg(long, value_enum)]
    pub sink: Option<SinkKind>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FEEDER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `status` command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Run identifier printed by `run`
    pub run_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command
#[derive(Parser, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `purge` command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Run identifier to delete
    pub run_id: String,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// List aliases with their member dimensions
    #[arg(long)]
    pub aliases: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Sink override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    Log,
    File,
    Network,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_requires_request_or_run_id() {
        assert!(Cli::try_parse_from(["feeder", "run"]).is_err());
        assert!(Cli::try_parse_from(["feeder", "run", "--run-id", "abc"]).is_ok());

        let cli = Cli::try_parse_from(["feeder", "run", "-d", "SiteA,SiteB", "-s", "Tag"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.dimensions.as_deref(), Some("SiteA,SiteB"));
        assert_eq!(args.config.config, PathBuf::from("feeder.toml"));
    }

    #[test]
    fn test_status_takes_positional_id() {
        let cli = Cli::try_parse_from(["feeder", "status", "run-1", "--json"]).unwrap();
        let Commands::Status(args) = cli.command else {
            panic!("expected status command");
        };
        assert_eq!(args.run_id, "run-1");
        assert!(args.json);
    }
}
