//! Clap definitions for the `speed-radar` command tree.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::DetectionStrategy;
use std::path::PathBuf;

/// Speed Radar - speed-limit violation detection over a stepped traffic simulation
#[derive(Parser, Debug)]
#[command(
    name = "speed-radar",
    author,
    version,
    about = "Speed-limit violation detection pipeline",
    long_about = "Drives radar zones over a stepped traffic simulation.\n\n\
                  Loads zones from configuration, checks vehicle speeds every tick \n\
                  with the configured detection strategy, journals violations locally \n\
                  and forwards them to a collector service when one is configured."
)]
pub struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SPEED_RADAR_VERBOSE")]
    pub verbose: u8,

    /// Suppress informational output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Console log rendering
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SPEED_RADAR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands understood by `speed-radar`
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the detection pipeline
    Run(RunArgs),

    /// Check a configuration file and exit
    Validate(ValidateArgs),

    /// Show a summary of a configuration file
    Info(InfoArgs),
}

/// Flags accepted by `run`
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Radar configuration file (TOML or JSON)
    #[arg(short, long, default_value = "radars.toml", env = "SPEED_RADAR_CONFIG")]
    pub config: PathBuf,

    /// Override the detection strategy from configuration
    #[arg(long, value_enum, env = "SPEED_RADAR_STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Number of ticks to run (0 = until interrupted)
    #[arg(long, default_value = "3600", env = "SPEED_RADAR_TICKS")]
    pub ticks: u64,

    /// Wall-clock delay between ticks in milliseconds (0 = run flat out)
    #[arg(long, default_value = "0", env = "SPEED_RADAR_TICK_MS")]
    pub tick_ms: u64,

    /// Vehicles placed per zone in the demo world
    #[arg(long, default_value = "3")]
    pub vehicles: usize,

    /// Seed for the demo world and plate generation
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Run identifier sent with notifications (default: random UUID)
    #[arg(long, env = "SPEED_RADAR_RUN_ID")]
    pub run_id: Option<String>,

    /// Override the violation journal path from configuration
    #[arg(long)]
    pub journal: Option<PathBuf>,

    /// Override the primary collector URL from configuration
    #[arg(long, env = "SPEED_RADAR_COLLECTOR_URL")]
    pub collector_url: Option<String>,

    /// Override the fallback collector URL from configuration
    #[arg(long, env = "SPEED_RADAR_FALLBACK_URL")]
    pub fallback_url: Option<String>,

    /// Disable remote delivery even when configured
    #[arg(long, conflicts_with_all = ["collector_url", "fallback_url"])]
    pub no_collector: bool,

    /// Override the delivery queue capacity from configuration
    #[arg(long)]
    pub queue_size: Option<usize>,

    /// Prometheus exporter port (0 = disabled)
    #[arg(long, default_value = "0", env = "SPEED_RADAR_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,
}

/// Flags accepted by `validate`
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file to check
    #[arg(short, long, default_value = "radars.toml")]
    pub config: PathBuf,

    /// Emit the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Flags accepted by `info`
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Configuration file to inspect
    #[arg(short, long, default_value = "radars.toml")]
    pub config: PathBuf,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed zone information
    #[arg(long)]
    pub zones: bool,

    /// Show journal and collector output configuration
    #[arg(long)]
    pub sink: bool,
}

/// Detection strategy selector
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    /// Check vehicles on road segments near each zone
    Edge,
    /// Consume per-zone region queries from the provider
    Subscription,
    /// Check every vehicle against every zone
    Full,
}

impl From<StrategyArg> for DetectionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Edge => DetectionStrategy::EdgeBased,
            StrategyArg::Subscription => DetectionStrategy::ContextSubscription,
            StrategyArg::Full => DetectionStrategy::FullScan,
        }
    }
}

/// Console log rendering
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// Multi-line human-readable output
    #[default]
    Pretty,
    /// Single-line compact output
    Compact,
    /// Newline-delimited JSON events
    Json,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
            LogFormat::Json => observability::LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::parse_from(["speed-radar", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("radars.toml"));
        assert_eq!(args.ticks, 3600);
        assert_eq!(args.vehicles, 3);
        assert_eq!(args.seed, 42);
        assert!(args.strategy.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn test_strategy_tokens() {
        let cli = Cli::parse_from(["speed-radar", "run", "--strategy", "subscription"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(matches!(args.strategy, Some(StrategyArg::Subscription)));
        assert_eq!(
            DetectionStrategy::from(args.strategy.unwrap()),
            DetectionStrategy::ContextSubscription
        );
    }

    #[test]
    fn test_no_collector_conflicts_with_url_override() {
        let result = Cli::try_parse_from([
            "speed-radar",
            "run",
            "--no-collector",
            "--collector-url",
            "http://localhost:5000",
        ]);
        assert!(result.is_err(), "conflicting flags must be rejected");
    }
}
