//! # Speed Radar CLI
//!
//! `speed-radar` 可执行入口。
//!
//! 子命令：
//! - `run`: 加载配置并驱动检测管道
//! - `validate`: 校验配置文件，不运行
//! - `info`: 查看配置概要

mod cli;
mod commands;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_pipeline, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // SPEED_RADAR_* env fallbacks may live in a .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        // The metrics port is a `run` argument; the pipeline installs the
        // exporter itself once it knows it.
        metrics_port: None,
        fallback_level: base_log_level(&cli).to_string(),
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "speed-radar starting");

    let outcome = match cli.command {
        Commands::Run(args) => run_pipeline(&args).await,
        Commands::Validate(args) => run_validate(&args),
        Commands::Info(args) => run_info(&args),
    };

    if let Err(e) = &outcome {
        tracing::error!(error = %e, "command failed");
    }

    outcome
}

fn base_log_level(cli: &Cli) -> &'static str {
    if cli.quiet {
        return "warn";
    }
    match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
