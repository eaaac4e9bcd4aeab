//! `run`: drive a detection run end to end.

use anyhow::{Context, Result};
use contracts::CollectorConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Entry point for `speed-radar run`.
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    anyhow::ensure!(
        args.config.exists(),
        "Configuration file not found: {}",
        args.config.display()
    );

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(strategy) = args.strategy {
        let strategy = contracts::DetectionStrategy::from(strategy);
        info!(%strategy, "Overriding detection strategy from CLI");
        blueprint.engine.strategy = strategy;
    }
    if let Some(ref path) = args.journal {
        info!(path = %path.display(), "Overriding journal path from CLI");
        blueprint.journal.path = path.clone();
    }
    apply_collector_overrides(&mut blueprint, args)?;

    info!(
        config = %args.config.display(),
        zones = blueprint.zones.len(),
        strategy = %blueprint.engine.strategy,
        cooldown_ticks = blueprint.engine.cooldown_ticks,
        collector = blueprint.collector.is_some(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run, not starting the pipeline");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        run_id: run_id.clone(),
        ticks: (args.ticks > 0).then_some(args.ticks),
        tick_interval: (args.tick_ms > 0).then(|| Duration::from_millis(args.tick_ms)),
        vehicles_per_zone: args.vehicles,
        seed: args.seed,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    // The pipeline watches for Ctrl+C / SIGTERM itself so an interrupted
    // run still drains the delivery queue and flushes the journal.
    info!(run_id = %run_id, "Starting detection pipeline");
    let stats = pipeline.run().await.context("Pipeline execution failed")?;

    info!(
        ticks = stats.ticks_processed,
        checks = stats.total_checks,
        violations = stats.total_violations,
        duration_secs = stats.duration.as_secs_f64(),
        "Detection run complete"
    );
    stats.print_summary();

    Ok(())
}

/// Apply `--collector-url`, `--fallback-url`, `--queue-size` and
/// `--no-collector` on top of the loaded configuration.
fn apply_collector_overrides(
    blueprint: &mut contracts::RadarBlueprint,
    args: &RunArgs,
) -> Result<()> {
    if args.no_collector {
        if blueprint.collector.take().is_some() {
            info!("Disabling collector delivery from CLI");
        }
        return Ok(());
    }

    if let Some(ref url) = args.collector_url {
        info!(url = %url, "Overriding collector URL from CLI");
        match blueprint.collector {
            Some(ref mut collector) => collector.primary_url = url.clone(),
            None => {
                blueprint.collector = Some(CollectorConfig {
                    primary_url: url.clone(),
                    ..CollectorConfig::default()
                });
            }
        }
    }

    if let Some(ref url) = args.fallback_url {
        let Some(ref mut collector) = blueprint.collector else {
            anyhow::bail!(
                "--fallback-url requires a collector (config [collector] section or --collector-url)"
            );
        };
        info!(url = %url, "Overriding fallback collector URL from CLI");
        collector.fallback_url = Some(url.clone());
    }

    if let Some(size) = args.queue_size {
        match blueprint.collector {
            Some(ref mut collector) => collector.queue_capacity = size,
            None => warn!("--queue-size ignored, no collector configured"),
        }
    }

    Ok(())
}

/// Human-readable blueprint dump for `--dry-run`.
fn print_config_summary(blueprint: &contracts::RadarBlueprint) {
    println!("\n📋 Configuration summary\n");

    println!("Zones ({}):", blueprint.zones.len());
    for zone in &blueprint.zones {
        println!(
            "  - {} @ ({:.1}, {:.1}) - limit {:.1} km/h, radius {:.0} m",
            zone.id,
            zone.x,
            zone.y,
            zone.speed_limit_kmh(),
            zone.detection_radius
        );
    }

    println!("\nEngine:");
    println!("  Strategy: {}", blueprint.engine.strategy);
    println!("  Cooldown window: {} ticks", blueprint.engine.cooldown_ticks);
    println!("  Sweep interval: {} ticks", blueprint.engine.sweep_interval);

    println!("\nJournal:");
    println!("  Path: {}", blueprint.journal.path.display());

    match &blueprint.collector {
        Some(collector) => {
            println!("\nCollector:");
            println!("  Primary: {}", collector.primary_url);
            match &collector.fallback_url {
                Some(fallback) => println!("  Fallback: {fallback}"),
                None => println!("  Fallback: (none)"),
            }
            println!("  Timeout: {} ms", collector.timeout_ms);
            println!("  Queue capacity: {}", collector.queue_capacity);
        }
        None => {
            println!("\nCollector: (disabled - journal only)");
        }
    }

    println!();
}
