//! `info`: inspect a radar config from the terminal.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// JSON payload produced by `info --json`.
#[derive(Serialize)]
struct ConfigInfo {
    version: contracts::ConfigVersion,
    engine: EngineInfo,
    zones: Vec<ZoneInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputInfo>,
}

#[derive(Serialize)]
struct EngineInfo {
    strategy: String,
    cooldown_ticks: u64,
    sweep_interval: u64,
}

#[derive(Serialize)]
struct ZoneInfo {
    id: String,
    x: f64,
    y: f64,
    speed_limit_ms: f64,
    speed_limit_kmh: f64,
    detection_radius: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

#[derive(Serialize)]
struct OutputInfo {
    journal_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    collector: Option<CollectorInfo>,
}

#[derive(Serialize)]
struct CollectorInfo {
    primary_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_url: Option<String>,
    timeout_ms: u64,
    queue_capacity: usize,
}

/// Entry point for `speed-radar info`.
pub fn run_info(args: &InfoArgs) -> Result<()> {
    anyhow::ensure!(
        args.config.exists(),
        "Configuration file not found: {}",
        args.config.display()
    );

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    info!(
        config = %args.config.display(),
        zones = blueprint.zones.len(),
        "Inspecting configuration"
    );

    if args.json {
        let report = build_config_info(&blueprint, args);
        let rendered = serde_json::to_string_pretty(&report)
            .context("Failed to render config info as JSON")?;
        println!("{rendered}");
        return Ok(());
    }

    print_config_info(&blueprint, args);
    Ok(())
}

fn build_config_info(blueprint: &contracts::RadarBlueprint, args: &InfoArgs) -> ConfigInfo {
    let zones = blueprint
        .zones
        .iter()
        .map(|zone| ZoneInfo {
            id: zone.id.clone(),
            x: zone.x,
            y: zone.y,
            speed_limit_ms: zone.speed_limit,
            speed_limit_kmh: zone.speed_limit_kmh(),
            detection_radius: zone.detection_radius,
            description: zone.description.clone(),
        })
        .collect();

    let output = if args.sink {
        Some(OutputInfo {
            journal_path: blueprint.journal.path.display().to_string(),
            collector: blueprint.collector.as_ref().map(|c| CollectorInfo {
                primary_url: c.primary_url.clone(),
                fallback_url: c.fallback_url.clone(),
                timeout_ms: c.timeout_ms,
                queue_capacity: c.queue_capacity,
            }),
        })
    } else {
        None
    };

    ConfigInfo {
        version: blueprint.version,
        engine: EngineInfo {
            strategy: blueprint.engine.strategy.to_string(),
            cooldown_ticks: blueprint.engine.cooldown_ticks,
            sweep_interval: blueprint.engine.sweep_interval,
        },
        zones,
        output,
    }
}

fn print_config_info(blueprint: &contracts::RadarBlueprint, args: &InfoArgs) {
    println!("╔{}╗", "═".repeat(50));
    println!("║{:^50}║", "Speed Radar Configuration");
    println!("╚{}╝\n", "═".repeat(50));

    let version = blueprint.version;
    println!("⚙️  Engine");
    println!("   ├─ Version: {version:?}");
    println!("   ├─ Strategy: {}", blueprint.engine.strategy);
    println!(
        "   ├─ Cooldown window: {} ticks",
        blueprint.engine.cooldown_ticks
    );
    println!(
        "   └─ Sweep interval: {} ticks",
        blueprint.engine.sweep_interval
    );

    // Zones
    println!("\n📡 Zones ({})", blueprint.zones.len());
    for (i, zone) in blueprint.zones.iter().enumerate() {
        let is_last = i == blueprint.zones.len() - 1;
        let (prefix, child_prefix) = if is_last { ("└─", "   ") } else { ("├─", "│  ") };

        if args.zones {
            println!("   {} {} at ({:.1}, {:.1})", prefix, zone.id, zone.x, zone.y);
            println!(
                "   {}     ├─ Limit: {:.1} km/h ({:.2} m/s)",
                child_prefix,
                zone.speed_limit_kmh(),
                zone.speed_limit
            );
            if zone.description.is_empty() {
                println!("   {}     └─ Radius: {:.0} m", child_prefix, zone.detection_radius);
            } else {
                println!(
                    "   {}     ├─ Radius: {:.0} m",
                    child_prefix, zone.detection_radius
                );
                println!("   {}     └─ {}", child_prefix, zone.description);
            }
        } else {
            println!(
                "   {} {} - {:.1} km/h within {:.0} m of ({:.1}, {:.1})",
                prefix,
                zone.id,
                zone.speed_limit_kmh(),
                zone.detection_radius,
                zone.x,
                zone.y
            );
        }
    }

    // Output routing
    if args.sink {
        println!("\n📤 Output");
        let journal_prefix = if blueprint.collector.is_some() {
            "├─"
        } else {
            "└─"
        };
        println!(
            "   {} Journal: {}",
            journal_prefix,
            blueprint.journal.path.display()
        );
        if let Some(ref collector) = blueprint.collector {
            println!("   ├─ Collector: {}", collector.primary_url);
            match &collector.fallback_url {
                Some(fallback) => println!("   ├─ Fallback: {fallback}"),
                None => println!("   ├─ Fallback: (none)"),
            }
            println!(
                "   └─ Timeout: {} ms, queue capacity {}",
                collector.timeout_ms, collector.queue_capacity
            );
        }
    }

    println!();
}
