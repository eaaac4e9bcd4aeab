//! `validate`: check a radar config without starting a run.

use anyhow::{Context, Result};
use contracts::{ConfigVersion, RadarBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation outcome, also the JSON output shape
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

impl ValidationResult {
    fn failure(config_path: String, error: String) -> Self {
        Self {
            valid: false,
            config_path,
            error: Some(error),
            warnings: None,
            summary: None,
        }
    }
}

#[derive(Serialize)]
struct ConfigSummary {
    version: ConfigVersion,
    zone_count: usize,
    strategy: String,
    cooldown_ticks: u64,
    journal_path: String,
    collector_configured: bool,
}

impl From<&RadarBlueprint> for ConfigSummary {
    fn from(blueprint: &RadarBlueprint) -> Self {
        Self {
            version: blueprint.version,
            zone_count: blueprint.zones.len(),
            strategy: blueprint.engine.strategy.to_string(),
            cooldown_ticks: blueprint.engine.cooldown_ticks,
            journal_path: blueprint.journal.path.display().to_string(),
            collector_configured: blueprint.collector.is_some(),
        }
    }
}

/// Entry point for `speed-radar validate`.
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Checking radar configuration");

    let result = check_config(args);

    if args.json {
        let rendered = serde_json::to_string_pretty(&result)
            .context("Failed to render the validation result as JSON")?;
        println!("{rendered}");
    } else {
        print_result(&result);
    }

    anyhow::ensure!(result.valid, "Configuration validation failed");
    Ok(())
}

fn check_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        let error = format!("File not found: {}", args.config.display());
        return ValidationResult::failure(config_path, error);
    }

    let blueprint = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => blueprint,
        Err(e) => return ValidationResult::failure(config_path, e.to_string()),
    };

    let warnings = gather_warnings(&blueprint);
    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: (!warnings.is_empty()).then_some(warnings),
        summary: Some(ConfigSummary::from(&blueprint)),
    }
}

/// Non-fatal findings worth surfacing before a run
fn gather_warnings(blueprint: &RadarBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    // Violations without a collector only reach the local journal
    if blueprint.collector.is_none() {
        warnings.push(
            "No collector configured - violations only reach the local journal".to_string(),
        );
    }

    // A zone a vehicle at the limit crosses in a few ticks is easy to miss
    for zone in &blueprint.zones {
        let crossing_ticks = (2.0 * zone.detection_radius) / zone.speed_limit;
        if crossing_ticks < 5.0 {
            warnings.push(format!(
                "Zone '{}': radius {:.0} m is small for a {:.1} km/h limit - \
                 vehicles at the limit cross it in under {:.0} ticks",
                zone.id,
                zone.detection_radius,
                zone.speed_limit_kmh(),
                crossing_ticks.ceil().max(1.0)
            ));
        }
    }

    // A zero cooldown floods the journal with one event per tick
    if blueprint.engine.cooldown_ticks == 0 {
        warnings.push(
            "engine.cooldown_ticks is 0 - every in-zone speeding tick emits an event".to_string(),
        );
    }

    if let Some(ref collector) = blueprint.collector {
        if collector.fallback_url.as_deref() == Some(collector.primary_url.as_str()) {
            warnings.push(
                "collector.fallback_url duplicates the primary URL - the retry is pointless"
                    .to_string(),
            );
        }
    }

    warnings
}

fn print_result(result: &ValidationResult) {
    if !result.valid {
        println!("✗ Invalid configuration: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("\n  Error: {error}");
        }
        return;
    }

    println!("✓ Valid configuration: {}", result.config_path);

    if let Some(summary) = &result.summary {
        println!("\n  Version: {:?}", summary.version);
        println!("  Zones: {}", summary.zone_count);
        println!("  Strategy: {}", summary.strategy);
        println!("  Cooldown window: {} ticks", summary.cooldown_ticks);
        println!("  Journal: {}", summary.journal_path);
        let collector = if summary.collector_configured {
            "configured"
        } else {
            "none"
        };
        println!("  Collector: {collector}");
    }

    if let Some(warnings) = &result.warnings {
        println!("\n⚠ Warnings ({}):", warnings.len());
        for warning in warnings {
            println!("  - {warning}");
        }
    }
}
