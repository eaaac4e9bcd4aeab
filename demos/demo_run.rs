//! Demo Run Example
//!
//! Drives the full detection path against the scripted demo world: zones
//! from a config (or a built-in pair), tick loop, cooldown dedup, local
//! journal. No collector and no network are involved.
//!
//! Run with: cargo run --bin demo_run [-- path/to/radars.toml]

use config_loader::ConfigLoader;
use contracts::{ConfigVersion, EngineConfig, JournalConfig, RadarBlueprint, ZoneConfig};
use detection::{DetectionEngine, PlateRegistry};
use observability::ViolationAggregator;
use telemetry::MockTelemetry;
use violation_sink::{ViolationJournal, ViolationSink};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init()?;

    tracing::info!("Starting Speed Radar demo run");

    // ==== Stage 1: Use built-in zones or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading radar config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_test_blueprint()
    };

    // ==== Stage 2: Build the demo world ====
    let seed = 42;
    let mut provider = MockTelemetry::demo_world(&blueprint.zones, 3, seed);
    tracing::info!(
        zones = blueprint.zones.len(),
        vehicles = provider.vehicle_count(),
        "Demo world ready"
    );

    // ==== Stage 3: Prepare the detection engine ====
    let mut engine = DetectionEngine::from_blueprint(
        &blueprint,
        Some("demo-run"),
        PlateRegistry::with_seed(seed),
    );
    engine.prepare(&mut provider)?;
    tracing::info!(strategy = %engine.strategy(), "Detection engine prepared");

    // ==== Stage 4: Open the journal-only sink ====
    let journal = ViolationJournal::create(&blueprint.journal.path, Some("demo-run"))?;
    let journal_path = journal.path().to_path_buf();
    let mut sink = ViolationSink::new(journal, None);

    // ==== Stage 5: Tick loop ====
    let ticks = 600u64;
    tracing::info!(ticks, "Running demo");

    let mut aggregator = ViolationAggregator::new();
    for tick in 0..ticks {
        for event in engine.tick(tick, &provider) {
            aggregator.update(&event);
            sink.emit(&event)?;
        }
        provider.step();
    }

    // ==== Stage 6: Report and close ====
    tracing::info!(
        checks = engine.total_checks(),
        violations = engine.total_violations(),
        "Demo completed"
    );

    println!("\n{}", aggregator.summary());
    println!("Full log saved to: {}", journal_path.display());

    sink.close().await?;
    Ok(())
}

fn create_test_blueprint() -> RadarBlueprint {
    RadarBlueprint {
        version: ConfigVersion::V1,
        zones: vec![
            ZoneConfig {
                id: "radar_center".to_string(),
                x: 100.0,
                y: 100.0,
                speed_limit: 13.89,
                detection_radius: 80.0,
                description: "city center approach".to_string(),
            },
            ZoneConfig {
                id: "radar_school".to_string(),
                x: -400.0,
                y: 250.0,
                speed_limit: 8.33,
                detection_radius: 60.0,
                description: "school zone".to_string(),
            },
        ],
        engine: EngineConfig::default(),
        journal: JournalConfig {
            path: "demo_violations.log".into(),
        },
        collector: None,
    }
}
