//! Run orchestrator that wires the demo world, engine and sink together.
//!
//! Builds the demo world, prepares the detection engine, opens the
//! violation sink and drives the tick loop until the requested tick count
//! is reached or a shutdown signal arrives.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::RadarBlueprint;
use detection::{DetectionEngine, PlateRegistry};
use observability::{record_tick, record_violation, record_zone_fallbacks};
use telemetry::MockTelemetry;
use tracing::{info, warn};
use violation_sink::{CollectorClient, DeliveryHandle, ViolationJournal, ViolationSink};

use super::PipelineStats;

/// Everything a run needs, resolved from config file + CLI overrides
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The radar blueprint configuration
    pub blueprint: RadarBlueprint,

    /// Identifier events and lifecycle notifications are tagged with
    pub run_id: String,

    /// Number of ticks to process (None = until interrupted)
    pub ticks: Option<u64>,

    /// Wall-clock pacing between ticks (None = run flat out)
    pub tick_interval: Option<Duration>,

    /// Vehicles placed per zone in the demo world
    pub vehicles_per_zone: usize,

    /// Seed for the demo world and plate generation
    pub seed: u64,

    /// Prometheus exporter port (None = no exporter)
    pub metrics_port: Option<u16>,
}

/// Owns a single detection run from world build to sink close
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Wrap a resolved configuration, ready to run
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Drive the tick loop to completion and return the run report
    pub async fn run(self) -> Result<PipelineStats> {
        let started = Instant::now();
        let blueprint = &self.config.blueprint;
        let run_id = self.config.run_id.clone();

        if let Some(port) = self.config.metrics_port {
            observability::serve_metrics(port)?;
        }

        // Build the demo world
        info!(
            zones = blueprint.zones.len(),
            vehicles_per_zone = self.config.vehicles_per_zone,
            seed = self.config.seed,
            "Building demo world"
        );

        let mut provider = MockTelemetry::demo_world(
            &blueprint.zones,
            self.config.vehicles_per_zone,
            self.config.seed,
        );

        info!(vehicles = provider.vehicle_count(), "Demo world ready");

        // Prepare the detection engine
        let plates = PlateRegistry::with_seed(self.config.seed);
        let mut engine = DetectionEngine::from_blueprint(blueprint, Some(&run_id), plates);
        engine
            .prepare(&mut provider)
            .context("Failed to prepare detection engine")?;

        info!(
            strategy = %engine.strategy(),
            zones = engine.zones().len(),
            "Detection engine prepared"
        );

        // Open the violation sink: journal first, remote delivery optional
        let journal = ViolationJournal::create(&blueprint.journal.path, Some(&run_id))
            .context("Failed to open violation journal")?;
        let journal_path = journal.path().to_path_buf();

        info!(path = %journal_path.display(), "Violation journal opened");

        let collector = match blueprint.collector {
            Some(ref config) => {
                let client =
                    CollectorClient::new(config).context("Failed to build collector client")?;
                info!(url = %client.primary_url(), "Collector delivery enabled");
                Some((client, config.queue_capacity))
            }
            None => {
                warn!("No collector configured - violations stay in the local journal");
                None
            }
        };

        // Lifecycle notifications are best effort: a dead collector must not
        // keep the radar from journaling locally.
        if let Some((ref client, _)) = collector {
            match client.notify_run_started(&run_id).await {
                Ok(target) => info!(%target, run_id = %run_id, "Run start notified"),
                Err(e) => warn!(error = %e, "Run start notification failed"),
            }
        }

        let delivery = collector
            .as_ref()
            .map(|(client, capacity)| DeliveryHandle::spawn(client.clone(), *capacity));
        let mut sink = ViolationSink::new(journal, delivery);

        // Tick loop
        let shutdown = watch_shutdown_signals();
        let total_ticks = self.config.ticks;

        match total_ticks {
            Some(n) => info!(ticks = n, "Pipeline running"),
            None => info!("Pipeline running until interrupted"),
        }

        let mut stats = PipelineStats {
            run_id: run_id.clone(),
            ..Default::default()
        };

        let mut tick: u64 = 0;
        loop {
            if let Some(limit) = total_ticks {
                if tick >= limit {
                    break;
                }
            }
            if shutdown.load(Ordering::Relaxed) {
                warn!(tick, "Shutdown signal received, stopping tick loop");
                stats.interrupted = true;
                break;
            }

            let checks_before = engine.total_checks();
            let events = engine.tick(tick, &provider);

            for event in &events {
                record_violation(event);
                stats.violations.update(event);
                sink.emit(event)
                    .context("Failed to record violation in journal")?;
            }

            record_tick(
                tick,
                engine.total_checks() - checks_before,
                events.len() as u64,
            );
            record_zone_fallbacks(engine.zones_in_fallback());

            provider.step();
            tick += 1;

            if let Some(interval) = self.config.tick_interval {
                tokio::time::sleep(interval).await;
            } else if tick % 1024 == 0 {
                // Let the delivery worker run even when pacing is disabled.
                tokio::task::yield_now().await;
            }
        }

        // Shutdown
        info!("Stopping pipeline");

        if let Some((ref client, _)) = collector {
            match client.notify_run_ended(&run_id).await {
                Ok(target) => info!(%target, run_id = %run_id, "Run end notified"),
                Err(e) => warn!(error = %e, "Run end notification failed"),
            }
        }

        stats.ticks_processed = tick;
        stats.total_checks = engine.total_checks();
        stats.total_violations = engine.total_violations();
        stats.zones_in_fallback = engine.zones_in_fallback();
        stats.engine = engine.stats();
        stats.journaled = sink.records();
        stats.journal_path = Some(journal_path);

        // Bounded drain of queued deliveries, then journal flush + fsync.
        stats.delivery = sink.close().await.context("Failed to close violation sink")?;
        stats.duration = started.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks_per_second = format!("{:.2}", stats.ticks_per_second()),
            violations = stats.total_violations,
            "Pipeline stopped"
        );

        Ok(stats)
    }
}

/// Watch for Ctrl+C / SIGTERM on a background task and expose the result
/// as a flag the synchronous tick loop can poll between ticks.
fn watch_shutdown_signals() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::clone(&flag);

    tokio::spawn(async move {
        let ctrl_c = async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(_) => {
                    warn!("Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        shutdown.store(true, Ordering::Relaxed);
    });

    flag
}
