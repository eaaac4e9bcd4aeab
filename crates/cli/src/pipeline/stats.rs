//! Pipeline statistics and the end-of-run report.

use std::time::Duration;

use detection::EngineStats;
use observability::ViolationAggregator;
use violation_sink::DeliverySnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Run identifier the events were tagged with
    pub run_id: String,

    /// Ticks actually processed (stops short of the request on Ctrl+C)
    pub ticks_processed: u64,

    /// Total vehicle speed checks across all zones
    pub total_checks: u64,

    /// Total violations detected
    pub total_violations: u64,

    /// Violations written to the local journal
    pub journaled: u64,

    /// Journal file location
    pub journal_path: Option<std::path::PathBuf>,

    /// Per-zone counters from the detection engine
    pub engine: EngineStats,

    /// In-memory violation aggregation for the closing summary
    pub violations: ViolationAggregator,

    /// Remote delivery counters, when a collector was configured
    pub delivery: Option<DeliverySnapshot>,

    /// Zones still degraded to full scans when the run ended
    pub zones_in_fallback: usize,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Whether a shutdown signal cut the run short
    pub interrupted: bool,
}

impl PipelineStats {
    /// Calculate ticks per second throughput
    pub fn ticks_per_second(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ticks_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate violations per thousand checks
    #[allow(dead_code)]
    pub fn violation_rate(&self) -> f64 {
        if self.total_checks > 0 {
            (self.total_violations as f64 / self.total_checks as f64) * 1000.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Speed Radar Run Summary                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Run id: {}", self.run_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks processed: {}", self.ticks_processed);
        println!("   ├─ Ticks/s: {:.2}", self.ticks_per_second());
        println!("   ├─ Vehicle checks: {}", self.total_checks);
        println!("   └─ Violations: {}", self.total_violations);

        if !self.engine.zones.is_empty() {
            println!("\n📈 Violations by Zone");
            for (i, zone) in self.engine.zones.iter().enumerate() {
                let prefix = if i == self.engine.zones.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!(
                    "   {} {}: {} violations / {} checks",
                    prefix, zone.zone_id, zone.violations, zone.checks
                );
            }
        }

        let summary = self.violations.summary();
        if summary.total_violations > 0 {
            println!("\n🚨 Violation Speeds");
            println!("   ├─ Overspeed (km/h): {}", summary.overspeed_kmh);
            println!("   └─ Speed (km/h): {}", summary.speed_kmh);
        }

        if let Some(ref delivery) = self.delivery {
            println!("\n📤 Remote Delivery");
            println!("   ├─ Delivered: {}", delivery.delivered);
            println!("   ├─ Failed: {}", delivery.failed);
            println!("   ├─ Dropped (queue full): {}", delivery.dropped);
            println!("   └─ Queued at close: {}", delivery.queue_len);
        }

        if let Some(ref path) = self.journal_path {
            println!("\n📝 Full log saved to: {}", path.display());
        }

        if self.zones_in_fallback > 0 {
            println!(
                "\n⚠️  {} zone(s) ended the run in full-scan fallback",
                self.zones_in_fallback
            );
        }

        if self.interrupted {
            println!("\n⚠️  Run interrupted before completing all ticks");
        }

        println!();
    }
}
