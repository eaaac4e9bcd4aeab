//! Radar run orchestration: demo world, detection engine, violation sink.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
