//! Error types shared across the workspace
//!
//! Grouped by failure source: config / journal / collector, plus the
//! telemetry-specific [`TelemetryError`] the engine inspects per kind.

use thiserror::Error;

/// Error type carried on every fallible path outside telemetry
#[derive(Debug, Error)]
pub enum RadarError {
    // ===== Configuration Errors =====
    /// Configuration deserialization failure
    #[error("failed to parse config: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Semantic check failure on a parsed configuration
    #[error("invalid config at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Journal Errors =====
    /// Journal open/create error
    #[error("journal '{path}' open error: {message}")]
    JournalOpen { path: String, message: String },

    /// Journal write error
    #[error("journal '{path}' write error: {message}")]
    JournalWrite { path: String, message: String },

    // ===== Collector Errors =====
    /// HTTP client construction error
    #[error("collector client error: {message}")]
    CollectorClient { message: String },

    /// Remote delivery attempt failed
    #[error("delivery to '{url}' failed: {message}")]
    Delivery { url: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl RadarError {
    /// Parse failure without an underlying cause
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Validation failure on a named field
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create journal open error
    pub fn journal_open(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JournalOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create journal write error
    pub fn journal_write(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JournalWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create delivery error
    pub fn delivery(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create collector client error
    pub fn collector_client(message: impl Into<String>) -> Self {
        Self::CollectorClient {
            message: message.into(),
        }
    }
}

/// Telemetry provider errors.
///
/// Kept separate from [`RadarError`] because the detection engine reacts to
/// the *kind* of failure: entities that disappeared between enumeration and
/// query are skipped silently, anything else is logged and skipped. None of
/// these are ever fatal to a running tick loop.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Entity was listed but is gone by query time
    #[error("entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    /// Unknown road segment
    #[error("segment not found: {segment_id}")]
    SegmentNotFound { segment_id: String },

    /// Unknown lane
    #[error("lane not found: {lane_id}")]
    LaneNotFound { lane_id: String },

    /// Zone subscription failure
    #[error("subscription error for zone '{zone_id}': {message}")]
    Subscription { zone_id: String, message: String },

    /// Provider transport failure
    #[error("telemetry transport error: {message}")]
    Transport { message: String },
}

impl TelemetryError {
    /// Create entity-not-found error
    pub fn entity_not_found(entity_id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity_id: entity_id.into(),
        }
    }

    /// Create segment-not-found error
    pub fn segment_not_found(segment_id: impl Into<String>) -> Self {
        Self::SegmentNotFound {
            segment_id: segment_id.into(),
        }
    }

    /// Create lane-not-found error
    pub fn lane_not_found(lane_id: impl Into<String>) -> Self {
        Self::LaneNotFound {
            lane_id: lane_id.into(),
        }
    }

    /// Create subscription error
    pub fn subscription(zone_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscription {
            zone_id: zone_id.into(),
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True when the subject of the query no longer exists.
    ///
    /// Vehicles routinely leave the simulation between enumeration and the
    /// follow-up position/speed queries; that race is expected and handled
    /// by skipping the entity without noise.
    pub fn is_gone(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound { .. } | Self::SegmentNotFound { .. } | Self::LaneNotFound { .. }
        )
    }
}
