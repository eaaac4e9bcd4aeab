//! CollectorClient - HTTP delivery to the remote violations collector
//!
//! Delivery is best effort. A connection-class failure against the primary
//! address is retried once against the fallback; a reachable server that
//! answers with a non-success status is final, because resending elsewhere
//! could duplicate the record.

use std::fmt;
use std::time::Duration;

use contracts::{CollectorConfig, EventSink, RadarError, ViolationEvent};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, instrument, warn};

/// Which address accepted a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryTarget {
    Primary,
    Fallback,
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Outcome of a single POST attempt.
enum SendFailure {
    /// No response at all (connect error, timeout)
    Connection(String),
    /// Server responded with a non-success status
    Status(StatusCode),
}

/// Cloning shares the underlying connection pool, so the delivery worker
/// and lifecycle notifications can use separate handles to one client.
#[derive(Clone)]
pub struct CollectorClient {
    http: reqwest::Client,
    primary_url: String,
    fallback_url: Option<String>,
}

impl CollectorClient {
    pub fn new(config: &CollectorConfig) -> Result<Self, RadarError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RadarError::collector_client(e.to_string()))?;

        Ok(Self {
            http,
            primary_url: normalize(&config.primary_url),
            fallback_url: config.fallback_url.as_deref().map(normalize),
        })
    }

    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    #[instrument(name = "collector_run_start", skip(self))]
    pub async fn notify_run_started(&self, run_id: &str) -> Result<DeliveryTarget, RadarError> {
        let target = self
            .post_with_fallback("/api/runs/start", &json!({ "run_id": run_id }))
            .await?;
        debug!(run_id, %target, "run start registered");
        Ok(target)
    }

    #[instrument(name = "collector_run_end", skip(self))]
    pub async fn notify_run_ended(&self, run_id: &str) -> Result<DeliveryTarget, RadarError> {
        let target = self
            .post_with_fallback("/api/runs/end", &json!({ "run_id": run_id }))
            .await?;
        debug!(run_id, %target, "run end registered");
        Ok(target)
    }

    async fn post_with_fallback(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<DeliveryTarget, RadarError> {
        let failure = match self.post(&self.primary_url, path, body).await {
            Ok(()) => return Ok(DeliveryTarget::Primary),
            Err(failure) => failure,
        };

        match failure {
            SendFailure::Status(status) => Err(RadarError::delivery(
                format!("{}{path}", self.primary_url),
                format!("server returned {status}"),
            )),
            SendFailure::Connection(message) => {
                let Some(fallback) = self.fallback_url.as_deref() else {
                    return Err(RadarError::delivery(
                        format!("{}{path}", self.primary_url),
                        message,
                    ));
                };
                warn!(
                    primary = %self.primary_url,
                    fallback = %fallback,
                    error = %message,
                    "primary collector unreachable, trying fallback"
                );
                match self.post(fallback, path, body).await {
                    Ok(()) => Ok(DeliveryTarget::Fallback),
                    Err(SendFailure::Connection(message)) => {
                        Err(RadarError::delivery(format!("{fallback}{path}"), message))
                    }
                    Err(SendFailure::Status(status)) => Err(RadarError::delivery(
                        format!("{fallback}{path}"),
                        format!("server returned {status}"),
                    )),
                }
            }
        }
    }

    async fn post(
        &self,
        base: &str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), SendFailure> {
        let url = format!("{base}{path}");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| SendFailure::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SendFailure::Status(response.status()))
        }
    }
}

impl EventSink for CollectorClient {
    fn name(&self) -> &str {
        "collector"
    }

    #[instrument(
        name = "collector_deliver",
        skip(self, event),
        fields(zone_id = %event.zone_id, tick = event.tick)
    )]
    async fn deliver(&mut self, event: &ViolationEvent) -> Result<(), RadarError> {
        let body = serde_json::to_value(event)
            .map_err(|e| RadarError::collector_client(e.to_string()))?;
        let target = self.post_with_fallback("/api/violations", &body).await?;
        debug!(
            zone_id = %event.zone_id,
            vehicle_id = %event.entity_id,
            %target,
            "violation delivered"
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RadarError> {
        Ok(())
    }
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(primary: &str, fallback: Option<&str>) -> CollectorConfig {
        CollectorConfig {
            primary_url: primary.to_string(),
            fallback_url: fallback.map(str::to_string),
            timeout_ms: 300,
            queue_capacity: 10,
        }
    }

    /// Bind then drop a listener so the port is known to refuse connections.
    fn refused_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[test]
    fn test_urls_are_normalized() {
        let client = CollectorClient::new(&config(
            "http://localhost:5000/",
            Some("http://backend:5000///"),
        ))
        .unwrap();
        assert_eq!(client.primary_url(), "http://localhost:5000");
        assert_eq!(client.fallback_url.as_deref(), Some("http://backend:5000"));
    }

    #[tokio::test]
    async fn test_unreachable_primary_without_fallback() {
        let client = CollectorClient::new(&config(&refused_url(), None)).unwrap();

        let err = client.notify_run_started("run-1").await.unwrap_err();
        assert!(
            matches!(err, RadarError::Delivery { .. }),
            "expected a delivery error, got: {err}"
        );
    }

    #[tokio::test]
    async fn test_both_addresses_unreachable() {
        let client =
            CollectorClient::new(&config(&refused_url(), Some(&refused_url()))).unwrap();

        let err = client.notify_run_ended("run-1").await.unwrap_err();
        assert!(matches!(err, RadarError::Delivery { .. }));
    }
}
