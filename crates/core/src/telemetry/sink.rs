use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::telemetry::message::TelemetryMessage;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("ingestion endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Where serialized telemetry goes. Implementations deliver one message;
/// retry and buffering policy is theirs, not the publisher's.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn send(&self, message: &TelemetryMessage) -> Result<(), TelemetryError>;
}

/// Sink that discards every message.
///
/// Stands in when publishing is disabled and in tests where delivery is
/// irrelevant.
pub struct NullTelemetrySink;

#[async_trait]
impl TelemetrySink for NullTelemetrySink {
    async fn send(&self, _message: &TelemetryMessage) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Configuration for the HTTP device-to-cloud ingestion endpoint.
#[derive(Clone, Debug)]
pub struct TelemetrySinkConfig {
    /// Base URL of the ingestion host.
    pub endpoint: String,
    /// Shared-access signature sent as the `Authorization` header.
    pub access_key: String,
    /// Upper bound on one delivery attempt.
    pub timeout: Duration,
}

/// HTTP sink posting each message to the device's events path.
pub struct HttpTelemetrySink {
    http: Client,
    config: TelemetrySinkConfig,
}

impl HttpTelemetrySink {
    pub fn new(config: TelemetrySinkConfig) -> Result<Self, TelemetryError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn send(&self, message: &TelemetryMessage) -> Result<(), TelemetryError> {
        let url = format!(
            "{}/devices/{}/messages/events",
            self.config.endpoint.trim_end_matches('/'),
            message.device_id
        );
        let response = self
            .http
            .post(&url)
            .header("Authorization", &self.config.access_key)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TelemetryError::Status(response.status()));
        }
        Ok(())
    }
}
