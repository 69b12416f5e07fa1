use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::purpleair::{SensorSample, parse_results};

pub const DEFAULT_BASE_URL: &str = "https://www.purpleair.com";

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no results")]
    NoResults,
}

/// Source of raw per-channel samples for one sensor.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Returns at least one sample, or an error when the sensor has no
    /// data this poll.
    async fn fetch(&self, sensor_id: &str) -> Result<Vec<SensorSample>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct PurpleAirClient {
    client: reqwest::Client,
    base_url: String,
}

impl PurpleAirClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl SensorSource for PurpleAirClient {
    async fn fetch(&self, sensor_id: &str) -> Result<Vec<SensorSample>, FetchError> {
        let url = format!("{}/json", self.base_url.trim_end_matches('/'));

        let resp = self
            .client
            .get(&url)
            .query(&[("show", sensor_id)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.text().await?;
        decode_samples(&body)
    }
}

fn decode_samples(body: &str) -> Result<Vec<SensorSample>, FetchError> {
    let body: serde_json::Value = serde_json::from_str(body)?;
    let samples = parse_results(body)?;
    if samples.is_empty() {
        return Err(FetchError::NoResults);
    }

    Ok(samples)
}
