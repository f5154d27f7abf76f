//! One-shot geolocation sources.
//!
//! Each source answers a single position query. Callers decide what to do
//! with a failure; none of these retry.

use async_trait::async_trait;
use geomind_core::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use crate::types::LocationError;

/// Platform geolocation capability: one position per call, or an error.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    message: Option<String>,
}

/// Approximate location from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    url: String,
}

impl IpLocator {
    pub fn with_url(url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LocationError::Other(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl LocationSource for IpLocator {
    #[instrument(skip(self), level = "debug")]
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                LocationError::Timeout
            } else {
                tracing::debug!("IP geolocation request failed: {}", e);
                LocationError::ServiceUnavailable
            }
        })?;

        if !response.status().is_success() {
            tracing::debug!("IP geolocation returned status {}", response.status());
            return Err(LocationError::ServiceUnavailable);
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Other(e.to_string()))?;

        if body.status != "success" {
            tracing::debug!(
                "IP geolocation refused: {}",
                body.message.as_deref().unwrap_or("no reason given")
            );
            return Err(LocationError::ServiceUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lng)) => {
                tracing::info!(
                    "Located via IP at {:.4}, {:.4} ({})",
                    lat,
                    lng,
                    body.city.as_deref().unwrap_or("unknown city")
                );
                Ok(Coordinates::new(lat, lng))
            }
            _ => Err(LocationError::Other("response missing coordinates".into())),
        }
    }
}

/// Always answers with the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationSource for FixedLocation {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// A platform without any geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

#[async_trait]
impl LocationSource for Unsupported {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unsupported)
    }
}
