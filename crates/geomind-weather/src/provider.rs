use async_trait::async_trait;
use geomind_core::Coordinates;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::types::{WeatherError, WeatherSnapshot};

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,wind_speed_10m,relative_humidity_2m";

/// Anything that can report current conditions for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentBlock {
    temperature_2m: f64,
    weather_code: i32,
    wind_speed_10m: f64,
    relative_humidity_2m: f64,
}

impl From<CurrentBlock> for WeatherSnapshot {
    fn from(c: CurrentBlock) -> Self {
        Self {
            temperature: c.temperature_2m,
            weather_code: c.weather_code,
            wind_speed: c.wind_speed_10m,
            humidity: c.relative_humidity_2m.round() as i32,
        }
    }
}

/// Open-Meteo client (free, no key required)
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
}

impl WeatherProvider {
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch current conditions, always in Celsius.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", coords.lat.to_string()),
                ("longitude", coords.lng.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("temperature_unit", "celsius".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Weather request returned status {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = WeatherSnapshot::from(parsed.current);
        tracing::debug!(
            "Weather at {}: {:.1}°C code {}",
            coords,
            snapshot.temperature,
            snapshot.weather_code
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherSource for WeatherProvider {
    async fn current(&self, coords: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch(coords).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "latitude": 37.76,
            "longitude": -122.42,
            "current_units": {"temperature_2m": "°C"},
            "current": {
                "time": "2026-10-18T12:00",
                "interval": 900,
                "temperature_2m": 17.3,
                "weather_code": 3,
                "wind_speed_10m": 12.6,
                "relative_humidity_2m": 71
            }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        let snap = WeatherSnapshot::from(parsed.current);
        assert_eq!(snap.temperature, 17.3);
        assert_eq!(snap.weather_code, 3);
        assert_eq!(snap.wind_speed, 12.6);
        assert_eq!(snap.humidity, 71);
    }

    #[test]
    fn test_missing_current_block_fails() {
        let parsed: Result<ForecastResponse, _> = serde_json::from_str(r#"{"latitude": 1.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let p = WeatherProvider::with_base_url("http://localhost:9/v1/forecast/", Duration::from_secs(1))
            .unwrap();
        assert_eq!(p.base_url, "http://localhost:9/v1/forecast");
    }
}
