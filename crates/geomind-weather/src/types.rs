use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    #[default]
    Cloudy,
    Fog,
    Rain,
    Showers,
    Snow,
    Storm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition.
    ///
    /// Ranges are checked in order and the first match wins. WMO codes stop
    /// at 99, so the storm band is 95..=99 and anything beyond is unmapped.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51..=67 => Self::Rain,
            80..=82 => Self::Showers,
            71..=77 => Self::Snow,
            95..=99 => Self::Storm,
            _ => Self::Cloudy,
        }
    }

    /// Get a human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Showers => "Showers",
            Self::Snow => "Snow",
            Self::Storm => "Storm",
        }
    }

    /// Get icon name for front ends that draw one
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun",
            Self::Cloudy => "cloud",
            Self::Fog => "cloud_fog",
            Self::Rain => "cloud_rain",
            Self::Showers => "cloud_rain_heavy",
            Self::Snow => "cloud_snow",
            Self::Storm => "cloud_lightning",
        }
    }
}

/// Current conditions at the map focus, replaced wholesale on every fetch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Degrees Celsius
    pub temperature: f64,
    pub weather_code: i32,
    /// km/h
    pub wind_speed: f64,
    /// Relative humidity in percent
    pub humidity: i32,
}

impl WeatherSnapshot {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.weather_code)
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this platform")]
    Unsupported,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather service returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}
