use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;
use crate::geo::Coordinates;

/// Environment variables checked (in order) for the Gemini credential.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gemini chat settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Weather lookup settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Map view settings
    #[serde(default)]
    pub map: MapConfig,

    /// Geolocation settings
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Gemini API key. `GEMINI_API_KEY` / `API_KEY` take precedence when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (0 disables the timeout)
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    60
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Resolve the credential: environment first, then the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .chain(self.api_key.clone())
            .map(|k| k.trim().to_string())
            .find(|k| !k.is_empty())
    }

    /// Like `resolve_api_key`, but a missing key is a hard error.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key()
            .ok_or_else(|| ConfigError::MissingSetting("ai.api_key (or GEMINI_API_KEY)".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Quiescence window before a focus change triggers a fetch
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_weather_timeout_secs() -> u64 {
    10
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_weather_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_lat")]
    pub default_lat: f64,

    #[serde(default = "default_lng")]
    pub default_lng: f64,

    #[serde(default = "default_zoom")]
    pub zoom: u8,

    /// Tile URL template with `{s}`, `{z}`, `{x}` and `{y}` placeholders
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Attribution the tile provider requires us to display
    #[serde(default = "default_attribution")]
    pub attribution: String,
}

fn default_lat() -> f64 {
    Coordinates::DEFAULT.lat
}

fn default_lng() -> f64 {
    Coordinates::DEFAULT.lng
}

fn default_zoom() -> u8 {
    13
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_lat: default_lat(),
            default_lng: default_lng(),
            zoom: default_zoom(),
            tile_url: default_tile_url(),
            attribution: default_attribution(),
        }
    }
}

impl MapConfig {
    pub fn default_center(&self) -> Coordinates {
        Coordinates::new(self.default_lat, self.default_lng)
    }
}

/// Which geolocation source backs "request location"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationProviderKind {
    /// IP-based geolocation over HTTP
    #[default]
    Ip,
    /// A fixed coordinate from this config
    Fixed,
    /// No geolocation capability
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub provider: LocationProviderKind,

    #[serde(default = "default_ip_api_url")]
    pub ip_api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_lng: Option<f64>,
}

fn default_ip_api_url() -> String {
    "http://ip-api.com/json".to_string()
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: LocationProviderKind::Ip,
            ip_api_url: default_ip_api_url(),
            fixed_lat: None,
            fixed_lng: None,
        }
    }
}

impl LocationConfig {
    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        match (self.fixed_lat, self.fixed_lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, writing defaults if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load_validated_from(&Self::config_path()?)
    }

    /// Load and validate configuration from a specific file
    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.ai.base_url, "ai.base_url", &mut result);
        validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.ai.resolve_api_key().is_none() {
            result.add_warning(
                "ai.api_key",
                "Gemini API key not configured - chat will be unavailable",
            );
        }

        if self.weather.debounce_ms == 0 {
            result.add_warning(
                "weather.debounce_ms",
                "Weather debounce disabled (0 ms) - every pan triggers a request",
            );
        }

        if !self.map.default_center().is_valid() {
            result.add_error(
                "map.default_lat",
                format!("Default center out of range: {}", self.map.default_center()),
            );
        }

        if self.map.zoom > 19 {
            result.add_error("map.zoom", "Zoom must be between 0 and 19");
        }

        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.map.tile_url.contains(placeholder) {
                result.add_error(
                    "map.tile_url",
                    format!("Tile URL template is missing {}", placeholder),
                );
            }
        }

        if self.map.attribution.trim().is_empty() {
            result.add_warning("map.attribution", "Tile attribution is empty");
        }

        match self.location.provider {
            LocationProviderKind::Ip => {
                validate_url(&self.location.ip_api_url, "location.ip_api_url", &mut result)
            }
            LocationProviderKind::Fixed => match self.location.fixed_coordinates() {
                Some(c) if c.is_valid() => {}
                Some(c) => result.add_error(
                    "location.fixed_lat",
                    format!("Fixed location out of range: {}", c),
                ),
                None => result.add_error(
                    "location.fixed_lat",
                    "Fixed provider requires fixed_lat and fixed_lng",
                ),
            },
            LocationProviderKind::None => {}
        }

        result
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("geomind");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
