use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use geomind_ai::{ChatBackend, GeminiClient};
use geomind_core::{Config, ConfigError, LocationConfig, LocationProviderKind};
use geomind_weather::{
    FixedLocation, IpLocator, LocationSource, Unsupported, WeatherLookup, WeatherProvider,
    WeatherSource,
};
use tokio::task::JoinHandle;

use crate::chat::ChatSession;
use crate::location::request_location;
use crate::map_view::MapView;
use crate::state::AppState;
use crate::weather_widget::WeatherView;

const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the shared state and every view model wired to it.
pub struct App {
    state: Arc<AppState>,
    map: Arc<MapView>,
    weather: Arc<WeatherLookup>,
    chat: Arc<ChatSession>,
    locator: Arc<dyn LocationSource>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Build the production services from `config`. Fails when no API key
    /// can be resolved.
    pub fn new(config: Config) -> Result<Self> {
        let api_key = config.ai.require_api_key()?;
        let ai_timeout = (config.ai.timeout_secs > 0)
            .then(|| Duration::from_secs(config.ai.timeout_secs));
        let backend = GeminiClient::with_base_url(&api_key, &config.ai.base_url, ai_timeout)
            .context("Failed to create Gemini client")?;

        let weather = WeatherProvider::with_base_url(
            &config.weather.base_url,
            Duration::from_secs(config.weather.timeout_secs),
        )
        .context("Failed to create weather provider")?;

        let locator = location_source(&config.location)?;

        Ok(Self::with_services(
            &config,
            Arc::new(backend),
            Arc::new(weather),
            locator,
        ))
    }

    /// Wire the view models around caller-supplied services.
    pub fn with_services(
        config: &Config,
        backend: Arc<dyn ChatBackend>,
        weather_source: Arc<dyn WeatherSource>,
        locator: Arc<dyn LocationSource>,
    ) -> Self {
        let state = Arc::new(AppState::new(config.map.default_center()));
        let map = Arc::new(MapView::from_config(Arc::clone(&state), &config.map));
        let weather = WeatherLookup::new(
            weather_source,
            Duration::from_millis(config.weather.debounce_ms),
        );
        let chat = Arc::new(ChatSession::new(backend, Arc::clone(&state)));

        Self {
            state,
            map,
            weather,
            chat,
            locator,
            tasks: Vec::new(),
        }
    }

    /// Start the background followers. Must run inside a Tokio runtime.
    pub fn start(&mut self) {
        tracing::info!("Starting GeoMind");
        self.tasks
            .push(self.weather.watch_focus(self.state.subscribe_focus()));
        self.tasks
            .push(self.map.follow_user_location(self.state.subscribe_user_location()));
    }

    /// One geolocation attempt; see [`request_location`].
    pub async fn locate(&self) {
        request_location(&self.state, self.locator.as_ref()).await;
    }

    /// Fetch weather for the current focus without waiting out the debounce.
    pub fn refresh_weather(&self) {
        if let Some(focus) = self.state.focus() {
            self.weather.refresh_now(focus);
        }
    }

    pub fn weather_view(&self) -> WeatherView {
        WeatherView::from_state(self.state.focus(), &self.weather.state())
    }

    /// Offer "Enable Location" while we do not know where the user is.
    pub fn needs_location(&self) -> bool {
        self.state.user_location().is_none()
    }

    pub fn shutdown(&mut self) {
        tracing::info!("Shutting down GeoMind");
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub fn map(&self) -> &Arc<MapView> {
        &self.map
    }

    pub fn weather(&self) -> &Arc<WeatherLookup> {
        &self.weather
    }

    pub fn chat(&self) -> &Arc<ChatSession> {
        &self.chat
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// The geolocation source selected by `[location]`.
pub fn location_source(config: &LocationConfig) -> Result<Arc<dyn LocationSource>> {
    let source: Arc<dyn LocationSource> = match config.provider {
        LocationProviderKind::Ip => Arc::new(
            IpLocator::with_url(&config.ip_api_url, LOCATION_TIMEOUT)
                .context("Failed to create IP locator")?,
        ),
        LocationProviderKind::Fixed => {
            let coords = config.fixed_coordinates().ok_or_else(|| {
                ConfigError::MissingSetting("location.fixed_lat / location.fixed_lng".into())
            })?;
            Arc::new(FixedLocation(coords))
        }
        LocationProviderKind::None => Arc::new(Unsupported),
    };
    Ok(source)
}
