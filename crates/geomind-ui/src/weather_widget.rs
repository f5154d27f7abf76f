//! What the weather widget shows for a given lookup state.

use geomind_core::Coordinates;
use geomind_weather::{WeatherSnapshot, WeatherState};

pub const UNAVAILABLE_TEXT: &str = "Weather unavailable";
pub const LOCATING_TEXT: &str = "Locating...";

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherView {
    /// No focus yet; the widget is not drawn.
    Hidden,
    /// Nothing fetched and nothing in flight.
    Locating,
    /// First fetch in flight.
    Loading,
    Unavailable,
    Ready(WeatherCard),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherCard {
    /// Rounded, with a degree sign
    pub temperature: String,
    pub label: &'static str,
    pub icon: &'static str,
    pub wind: String,
    pub humidity: String,
    /// A newer reading is on its way
    pub refreshing: bool,
}

impl WeatherCard {
    fn from_snapshot(snapshot: &WeatherSnapshot, refreshing: bool) -> Self {
        let condition = snapshot.condition();
        // Avoid printing "-0°"
        let degrees = snapshot.temperature.round() as i64;
        Self {
            temperature: format!("{}°", degrees),
            label: condition.label(),
            icon: condition.icon_name(),
            wind: format!("{} km/h", snapshot.wind_speed),
            humidity: format!("{}%", snapshot.humidity),
            refreshing,
        }
    }
}

impl WeatherView {
    /// A failure stays on screen until the next fetch starts; while that
    /// fetch runs, any earlier reading is shown as refreshing.
    pub fn from_state(focus: Option<Coordinates>, state: &WeatherState) -> Self {
        if focus.is_none() {
            return WeatherView::Hidden;
        }
        match (state.loading, state.error, state.snapshot.as_ref()) {
            (true, _, None) => WeatherView::Loading,
            (false, true, _) => WeatherView::Unavailable,
            (loading, _, Some(snapshot)) => {
                WeatherView::Ready(WeatherCard::from_snapshot(snapshot, loading))
            }
            (false, false, None) => WeatherView::Locating,
        }
    }

    /// One-line rendering for text front ends.
    pub fn summary(&self) -> Option<String> {
        match self {
            WeatherView::Hidden => None,
            WeatherView::Locating => Some(LOCATING_TEXT.to_string()),
            WeatherView::Loading => Some("Loading weather...".to_string()),
            WeatherView::Unavailable => Some(UNAVAILABLE_TEXT.to_string()),
            WeatherView::Ready(card) => Some(format!(
                "[{}] {} {} | wind {} | humidity {}{}",
                card.icon,
                card.temperature,
                card.label,
                card.wind,
                card.humidity,
                if card.refreshing { " (updating)" } else { "" }
            )),
        }
    }
}
