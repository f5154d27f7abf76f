//! Front-end view models for GeoMind.
//!
//! Everything here is headless: state lives in `tokio::sync::watch` channels
//! and front ends subscribe to it. The terminal binary is one such front end.

pub mod app;
pub mod chat;
pub mod location;
pub mod map_view;
pub mod render;
pub mod state;
pub mod weather_widget;

pub use app::App;
pub use chat::{
    ChatSession, ChatState, QuickAction, SubmitOutcome, APOLOGY, QUICK_ACTIONS, SUGGESTIONS,
};
pub use location::request_location;
pub use map_view::{MapView, Tile, TileLayer, Viewport, USER_MARKER_LABEL};
pub use render::render_message;
pub use state::AppState;
pub use weather_widget::{WeatherCard, WeatherView};
