//! Weather service for GeoMind
//!
//! Provides current conditions via the Open-Meteo API, a debounced lookup that
//! follows the map focus, and the geolocation sources used to find the user.

pub mod location;
pub mod lookup;
pub mod provider;
pub mod types;

pub use location::{FixedLocation, IpLocator, LocationSource, Unsupported};
pub use lookup::{WeatherLookup, WeatherState};
pub use provider::{WeatherProvider, WeatherSource};
pub use types::*;
