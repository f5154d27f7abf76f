use geomind_weather::LocationSource;

use crate::state::AppState;

/// Ask `source` for the user's position once. On success the position
/// becomes both the user location and the map focus; on failure nothing
/// changes and the failure is only logged.
pub async fn request_location(state: &AppState, source: &dyn LocationSource) {
    match source.locate().await {
        Ok(coords) => {
            tracing::info!("User located at {}", coords);
            state.set_user_location(coords);
            state.set_focus(coords);
        }
        Err(e) => {
            tracing::warn!("Geolocation failed: {}", e);
        }
    }
}
