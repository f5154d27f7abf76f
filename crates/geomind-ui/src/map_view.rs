//! Map viewport, tile addressing and the "You are here" marker.
//!
//! Only a completed user gesture publishes a new focus. Re-centring on the
//! user's location moves the viewport without starting a gesture, so it can
//! never echo back into the focus channel.

use std::f64::consts::PI;
use std::sync::Arc;

use geomind_core::{Coordinates, MapConfig};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::AppState;

pub const USER_MARKER_LABEL: &str = "You are here";

pub const MAX_ZOOM: u8 = 19;

const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub subdomains: Vec<String>,
}

impl TileLayer {
    pub fn new(url_template: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            attribution: attribution.into(),
            subdomains: SUBDOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(&config.tile_url, &config.attribution)
    }

    /// Web Mercator tile containing `coords` at `zoom`. Latitudes beyond the
    /// projection's limits clamp to the edge rows.
    pub fn tile_for(coords: Coordinates, zoom: u8) -> Tile {
        let zoom = zoom.min(MAX_ZOOM);
        let n = f64::from(1u32 << zoom);
        let max_index = n - 1.0;

        let x = ((coords.lng + 180.0) / 360.0 * n).floor();
        let lat_rad = coords.lat.to_radians();
        let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

        Tile {
            x: clamp_index(x, max_index),
            y: clamp_index(y, max_index),
            z: zoom,
        }
    }

    pub fn tile_url(&self, tile: Tile) -> String {
        let subdomain = if self.subdomains.is_empty() {
            ""
        } else {
            let idx = (tile.x as usize + tile.y as usize) % self.subdomains.len();
            self.subdomains[idx].as_str()
        };

        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

fn clamp_index(value: f64, max_index: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, max_index) as u32
}

#[derive(Debug)]
struct MapInner {
    viewport: Viewport,
    marker: Option<Coordinates>,
    gesture_active: bool,
}

pub struct MapView {
    app: Arc<AppState>,
    tiles: TileLayer,
    inner: Mutex<MapInner>,
}

impl MapView {
    pub fn new(app: Arc<AppState>, viewport: Viewport, tiles: TileLayer) -> Self {
        Self {
            app,
            tiles,
            inner: Mutex::new(MapInner {
                viewport,
                marker: None,
                gesture_active: false,
            }),
        }
    }

    pub fn from_config(app: Arc<AppState>, config: &MapConfig) -> Self {
        let viewport = Viewport {
            center: config.default_center(),
            zoom: config.zoom.min(MAX_ZOOM),
        };
        Self::new(app, viewport, TileLayer::from_config(config))
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.lock().viewport
    }

    pub fn marker(&self) -> Option<Coordinates> {
        self.inner.lock().marker
    }

    /// URL of the tile under the viewport centre.
    pub fn center_tile_url(&self) -> String {
        let viewport = self.viewport();
        self.tiles
            .tile_url(TileLayer::tile_for(viewport.center, viewport.zoom))
    }

    /// Status line for text front ends. Carries the attribution the tile
    /// provider requires wherever its tiles are shown.
    pub fn status_line(&self) -> String {
        let viewport = self.viewport();
        format!(
            "Map: {} (zoom {}) | tile {} | {}",
            viewport.center,
            viewport.zoom,
            self.center_tile_url(),
            self.tiles.attribution
        )
    }

    /// One step of a user drag. Updates the viewport only.
    pub fn move_to(&self, center: Coordinates) {
        let mut inner = self.inner.lock();
        inner.gesture_active = true;
        inner.viewport.center = center;
    }

    pub fn zoom_to(&self, zoom: u8) {
        let mut inner = self.inner.lock();
        inner.gesture_active = true;
        inner.viewport.zoom = zoom.min(MAX_ZOOM);
    }

    /// End of a user gesture: publishes the final centre as the new focus.
    /// Returns the published centre, or `None` if no gesture was active.
    pub fn move_end(&self) -> Option<Coordinates> {
        let center = {
            let mut inner = self.inner.lock();
            if !std::mem::take(&mut inner.gesture_active) {
                return None;
            }
            inner.viewport.center
        };
        tracing::debug!("Map moved to {}", center);
        self.app.set_focus(center);
        Some(center)
    }

    /// A whole drag in one call.
    pub fn pan_to(&self, center: Coordinates) -> Option<Coordinates> {
        self.move_to(center);
        self.move_end()
    }

    /// Place the marker and re-centre when the position changed. The
    /// re-centre is programmatic and publishes nothing.
    pub fn set_user_location(&self, coords: Coordinates) -> bool {
        let mut inner = self.inner.lock();
        let previous = inner.marker.replace(coords);
        if previous == Some(coords) {
            return false;
        }
        inner.viewport.center = coords;
        true
    }

    /// Keep the marker in step with the user-location channel until the
    /// sender is dropped.
    pub fn follow_user_location(
        self: &Arc<Self>,
        mut user_location: watch::Receiver<Option<Coordinates>>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let latest = *user_location.borrow_and_update();
                if let Some(coords) = latest {
                    if this.set_user_location(coords) {
                        tracing::debug!("Map recentred on user at {}", coords);
                    }
                }
                if user_location.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> (Arc<MapView>, Arc<AppState>) {
        let app = Arc::new(AppState::new(Coordinates::DEFAULT));
        let view = MapView::from_config(Arc::clone(&app), &MapConfig::default());
        (Arc::new(view), app)
    }

    #[test]
    fn test_tile_for() {
        assert_eq!(
            TileLayer::tile_for(Coordinates::new(12.0, 34.0), 0),
            Tile { x: 0, y: 0, z: 0 }
        );
        assert_eq!(
            TileLayer::tile_for(Coordinates::DEFAULT, 13),
            Tile { x: 1310, y: 3166, z: 13 }
        );
        assert_eq!(
            TileLayer::tile_for(Coordinates::new(0.0, 0.0), 1),
            Tile { x: 1, y: 1, z: 1 }
        );
    }

    #[test]
    fn test_tile_for_clamps_edges() {
        let south = TileLayer::tile_for(Coordinates::new(-89.0, -180.0), 3);
        assert_eq!((south.x, south.y), (0, 7));

        let east = TileLayer::tile_for(Coordinates::new(0.0, 180.0), 2);
        assert_eq!(east.x, 3);
    }

    #[test]
    fn test_tile_url() {
        let layer = TileLayer::from_config(&MapConfig::default());
        assert_eq!(
            layer.tile_url(Tile { x: 1310, y: 3166, z: 13 }),
            "https://a.tile.openstreetmap.org/13/1310/3166.png"
        );
        assert_eq!(
            layer.tile_url(Tile { x: 1, y: 1, z: 1 }),
            "https://c.tile.openstreetmap.org/1/1/1.png"
        );
        assert_eq!(
            layer.tile_url(Tile { x: 0, y: 0, z: 0 }),
            "https://a.tile.openstreetmap.org/0/0/0.png"
        );
        assert_eq!(layer.attribution, "© OpenStreetMap contributors");
    }

    #[test]
    fn test_initial_viewport() {
        let (view, _app) = view();
        assert_eq!(
            view.viewport(),
            Viewport {
                center: Coordinates::DEFAULT,
                zoom: 13
            }
        );
        assert!(view.marker().is_none());
    }

    #[test]
    fn test_status_line_shows_tile_and_attribution() {
        let (view, _app) = view();
        assert_eq!(
            view.status_line(),
            "Map: 37.7749, -122.4194 (zoom 13) | tile https://a.tile.openstreetmap.org/13/1310/3166.png | © OpenStreetMap contributors"
        );

        view.pan_to(Coordinates::new(0.0, 0.0));
        view.zoom_to(1);
        assert!(view
            .status_line()
            .contains("https://c.tile.openstreetmap.org/1/1/1.png | © OpenStreetMap contributors"));
    }

    #[test]
    fn test_gesture_emits_once() {
        let (view, app) = view();
        let mut focus = app.subscribe_focus();
        focus.borrow_and_update();

        view.move_to(Coordinates::new(37.78, -122.41));
        view.move_to(Coordinates::new(37.79, -122.40));
        assert!(!focus.has_changed().unwrap());

        let end = Coordinates::new(37.80, -122.39);
        view.move_to(end);
        assert_eq!(view.move_end(), Some(end));
        assert_eq!(*focus.borrow_and_update(), Some(end));

        assert_eq!(view.move_end(), None);
        assert!(!focus.has_changed().unwrap());
    }

    #[test]
    fn test_recentre_does_not_emit() {
        let (view, app) = view();
        let mut focus = app.subscribe_focus();
        focus.borrow_and_update();

        let home = Coordinates::new(51.5, -0.12);
        assert!(view.set_user_location(home));
        assert_eq!(view.viewport().center, home);
        assert_eq!(view.marker(), Some(home));

        assert_eq!(view.move_end(), None);
        assert!(!focus.has_changed().unwrap());

        assert!(!view.set_user_location(home));
    }

    #[test]
    fn test_zoom_is_capped() {
        let (view, _app) = view();
        view.zoom_to(25);
        assert_eq!(view.viewport().zoom, MAX_ZOOM);
        assert_eq!(view.move_end(), Some(Coordinates::DEFAULT));
    }

    #[tokio::test]
    async fn test_follow_user_location() {
        let (view, app) = view();
        let mut focus = app.subscribe_focus();
        focus.borrow_and_update();
        let handle = view.follow_user_location(app.subscribe_user_location());

        let home = Coordinates::new(48.85, 2.35);
        app.set_user_location(home);

        for _ in 0..10 {
            if view.marker() == Some(home) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(view.marker(), Some(home));
        assert_eq!(view.viewport().center, home);
        assert!(!focus.has_changed().unwrap());

        handle.abort();
    }
}
