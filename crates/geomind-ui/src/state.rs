//! Shared coordinate and mode state.
//!
//! The map view and the location request write here; the weather lookup and
//! the chat session read from here.

use geomind_ai::Mode;
use geomind_core::Coordinates;
use tokio::sync::watch;

#[derive(Debug)]
pub struct AppState {
    user_location: watch::Sender<Option<Coordinates>>,
    focus: watch::Sender<Option<Coordinates>>,
    mode: watch::Sender<Mode>,
}

impl AppState {
    /// Focus starts at `default_center`; no user location is known yet.
    pub fn new(default_center: Coordinates) -> Self {
        let (user_location, _) = watch::channel(None);
        let (focus, _) = watch::channel(Some(default_center));
        let (mode, _) = watch::channel(Mode::default());
        Self {
            user_location,
            focus,
            mode,
        }
    }

    pub fn user_location(&self) -> Option<Coordinates> {
        *self.user_location.borrow()
    }

    pub fn focus(&self) -> Option<Coordinates> {
        *self.focus.borrow()
    }

    pub fn mode(&self) -> Mode {
        *self.mode.borrow()
    }

    pub fn set_user_location(&self, coords: Coordinates) {
        self.user_location.send_replace(Some(coords));
    }

    pub fn set_focus(&self, coords: Coordinates) {
        self.focus.send_replace(Some(coords));
    }

    /// Returns true when the mode actually changed.
    pub fn set_mode(&self, mode: Mode) -> bool {
        let changed = self.mode.send_if_modified(|current| {
            if *current == mode {
                return false;
            }
            *current = mode;
            true
        });
        if changed {
            tracing::info!("Mode switched to {}", mode.label());
        }
        changed
    }

    pub fn subscribe_user_location(&self) -> watch::Receiver<Option<Coordinates>> {
        self.user_location.subscribe()
    }

    pub fn subscribe_focus(&self) -> watch::Receiver<Option<Coordinates>> {
        self.focus.subscribe()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<Mode> {
        self.mode.subscribe()
    }

    /// Location sent with the next prompt: where the map is looking, else
    /// where the user is, else nothing.
    pub fn location_context(&self) -> Option<Coordinates> {
        self.focus().or_else(|| self.user_location())
    }
}
