//! Debounced weather lookup that follows the map focus.
//!
//! Every focus change cancels the pending (not yet started) fetch and
//! schedules a new one after the quiescence window. Fetches that already hit
//! the network are never cancelled; each carries a sequence number and its
//! result is dropped if a newer fetch has already completed.

use std::sync::Arc;
use std::time::Duration;

use geomind_core::Coordinates;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::provider::WeatherSource;
use crate::types::WeatherSnapshot;

/// What the weather widget renders from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeatherState {
    /// Last successful reading; kept across failures.
    pub snapshot: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: bool,
}

#[derive(Debug, Default)]
struct Schedule {
    pending: Option<CancellationToken>,
    next_seq: u64,
    started_seq: u64,
    applied_seq: u64,
}

pub struct WeatherLookup {
    source: Arc<dyn WeatherSource>,
    debounce: Duration,
    schedule: Mutex<Schedule>,
    state: watch::Sender<WeatherState>,
}

impl WeatherLookup {
    pub fn new(source: Arc<dyn WeatherSource>, debounce: Duration) -> Arc<Self> {
        let (state, _) = watch::channel(WeatherState::default());
        Arc::new(Self {
            source,
            debounce,
            schedule: Mutex::new(Schedule::default()),
            state,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WeatherState {
        *self.state.borrow()
    }

    /// Schedule a fetch for `coords` once the focus has been stable for the
    /// debounce window, superseding any fetch still waiting out its window.
    pub fn on_focus_change(self: &Arc<Self>, coords: Coordinates) {
        self.schedule_fetch(coords, self.debounce);
    }

    /// Fetch immediately, still superseding any pending debounced fetch.
    pub fn refresh_now(self: &Arc<Self>, coords: Coordinates) {
        self.schedule_fetch(coords, Duration::ZERO);
    }

    /// Follow a focus channel until its sender is dropped. The current value
    /// counts as the first change.
    pub fn watch_focus(
        self: &Arc<Self>,
        mut focus: watch::Receiver<Option<Coordinates>>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let initial = *focus.borrow_and_update();
            if let Some(coords) = initial {
                this.on_focus_change(coords);
            }
            while focus.changed().await.is_ok() {
                let latest = *focus.borrow_and_update();
                if let Some(coords) = latest {
                    this.on_focus_change(coords);
                }
            }
            tracing::debug!("Focus channel closed, weather lookup stops following");
        })
    }

    fn schedule_fetch(self: &Arc<Self>, coords: Coordinates, delay: Duration) {
        let token = CancellationToken::new();
        let seq = {
            let mut schedule = self.schedule.lock();
            if let Some(previous) = schedule.pending.replace(token.clone()) {
                previous.cancel();
            }
            schedule.next_seq += 1;
            schedule.next_seq
        };

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("Weather fetch #{} superseded before it started", seq);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            this.run_fetch(seq, coords).await;
        });
    }

    async fn run_fetch(&self, seq: u64, coords: Coordinates) {
        {
            let mut schedule = self.schedule.lock();
            schedule.started_seq = schedule.started_seq.max(seq);
        }
        self.state.send_modify(|s| s.loading = true);
        tracing::debug!("Weather fetch #{} for {}", seq, coords);

        let result = self.source.current(coords).await;

        let mut schedule = self.schedule.lock();
        let is_latest_started = seq == schedule.started_seq;

        if seq <= schedule.applied_seq {
            tracing::debug!(
                "Discarding weather fetch #{}; #{} already completed",
                seq,
                schedule.applied_seq
            );
            if is_latest_started {
                self.state.send_modify(|s| s.loading = false);
            }
            return;
        }
        schedule.applied_seq = seq;

        self.state.send_modify(|s| {
            match &result {
                Ok(snapshot) => {
                    s.snapshot = Some(*snapshot);
                    s.error = false;
                }
                Err(e) => {
                    tracing::error!("Weather fetch #{} failed: {}", seq, e);
                    s.error = true;
                }
            }
            if is_latest_started {
                s.loading = false;
            }
        });
    }
}
