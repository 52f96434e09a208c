//! Forecast session: keeps one forecast payload in step with the tracked
//! coordinate and refreshes it on a fixed interval.

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Notify, watch},
    task::JoinSet,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::GatewayError,
    gateway::{ForecastGateway, ForecastQuery},
    model::{Coordinate, ForecastPayload, TrackingState},
    units::Unit,
    views::{self, ForecastView},
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub refresh_interval: Duration,
    /// Sent with every query; `auto` lets the provider pick.
    pub timezone: String,
    pub unit: Unit,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            timezone: "auto".to_string(),
            unit: Unit::Celsius,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub payload: Option<ForecastPayload>,
    /// Coordinate the current payload was fetched for.
    pub fetched_for: Option<Coordinate>,
    /// Set by a failed fetch, cleared by the next successful one.
    pub error: Option<String>,
    pub in_flight: usize,
    pub unit: Unit,
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn view(&self) -> Option<ForecastView> {
        self.payload.as_ref().map(|p| views::compose(p, self.unit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The coordinate moved on while the request was out; nothing was written.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct ForecastSession {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    gateway: Arc<dyn ForecastGateway>,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    refresh: Notify,
}

impl ForecastSession {
    pub fn new(gateway: Arc<dyn ForecastGateway>, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState {
            unit: config.unit,
            ..SessionState::default()
        });

        Self {
            inner: Arc::new(Inner {
                gateway,
                config,
                state,
                refresh: Notify::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn view(&self) -> Option<ForecastView> {
        self.inner.state.borrow().view()
    }

    pub fn set_unit(&self, unit: Unit) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.unit != unit;
            state.unit = unit;
            changed
        });
    }

    /// Ask a running session loop to refetch now.
    pub fn refresh(&self) {
        self.inner.refresh.notify_one();
    }

    /// Fetch for `coordinate` and apply the result unconditionally.
    pub async fn fetch_for(&self, coordinate: Coordinate) -> Result<FetchOutcome, GatewayError> {
        fetch(&self.inner, coordinate, None).await
    }

    /// Drive the session until `cancel` fires or the tracker goes away.
    ///
    /// Fetches on start, on every change of the tracked coordinate, on each
    /// refresh tick and on [`ForecastSession::refresh`]. Fetches may overlap;
    /// a result is only applied if its coordinate is still the tracked one.
    pub async fn run(&self, mut tracking: watch::Receiver<TrackingState>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.inner.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last = tracking.borrow_and_update().coordinate;
        let mut in_flight = JoinSet::new();

        loop {
            let target = tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    debug!("Refresh interval elapsed");
                    tracking.borrow().coordinate
                }
                _ = self.inner.refresh.notified() => {
                    debug!("Manual refresh requested");
                    tracking.borrow().coordinate
                }
                changed = tracking.changed() => {
                    if changed.is_err() {
                        debug!("Tracker dropped; stopping forecast session");
                        break;
                    }
                    let coordinate = tracking.borrow_and_update().coordinate;
                    if coordinate == last {
                        continue;
                    }
                    coordinate
                }
                Some(joined) = in_flight.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!("Forecast fetch task panicked: {}", e);
                        }
                    }
                    continue;
                }
            };

            last = target;
            let inner = Arc::clone(&self.inner);
            let watcher = tracking.clone();
            in_flight.spawn(async move {
                // Failures are recorded in the session state.
                let _ = fetch(&inner, target, Some(&watcher)).await;
            });
        }

        in_flight.shutdown().await;
    }
}

/// Counts one fetch as in flight until finished or dropped.
///
/// A fetch aborted during the gateway call still gives its count back.
struct InFlight<'a> {
    state: &'a watch::Sender<SessionState>,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| s.in_flight += 1);
        Self { state, done: false }
    }

    /// Leave the in-flight count and apply `update` in one transition.
    fn finish(mut self, update: impl FnOnce(&mut SessionState)) {
        self.done = true;
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            update(s);
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.state
                .send_modify(|s| s.in_flight = s.in_flight.saturating_sub(1));
        }
    }
}

async fn fetch(
    inner: &Inner,
    coordinate: Coordinate,
    tracking: Option<&watch::Receiver<TrackingState>>,
) -> Result<FetchOutcome, GatewayError> {
    let query = ForecastQuery {
        coordinate,
        timezone: inner.config.timezone.clone(),
    };

    let in_flight = InFlight::begin(&inner.state);
    let result = inner.gateway.forecast(&query).await;

    let current = tracking.map(|t| t.borrow().coordinate);
    if current.is_some_and(|c| c != coordinate) {
        debug!(%coordinate, "Discarding forecast for a superseded coordinate");
        in_flight.finish(|_| {});
        return Ok(FetchOutcome::Superseded);
    }

    match result {
        Ok(payload) => {
            info!(%coordinate, hours = payload.hourly.len(), days = payload.daily.len(), "Forecast updated");
            in_flight.finish(|state| {
                state.payload = Some(payload);
                state.fetched_for = Some(coordinate);
                state.error = None;
            });
            Ok(FetchOutcome::Applied)
        }
        Err(e) => {
            warn!(%coordinate, "Forecast fetch failed: {}", e);
            let message = format!("Failed to load weather data: {e}");
            in_flight.finish(|state| state.error = Some(message));
            Err(e)
        }
    }
}
