//! Location tracking.
//!
//! [`LocationTracker`] owns the authoritative coordinate. Three sources feed it:
//! the startup fix, continuous observation, and manual place selection. State is
//! published through a `watch` channel so every change is a single whole-value
//! transition and readers only ever see snapshots.

use parking_lot::Mutex;
use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    device::{PositionOptions, PositionSource},
    error::LocationError,
    gateway::GeocodingGateway,
    model::{Coordinate, Place, TrackingState},
};

/// Roughly 200 m expressed in degrees.
pub const DEFAULT_DISPLACEMENT_THRESHOLD: f64 = 0.0018;

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Coordinate and name used until (or instead of) a device fix.
    pub fallback: Place,
    /// Observations closer than this to the current coordinate are discarded.
    pub displacement_threshold: f64,
    pub following: bool,
    pub fix_options: PositionOptions,
    pub watch_options: PositionOptions,
}

impl TrackerConfig {
    pub fn new(fallback: Place) -> Self {
        Self {
            fallback,
            displacement_threshold: DEFAULT_DISPLACEMENT_THRESHOLD,
            following: true,
            fix_options: PositionOptions::one_shot(),
            watch_options: PositionOptions::watch(),
        }
    }
}

/// Cheap to clone; clones share the same state.
#[derive(Debug, Clone)]
pub struct LocationTracker {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: TrackerConfig,
    position: Arc<dyn PositionSource>,
    geocoder: Arc<dyn GeocodingGateway>,
    state: watch::Sender<TrackingState>,
    /// Bumped on every manual selection.
    selections: AtomicU64,
    watch_task: Mutex<Option<JoinHandle<()>>>,
    lookup_task: Mutex<Option<JoinHandle<()>>>,
}

impl LocationTracker {
    pub fn new(
        config: TrackerConfig,
        position: Arc<dyn PositionSource>,
        geocoder: Arc<dyn GeocodingGateway>,
    ) -> Self {
        let initial = TrackingState {
            coordinate: config.fallback.coordinate(),
            following: config.following,
            place_name: config.fallback.display_name().to_string(),
        };
        let (state, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                config,
                position,
                geocoder,
                state,
                selections: AtomicU64::new(0),
                watch_task: Mutex::new(None),
                lookup_task: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> TrackingState {
        self.inner.state.borrow().clone()
    }

    pub fn coordinate(&self) -> Coordinate {
        self.inner.state.borrow().coordinate
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.inner.state.subscribe()
    }

    /// Ask the device for a position once.
    ///
    /// On failure the coordinate stays where it is and the place name explains
    /// the degraded state. A manual selection made while the request was pending
    /// wins over the late result.
    pub async fn initial_fix(&self) -> Result<Coordinate, LocationError> {
        let options = self.inner.config.fix_options;
        let selections = self.inner.selections.load(Ordering::SeqCst);

        let result = match tokio::time::timeout(
            options.timeout,
            self.inner.position.current_position(options),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };

        if self.inner.selections.load(Ordering::SeqCst) != selections {
            debug!("Ignoring initial fix: a place was selected meanwhile");
            return result;
        }

        match &result {
            Ok(coordinate) => {
                let coordinate = *coordinate;
                info!(%coordinate, "Initial device fix acquired");
                self.inner.state.send_modify(|state| {
                    state.coordinate = coordinate;
                    state.place_name = coordinate.label();
                });
                self.spawn_reverse_lookup(coordinate);
            }
            Err(e) => {
                warn!("Initial device fix failed: {}", e);
                let message = format!(
                    "{} – using default ({})",
                    e.reason(),
                    self.inner.config.fallback.display_name()
                );
                self.inner.state.send_modify(|state| state.place_name = message);
            }
        }

        result
    }

    /// Begin continuous observation. Calling it while already watching is a no-op.
    pub fn start_watch(&self) -> Result<(), LocationError> {
        let mut slot = self.inner.watch_task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return Ok(());
        }

        let options = self.inner.config.watch_options;
        let mut stream = self.inner.position.watch_position(options)?;
        let weak = Arc::downgrade(&self.inner);

        *slot = Some(tokio::spawn(async move {
            loop {
                let next = match tokio::time::timeout(options.timeout, stream.recv()).await {
                    Ok(Some(next)) => next,
                    Ok(None) => break,
                    Err(_) if weak.strong_count() == 0 => break,
                    Err(_) => {
                        debug!("No position update within {:?}", options.timeout);
                        continue;
                    }
                };

                let Some(tracker) = upgrade(&weak) else { break };
                match next {
                    Ok(coordinate) => {
                        tracker.observe(coordinate);
                    }
                    Err(e) => debug!("Position observation failed: {}", e),
                }
            }
            debug!("Position stream ended");
        }));

        Ok(())
    }

    pub fn stop_watch(&self) {
        if let Some(task) = self.inner.watch_task.lock().take() {
            task.abort();
        }
    }

    pub fn is_watching(&self) -> bool {
        self.inner
            .watch_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Apply one continuous observation. Returns whether it moved the coordinate.
    ///
    /// Must be called from within a Tokio runtime: an accepted update schedules a
    /// reverse lookup.
    pub fn observe(&self, candidate: Coordinate) -> bool {
        let threshold = self.inner.config.displacement_threshold;

        let accepted = self.inner.state.send_if_modified(|state| {
            if !state.following {
                return false;
            }
            let displacement = state.coordinate.planar_distance(&candidate);
            if displacement <= threshold {
                debug!(displacement, "Discarding observation below threshold");
                return false;
            }
            state.coordinate = candidate;
            state.place_name = candidate.label();
            true
        });

        if accepted {
            info!(coordinate = %candidate, "Device moved");
            self.spawn_reverse_lookup(candidate);
        }
        accepted
    }

    /// Jump to a user-chosen place. The following flag is left as it is.
    pub fn select_place(&self, place: Place) {
        self.inner.selections.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.inner.lookup_task.lock().take() {
            task.abort();
        }

        info!(coordinate = %place.coordinate(), "Selected {}", place.display_name());
        self.inner.state.send_modify(|state| {
            state.coordinate = place.coordinate();
            state.place_name = place.display_name().to_string();
        });
    }

    pub fn set_following(&self, following: bool) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.following != following;
            state.following = following;
            changed
        });
    }

    /// Stop observing and drop any pending lookup.
    pub fn shutdown(&self) {
        self.stop_watch();
        if let Some(task) = self.inner.lookup_task.lock().take() {
            task.abort();
        }
    }

    fn spawn_reverse_lookup(&self, coordinate: Coordinate) {
        let geocoder = Arc::clone(&self.inner.geocoder);
        let weak = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let name = match geocoder.reverse(coordinate).await {
                Ok(Some(name)) => name,
                Ok(None) => {
                    debug!(%coordinate, "Reverse geocode returned no name");
                    return;
                }
                Err(e) => {
                    debug!(%coordinate, "Reverse geocode failed: {}", e);
                    return;
                }
            };

            if let Some(inner) = weak.upgrade() {
                // The coordinate may have moved on while we were waiting.
                inner.state.send_if_modified(|state| {
                    if state.coordinate != coordinate {
                        return false;
                    }
                    state.place_name = name;
                    true
                });
            }
        });

        if let Some(previous) = self.inner.lookup_task.lock().replace(task) {
            previous.abort();
        }
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<LocationTracker> {
    weak.upgrade().map(|inner| LocationTracker { inner })
}
