//! Composition root: wires tracker, search and session together and owns
//! their shared lifetime.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    Config,
    device::PositionSource,
    gateway::Gateways,
    search::SearchController,
    session::ForecastSession,
    tracker::LocationTracker,
};

#[derive(Debug)]
pub struct Dashboard {
    tracker: LocationTracker,
    search: SearchController,
    session: ForecastSession,
    cancel: CancellationToken,
    session_task: Option<JoinHandle<()>>,
}

impl Dashboard {
    /// Build the components without starting anything.
    pub fn new(
        config: &Config,
        gateways: Gateways,
        position: Arc<dyn PositionSource>,
    ) -> anyhow::Result<Self> {
        let tracker = LocationTracker::new(
            config.tracker_config()?,
            position,
            Arc::clone(&gateways.geocoding),
        );
        let search = SearchController::new(gateways.geocoding, config.search_debounce());
        let session = ForecastSession::new(gateways.forecast, config.session_config());

        Ok(Self {
            tracker,
            search,
            session,
            cancel: CancellationToken::new(),
            session_task: None,
        })
    }

    /// Build and start: one startup fix, continuous observation, then the
    /// forecast loop.
    pub async fn start(
        config: &Config,
        gateways: Gateways,
        position: Arc<dyn PositionSource>,
    ) -> anyhow::Result<Self> {
        let mut dashboard = Self::new(config, gateways, position)?;

        // A failed fix is already reflected in the place name.
        let _ = dashboard.tracker.initial_fix().await;

        // Observe even while not following, so following can be turned on later.
        if let Err(e) = dashboard.tracker.start_watch() {
            debug!("Continuous position observation unavailable: {}", e);
        }

        let session = dashboard.session.clone();
        let tracking = dashboard.tracker.subscribe();
        let cancel = dashboard.cancel.clone();
        dashboard.session_task = Some(tokio::spawn(async move {
            session.run(tracking, cancel).await;
        }));

        info!("Dashboard started");
        Ok(dashboard)
    }

    pub fn tracker(&self) -> &LocationTracker {
        &self.tracker
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn session(&self) -> &ForecastSession {
        &self.session
    }

    /// Select a search candidate and hand it to the tracker.
    pub fn choose_candidate(&self, index: usize) -> bool {
        self.search.select(index, &self.tracker).is_some()
    }

    /// Stop observation, the refresh loop and any outstanding requests.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.tracker.shutdown();
        self.search.shutdown();

        if let Some(task) = self.session_task.take() {
            let _ = task.await;
        }
        info!("Dashboard stopped");
    }
}
