//! Debounced place search.

use parking_lot::Mutex;
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{gateway::GeocodingGateway, model::Place, tracker::LocationTracker};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Turns keystrokes into geocoding queries.
///
/// Every input supersedes the previous one: its timer or in-flight request is
/// aborted, and a generation number keeps a result that slipped through from
/// being written.
#[derive(Debug, Clone)]
pub struct SearchController {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    geocoder: Arc<dyn GeocodingGateway>,
    debounce: Duration,
    text: Mutex<String>,
    candidates: watch::Sender<Vec<Place>>,
    pending: Mutex<Pending>,
}

#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Pending {
    /// Invalidate whatever is scheduled and return the new generation.
    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation
    }
}

impl SearchController {
    pub fn new(geocoder: Arc<dyn GeocodingGateway>, debounce: Duration) -> Self {
        let (candidates, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                geocoder,
                debounce,
                text: Mutex::new(String::new()),
                candidates,
                pending: Mutex::new(Pending::default()),
            }),
        }
    }

    pub fn text(&self) -> String {
        self.inner.text.lock().clone()
    }

    pub fn candidates(&self) -> Vec<Place> {
        self.inner.candidates.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Place>> {
        self.inner.candidates.subscribe()
    }

    /// Handle a change of the search box contents.
    pub fn input(&self, text: &str) {
        *self.inner.text.lock() = text.to_string();

        let mut pending = self.inner.pending.lock();
        let generation = pending.supersede();

        let query = text.trim();
        if query.is_empty() {
            self.inner.candidates.send_replace(Vec::new());
            return;
        }

        let query = query.to_string();
        let geocoder = Arc::clone(&self.inner.geocoder);
        let debounce = self.inner.debounce;
        let weak = Arc::downgrade(&self.inner);

        pending.task = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            debug!(%query, "Searching places");
            let places = match geocoder.search(&query).await {
                Ok(places) => places,
                Err(e) => {
                    debug!(%query, "Place search failed: {}", e);
                    Vec::new()
                }
            };

            publish(&weak, generation, places);
        }));
    }

    /// Pick a candidate by index: clears the search and moves the tracker there.
    pub fn select(&self, index: usize, tracker: &LocationTracker) -> Option<Place> {
        let place = self.inner.candidates.borrow().get(index).cloned()?;

        self.clear();
        tracker.select_place(place.clone());
        Some(place)
    }

    /// Empty the input and candidates, dropping any pending query.
    pub fn clear(&self) {
        self.inner.text.lock().clear();
        self.inner.pending.lock().supersede();
        self.inner.candidates.send_replace(Vec::new());
    }

    pub fn shutdown(&self) {
        self.inner.pending.lock().supersede();
    }
}

fn publish(weak: &Weak<Inner>, generation: u64, places: Vec<Place>) {
    let Some(inner) = weak.upgrade() else { return };

    let pending = inner.pending.lock();
    if pending.generation != generation {
        debug!("Dropping superseded search result");
        return;
    }
    inner.candidates.send_replace(places);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::{FakeGeocoder, NeverResponds, coord, new_delhi, place},
        tracker::TrackerConfig,
    };

    fn controller(geocoder: Arc<FakeGeocoder>) -> SearchController {
        SearchController::new(geocoder, DEFAULT_DEBOUNCE)
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn only_final_text_is_queried_after_quiet_period() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .with_results("Paris", vec![place("Paris, France", 48.85, 2.35)]),
        );
        let search = controller(geocoder.clone());

        for text in ["P", "Pa", "Par", "Pari", "Paris"] {
            search.input(text);
            advance(100).await;
        }
        assert!(geocoder.search_calls().is_empty());

        advance(300).await;
        assert_eq!(geocoder.search_calls(), vec!["Paris".to_string()]);

        let names: Vec<_> = search
            .candidates()
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Paris, France"]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_sent_before_the_debounce_elapses() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let search = controller(geocoder.clone());

        search.input("Lon");
        advance(349).await;
        assert!(geocoder.search_calls().is_empty());

        advance(2).await;
        assert_eq!(geocoder.search_calls(), vec!["Lon".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_clears_immediately_without_query() {
        let geocoder = Arc::new(
            FakeGeocoder::default().with_results("Rome", vec![place("Rome, Italy", 41.9, 12.5)]),
        );
        let search = controller(geocoder.clone());

        search.input("Rome");
        advance(400).await;
        assert_eq!(search.candidates().len(), 1);

        search.input("   ");
        assert!(search.candidates().is_empty());
        advance(1000).await;
        assert_eq!(geocoder.search_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_cancels_scheduled_query() {
        let geocoder = Arc::new(FakeGeocoder::default());
        let search = controller(geocoder.clone());

        search.input("Berl");
        advance(200).await;
        search.input("");
        advance(1000).await;
        assert!(geocoder.search_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_result_for_old_text_is_dropped() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .with_delay(Duration::from_millis(500))
                .with_results("Ber", vec![place("Bern, Switzerland", 46.95, 7.44)])
                .with_results("Berlin", vec![place("Berlin, Germany", 52.52, 13.4)]),
        );
        let search = controller(geocoder.clone());

        search.input("Ber");
        advance(400).await; // query for "Ber" now in flight
        search.input("Berlin");
        advance(1000).await;

        let names: Vec<_> = search
            .candidates()
            .iter()
            .map(|p| p.display_name().to_string())
            .collect();
        assert_eq!(names, vec!["Berlin, Germany"]);
    }

    #[tokio::test(start_paused = true)]
    async fn gateway_failure_yields_empty_candidates() {
        let search = controller(Arc::new(FakeGeocoder::failing()));

        search.input("Atlantis");
        advance(400).await;
        assert!(search.candidates().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_clears_search_and_moves_tracker() {
        let tokyo = place("Tokyo, Japan", 35.6762, 139.6503);
        let geocoder = Arc::new(FakeGeocoder::default().with_results("Tokyo", vec![tokyo.clone()]));
        let search = controller(geocoder.clone());
        let tracker = LocationTracker::new(
            TrackerConfig::new(new_delhi()),
            Arc::new(NeverResponds),
            geocoder,
        );

        search.input("Tokyo");
        advance(400).await;

        assert!(search.select(5, &tracker).is_none());
        let chosen = search.select(0, &tracker).expect("candidate exists");

        assert_eq!(chosen, tokyo);
        assert_eq!(search.text(), "");
        assert!(search.candidates().is_empty());
        assert_eq!(tracker.coordinate(), coord(35.6762, 139.6503));
        assert_eq!(tracker.snapshot().place_name, "Tokyo, Japan");
    }
}
