//! In-memory gateways and position sources for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::{collections::HashMap, time::Duration};

use crate::{
    device::{PositionOptions, PositionSource, PositionStream},
    error::{GatewayError, LocationError},
    gateway::{ForecastGateway, ForecastQuery, GeocodingGateway},
    model::{Coordinate, CurrentConditions, DailySample, ForecastPayload, HourlySample, Place},
};

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("test coordinate is valid")
}

pub fn place(name: &str, lat: f64, lon: f64) -> Place {
    Place::new(name, coord(lat, lon))
}

pub fn new_delhi() -> Place {
    place("New Delhi", 28.6139, 77.2090)
}

fn unavailable(service: &'static str) -> GatewayError {
    GatewayError::Status {
        service,
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: "fake outage".into(),
    }
}

/// A payload with `hours` hourly samples and `days` daily samples.
pub fn payload(temperature: f64, hours: usize, days: usize) -> ForecastPayload {
    let hourly = (0..hours)
        .map(|i| HourlySample {
            time: format!("2025-03-{:02}T{:02}:00", 1 + i / 24, i % 24),
            temperature: Some(temperature + i as f64 * 0.1),
            humidity: Some(50.0),
            precipitation: Some(0.0),
            cloud_cover: Some(20.0),
            wind_speed: Some(5.0),
        })
        .collect();

    let daily = (0..days)
        .map(|i| DailySample {
            date: format!("2025-03-{:02}", 1 + i),
            temperature_max: Some(temperature + 5.0),
            temperature_min: Some(temperature - 5.0),
            uv_index_max: Some(i as f64 * 2.0),
            precipitation_sum: Some(1.0),
            sunrise: Some(format!("2025-03-{:02}T06:40", 1 + i)),
            sunset: Some(format!("2025-03-{:02}T18:20", 1 + i)),
        })
        .collect();

    ForecastPayload {
        current: CurrentConditions {
            time: Some("2025-03-01T12:00".into()),
            temperature,
            apparent_temperature: Some(temperature + 1.0),
            humidity: Some(45.0),
            pressure: Some(1010.0),
            precipitation: Some(0.0),
            wind_speed: Some(8.0),
            wind_direction: Some(90.0),
            cloud_cover: Some(10.0),
            is_day: Some(true),
            weather_code: Some(1),
        },
        hourly,
        daily,
        timezone: Some("UTC".into()),
        fetched_at: Utc::now(),
    }
}

#[derive(Debug, Default)]
pub struct FakeGeocoder {
    results: HashMap<String, Vec<Place>>,
    reverse_name: Option<String>,
    delay: Duration,
    fail: bool,
    searches: Mutex<Vec<String>>,
    reverses: Mutex<Vec<Coordinate>>,
}

impl FakeGeocoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_results(mut self, query: &str, places: Vec<Place>) -> Self {
        self.results.insert(query.to_string(), places);
        self
    }

    pub fn with_reverse_name(mut self, name: &str) -> Self {
        self.reverse_name = Some(name.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn search_calls(&self) -> Vec<String> {
        self.searches.lock().clone()
    }

    pub fn reverse_calls(&self) -> Vec<Coordinate> {
        self.reverses.lock().clone()
    }
}

#[async_trait]
impl GeocodingGateway for FakeGeocoder {
    async fn search(&self, text: &str) -> Result<Vec<Place>, GatewayError> {
        self.searches.lock().push(text.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(unavailable("fake search"));
        }
        Ok(self.results.get(text).cloned().unwrap_or_default())
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, GatewayError> {
        self.reverses.lock().push(coordinate);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(unavailable("fake reverse"));
        }
        Ok(self.reverse_name.clone())
    }
}

/// Scripted forecast gateway. Responses are consumed in order; once the script
/// runs out every call succeeds with a default payload.
#[derive(Debug, Default)]
pub struct FakeForecast {
    script: Mutex<Vec<Result<ForecastPayload, ()>>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<ForecastQuery>>,
}

impl FakeForecast {
    pub fn then_ok(mut self, payload: ForecastPayload) -> Self {
        self.script.get_mut().push(Ok(payload));
        self
    }

    pub fn then_fail(mut self) -> Self {
        self.script.get_mut().push(Err(()));
        self
    }

    /// Delay responses for one coordinate.
    pub fn with_delay_for(mut self, coordinate: Coordinate, delay: Duration) -> Self {
        self.delays.insert(coordinate.label(), delay);
        self
    }

    pub fn calls(&self) -> Vec<ForecastQuery> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ForecastGateway for FakeForecast {
    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastPayload, GatewayError> {
        self.calls.lock().push(query.clone());

        let next = {
            let mut script = self.script.lock();
            if script.is_empty() {
                Ok(payload(20.0, 48, 7))
            } else {
                script.remove(0)
            }
        };

        if let Some(delay) = self.delays.get(&query.coordinate.label()) {
            tokio::time::sleep(*delay).await;
        }

        next.map_err(|_| unavailable("fake forecast"))
    }
}

/// A device that never answers.
#[derive(Debug, Default)]
pub struct NeverResponds;

#[async_trait]
impl PositionSource for NeverResponds {
    async fn current_position(&self, _: PositionOptions) -> Result<Coordinate, LocationError> {
        std::future::pending().await
    }

    fn watch_position(&self, _: PositionOptions) -> Result<PositionStream, LocationError> {
        Err(LocationError::Unavailable)
    }
}
