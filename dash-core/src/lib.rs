//! Core library for the `weather-dash` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - Gateways to the forecast and geocoding services
//! - Location tracking, debounced place search, and the forecast session
//! - Display projections of forecast data (units, 24-hour and 7-day views)
//!
//! It is used by `weather-dash`, but can also be embedded by other front ends.

pub mod config;
pub mod dashboard;
pub mod device;
pub mod error;
pub mod gateway;
pub mod model;
pub mod search;
pub mod session;
pub mod tracker;
pub mod units;
pub mod views;
pub mod weather_code;

#[cfg(test)]
mod testing;

pub use config::{Config, DeviceConfig, FallbackLocation};
pub use dashboard::Dashboard;
pub use device::{ChannelPosition, FixedPosition, NoDevice, PositionOptions, PositionSource};
pub use error::{GatewayError, LocationError, ModelError};
pub use gateway::{
    ForecastGateway, ForecastQuery, GatewayKind, Gateways, GeocodingGateway, gateways_from_config,
};
pub use model::{
    Coordinate, CurrentConditions, DailySample, ForecastPayload, HourlySample, Place,
    TrackingState,
};
pub use search::SearchController;
pub use session::{FetchOutcome, ForecastSession, SessionConfig, SessionState};
pub use tracker::{LocationTracker, TrackerConfig};
pub use units::Unit;
pub use views::ForecastView;
