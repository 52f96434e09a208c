//! Gateways that skip the relay and call the public providers themselves.
//! The query parameters match what the relay sends on our behalf.

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::GatewayError,
    model::{Coordinate, ForecastPayload, Place},
};

use super::{
    ForecastGateway, ForecastQuery, GeocodingGateway, base_url, fetch_body,
    wire::{decode_forecast, decode_places, decode_reverse},
};

const CURRENT_VARS: &[&str] = &[
    "temperature_2m",
    "apparent_temperature",
    "relative_humidity_2m",
    "is_day",
    "precipitation",
    "wind_speed_10m",
    "wind_direction_10m",
    "weather_code",
    "surface_pressure",
    "cloud_cover",
];

const HOURLY_VARS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation",
    "cloud_cover",
    "wind_speed_10m",
];

const DAILY_VARS: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "uv_index_max",
    "sunrise",
    "sunset",
    "precipitation_sum",
];

const FORECAST_DAYS: u8 = 7;
const SEARCH_LIMIT: u8 = 5;

#[derive(Debug, Clone)]
pub struct OpenMeteoGateway {
    base_url: String,
    http: Client,
}

impl OpenMeteoGateway {
    pub fn new(url: &str, http: Client) -> Self {
        Self {
            base_url: base_url(url),
            http,
        }
    }
}

#[async_trait]
impl ForecastGateway for OpenMeteoGateway {
    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastPayload, GatewayError> {
        const SERVICE: &str = "Open-Meteo forecast";

        let request = self
            .http
            .get(format!("{}/v1/forecast", self.base_url))
            .query(&[
                ("latitude", query.coordinate.latitude().to_string()),
                ("longitude", query.coordinate.longitude().to_string()),
                ("current", CURRENT_VARS.join(",")),
                ("hourly", HOURLY_VARS.join(",")),
                ("daily", DAILY_VARS.join(",")),
                ("forecast_days", FORECAST_DAYS.to_string()),
                ("timezone", query.timezone.clone()),
            ]);

        let body = fetch_body(SERVICE, request).await?;
        decode_forecast(SERVICE, &body)
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGateway {
    base_url: String,
    http: Client,
}

impl NominatimGateway {
    pub fn new(url: &str, http: Client) -> Self {
        Self {
            base_url: base_url(url),
            http,
        }
    }
}

#[async_trait]
impl GeocodingGateway for NominatimGateway {
    async fn search(&self, text: &str) -> Result<Vec<Place>, GatewayError> {
        const SERVICE: &str = "Nominatim search";

        let request = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("q", text.to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
            ]);

        let body = fetch_body(SERVICE, request).await?;
        decode_places(SERVICE, &body)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, GatewayError> {
        const SERVICE: &str = "Nominatim reverse";

        let request = self
            .http
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinate.latitude().to_string()),
                ("lon", coordinate.longitude().to_string()),
            ]);

        let body = fetch_body(SERVICE, request).await?;
        decode_reverse(SERVICE, &body)
    }
}
