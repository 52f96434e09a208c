use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::GatewayError,
    model::{Coordinate, ForecastPayload, Place},
};

use super::{
    ForecastGateway, ForecastQuery, GeocodingGateway, fetch_body,
    wire::{decode_forecast, decode_places, decode_reverse},
};

/// Client for the dashboard's relay service.
#[derive(Debug, Clone)]
pub struct RelayGateway {
    base_url: String,
    http: Client,
}

impl RelayGateway {
    pub fn new(base_url: &str, http: Client) -> Self {
        Self {
            base_url: super::base_url(base_url),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ForecastGateway for RelayGateway {
    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastPayload, GatewayError> {
        const SERVICE: &str = "relay forecast";

        let request = self.http.get(self.url("/weather")).query(&[
            ("lat", query.coordinate.latitude().to_string()),
            ("lon", query.coordinate.longitude().to_string()),
            ("tz", query.timezone.clone()),
        ]);

        let body = fetch_body(SERVICE, request).await?;
        decode_forecast(SERVICE, &body)
    }
}

#[async_trait]
impl GeocodingGateway for RelayGateway {
    async fn search(&self, text: &str) -> Result<Vec<Place>, GatewayError> {
        const SERVICE: &str = "relay search";

        let request = self.http.get(self.url("/api/search")).query(&[("q", text)]);

        let body = fetch_body(SERVICE, request).await?;
        decode_places(SERVICE, &body)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, GatewayError> {
        const SERVICE: &str = "relay reverse geocode";

        let request = self.http.get(self.url("/api/reverse")).query(&[
            ("lat", coordinate.latitude().to_string()),
            ("lon", coordinate.longitude().to_string()),
        ]);

        let body = fetch_body(SERVICE, request).await?;
        decode_reverse(SERVICE, &body)
    }
}
