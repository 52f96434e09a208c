use crate::{
    Config,
    error::GatewayError,
    gateway::{
        relay::RelayGateway,
        upstream::{NominatimGateway, OpenMeteoGateway},
    },
    model::{Coordinate, ForecastPayload, Place},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt::Debug, sync::Arc, time::Duration};

pub mod relay;
pub mod upstream;
mod wire;

/// Which backend the gateways talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// The dashboard's own relay service (`/weather`, `/api/search`, `/api/reverse`).
    #[default]
    Relay,
    /// Open-Meteo and Nominatim, called directly.
    Direct,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Relay => "relay",
            GatewayKind::Direct => "direct",
        }
    }

    pub const fn all() -> &'static [GatewayKind] {
        &[GatewayKind::Relay, GatewayKind::Direct]
    }
}

impl std::fmt::Display for GatewayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for GatewayKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "relay" => Ok(GatewayKind::Relay),
            "direct" => Ok(GatewayKind::Direct),
            _ => Err(anyhow::anyhow!(
                "Unknown gateway '{value}'. Supported gateways: relay, direct."
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub coordinate: Coordinate,
    /// IANA timezone identifier, or `auto` to let the provider decide.
    pub timezone: String,
}

#[async_trait]
pub trait ForecastGateway: Send + Sync + Debug {
    async fn forecast(&self, query: &ForecastQuery) -> Result<ForecastPayload, GatewayError>;
}

#[async_trait]
pub trait GeocodingGateway: Send + Sync + Debug {
    async fn search(&self, text: &str) -> Result<Vec<Place>, GatewayError>;

    /// `Ok(None)` when the service knows no name for the coordinate.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, GatewayError>;
}

/// The pair of gateways the dashboard runs against.
#[derive(Debug, Clone)]
pub struct Gateways {
    pub forecast: Arc<dyn ForecastGateway>,
    pub geocoding: Arc<dyn GeocodingGateway>,
}

/// Construct both gateways for the configured backend.
pub fn gateways_from_config(config: &Config) -> anyhow::Result<Gateways> {
    let http = http_client(config.request_timeout(), &config.user_agent)?;

    let gateways = match config.gateway {
        GatewayKind::Relay => {
            let relay = Arc::new(RelayGateway::new(&config.backend_url, http));
            Gateways {
                forecast: relay.clone(),
                geocoding: relay,
            }
        }
        GatewayKind::Direct => Gateways {
            forecast: Arc::new(OpenMeteoGateway::new(&config.forecast_url, http.clone())),
            geocoding: Arc::new(NominatimGateway::new(&config.geocoding_url, http)),
        },
    };

    Ok(gateways)
}

pub fn http_client(timeout: Duration, user_agent: &str) -> Result<Client, GatewayError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(GatewayError::Client)
}

/// Send a request and return the body of a 2xx response.
pub(crate) async fn fetch_body(
    service: &'static str,
    request: RequestBuilder,
) -> Result<String, GatewayError> {
    let res = request
        .send()
        .await
        .map_err(|source| GatewayError::Network { service, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| GatewayError::Network { service, source })?;

    if !status.is_success() {
        return Err(GatewayError::Status {
            service,
            status,
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

pub(crate) fn base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
