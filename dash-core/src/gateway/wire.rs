//! Provider JSON shapes and their normalization.
//!
//! The relay forwards Open-Meteo and Nominatim bodies untouched, so both gateway
//! flavors decode the same types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    error::GatewayError,
    model::{Coordinate, CurrentConditions, DailySample, ForecastPayload, HourlySample, Place},
};

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: Option<String>,
    temperature_2m: f64,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    surface_pressure: Option<f64>,
    precipitation: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    cloud_cover: Option<f64>,
    is_day: Option<u8>,
    weather_code: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    cloud_cover: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    uv_index_max: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    sunrise: Vec<Option<String>>,
    sunset: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct OmForecast {
    current: OmCurrent,
    #[serde(default)]
    hourly: OmHourly,
    #[serde(default)]
    daily: OmDaily,
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NmPlace {
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct NmReverse {
    display_name: Option<String>,
}

fn column<T: Clone>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).cloned().flatten()
}

impl OmForecast {
    fn into_payload(self, fetched_at: DateTime<Utc>) -> ForecastPayload {
        let c = self.current;
        let current = CurrentConditions {
            time: c.time,
            temperature: c.temperature_2m,
            apparent_temperature: c.apparent_temperature,
            humidity: c.relative_humidity_2m,
            pressure: c.surface_pressure,
            precipitation: c.precipitation,
            wind_speed: c.wind_speed_10m,
            wind_direction: c.wind_direction_10m,
            cloud_cover: c.cloud_cover,
            is_day: c.is_day.map(|d| d != 0),
            weather_code: c.weather_code,
        };

        let h = &self.hourly;
        let hourly = h
            .time
            .iter()
            .enumerate()
            .map(|(i, time)| HourlySample {
                time: time.clone(),
                temperature: column(&h.temperature_2m, i),
                humidity: column(&h.relative_humidity_2m, i),
                precipitation: column(&h.precipitation, i),
                cloud_cover: column(&h.cloud_cover, i),
                wind_speed: column(&h.wind_speed_10m, i),
            })
            .collect();

        let d = &self.daily;
        let daily = d
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| DailySample {
                date: date.clone(),
                temperature_max: column(&d.temperature_2m_max, i),
                temperature_min: column(&d.temperature_2m_min, i),
                uv_index_max: column(&d.uv_index_max, i),
                precipitation_sum: column(&d.precipitation_sum, i),
                sunrise: column(&d.sunrise, i),
                sunset: column(&d.sunset, i),
            })
            .collect();

        ForecastPayload {
            current,
            hourly,
            daily,
            timezone: self.timezone,
            fetched_at,
        }
    }
}

/// Decode a forecast body. `{"error": true, "reason": ...}` is a failure even on 200.
pub(crate) fn decode_forecast(
    service: &'static str,
    body: &str,
) -> Result<ForecastPayload, GatewayError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|source| GatewayError::Decode { service, source })?;

    if value.get("error").and_then(|e| e.as_bool()) == Some(true) {
        let reason = value
            .get("reason")
            .and_then(|r| r.as_str())
            .unwrap_or("no reason given")
            .to_string();
        return Err(GatewayError::Upstream { service, reason });
    }

    let parsed: OmForecast =
        serde_json::from_value(value).map_err(|source| GatewayError::Decode { service, source })?;

    Ok(parsed.into_payload(Utc::now()))
}

/// Decode a place search body. Entries with unusable coordinates are skipped.
pub(crate) fn decode_places(service: &'static str, body: &str) -> Result<Vec<Place>, GatewayError> {
    let parsed: Vec<NmPlace> =
        serde_json::from_str(body).map_err(|source| GatewayError::Decode { service, source })?;

    let places = parsed
        .into_iter()
        .filter_map(|p| {
            let lat = p.lat.trim().parse::<f64>().ok()?;
            let lon = p.lon.trim().parse::<f64>().ok()?;
            match Coordinate::new(lat, lon) {
                Ok(coordinate) => Some(Place::new(p.display_name, coordinate)),
                Err(e) => {
                    tracing::debug!("Skipping search result '{}': {}", p.display_name, e);
                    None
                }
            }
        })
        .collect();

    Ok(places)
}

pub(crate) fn decode_reverse(
    service: &'static str,
    body: &str,
) -> Result<Option<String>, GatewayError> {
    let parsed: NmReverse =
        serde_json::from_str(body).map_err(|source| GatewayError::Decode { service, source })?;

    Ok(parsed.display_name.filter(|n| !n.trim().is_empty()))
}
