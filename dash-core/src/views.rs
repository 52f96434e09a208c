//! Display projections of a forecast payload.
//!
//! Everything here is a pure function of the payload and the active unit, so a
//! unit change never needs a refetch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    model::{ForecastPayload, HourlySample},
    units::Unit,
    weather_code::{self, WeatherCodeInfo},
};

pub const HOURLY_WINDOW: usize = 24;
/// UV index that fills the whole bar.
pub const UV_REFERENCE_MAX: f64 = 11.0;
const UV_BAR_MIN_PERCENT: f64 = 5.0;
const UV_BAR_MAX_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub temperature: f64,
    pub apparent_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub precipitation: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_compass: Option<&'static str>,
    pub cloud_cover: Option<f64>,
    pub is_day: Option<bool>,
    pub condition: WeatherCodeInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyPoint {
    pub time: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: String,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub uv_index_max: Option<f64>,
    pub uv_bar_percent: f64,
    pub precipitation_sum: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastView {
    pub unit: Unit,
    pub current: CurrentView,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyRow>,
    pub fetched_at: DateTime<Utc>,
}

/// The first 24 samples, in delivered order.
pub fn hourly_window(payload: &ForecastPayload) -> &[HourlySample] {
    let end = payload.hourly.len().min(HOURLY_WINDOW);
    &payload.hourly[..end]
}

pub fn current_view(payload: &ForecastPayload, unit: Unit) -> CurrentView {
    let c = &payload.current;
    CurrentView {
        temperature: unit.convert(c.temperature),
        apparent_temperature: c.apparent_temperature.map(|t| unit.convert(t)),
        humidity: c.humidity,
        pressure: c.pressure,
        precipitation: c.precipitation,
        wind_speed: c.wind_speed,
        wind_direction: c.wind_direction,
        wind_compass: c.wind_direction.map(compass_point),
        cloud_cover: c.cloud_cover,
        is_day: c.is_day,
        condition: weather_code::describe_opt(c.weather_code),
    }
}

pub fn converted_hourly(payload: &ForecastPayload, unit: Unit) -> Vec<HourlyPoint> {
    hourly_window(payload)
        .iter()
        .map(|h| HourlyPoint {
            time: h.time.clone(),
            temperature: h.temperature.map(|t| unit.convert(t)),
            humidity: h.humidity,
            precipitation: h.precipitation,
            cloud_cover: h.cloud_cover,
            wind_speed: h.wind_speed,
        })
        .collect()
}

pub fn daily_summary(payload: &ForecastPayload, unit: Unit) -> Vec<DailyRow> {
    payload
        .daily
        .iter()
        .map(|d| DailyRow {
            date: d.date.clone(),
            temperature_max: d.temperature_max.map(|t| unit.convert(t)),
            temperature_min: d.temperature_min.map(|t| unit.convert(t)),
            uv_index_max: d.uv_index_max,
            uv_bar_percent: uv_bar_percent(d.uv_index_max),
            precipitation_sum: d.precipitation_sum,
            sunrise: d.sunrise.clone(),
            sunset: d.sunset.clone(),
        })
        .collect()
}

/// Width of the UV bar: the index scaled against 0–11, kept within 5–100%.
pub fn uv_bar_percent(uv: Option<f64>) -> f64 {
    let uv = uv.filter(|v| v.is_finite()).unwrap_or(0.0);
    (uv / UV_REFERENCE_MAX * 100.0).clamp(UV_BAR_MIN_PERCENT, UV_BAR_MAX_PERCENT)
}

/// 16-point compass name for a bearing in degrees.
pub fn compass_point(degrees: f64) -> &'static str {
    const POINTS: [&str; 16] = [
        "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
        "NNW",
    ];
    let index = (degrees.rem_euclid(360.0) / 22.5).round() as usize % POINTS.len();
    POINTS[index]
}

pub fn compose(payload: &ForecastPayload, unit: Unit) -> ForecastView {
    ForecastView {
        unit,
        current: current_view(payload, unit),
        hourly: converted_hourly(payload, unit),
        daily: daily_summary(payload, unit),
        fetched_at: payload.fetched_at,
    }
}
