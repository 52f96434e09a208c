//! WMO weather interpretation codes as returned by Open-Meteo.
//! See: https://open-meteo.com/en/docs#weathervariables

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherCodeInfo {
    pub label: &'static str,
    pub icon: &'static str,
}

/// Entry for codes outside the table (and for a missing code).
pub const UNKNOWN: WeatherCodeInfo = WeatherCodeInfo {
    label: "Unknown",
    icon: "❔",
};

const fn entry(label: &'static str, icon: &'static str) -> WeatherCodeInfo {
    WeatherCodeInfo { label, icon }
}

pub fn describe(code: i32) -> WeatherCodeInfo {
    match code {
        0 => entry("Clear sky", "☀️"),
        1 => entry("Mainly clear", "🌤️"),
        2 => entry("Partly cloudy", "⛅"),
        3 => entry("Overcast", "☁️"),
        45 => entry("Fog", "🌫️"),
        48 => entry("Depositing rime fog", "🌫️"),
        51 => entry("Light drizzle", "🌦️"),
        53 => entry("Moderate drizzle", "🌦️"),
        55 => entry("Dense drizzle", "🌧️"),
        56 => entry("Light freezing drizzle", "🌧️"),
        57 => entry("Dense freezing drizzle", "🌧️"),
        61 => entry("Slight rain", "🌦️"),
        63 => entry("Moderate rain", "🌧️"),
        65 => entry("Heavy rain", "🌧️"),
        66 => entry("Light freezing rain", "🌧️"),
        67 => entry("Heavy freezing rain", "🌧️"),
        71 => entry("Slight snowfall", "🌨️"),
        73 => entry("Moderate snowfall", "🌨️"),
        75 => entry("Heavy snowfall", "❄️"),
        77 => entry("Snow grains", "🌨️"),
        80 => entry("Slight rain showers", "🌦️"),
        81 => entry("Moderate rain showers", "🌧️"),
        82 => entry("Violent rain showers", "⛈️"),
        85 => entry("Slight snow showers", "🌨️"),
        86 => entry("Heavy snow showers", "❄️"),
        95 => entry("Thunderstorm", "⛈️"),
        96 => entry("Thunderstorm with slight hail", "⛈️"),
        99 => entry("Thunderstorm with heavy hail", "⛈️"),
        _ => UNKNOWN,
    }
}

/// Like [`describe`], for payloads where the code may be absent.
pub fn describe_opt(code: Option<i32>) -> WeatherCodeInfo {
    code.map(describe).unwrap_or(UNKNOWN)
}
