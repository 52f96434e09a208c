//! Plain-text rendering of dashboard state.

use chrono::{Local, NaiveDateTime};
use std::fmt::Write;
use weather_dash_core::{
    Coordinate, ForecastView, Place, SessionState, TrackingState, views::DailyRow,
};

const UV_BAR_WIDTH: f64 = 20.0;

fn temp(value: Option<f64>, symbol: &str) -> String {
    value
        .map(|v| format!("{v:.1}{symbol}"))
        .unwrap_or_else(|| "—".to_string())
}

fn num(value: Option<f64>, suffix: &str) -> String {
    value
        .map(|v| format!("{v:.0}{suffix}"))
        .unwrap_or_else(|| "—".to_string())
}

/// `2025-03-01T14:00` -> `14:00`; anything unparseable is shown as-is.
fn clock(time: &str) -> String {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| time.to_string())
}

fn uv_bar(row: &DailyRow) -> String {
    let filled = (row.uv_bar_percent / 100.0 * UV_BAR_WIDTH).round() as usize;
    format!("{:<width$}", "█".repeat(filled), width = UV_BAR_WIDTH as usize)
}

pub fn current(name: &str, coordinate: Coordinate, view: &ForecastView) -> String {
    let c = &view.current;
    let symbol = view.unit.symbol();
    let mut out = String::new();

    let _ = writeln!(out, "{name} ({coordinate})");
    let _ = writeln!(
        out,
        "{} {}  {:.1}{symbol} (feels like {})",
        c.condition.icon,
        c.condition.label,
        c.temperature,
        temp(c.apparent_temperature, symbol),
    );
    let _ = writeln!(
        out,
        "Humidity {}  Pressure {}  Clouds {}",
        num(c.humidity, "%"),
        num(c.pressure, " hPa"),
        num(c.cloud_cover, "%"),
    );
    let _ = writeln!(
        out,
        "Wind {} {}",
        num(c.wind_speed, " km/h"),
        c.wind_compass.unwrap_or(""),
    );
    let _ = writeln!(
        out,
        "Updated {}",
        view.fetched_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    out
}

pub fn full(name: &str, coordinate: Coordinate, view: &ForecastView) -> String {
    let symbol = view.unit.symbol();
    let mut out = current(name, coordinate, view);

    let _ = writeln!(out, "\nNext 24 hours");
    for h in &view.hourly {
        let _ = writeln!(
            out,
            "  {:>5}  {:>8}  rain {:>4}  wind {:>8}",
            clock(&h.time),
            temp(h.temperature, symbol),
            h.precipitation
                .map(|p| format!("{p:.1}"))
                .unwrap_or_else(|| "—".into()),
            num(h.wind_speed, " km/h"),
        );
    }

    let _ = writeln!(out, "\n7 days");
    for d in &view.daily {
        let _ = writeln!(
            out,
            "  {}  {:>8} / {:<8}  UV {} {:>4}  rain {:>5}  ☀ {} – {}",
            d.date,
            temp(d.temperature_max, symbol),
            temp(d.temperature_min, symbol),
            uv_bar(d),
            d.uv_index_max
                .map(|u| format!("{u:.1}"))
                .unwrap_or_else(|| "—".into()),
            d.precipitation_sum
                .map(|p| format!("{p:.1}"))
                .unwrap_or_else(|| "—".into()),
            d.sunrise.as_deref().map(clock).unwrap_or_default(),
            d.sunset.as_deref().map(clock).unwrap_or_default(),
        );
    }
    out
}

pub fn places(places: &[Place]) -> String {
    if places.is_empty() {
        return "No places found.\n".to_string();
    }

    let mut out = String::new();
    for (i, p) in places.iter().enumerate() {
        let _ = writeln!(out, "{:>2}. {}  ({})", i + 1, p.display_name(), p.coordinate());
    }
    out
}

pub fn status(tracking: &TrackingState, state: &SessionState) -> String {
    let mut out = String::new();

    if let Some(view) = state.view() {
        out.push_str(&current(&tracking.place_name, tracking.coordinate, &view));
    } else if state.is_loading() {
        let _ = writeln!(out, "{}: loading…", tracking.place_name);
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_extracts_hour() {
        assert_eq!(clock("2025-03-01T14:00"), "14:00");
        assert_eq!(clock("soon"), "soon");
    }

    #[test]
    fn missing_values_render_as_dash() {
        assert_eq!(temp(None, "°C"), "—");
        assert_eq!(temp(Some(21.04), "°F"), "21.0°F");
        assert_eq!(num(Some(55.4), "%"), "55%");
    }

    #[test]
    fn empty_search_says_so() {
        assert_eq!(places(&[]), "No places found.\n");
    }

    #[test]
    fn places_are_numbered_from_one() {
        let list = vec![Place::new(
            "Oslo, Norway",
            Coordinate::new(59.91, 10.75).unwrap(),
        )];
        assert_eq!(places(&list), " 1. Oslo, Norway  (59.9100, 10.7500)\n");
    }
}
