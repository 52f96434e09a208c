//! Gateway tests against mock HTTP servers.

use std::time::Duration;

use weather_dash_core::{
    Coordinate, ForecastGateway, ForecastQuery, GatewayError, GeocodingGateway,
    gateway::{
        http_client,
        relay::RelayGateway,
        upstream::{NominatimGateway, OpenMeteoGateway},
    },
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    http_client(Duration::from_secs(5), "WeatherApp/1.0").unwrap()
}

fn forecast_body(hours: usize) -> serde_json::Value {
    let times: Vec<String> = (0..hours)
        .map(|i| format!("2025-03-{:02}T{:02}:00", 1 + i / 24, i % 24))
        .collect();
    let temps: Vec<f64> = (0..hours).map(|i| 10.0 + i as f64).collect();

    serde_json::json!({
        "timezone": "Asia/Kolkata",
        "current": {
            "time": "2025-03-01T12:00",
            "temperature_2m": 27.5,
            "apparent_temperature": 29.1,
            "relative_humidity_2m": 52,
            "is_day": 1,
            "precipitation": 0.0,
            "wind_speed_10m": 9.3,
            "wind_direction_10m": 300,
            "weather_code": 3,
            "surface_pressure": 1004.2,
            "cloud_cover": 90
        },
        "hourly": {
            "time": times,
            "temperature_2m": temps,
            "precipitation": vec![0.0; hours],
            "wind_speed_10m": vec![4.0; hours]
        },
        "daily": {
            "time": ["2025-03-01", "2025-03-02"],
            "temperature_2m_max": [31.0, 30.0],
            "temperature_2m_min": [18.0, 17.5],
            "uv_index_max": [8.1, 6.0],
            "precipitation_sum": [0.0, 1.2],
            "sunrise": ["2025-03-01T06:44", "2025-03-02T06:43"],
            "sunset": ["2025-03-01T18:20", "2025-03-02T18:21"]
        }
    })
}

fn delhi() -> Coordinate {
    Coordinate::new(28.6139, 77.209).unwrap()
}

#[tokio::test]
async fn relay_forecast_sends_coordinates_and_timezone() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "28.6139"))
        .and(query_param("lon", "77.209"))
        .and(query_param("tz", "Asia/Kolkata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(48)))
        .expect(1)
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let payload = relay
        .forecast(&ForecastQuery {
            coordinate: delhi(),
            timezone: "Asia/Kolkata".into(),
        })
        .await
        .unwrap();

    assert_eq!(payload.current.temperature, 27.5);
    assert_eq!(payload.hourly.len(), 48);
    assert_eq!(payload.hourly[0].temperature, Some(10.0));
    assert_eq!(payload.hourly[47].temperature, Some(57.0));
    assert_eq!(payload.daily.len(), 2);
}

#[tokio::test]
async fn relay_error_marker_is_reported_as_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": true,
            "reason": "Parameter 'latitude' is out of range"
        })))
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let err = relay
        .forecast(&ForecastQuery {
            coordinate: delhi(),
            timezone: "auto".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Upstream { .. }));
}

#[tokio::test]
async fn non_success_status_is_a_gateway_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let err = relay
        .forecast(&ForecastQuery {
            coordinate: delhi(),
            timezone: "auto".into(),
        })
        .await
        .unwrap_err();

    match err {
        GatewayError::Status { status, body, .. } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn relay_search_returns_places_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("q", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"display_name": "Paris, Île-de-France, France", "lat": "48.8534951", "lon": "2.3483915"},
            {"display_name": "Paris, Lamar County, Texas, United States", "lat": "33.6617962", "lon": "-95.555513"}
        ])))
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let places = relay.search("Paris").await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].display_name(), "Paris, Île-de-France, France");
    assert_eq!(places[1].coordinate().longitude(), -95.555513);
}

#[tokio::test]
async fn relay_reverse_handles_missing_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/reverse"))
        .and(query_param("lat", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "Unable to geocode"})),
        )
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let name = relay
        .reverse(Coordinate::new(0.0, 0.0).unwrap())
        .await
        .unwrap();

    assert_eq!(name, None);
}

#[tokio::test]
async fn open_meteo_requests_the_dashboard_variables() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "28.6139"))
        .and(query_param("forecast_days", "7"))
        .and(query_param("timezone", "auto"))
        .and(query_param(
            "daily",
            "temperature_2m_max,temperature_2m_min,uv_index_max,sunrise,sunset,precipitation_sum",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(24)))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = OpenMeteoGateway::new(&server.uri(), client());
    let payload = gateway
        .forecast(&ForecastQuery {
            coordinate: delhi(),
            timezone: "auto".into(),
        })
        .await
        .unwrap();

    assert_eq!(payload.hourly.len(), 24);
    assert_eq!(payload.timezone.as_deref(), Some("Asia/Kolkata"));
}

#[tokio::test]
async fn nominatim_search_sends_user_agent_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("format", "json"))
        .and(query_param("q", "Oslo"))
        .and(query_param("limit", "5"))
        .and(header("user-agent", "WeatherApp/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"display_name": "Oslo, Norway", "lat": "59.9133301", "lon": "10.7389701"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = NominatimGateway::new(&server.uri(), client());
    let places = gateway.search("Oslo").await.unwrap();

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].display_name(), "Oslo, Norway");
}

#[tokio::test]
async fn malformed_search_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let relay = RelayGateway::new(&server.uri(), client());
    let err = relay.search("x").await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode { .. }));
}
