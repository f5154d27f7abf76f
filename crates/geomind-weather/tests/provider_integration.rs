//! Integration tests for WeatherProvider and IpLocator using wiremock.

use std::time::Duration;

use geomind_core::Coordinates;
use geomind_weather::{IpLocator, LocationError, LocationSource, WeatherError, WeatherProvider};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body(temp: f64, code: i32) -> serde_json::Value {
    serde_json::json!({
        "latitude": 37.76,
        "longitude": -122.42,
        "current": {
            "time": "2026-10-18T12:00",
            "interval": 900,
            "temperature_2m": temp,
            "weather_code": code,
            "wind_speed_10m": 14.4,
            "relative_humidity_2m": 68
        }
    })
}

fn provider(server: &MockServer) -> WeatherProvider {
    WeatherProvider::with_base_url(&format!("{}/v1/forecast", server.uri()), Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn test_fetch_sends_expected_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "37.7"))
        .and(query_param("longitude", "-122.4"))
        .and(query_param(
            "current",
            "temperature_2m,weather_code,wind_speed_10m,relative_humidity_2m",
        ))
        .and(query_param("temperature_unit", "celsius"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(18.5, 2)))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = provider(&server)
        .fetch(Coordinates::new(37.7, -122.4))
        .await
        .unwrap();

    assert_eq!(snapshot.temperature, 18.5);
    assert_eq!(snapshot.weather_code, 2);
    assert_eq!(snapshot.wind_speed, 14.4);
    assert_eq!(snapshot.humidity, 68);
    assert_eq!(snapshot.condition().label(), "Cloudy");
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = provider(&server)
        .fetch(Coordinates::new(0.0, 0.0))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Status(500)));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "current": {} })),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .fetch(Coordinates::new(0.0, 0.0))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn test_ip_locator_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 47.6062,
            "lon": -122.3321,
            "city": "Seattle"
        })))
        .mount(&server)
        .await;

    let locator =
        IpLocator::with_url(&format!("{}/json", server.uri()), Duration::from_secs(5)).unwrap();
    let coords = locator.locate().await.unwrap();

    assert_eq!(coords, Coordinates::new(47.6062, -122.3321));
}

#[tokio::test]
async fn test_ip_locator_refusal_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "reserved range"
        })))
        .mount(&server)
        .await;

    let locator =
        IpLocator::with_url(&format!("{}/json", server.uri()), Duration::from_secs(5)).unwrap();

    assert!(matches!(
        locator.locate().await,
        Err(LocationError::ServiceUnavailable)
    ));
}
