//! Integration tests for the Met Office client and forecast operations using wiremock
//!
//! These tests run the full pipeline against a mock HTTP server, covering the
//! request shape, status classification and network failure handling.

use std::time::Duration;

use serde_json::{Value, json};
use ukweather_core::{
    Config, ErrorKind, ForecastDocument, ForecastService, MetOfficeClient, ResponseFormat,
    config::ApiKey,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

const TEST_KEY: &str = "test-api-key";

/// Hourly DataHub response with `steps` entries starting 2024-01-15T00:00Z.
fn hourly_response(steps: usize) -> Value {
    let series: Vec<Value> = (0..steps)
        .map(|i| {
            json!({
                "time": format!("2024-01-{:02}T{:02}:00Z", 15 + i / 24, i % 24),
                "screenTemperature": 6.2,
                "feelsLikeTemperature": 3.9,
                "windSpeed10m": 5.14,
                "windDirectionFrom10m": 240,
                "totalPrecipAmount": 0.11,
                "screenRelativeHumidity": 88.2,
                "visibility": 9500,
                "mslp": 100940,
                "uvIndex": 0,
                "significantWeatherCode": 12
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-0.1278, 51.5074, 15.0] },
            "properties": {
                "location": { "name": "London" },
                "requestPointDistance": 120.5,
                "modelRunDate": "2024-01-15T00:00Z",
                "timeSeries": series
            }
        }],
        "parameters": [{ "screenTemperature": { "type": "Parameter" } }]
    })
}

fn config_for(mock_server: &MockServer, api_key: Option<&str>) -> Config {
    Config {
        api_key: api_key.map(ApiKey::new),
        base_url: Some(format!("{}/point", mock_server.uri())),
        timeout_secs: Some(1),
    }
}

/// Create a service backed by a real client pointed at the mock server
///
/// # Panics
///
/// Panics if the client cannot be created (should not happen in tests).
fn create_service(config: &Config) -> ForecastService<MetOfficeClient> {
    ForecastService::new(MetOfficeClient::new(config).expect("Failed to create client"))
}

async fn mount(mock_server: &MockServer, endpoint: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/point/{endpoint}")))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Success scenarios
// ============================================================================

#[tokio::test]
async fn hourly_markdown_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/point/hourly"))
        .and(query_param("latitude", "51.5074"))
        .and(query_param("longitude", "-0.1278"))
        .and(header("apikey", TEST_KEY))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_response(48)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));
    let out = service
        .get_hourly_forecast(51.5074, -0.1278, ResponseFormat::Markdown)
        .await;

    assert!(!out.starts_with("Error: "), "unexpected error: {out}");
    assert_eq!(out.lines().filter(|l| l.starts_with("## ")).count(), 20);
    assert!(out.contains("**Location:** London"));
    assert!(out.contains("- **Weather:** Light rain (code 12)"));
    assert!(!out.contains("Response truncated"));
}

#[tokio::test]
async fn json_output_roundtrips_to_the_upstream_document() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "three-hourly",
        ResponseTemplate::new(200).set_body_json(hourly_response(20)),
    )
    .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));
    let out = service
        .get_three_hourly_forecast(51.5074, -0.1278, ResponseFormat::Json)
        .await;

    let rendered: ForecastDocument = serde_json::from_str(&out).expect("valid JSON document");
    let upstream: ForecastDocument =
        serde_json::from_value(hourly_response(20)).expect("valid fixture");
    assert_eq!(rendered, upstream);
}

#[tokio::test]
async fn daily_operation_uses_daily_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/point/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-3.1883, 55.9533, 47.0] },
                "properties": {
                    "timeSeries": [{
                        "time": "2024-01-15T00:00Z",
                        "dayMaxScreenTemperature": 7.4,
                        "nightMinScreenTemperature": 1.2,
                        "daySignificantWeatherCode": 3
                    }]
                }
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));
    let out = service
        .get_daily_forecast(55.9533, -3.1883, ResponseFormat::Markdown)
        .await;

    assert!(out.contains("# Weather Forecast (Daily)"));
    assert!(out.contains("- **Temperature:** 7.4 °C"));
    assert!(out.contains("- **Weather:** Partly cloudy (day) (code 3)"));
}

// ============================================================================
// Failures that never reach the network
// ============================================================================

#[tokio::test]
async fn invalid_coordinates_make_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_response(1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));

    assert_eq!(
        service.get_daily_forecast(100.0, 0.0, ResponseFormat::Markdown).await,
        "Error: Latitude must be between -90 and 90 degrees"
    );
    assert_eq!(
        service.get_hourly_forecast(0.0, -181.0, ResponseFormat::Json).await,
        "Error: Longitude must be between -180 and 180 degrees"
    );
}

#[tokio::test]
async fn missing_api_key_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_response(1)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = create_service(&config_for(&mock_server, None));
    let out = service
        .get_hourly_forecast(51.5074, -0.1278, ResponseFormat::Markdown)
        .await;

    assert!(out.starts_with("Error: "));
    assert!(out.contains("MET_OFFICE_API_KEY"));
}

// ============================================================================
// Upstream error classification
// ============================================================================

async fn run_against_status(status: u16, body: &str) -> String {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "hourly",
        ResponseTemplate::new(status).set_body_string(body),
    )
    .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));
    service
        .get_hourly_forecast(51.5074, -0.1278, ResponseFormat::Markdown)
        .await
}

#[tokio::test]
async fn status_401_is_authentication_failure() {
    let out = run_against_status(401, r#"{"message":"Invalid credentials"}"#).await;
    assert_eq!(out, ErrorKind::AuthenticationFailed.user_message());
}

#[tokio::test]
async fn status_403_is_authentication_failure() {
    let out = run_against_status(403, "").await;
    assert_eq!(out, ErrorKind::AuthenticationFailed.user_message());
}

#[tokio::test]
async fn status_429_is_rate_limited() {
    let out = run_against_status(429, "Too Many Requests").await;
    assert_eq!(out, ErrorKind::RateLimited.user_message());
}

#[tokio::test]
async fn status_404_is_location_unavailable() {
    let out = run_against_status(404, "").await;
    assert_eq!(out, ErrorKind::LocationUnavailable.user_message());
}

#[tokio::test]
async fn server_error_does_not_leak_body() {
    let out = run_against_status(500, "internal trace id=abc123").await;

    assert_eq!(out, ErrorKind::UpstreamMalformedResponse.user_message());
    assert!(!out.contains("abc123"));
}

#[tokio::test]
async fn unparseable_body_is_malformed_response() {
    let out = run_against_status(200, "<html>maintenance</html>").await;
    assert_eq!(out, ErrorKind::UpstreamMalformedResponse.user_message());
}

#[tokio::test]
async fn empty_feature_collection_is_location_unavailable() {
    let out = run_against_status(200, r#"{"type":"FeatureCollection","features":[]}"#).await;
    assert_eq!(out, ErrorKind::LocationUnavailable.user_message());
}

// ============================================================================
// Network failures
// ============================================================================

#[tokio::test]
async fn slow_upstream_times_out() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "hourly",
        ResponseTemplate::new(200)
            .set_body_json(hourly_response(1))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let service = create_service(&config_for(&mock_server, Some(TEST_KEY)));
    let out = service
        .get_hourly_forecast(51.5074, -0.1278, ResponseFormat::Markdown)
        .await;

    assert_eq!(out, ErrorKind::UpstreamTimeout.user_message());
}

#[tokio::test]
async fn connection_refused_is_unreachable() {
    // Grab a free port and release it so nothing is listening there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("local port")
        .port();

    let config = Config {
        api_key: Some(ApiKey::new(TEST_KEY)),
        base_url: Some(format!("http://127.0.0.1:{port}/point")),
        timeout_secs: Some(2),
    };
    let service = create_service(&config);
    let out = service
        .get_hourly_forecast(51.5074, -0.1278, ResponseFormat::Markdown)
        .await;

    assert_eq!(out, ErrorKind::UpstreamUnreachable.user_message());
}
