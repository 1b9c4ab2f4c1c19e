#![allow(clippy::unwrap_used)]
// Integration tests for `ProxyClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shoremap_api::{Error, ProxyClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ProxyClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ProxyClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

// ── Collection tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_beaches() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/beaches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "64f1c0a1",
                "name": "Huntington City Beach",
                "latitude": 33.6553,
                "longitude": -118.0052,
                "restrooms": "Yes"
            },
            {
                "id": "64f1c0a2",
                "name": "Bolsa Chica State Beach"
            }
        ])))
        .mount(&server)
        .await;

    let beaches = client.list_beaches().await.unwrap();

    assert_eq!(beaches.len(), 2);
    assert_eq!(beaches[0].id, "64f1c0a1");
    assert_eq!(beaches[0].str_field("name"), Some("Huntington City Beach"));
    assert_eq!(beaches[0].str_field("restrooms"), Some("Yes"));
    assert_eq!(beaches[1].f64_field("latitude"), None);
}

#[tokio::test]
async fn test_list_pois() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/pois"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "venice-beach-skate-park",
            "name": "Venice Beach Skate Park",
            "categoryName": "Recreation & Sports",
            "geometry": { "type": "Point", "coordinates": [-118.4681, 33.985] }
        }])))
        .mount(&server)
        .await;

    let pois = client.list_pois().await.unwrap();

    assert_eq!(pois.len(), 1);
    assert_eq!(pois[0].str_field("categoryName"), Some("Recreation & Sports"));
    assert!(pois[0].field("geometry").is_some());
}

#[tokio::test]
async fn test_get_weather() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/weather/64f1c0a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "temperature": 71.6,
            "humidity": 64,
            "sunset": "2025-07-01T03:05:00Z"
        })))
        .mount(&server)
        .await;

    let weather = tokio_test::assert_ok!(client.get_weather("64f1c0a1").await);

    assert_eq!(weather.get("humidity"), Some(&json!(64)));
    assert_eq!(weather.get("sunset"), Some(&json!("2025-07-01T03:05:00Z")));
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_status_error_carries_code_and_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/beaches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Failed to fetch beaches"))
        .mount(&server)
        .await;

    let err = client.list_beaches().await.unwrap_err();

    match &err {
        Error::Status {
            status, message, ..
        } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Failed to fetch beaches");
        }
        other => panic!("expected Status error, got: {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_weather_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/weather/unknown"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_weather("unknown").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/pois"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_pois().await;

    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Port 9 (discard) is closed on CI hosts.
    let client = ProxyClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:9").unwrap(),
    );

    let err = client.list_beaches().await.unwrap_err();
    assert!(
        matches!(err, Error::Transport(_)),
        "expected Transport error, got: {err:?}"
    );
}
