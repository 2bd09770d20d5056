//! End-to-end tests of the routes against the bundled fixtures.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::header::ACCEPT;

use crate::reports::ReportStore;
use crate::sncf::{CallCounts, MockSncfClient, TransitApi};

use super::{AppState, ViewConfig, create_router};

const MOCK_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/mock");
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

struct TestServer {
    base: String,
    http: reqwest::Client,
    calls: Arc<CallCounts>,
}

impl TestServer {
    async fn start() -> Self {
        let mock = MockSncfClient::from_dir(MOCK_DIR).unwrap();
        let calls = mock.calls();
        let api: Arc<dyn TransitApi> = Arc::new(mock);

        let reports = Arc::new(ReportStore::new());
        reports.refresh_disruptions(api.as_ref()).await.unwrap();
        reports.refresh_equipment(api.as_ref()).await.unwrap();

        let config = ViewConfig::default().with_debounce(Duration::ZERO);
        let app = create_router(AppState::new(api, reports, config), STATIC_DIR);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            http: reqwest::Client::new(),
            calls,
        }
    }

    async fn html(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .header(ACCEPT, "text/html")
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.text().await.unwrap())
    }
}

#[tokio::test]
async fn health_check() {
    let server = TestServer::start().await;
    let (status, body) = server.html("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn index_page_renders_empty_session() {
    let server = TestServer::start().await;
    let (status, body) = server.html("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/static/app.js"));
}

#[tokio::test]
async fn search_returns_suggestions() {
    let server = TestServer::start().await;

    let (status, body) = server.html("/search?q=Gare%20de%20Lyon").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Paris Gare de Lyon"));
    assert!(body.contains("stop_area:SNCF:87686006"));

    let json: serde_json::Value = server
        .http
        .get(format!("{}/search?q=Lyon", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let stations = json["stations"].as_array().unwrap();
    assert_eq!(stations.len(), 2);
    assert_eq!(stations[0]["name"], "Paris Gare de Lyon (Paris)");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn short_search_does_not_hit_the_api() {
    let server = TestServer::start().await;
    let (status, _) = server.html("/search?q=P").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.calls.search.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn overlong_search_is_rejected() {
    let server = TestServer::start().await;
    let query = "a".repeat(101);
    let (status, _) = server.html(&format!("/search?q={}", query)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn board_then_journey() {
    let server = TestServer::start().await;

    server.html("/search?q=Paris").await;
    let (status, board) = server.html("/stations/stop_area:SNCF:87686006").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.calls.departures.load(Ordering::SeqCst), 1);
    assert!(board.contains("Départs de Paris Gare de Lyon"));
    assert!(board.contains("6611_0"));
    assert!(board.contains("+7 min"));
    assert!(board.contains("Travaux entre Lyon et Avignon"));

    let (status, journey) = server.html("/departures/6611_0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.calls.journey.load(Ordering::SeqCst), 1);

    assert!(journey.contains("Travaux entre Lyon et Avignon"));
    let stops = &journey[journey.find("class=\"stops\"").unwrap()..];
    let paris = stops.find("Paris Gare de Lyon").unwrap();
    let lyon = stops.find("Lyon Part Dieu").unwrap();
    let marseille = stops.find("Marseille Saint-Charles").unwrap();
    assert!(paris < lyon);
    assert!(lyon < marseille);

    let response = server
        .http
        .post(format!("{}/journey/close", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // The board is kept after closing the journey
    let (_, page) = server.html("/").await;
    assert!(page.contains("Départs de Paris Gare de Lyon"));
    assert!(!page.contains("class=\"stops\""));
}

#[tokio::test]
async fn station_by_url_uses_name_parameter() {
    let server = TestServer::start().await;
    let (status, board) = server
        .html("/stations/stop_area:SNCF:87686006?name=Gare%20de%20Lyon")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(board.contains("Départs de Gare de Lyon"));
}

#[tokio::test]
async fn unknown_targets_are_not_found() {
    let server = TestServer::start().await;

    let (status, _) = server.html("/stations/stop_area:SNCF:0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.html("/departures/9999_0").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(server.calls.journey.load(Ordering::SeqCst), 0);
}
