//! SNCF Navitia HTTP client.
//!
//! Provides async methods for querying the SNCF coverage of the Navitia API.
//! Handles authentication, concurrency limiting, and conversion to domain
//! types.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Local, NaiveDateTime};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{
    Departure, Disruption, EquipmentReport, Station, Stop, format_compact_datetime,
};

use super::convert::{
    convert_departures, convert_disruptions, convert_equipment_reports, convert_journey,
    convert_places,
};
use super::error::SncfError;
use super::types::{
    DeparturesResponse, DisruptionsResponse, EquipmentReportsResponse, PlacesResponse,
    VehicleJourneysResponse,
};

/// Default base URL for the SNCF coverage.
pub const DEFAULT_BASE_URL: &str = "https://api.sncf.com/v1/coverage/sncf";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Maximum number of station suggestions.
pub const SEARCH_LIMIT: usize = 10;

/// Number of departures requested per board.
const DEPARTURES_COUNT: u32 = 20;

/// Number of disruption / equipment reports requested per poll.
const REPORTS_COUNT: u32 = 50;

/// Characters of a failed body kept in decode errors.
const BODY_SNIPPET_LEN: usize = 500;

/// Configuration for the SNCF client.
#[derive(Debug, Clone)]
pub struct SncfConfig {
    /// API key, sent as the Basic auth user name
    pub api_key: String,
    /// Base URL of the coverage (defaults to production SNCF)
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl SncfConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Value of the `Authorization` header for an API key.
///
/// Navitia takes the key as the user name with an empty password.
fn basic_auth(api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{api_key}:")))
}

/// SNCF Navitia API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct SncfClient {
    http: reqwest::Client,
    base_url: Url,
    semaphore: Arc<Semaphore>,
}

impl SncfClient {
    /// Create a new SNCF client with the given configuration.
    pub fn new(config: SncfConfig) -> Result<Self, SncfError> {
        let mut headers = HeaderMap::new();

        let mut auth =
            HeaderValue::from_str(&basic_auth(&config.api_key)).map_err(|_| SncfError::Api {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.base_url).map_err(|e| SncfError::Api {
            status: 0,
            message: format!("Invalid base URL {}: {}", config.base_url, e),
        })?;

        Ok(Self {
            http,
            base_url,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// Build an endpoint URL from path segments.
    ///
    /// Segments are percent-encoded, so ids containing reserved characters
    /// stay within their segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SncfError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SncfError::Api {
                status: 0,
                message: format!("Base URL cannot have a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a Navitia resource and decode it.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, SncfError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| SncfError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        debug!(url = url.as_str(), "navitia request");

        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SncfError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SncfError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SncfError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| SncfError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_SNIPPET_LEN).collect()),
        })
    }

    /// Search stations by name.
    ///
    /// Only stop areas are kept, at most [`SEARCH_LIMIT`].
    pub async fn search_stations(&self, query: &str) -> Result<Vec<Station>, SncfError> {
        if query.trim().is_empty() {
            return Err(SncfError::EmptyQuery);
        }

        let url = self.endpoint(&["places"])?;
        let response: PlacesResponse = self
            .get_json(
                url,
                &[
                    ("q", query.to_string()),
                    ("type[]", "stop_area".to_string()),
                    ("count", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        Ok(convert_places(&response, SEARCH_LIMIT))
    }

    /// Get upcoming departures from a station, starting now.
    pub async fn departures(&self, stop_area_id: &str) -> Result<Vec<Departure>, SncfError> {
        self.departures_from(stop_area_id, Local::now().naive_local())
            .await
    }

    /// Get departures from a station, starting at `from`.
    pub async fn departures_from(
        &self,
        stop_area_id: &str,
        from: NaiveDateTime,
    ) -> Result<Vec<Departure>, SncfError> {
        let url = self.endpoint(&["stop_areas", stop_area_id, "departures"])?;
        let response: DeparturesResponse = self
            .get_json(
                url,
                &[
                    ("from_datetime", format_compact_datetime(from)),
                    ("data_freshness", "realtime".to_string()),
                    ("count", DEPARTURES_COUNT.to_string()),
                    ("depth", "3".to_string()),
                ],
            )
            .await?;

        Ok(convert_departures(&response))
    }

    /// Get the stop timeline of a departure's vehicle journey.
    ///
    /// Fails without a request when the departure carries no vehicle journey
    /// link or no scheduled date.
    pub async fn journey_details(&self, departure: &Departure) -> Result<Vec<Stop>, SncfError> {
        let (journey_id, service_day) = journey_reference(departure)?;

        let url = self.endpoint(&["vehicle_journeys", journey_id])?;
        let response: VehicleJourneysResponse = self
            .get_json(
                url,
                &[
                    ("data_freshness", "realtime".to_string()),
                    ("depth", "2".to_string()),
                ],
            )
            .await?;

        Ok(convert_journey(
            &response,
            &departure.train_number,
            service_day,
            departure.scheduled_time,
        ))
    }

    /// Get current disruptions across the network.
    pub async fn line_reports(&self) -> Result<Vec<Disruption>, SncfError> {
        let url = self.endpoint(&["disruptions"])?;
        let response: DisruptionsResponse = self.get_json(url, &reports_query()).await?;
        Ok(convert_disruptions(&response))
    }

    /// Get current elevator / escalator status across the network.
    pub async fn equipment_reports(&self) -> Result<Vec<EquipmentReport>, SncfError> {
        let url = self.endpoint(&["equipment_reports"])?;
        let response: EquipmentReportsResponse = self.get_json(url, &reports_query()).await?;
        Ok(convert_equipment_reports(&response))
    }
}

fn reports_query() -> [(&'static str, String); 2] {
    [
        ("count", REPORTS_COUNT.to_string()),
        ("depth", "3".to_string()),
    ]
}

/// The vehicle journey id and service day a journey lookup needs.
pub(crate) fn journey_reference(
    departure: &Departure,
) -> Result<(&str, chrono::NaiveDate), SncfError> {
    let journey_id = departure
        .vehicle_journey_id
        .as_deref()
        .ok_or(SncfError::MissingReference("vehicle_journey link"))?;
    let service_day = departure
        .service_day()
        .ok_or(SncfError::MissingReference("scheduled departure time"))?;
    Ok((journey_id, service_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::{DepartureId, UNKNOWN_PLATFORM};

    #[test]
    fn config_builder() {
        let config = SncfConfig::new("test-key")
            .with_base_url("http://localhost:8080/v1/coverage/sncf")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080/v1/coverage/sncf");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = SncfConfig::new("test-key");

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn client_creation() {
        let config = SncfConfig::new("test-key");
        let client = SncfClient::new(config);
        assert!(client.is_ok());
    }

    #[test]
    fn invalid_base_url_rejected() {
        let config = SncfConfig::new("test-key").with_base_url("not a url");
        assert!(SncfClient::new(config).is_err());
    }

    #[test]
    fn basic_auth_header() {
        // base64("abc:")
        assert_eq!(basic_auth("abc"), "Basic YWJjOg==");
    }

    #[test]
    fn endpoint_encodes_ids() {
        let client = SncfClient::new(SncfConfig::new("k")).unwrap();

        let url = client.endpoint(&["places"]).unwrap();
        assert_eq!(url.as_str(), "https://api.sncf.com/v1/coverage/sncf/places");

        let url = client
            .endpoint(&["stop_areas", "stop_area:SNCF:87686006", "departures"])
            .unwrap();
        assert_eq!(
            url.path(),
            "/v1/coverage/sncf/stop_areas/stop_area:SNCF:87686006/departures"
        );

        let url = client.endpoint(&["vehicle_journeys", "a/b"]).unwrap();
        assert_eq!(url.path(), "/v1/coverage/sncf/vehicle_journeys/a%2Fb");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let config = SncfConfig::new("k").with_base_url("http://localhost:9000/v1/");
        let client = SncfClient::new(config).unwrap();
        let url = client.endpoint(&["disruptions"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/v1/disruptions");
    }

    fn departure() -> Departure {
        Departure {
            id: DepartureId::synthesize("6611", 0),
            train_number: "6611".into(),
            destination: "Marseille".into(),
            platform: UNKNOWN_PLATFORM.into(),
            scheduled_time: chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(9, 0, 0),
            real_time: None,
            delay_minutes: None,
            service_type: "TGV INOUI".into(),
            network: None,
            disruption_refs: vec![],
            route: None,
            stop_area_id: "stop_area:SNCF:87686006".into(),
            vehicle_journey_id: None,
        }
    }

    #[tokio::test]
    async fn empty_query_rejected_without_request() {
        let client = SncfClient::new(SncfConfig::new("k").with_base_url("http://127.0.0.1:9"))
            .unwrap();
        let err = client.search_stations("   ").await.unwrap_err();
        assert!(matches!(err, SncfError::EmptyQuery));
    }

    #[tokio::test]
    async fn journey_without_link_fails_without_request() {
        let client = SncfClient::new(SncfConfig::new("k").with_base_url("http://127.0.0.1:9"))
            .unwrap();
        let err = client.journey_details(&departure()).await.unwrap_err();
        assert!(matches!(
            err,
            SncfError::MissingReference("vehicle_journey link")
        ));
    }

    #[test]
    fn journey_reference_requires_date() {
        let mut dep = departure();
        dep.vehicle_journey_id = Some("vj:1".into());
        let (id, day) = journey_reference(&dep).unwrap();
        assert_eq!(id, "vj:1");
        assert_eq!(day, chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        dep.scheduled_time = None;
        assert!(matches!(
            journey_reference(&dep),
            Err(SncfError::MissingReference("scheduled departure time"))
        ));
    }

    /// One good departure and one without `stop_date_time`.
    const DEPARTURES_BODY: &str = r#"{"departures": [
        {
            "display_informations": {"headsign": "6611", "direction": "Marseille"},
            "stop_date_time": {
                "base_departure_date_time": "20240315T090000",
                "departure_date_time": "20240315T090700"
            },
            "stop_point": {"id": "sp:1", "stop_area": {"id": "stop_area:SNCF:87686006"}}
        },
        {
            "display_informations": {"headsign": "8421"},
            "stop_point": {"id": "sp:1", "stop_area": {"id": "stop_area:SNCF:87686006"}}
        }
    ]}"#;

    /// Stand-in for the Navitia API. The first path segment picks the
    /// response, so each test points its base URL at one behaviour.
    async fn navitia_stub(
        axum::extract::Path((behaviour, _rest)): axum::extract::Path<(String, String)>,
        headers: axum::http::HeaderMap,
    ) -> axum::response::Response {
        use axum::http::{StatusCode, header};
        use axum::response::IntoResponse;

        match behaviour.as_str() {
            "unavailable" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
            "unauthorized" => StatusCode::UNAUTHORIZED.into_response(),
            "throttled" => StatusCode::TOO_MANY_REQUESTS.into_response(),
            "garbage" => "<html>not json</html>".into_response(),
            _ => {
                let authorized = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v == basic_auth("k"));
                if !authorized {
                    return StatusCode::UNAUTHORIZED.into_response();
                }
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    DEPARTURES_BODY,
                )
                    .into_response()
            }
        }
    }

    /// Serve the stub on a free local port and return its address.
    async fn start_stub() -> std::net::SocketAddr {
        let app = axum::Router::new().route("/:behaviour/*rest", axum::routing::get(navitia_stub));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn client_for(behaviour: &str) -> SncfClient {
        let addr = start_stub().await;
        let config = SncfConfig::new("k")
            .with_base_url(format!("http://{}/{}", addr, behaviour))
            .with_timeout(5);
        SncfClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn decodes_board_and_skips_malformed_entry() {
        let client = client_for("ok").await;
        let departures = client.departures("stop_area:SNCF:87686006").await.unwrap();
        assert_eq!(departures.len(), 1);
        assert_eq!(departures[0].id.as_str(), "6611_0");
        assert_eq!(departures[0].delay_minutes, Some(7));
    }

    #[tokio::test]
    async fn error_status_maps_to_api_error() {
        let client = client_for("unavailable").await;
        let err = client.line_reports().await.unwrap_err();
        assert!(err.is_network());
        match err {
            SncfError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_and_rate_limited() {
        let client = client_for("unauthorized").await;
        let err = client.search_stations("Lyon").await.unwrap_err();
        assert!(matches!(err, SncfError::Unauthorized));
        assert!(err.is_network());

        let client = client_for("throttled").await;
        let err = client.equipment_reports().await.unwrap_err();
        assert!(matches!(err, SncfError::RateLimited));
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn undecodable_body_keeps_snippet() {
        let client = client_for("garbage").await;
        let err = client.departures("stop_area:SNCF:87686006").await.unwrap_err();
        assert!(!err.is_network());
        match err {
            SncfError::Json { body, .. } => {
                assert_eq!(body.as_deref(), Some("<html>not json</html>"));
            }
            other => panic!("expected JSON error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_http_error() {
        // Bind then release a port so nothing is listening on it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = SncfConfig::new("k")
            .with_base_url(format!("http://{}/v1", addr))
            .with_timeout(5);
        let client = SncfClient::new(config).unwrap();

        let err = client.line_reports().await.unwrap_err();
        assert!(matches!(err, SncfError::Http(_)));
        assert!(err.is_network());
    }
}
