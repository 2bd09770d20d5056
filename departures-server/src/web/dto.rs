//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::Station;

/// Query of the station search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Text typed so far
    #[serde(default)]
    pub q: String,
}

/// Query of the station selection endpoint.
#[derive(Debug, Deserialize)]
pub struct SelectStationQuery {
    /// Display name, used when the station is not among the suggestions
    pub name: Option<String>,
}

/// JSON response for station search.
#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    /// Matching stations
    pub stations: Vec<Station>,

    /// User-facing error, if the search failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
