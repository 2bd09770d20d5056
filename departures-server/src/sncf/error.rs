//! SNCF client error types.

/// Errors from the SNCF Navitia client.
#[derive(Debug, thiserror::Error)]
pub enum SncfError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid API key or unauthorized
    #[error("unauthorized: check SNCF_API_KEY")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by SNCF API")]
    RateLimited,

    /// Response body did not have the expected shape
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// A required cross-reference is absent (e.g. the vehicle journey link)
    #[error("missing reference: {0}")]
    MissingReference(&'static str),

    /// Station search called with an empty query
    #[error("search query must not be empty")]
    EmptyQuery,
}

impl SncfError {
    /// Whether the request failed at the transport or HTTP status level.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SncfError::Http(_)
                | SncfError::Api { .. }
                | SncfError::Unauthorized
                | SncfError::RateLimited
        )
    }
}
