//! HTTP route handlers.
//!
//! Each handler follows the same shape: update the session and take a
//! ticket under the lock, release it for the network call, then lock again
//! to apply the response and render.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::domain::DepartureId;

use super::dto::*;
use super::session::{SearchStep, SelectedStation, ViewSession};
use super::state::AppState;
use super::templates::*;

/// Longest accepted search input, in characters.
const MAX_QUERY_CHARS: usize = 100;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/search", get(search_stations))
        .route("/stations/:id", get(select_station))
        .route("/departures/:id", get(select_departure))
        .route("/journey/close", post(close_journey))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Render a template into an HTML response.
fn render(template: &impl Template) -> Result<Response, AppError> {
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;
    Ok(Html(html).into_response())
}

/// Snapshot the reports and build views from the session.
///
/// The session lock is held only while building the views.
async fn with_reports<T>(
    state: &AppState,
    build: impl FnOnce(&ViewSession, ReportsView<'_>) -> T,
) -> T {
    let disruptions = state.reports.disruptions().await;
    let equipment = state.reports.equipment().await;
    let reports = ReportsView {
        disruptions: disruptions.as_deref().map(Vec::as_slice),
        equipment: equipment.as_deref().map(Vec::as_slice),
    };

    let session = state.session.lock().await;
    build(&session, reports)
}

/// Full page, rendered from the current session.
async fn index_page(State(state): State<AppState>) -> Result<Response, AppError> {
    let template = with_reports(&state, IndexTemplate::from_session).await;
    render(&template)
}

/// Station search as the user types.
///
/// Responds with the suggestions fragment, or JSON when HTML is not
/// accepted. Responds 204 when a later keystroke superseded this one.
async fn search_stations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(req): Query<SearchQuery>,
) -> Result<Response, AppError> {
    if req.q.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::BadRequest {
            message: format!("Search text longer than {} characters", MAX_QUERY_CHARS),
        });
    }

    let step = {
        let mut session = state.session.lock().await;
        session.begin_search(&req.q, state.config.min_query_chars)
    };

    if let SearchStep::Fetch(ticket) = step {
        if !state.debouncer.settle().await {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }

        let result = state.api.search_stations(req.q.trim()).await;
        if let Err(e) = &result {
            warn!(query = %req.q, error = %e, "station search failed");
        }

        let mut session = state.session.lock().await;
        if !session.apply_search(ticket, result) {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }

    let session = state.session.lock().await;
    if accepts_html(&headers) {
        render(&SuggestionsTemplate {
            error: session.error().map(String::from),
            suggestions: suggestions(&session),
        })
    } else {
        Ok(Json(StationSearchResponse {
            stations: session.suggestions.clone(),
            error: session.error().map(String::from),
        })
        .into_response())
    }
}

/// Select a station and load its departure board.
async fn select_station(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(req): Query<SelectStationQuery>,
) -> Result<Response, AppError> {
    let ticket = {
        let mut session = state.session.lock().await;
        let name = session
            .suggestions
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.clone())
            .or(req.name)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| AppError::NotFound {
                message: format!("Unknown station {}", id),
            })?;

        info!(station = %id, name = %name, "station selected");
        session.select_station(SelectedStation {
            id: id.clone(),
            name,
        })
    };

    let result = state.api.departures(&id).await;
    if let Err(e) = &result {
        warn!(station = %id, error = %e, "departures failed");
    }

    {
        let mut session = state.session.lock().await;
        if !session.apply_departures(ticket, result) {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }

    let template = with_reports(&state, |session, reports| BoardTemplate {
        error: session.error().map(String::from),
        board: BoardView::from_session(session, reports),
    })
    .await;
    render(&template)
}

/// Open the journey view of a departure on the current board.
async fn select_departure(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = DepartureId::from_raw(id);

    let (ticket, departure) = {
        let mut session = state.session.lock().await;
        session
            .select_departure(&id)
            .ok_or_else(|| AppError::NotFound {
                message: format!("Departure {} is not on the current board", id),
            })?
    };

    let result = state.api.journey_details(&departure).await;
    if let Err(e) = &result {
        warn!(departure = %id, error = %e, "journey details failed");
    }

    {
        let mut session = state.session.lock().await;
        if !session.apply_journey(ticket, result) {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    }

    let template = with_reports(&state, |session, reports| JourneyTemplate {
        error: session.error().map(String::from),
        journey: JourneyView::from_session(session, reports),
    })
    .await;
    render(&template)
}

/// Close the journey view.
async fn close_journey(State(state): State<AppState>) -> Result<Response, AppError> {
    state.session.lock().await.close_journey();
    render(&JourneyTemplate {
        error: None,
        journey: None,
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
