//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::reports::ReportStore;
use crate::sncf::TransitApi;

use super::config::ViewConfig;
use super::debounce::Debouncer;
use super::session::ViewSession;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Transit data source (live, cached or mock)
    pub api: Arc<dyn TransitApi>,

    /// Latest disruption and equipment reports
    pub reports: Arc<ReportStore>,

    /// UI state. Never held across a network call.
    pub session: Arc<Mutex<ViewSession>>,

    /// Search input debouncer
    pub debouncer: Arc<Debouncer>,

    /// View configuration
    pub config: Arc<ViewConfig>,
}

impl AppState {
    /// Create a new app state with an empty session.
    pub fn new(api: Arc<dyn TransitApi>, reports: Arc<ReportStore>, config: ViewConfig) -> Self {
        Self {
            api,
            reports,
            session: Arc::new(Mutex::new(ViewSession::new())),
            debouncer: Arc::new(Debouncer::new(config.debounce)),
            config: Arc::new(config),
        }
    }
}
