//! Web layer for the departures board.
//!
//! Serves the page and the HTML fragments the browser script swaps in. All
//! UI state lives in a server-side [`ViewSession`] for the single local user.

mod config;
mod debounce;
mod dto;
mod routes;
#[cfg(test)]
mod routes_tests;
mod session;
mod state;
pub mod templates;

pub use config::ViewConfig;
pub use debounce::Debouncer;
pub use dto::*;
pub use routes::{AppError, create_router};
pub use session::{
    DEPARTURES_ERROR, JOURNEY_ERROR, SEARCH_ERROR, SearchStep, SelectedStation, Slot, Ticket,
    ViewSession,
};
pub use state::AppState;
pub use templates::*;
