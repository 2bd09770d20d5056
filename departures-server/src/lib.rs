//! SNCF departures board server.
//!
//! A locally served web application: search a station, watch its upcoming
//! departures, and open a train's stop-by-stop timeline, with live
//! disruption and elevator / escalator status overlaid.

pub mod cache;
pub mod config;
pub mod domain;
pub mod logger;
pub mod matcher;
pub mod reports;
pub mod sncf;
pub mod web;
