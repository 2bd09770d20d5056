//! SNCF Navitia client.
//!
//! This module provides an HTTP client for the SNCF coverage of the Navitia
//! API, which provides station search, realtime departure boards, journey
//! stop times, disruptions and equipment status.
//!
//! Key characteristics of Navitia:
//! - Instants are `YYYYMMDDTHHMMSS` local wall-clock strings
//! - Journey stop times are bare `HHMMSS` strings, so the date must be
//!   reconstructed from the service day
//! - Authentication is HTTP Basic with the API key as user name
//! - Departure ids are synthesized from the list position; they mean
//!   nothing across fetches

mod api;
mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use api::TransitApi;
pub use client::{DEFAULT_BASE_URL, SEARCH_LIMIT, SncfClient, SncfConfig};
pub use convert::{
    ConversionError, convert_departure, convert_departures, convert_disruptions,
    convert_equipment_reports, convert_journey, convert_places,
};
pub use error::SncfError;
pub use mock::{CallCounts, MockSncfClient};
pub use types::{
    DeparturesResponse, DisruptionsResponse, EquipmentReportsResponse, PlacesResponse,
    VehicleJourneysResponse,
};
