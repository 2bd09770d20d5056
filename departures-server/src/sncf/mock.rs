//! Mock SNCF client for running without API access.
//!
//! Serves fixture payloads in the Navitia wire format, converted through the
//! same code path as live responses.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::domain::{Departure, Disruption, EquipmentReport, Station, Stop};

use super::api::TransitApi;
use super::client::{SEARCH_LIMIT, journey_reference};
use super::convert::{
    convert_departures, convert_disruptions, convert_equipment_reports, convert_journey,
    convert_places,
};
use super::error::SncfError;
use super::types::{
    DeparturesResponse, DisruptionsResponse, EquipmentReportsResponse, PlacesResponse,
    VehicleJourneysResponse,
};

/// Fixture file names inside a mock data directory.
const PLACES_FILE: &str = "places.json";
const DEPARTURES_FILE: &str = "departures.json";
const JOURNEY_FILE: &str = "vehicle_journey.json";
const DISRUPTIONS_FILE: &str = "disruptions.json";
const EQUIPMENT_FILE: &str = "equipment_reports.json";

/// Number of calls made to each operation.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub search: AtomicUsize,
    pub departures: AtomicUsize,
    pub journey: AtomicUsize,
    pub line_reports: AtomicUsize,
    pub equipment_reports: AtomicUsize,
}

/// Mock client that serves fixture payloads.
///
/// Every operation answers with the same payload regardless of its
/// arguments. An operation without a fixture answers with an empty result.
/// Call counts are recorded so tests can assert how often the network
/// would have been hit.
#[derive(Default)]
pub struct MockSncfClient {
    places: Option<PlacesResponse>,
    departures: Option<DeparturesResponse>,
    journey: Option<VehicleJourneysResponse>,
    disruptions: Option<DisruptionsResponse>,
    equipment: Option<EquipmentReportsResponse>,
    failing: AtomicBool,
    calls: Arc<CallCounts>,
}

impl MockSncfClient {
    /// Create a mock with no fixtures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load fixtures from a directory.
    ///
    /// Recognised files are `places.json`, `departures.json`,
    /// `vehicle_journey.json`, `disruptions.json` and
    /// `equipment_reports.json`. Missing files are allowed; a file that
    /// exists but does not decode is an error.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, SncfError> {
        let data_dir = data_dir.as_ref();

        if !data_dir.is_dir() {
            return Err(SncfError::Api {
                status: 0,
                message: format!("Mock data directory not found: {:?}", data_dir),
            });
        }

        let mock = Self {
            places: load_fixture(data_dir, PLACES_FILE)?,
            departures: load_fixture(data_dir, DEPARTURES_FILE)?,
            journey: load_fixture(data_dir, JOURNEY_FILE)?,
            disruptions: load_fixture(data_dir, DISRUPTIONS_FILE)?,
            equipment: load_fixture(data_dir, EQUIPMENT_FILE)?,
            ..Self::default()
        };

        info!(dir = ?data_dir, "loaded mock SNCF fixtures");
        Ok(mock)
    }

    pub fn with_places(mut self, json: &str) -> Result<Self, SncfError> {
        self.places = Some(decode(json)?);
        Ok(self)
    }

    pub fn with_departures(mut self, json: &str) -> Result<Self, SncfError> {
        self.departures = Some(decode(json)?);
        Ok(self)
    }

    pub fn with_journey(mut self, json: &str) -> Result<Self, SncfError> {
        self.journey = Some(decode(json)?);
        Ok(self)
    }

    pub fn with_disruptions(mut self, json: &str) -> Result<Self, SncfError> {
        self.disruptions = Some(decode(json)?);
        Ok(self)
    }

    pub fn with_equipment_reports(mut self, json: &str) -> Result<Self, SncfError> {
        self.equipment = Some(decode(json)?);
        Ok(self)
    }

    /// Make every subsequent call fail with a server error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Shared handle on the call counters.
    pub fn calls(&self) -> Arc<CallCounts> {
        Arc::clone(&self.calls)
    }

    fn record(&self, counter: &AtomicUsize) -> Result<(), SncfError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SncfError::Api {
                status: 503,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }

    async fn search_stations_inner(&self, query: &str) -> Result<Vec<Station>, SncfError> {
        if query.trim().is_empty() {
            return Err(SncfError::EmptyQuery);
        }
        self.record(&self.calls.search)?;
        Ok(self
            .places
            .as_ref()
            .map(|p| convert_places(p, SEARCH_LIMIT))
            .unwrap_or_default())
    }

    async fn departures_inner(&self) -> Result<Vec<Departure>, SncfError> {
        self.record(&self.calls.departures)?;
        Ok(self
            .departures
            .as_ref()
            .map(convert_departures)
            .unwrap_or_default())
    }

    async fn journey_details_inner(&self, departure: &Departure) -> Result<Vec<Stop>, SncfError> {
        let (_, service_day) = journey_reference(departure)?;
        self.record(&self.calls.journey)?;
        Ok(self
            .journey
            .as_ref()
            .map(|j| {
                convert_journey(
                    j,
                    &departure.train_number,
                    service_day,
                    departure.scheduled_time,
                )
            })
            .unwrap_or_default())
    }

    async fn line_reports_inner(&self) -> Result<Vec<Disruption>, SncfError> {
        self.record(&self.calls.line_reports)?;
        Ok(self
            .disruptions
            .as_ref()
            .map(convert_disruptions)
            .unwrap_or_default())
    }

    async fn equipment_reports_inner(&self) -> Result<Vec<EquipmentReport>, SncfError> {
        self.record(&self.calls.equipment_reports)?;
        Ok(self
            .equipment
            .as_ref()
            .map(convert_equipment_reports)
            .unwrap_or_default())
    }
}

impl TransitApi for MockSncfClient {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Station>, SncfError>> {
        self.search_stations_inner(query).boxed()
    }

    fn departures<'a>(
        &'a self,
        _stop_area_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Departure>, SncfError>> {
        self.departures_inner().boxed()
    }

    fn journey_details<'a>(
        &'a self,
        departure: &'a Departure,
    ) -> BoxFuture<'a, Result<Vec<Stop>, SncfError>> {
        self.journey_details_inner(departure).boxed()
    }

    fn line_reports(&self) -> BoxFuture<'_, Result<Vec<Disruption>, SncfError>> {
        self.line_reports_inner().boxed()
    }

    fn equipment_reports(&self) -> BoxFuture<'_, Result<Vec<EquipmentReport>, SncfError>> {
        self.equipment_reports_inner().boxed()
    }
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, SncfError> {
    serde_json::from_str(json).map_err(|e| SncfError::Json {
        message: e.to_string(),
        body: None,
    })
}

fn load_fixture<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<T>, SncfError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(&path).map_err(|e| SncfError::Api {
        status: 0,
        message: format!("Failed to read {:?}: {}", path, e),
    })?;

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| SncfError::Json {
            message: format!("Failed to parse {:?}: {}", path, e),
            body: None,
        })
}
