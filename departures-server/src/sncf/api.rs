//! The transit data operations the web layer depends on.

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::domain::{Departure, Disruption, EquipmentReport, Station, Stop};

use super::client::SncfClient;
use super::error::SncfError;

/// Remote transit data source.
///
/// Implemented by the live client, the caching wrapper, and the
/// fixture-backed mock. Methods return boxed futures so the trait can be
/// used as `Arc<dyn TransitApi>`.
pub trait TransitApi: Send + Sync {
    /// Stations whose name matches `query`.
    fn search_stations<'a>(&'a self, query: &'a str)
    -> BoxFuture<'a, Result<Vec<Station>, SncfError>>;

    /// Upcoming departures from a station.
    fn departures<'a>(
        &'a self,
        stop_area_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Departure>, SncfError>>;

    /// Stop timeline of a departure's journey, sorted by arrival.
    fn journey_details<'a>(
        &'a self,
        departure: &'a Departure,
    ) -> BoxFuture<'a, Result<Vec<Stop>, SncfError>>;

    /// Current disruption reports.
    fn line_reports(&self) -> BoxFuture<'_, Result<Vec<Disruption>, SncfError>>;

    /// Current equipment reports.
    fn equipment_reports(&self) -> BoxFuture<'_, Result<Vec<EquipmentReport>, SncfError>>;
}

impl TransitApi for SncfClient {
    fn search_stations<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Station>, SncfError>> {
        SncfClient::search_stations(self, query).boxed()
    }

    fn departures<'a>(
        &'a self,
        stop_area_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Departure>, SncfError>> {
        SncfClient::departures(self, stop_area_id).boxed()
    }

    fn journey_details<'a>(
        &'a self,
        departure: &'a Departure,
    ) -> BoxFuture<'a, Result<Vec<Stop>, SncfError>> {
        SncfClient::journey_details(self, departure).boxed()
    }

    fn line_reports(&self) -> BoxFuture<'_, Result<Vec<Disruption>, SncfError>> {
        SncfClient::line_reports(self).boxed()
    }

    fn equipment_reports(&self) -> BoxFuture<'_, Result<Vec<EquipmentReport>, SncfError>> {
        SncfClient::equipment_reports(self).boxed()
    }
}
