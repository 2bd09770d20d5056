//! Navitia API response DTOs.
//!
//! These types map directly to the SNCF Navitia JSON responses. Envelope
//! fields are required so a payload of the wrong shape fails to decode;
//! nested fields use `Option` liberally because Navitia omits fields rather
//! than sending null values in many cases. Entries of the main collections
//! are wrapped in [`Lenient`], so one malformed entry does not fail the
//! whole response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// A collection entry decoded on its own.
///
/// An entry that does not match `T` keeps its decode error instead of
/// failing the enclosing collection.
#[derive(Debug, Clone)]
pub struct Lenient<T>(pub Result<T, String>);

impl<T> Lenient<T> {
    pub fn get(&self) -> Result<&T, &str> {
        self.0.as_ref().map_err(String::as_str)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self(T::deserialize(value).map_err(|e| e.to_string())))
    }
}

/// Response from `/places`.
///
/// Navitia omits `places` entirely when nothing matches.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub places: Vec<Lenient<Place>>,
}

/// A search result of any embedded type.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,

    /// "stop_area", "address", "administrative_region", "poi", ...
    pub embedded_type: String,

    /// Present when `embedded_type` is "stop_area".
    pub stop_area: Option<StopArea>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopArea {
    pub id: String,
    pub name: Option<String>,
    pub label: Option<String>,
    pub coord: Option<CoordDto>,
}

/// Coordinates are sent as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordDto {
    pub lat: String,
    pub lon: String,
}

/// Response from `/stop_areas/{id}/departures`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeparturesResponse {
    pub departures: Vec<Lenient<DepartureItem>>,
}

/// One entry on a departure board.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartureItem {
    pub display_informations: DisplayInformations,
    pub stop_date_time: StopDateTime,
    pub stop_point: StopPoint,
    pub route: Option<RouteDto>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Display fields of a departure.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayInformations {
    /// Usually the train number.
    #[serde(default)]
    pub headsign: String,

    /// Direction label, e.g. "Lyon Part Dieu (Lyon)".
    #[serde(default)]
    pub direction: String,

    /// Commercial mode, e.g. "TER", "TGV INOUI", "additional service".
    pub commercial_mode: Option<String>,

    pub network: Option<String>,
    pub name: Option<String>,
    pub code: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub trip_short_name: Option<String>,
}

/// Scheduled and realtime instants, in `YYYYMMDDTHHMMSS` form.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDateTime {
    pub base_departure_date_time: Option<String>,
    pub departure_date_time: Option<String>,
    pub base_arrival_date_time: Option<String>,
    pub arrival_date_time: Option<String>,
    pub data_freshness: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopPoint {
    pub id: String,
    pub name: Option<String>,
    pub label: Option<String>,
    pub platform_code: Option<String>,
    pub platform: Option<String>,
    pub stop_area: Option<StopArea>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteDto {
    pub id: String,
    pub name: Option<String>,
    pub line: Option<LineDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineDto {
    pub id: String,
    pub name: Option<String>,
    pub code: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
}

/// A typed reference to another Navitia object.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
}

/// Response from `/vehicle_journeys/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleJourneysResponse {
    pub vehicle_journeys: Vec<VehicleJourney>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleJourney {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub stop_times: Vec<Lenient<StopTime>>,
}

/// One row of a vehicle journey's stop-time table.
///
/// Times are `HHMMSS` strings without a date.
#[derive(Debug, Clone, Deserialize)]
pub struct StopTime {
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
    pub base_arrival_time: Option<String>,
    pub base_departure_time: Option<String>,
    pub stop_point: Option<StopPoint>,
    pub pickup_allowed: Option<bool>,
    pub drop_off_allowed: Option<bool>,
}

/// Response from `/disruptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct DisruptionsResponse {
    #[serde(default)]
    pub disruptions: Vec<Lenient<DisruptionDto>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisruptionDto {
    pub id: String,
    pub status: Option<String>,
    pub severity: Option<SeverityDto>,
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    #[serde(default)]
    pub impacted_objects: Vec<ImpactedObjectDto>,
    #[serde(default)]
    pub application_periods: Vec<PeriodDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeverityDto {
    pub name: Option<String>,
    pub effect: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    pub text: Option<String>,
    pub channel: Option<ChannelDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelDto {
    pub name: Option<String>,
    pub content_type: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImpactedObjectDto {
    pub pt_object: Option<PtObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PtObject {
    pub id: Option<String>,
    pub name: Option<String>,
    pub embedded_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodDto {
    pub begin: Option<String>,
    pub end: Option<String>,
}

/// Response from `/equipment_reports`.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentReportsResponse {
    #[serde(default)]
    pub equipment_reports: Vec<Lenient<EquipmentReportDto>>,
}

/// Equipment status for the stations of one line.
#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentReportDto {
    pub line: Option<LineDto>,
    #[serde(default)]
    pub stop_area_equipments: Vec<Lenient<StopAreaEquipment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopAreaEquipment {
    pub stop_area: StopArea,
    #[serde(default)]
    pub equipment_details: Vec<EquipmentDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquipmentDetail {
    pub id: Option<String>,
    pub name: Option<String>,
    pub embedded_type: Option<String>,
    pub current_availability: Option<CurrentAvailability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentAvailability {
    pub status: Option<String>,
    pub effect: Option<Label>,
    pub cause: Option<Label>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub label: Option<String>,
}
