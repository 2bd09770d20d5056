//! Conversion from Navitia DTOs to domain types.
//!
//! Each collection is converted entry by entry. An entry that cannot be
//! turned into a complete domain value is logged and skipped rather than
//! producing a partial object or failing the whole response.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::domain::{
    ApplicationPeriod, Availability, Channel, ClockSequence, Coord, Departure, DepartureId,
    Disruption, DisruptionStatus, Equipment, EquipmentKind, EquipmentReport, ImpactedObject, Line,
    Message, Route, Severity, Station, Stop, StopStatus, UNKNOWN_PLATFORM, delay_minutes,
    parse_compact_datetime,
};

use super::types::{
    DepartureItem, DeparturesResponse, DisruptionDto, DisruptionsResponse, EquipmentDetail,
    EquipmentReportsResponse, Lenient, LineDto, Place, PlacesResponse, RouteDto, StopPoint,
    StopTime, VehicleJourneysResponse,
};

/// Navitia embedded type of stations.
const STOP_AREA: &str = "stop_area";

/// Link type pointing at the vehicle journey of a departure.
const VEHICLE_JOURNEY_LINK: &str = "vehicle_journey";

/// Link type pointing at a disruption.
const DISRUPTION_LINK: &str = "disruption";

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Coordinates were not valid numbers
    #[error("invalid coordinate: ({lat}, {lon})")]
    InvalidCoord { lat: String, lon: String },

    /// Equipment of a kind we don't track
    #[error("unsupported equipment type: {0}")]
    UnsupportedEquipment(String),
}

/// Entries of a collection that decoded, with their position.
///
/// Malformed entries are logged and skipped.
fn decoded<'a, T>(
    entries: &'a [Lenient<T>],
    kind: &'static str,
) -> impl Iterator<Item = (usize, &'a T)> + 'a {
    entries
        .iter()
        .enumerate()
        .filter_map(move |(index, entry)| match entry.get() {
            Ok(item) => Some((index, item)),
            Err(e) => {
                warn!(kind, index, error = e, "skipping malformed entry");
                None
            }
        })
}

/// Convert a `/places` response, keeping stop areas only, at most `limit`.
pub fn convert_places(response: &PlacesResponse, limit: usize) -> Vec<Station> {
    decoded(&response.places, "place")
        .map(|(_, place)| place)
        .filter(|p| p.embedded_type == STOP_AREA)
        .filter_map(|place| match convert_place(place) {
            Ok(station) => Some(station),
            Err(e) => {
                warn!(place = %place.id, error = %e, "skipping place");
                None
            }
        })
        .take(limit)
        .collect()
}

fn convert_place(place: &Place) -> Result<Station, ConversionError> {
    let stop_area = place
        .stop_area
        .as_ref()
        .ok_or(ConversionError::MissingField("stop_area"))?;
    let coord = stop_area
        .coord
        .as_ref()
        .ok_or(ConversionError::MissingField("stop_area.coord"))?;
    let coord = Coord::parse(&coord.lat, &coord.lon).ok_or_else(|| {
        ConversionError::InvalidCoord {
            lat: coord.lat.clone(),
            lon: coord.lon.clone(),
        }
    })?;

    Ok(Station {
        id: place.id.clone(),
        name: place.name.clone(),
        coord,
    })
}

/// Convert a departure board response, keeping provider order.
///
/// Ids use each entry's position in the provider list, skipped entries
/// included.
pub fn convert_departures(response: &DeparturesResponse) -> Vec<Departure> {
    decoded(&response.departures, "departure")
        .filter_map(|(index, item)| match convert_departure(item, index) {
            Ok(departure) => Some(departure),
            Err(e) => {
                warn!(
                    headsign = %item.display_informations.headsign,
                    error = %e,
                    "skipping departure"
                );
                None
            }
        })
        .collect()
}

/// Convert a single departure board entry.
pub fn convert_departure(item: &DepartureItem, index: usize) -> Result<Departure, ConversionError> {
    let info = &item.display_informations;

    let stop_area_id = item
        .stop_point
        .stop_area
        .as_ref()
        .map(|sa| sa.id.clone())
        .ok_or(ConversionError::MissingField("stop_point.stop_area"))?;

    let scheduled_time = item
        .stop_date_time
        .base_departure_date_time
        .as_deref()
        .and_then(parse_compact_datetime);
    let real_time = item
        .stop_date_time
        .departure_date_time
        .as_deref()
        .and_then(parse_compact_datetime);

    let vehicle_journey_id = item
        .links
        .iter()
        .find(|l| l.kind.as_deref() == Some(VEHICLE_JOURNEY_LINK))
        .and_then(|l| l.id.clone());

    let disruption_refs = item
        .links
        .iter()
        .filter(|l| l.kind.as_deref() == Some(DISRUPTION_LINK))
        .filter_map(|l| l.id.clone())
        .collect();

    Ok(Departure {
        id: DepartureId::synthesize(&info.headsign, index),
        train_number: info.headsign.clone(),
        destination: info.direction.clone(),
        platform: platform_of(&item.stop_point),
        scheduled_time,
        real_time,
        delay_minutes: delay_minutes(real_time, scheduled_time),
        service_type: info.commercial_mode.clone().unwrap_or_default(),
        network: info.network.clone(),
        disruption_refs,
        route: item.route.as_ref().map(convert_route),
        stop_area_id,
        vehicle_journey_id,
    })
}

/// Platform with fallback: code, then name, then "N/A".
fn platform_of(stop_point: &StopPoint) -> String {
    [&stop_point.platform_code, &stop_point.platform]
        .into_iter()
        .flatten()
        .find(|p| !p.is_empty())
        .cloned()
        .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string())
}

fn convert_route(route: &RouteDto) -> Route {
    Route {
        id: route.id.clone(),
        name: route.name.clone(),
        line: route.line.as_ref().map(convert_line),
    }
}

fn convert_line(line: &LineDto) -> Line {
    Line {
        id: line.id.clone(),
        name: line.name.clone(),
        code: line.code.clone(),
        color: line.color.clone().filter(|c| !c.is_empty()),
        text_color: line.text_color.clone().filter(|c| !c.is_empty()),
    }
}

/// Convert a vehicle journey into its stops, sorted by arrival.
///
/// Times are placed on `service_day`, advancing across midnight as the
/// itinerary requires. When `reference` (the scheduled departure at the
/// board station) is given, the whole timeline is shifted by whole days so
/// that the stop closest to it lands on the reference's date; this keeps
/// journeys that started the evening before correct.
pub fn convert_journey(
    response: &VehicleJourneysResponse,
    train_number: &str,
    service_day: NaiveDate,
    reference: Option<NaiveDateTime>,
) -> Vec<Stop> {
    let Some(journey) = response.vehicle_journeys.first() else {
        warn!("vehicle journey response had no journeys");
        return Vec::new();
    };

    let mut realtime = ClockSequence::new(service_day);
    let mut base = ClockSequence::new(service_day);
    let mut stops = Vec::with_capacity(journey.stop_times.len());

    for (index, row) in decoded(&journey.stop_times, "stop time") {
        match convert_stop_time(row, index, train_number, &mut realtime, &mut base) {
            Ok(stop) => stops.push(stop),
            Err(e) => warn!(journey = %journey.id, index, error = %e, "skipping stop"),
        }
    }

    if let Some(reference) = reference {
        align_to_reference(&mut stops, reference);
    }

    stops.sort_by_key(|s| s.arrival_time);
    stops
}

fn convert_stop_time(
    row: &StopTime,
    index: usize,
    train_number: &str,
    realtime: &mut ClockSequence,
    base: &mut ClockSequence,
) -> Result<Stop, ConversionError> {
    let stop_point = row
        .stop_point
        .as_ref()
        .ok_or(ConversionError::MissingField("stop_point"))?;

    let arrival = row.arrival_time.as_deref();
    let departure = row.departure_time.as_deref();
    let arrival_time = realtime.parse_next_or(arrival, departure);
    let departure_time = realtime.parse_next_or(departure, arrival);
    let (arrival_time, departure_time) = match (arrival_time, departure_time) {
        (Some(a), Some(d)) => (a, d),
        (Some(t), None) | (None, Some(t)) => (t, t),
        (None, None) => return Err(ConversionError::MissingField("arrival_time/departure_time")),
    };

    let base_arrival = row.base_arrival_time.as_deref();
    let base_departure = row.base_departure_time.as_deref();
    let base_arrival_time = base.parse_next_or(base_arrival, base_departure);
    let base_departure_time = base.parse_next_or(base_departure, base_arrival);

    let station_name = stop_point
        .label
        .clone()
        .or_else(|| stop_point.name.clone())
        .ok_or(ConversionError::MissingField("stop_point.name"))?;

    Ok(Stop {
        id: format!("{train_number}_{index}"),
        station_name,
        stop_area_id: stop_point.stop_area.as_ref().map(|sa| sa.id.clone()),
        arrival_time,
        departure_time,
        base_arrival_time,
        base_departure_time,
        platform: platform_of(stop_point),
        arrival_delay_minutes: delay_minutes(Some(arrival_time), base_arrival_time),
        departure_delay_minutes: delay_minutes(Some(departure_time), base_departure_time),
        status: StopStatus::from_flags(row.pickup_allowed, row.drop_off_allowed),
    })
}

/// Shift every instant by the whole number of days separating the stop
/// nearest to `reference` from `reference` itself.
fn align_to_reference(stops: &mut [Stop], reference: NaiveDateTime) {
    let nearest = stops
        .iter()
        .map(|s| s.base_departure_time.unwrap_or(s.departure_time))
        .min_by_key(|t| time_of_day_distance(*t, reference));

    let Some(nearest) = nearest else {
        return;
    };

    let days = (reference.date() - nearest.date()).num_days();
    if days == 0 {
        return;
    }

    let shift = Duration::days(days);
    for stop in stops.iter_mut() {
        stop.arrival_time += shift;
        stop.departure_time += shift;
        stop.base_arrival_time = stop.base_arrival_time.map(|t| t + shift);
        stop.base_departure_time = stop.base_departure_time.map(|t| t + shift);
    }
}

/// Distance between two instants ignoring their dates, in seconds.
fn time_of_day_distance(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    let diff = (a.time() - b.time()).num_seconds().abs();
    diff.min(86_400 - diff)
}

/// Convert a `/disruptions` response.
pub fn convert_disruptions(response: &DisruptionsResponse) -> Vec<Disruption> {
    decoded(&response.disruptions, "disruption")
        .map(|(_, dto)| convert_disruption(dto))
        .collect()
}

fn convert_disruption(dto: &DisruptionDto) -> Disruption {
    let severity = dto
        .severity
        .as_ref()
        .map(|s| Severity {
            name: s.name.clone(),
            effect: s.effect.clone(),
            color: s.color.clone().filter(|c| !c.is_empty()),
        })
        .unwrap_or_default();

    let messages = dto
        .messages
        .iter()
        .filter_map(|m| {
            Some(Message {
                text: m.text.clone().filter(|t| !t.is_empty())?,
                channel: m.channel.as_ref().map(|c| Channel {
                    name: c.name.clone(),
                    content_type: c.content_type.clone(),
                    types: c.types.clone(),
                }),
            })
        })
        .collect();

    let impacted_objects = dto
        .impacted_objects
        .iter()
        .filter_map(|o| {
            let pt = o.pt_object.as_ref()?;
            Some(ImpactedObject {
                id: pt.id.clone()?,
                name: pt.name.clone(),
                kind: pt.embedded_type.clone(),
            })
        })
        .collect();

    let application_periods = dto
        .application_periods
        .iter()
        .map(|p| ApplicationPeriod {
            begin: p.begin.as_deref().and_then(parse_compact_datetime),
            end: p.end.as_deref().and_then(parse_compact_datetime),
        })
        .collect();

    Disruption {
        id: dto.id.clone(),
        status: dto
            .status
            .as_deref()
            .map_or(DisruptionStatus::Unknown, DisruptionStatus::parse),
        severity,
        messages,
        impacted_objects,
        application_periods,
    }
}

/// Flatten a `/equipment_reports` response into per-station reports.
pub fn convert_equipment_reports(response: &EquipmentReportsResponse) -> Vec<EquipmentReport> {
    decoded(&response.equipment_reports, "equipment report")
        .flat_map(|(_, report)| decoded(&report.stop_area_equipments, "stop area equipment"))
        .map(|(_, sae)| EquipmentReport {
            stop_area_id: sae.stop_area.id.clone(),
            stop_area_name: sae
                .stop_area
                .name
                .clone()
                .or_else(|| sae.stop_area.label.clone()),
            equipments: sae
                .equipment_details
                .iter()
                .filter_map(|detail| match convert_equipment(detail) {
                    Ok(equipment) => Some(equipment),
                    Err(e) => {
                        warn!(stop_area = %sae.stop_area.id, error = %e, "skipping equipment");
                        None
                    }
                })
                .collect(),
        })
        .collect()
}

fn convert_equipment(detail: &EquipmentDetail) -> Result<Equipment, ConversionError> {
    let embedded_type = detail
        .embedded_type
        .as_deref()
        .ok_or(ConversionError::MissingField("embedded_type"))?;
    let kind = EquipmentKind::parse(embedded_type)
        .ok_or_else(|| ConversionError::UnsupportedEquipment(embedded_type.to_string()))?;
    let id = detail
        .id
        .clone()
        .ok_or(ConversionError::MissingField("id"))?;

    let availability = detail.current_availability.as_ref().map(|a| Availability {
        status: a.status.clone().unwrap_or_else(|| "unknown".to_string()),
        effect: a.effect.as_ref().and_then(|l| l.label.clone()),
        cause: a.cause.as_ref().and_then(|l| l.label.clone()),
    });

    Ok(Equipment {
        name: detail.name.clone().unwrap_or_else(|| id.clone()),
        id,
        kind,
        availability,
    })
}
