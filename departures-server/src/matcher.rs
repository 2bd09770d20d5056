//! Maps disruption and equipment reports onto displayed departures and stops.
//!
//! Pure functions over the latest report snapshot. `None` means "no reports
//! to consult" and is distinct from an empty match.

use crate::domain::{Disruption, EquipmentReport};

/// Disruptions affecting a line.
///
/// Returns `None` when either the line id or the reports are absent; an
/// empty line id counts as absent. Otherwise returns every report with an
/// impacted object whose id equals or contains `line_id`, in report order. Navitia often qualifies line ids
/// (e.g. `line:L1:forward`), hence the substring match.
pub fn disruptions_for_line<'a>(
    line_id: Option<&str>,
    reports: Option<&'a [Disruption]>,
) -> Option<Vec<&'a Disruption>> {
    let line_id = line_id.filter(|id| !id.is_empty())?;
    let reports = reports?;
    Some(reports.iter().filter(|d| d.impacts(line_id)).collect())
}

/// Equipment report for a station, if any.
pub fn equipment_for_station<'a>(
    station_id: &str,
    reports: Option<&'a [EquipmentReport]>,
) -> Option<&'a EquipmentReport> {
    reports?.iter().find(|r| r.stop_area_id == station_id)
}
