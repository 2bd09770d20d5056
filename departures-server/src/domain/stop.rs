//! Stops of a vehicle journey.

use std::fmt;

use chrono::NaiveDateTime;

/// Role of a stop in its journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopStatus {
    /// Boarding only: the first stop.
    Origin,
    /// Alighting only: the last stop.
    Terminus,
    Standard,
}

impl StopStatus {
    /// Derive the status from the raw pickup / drop-off flags.
    ///
    /// A stop that forbids pickup is a terminus; otherwise one that forbids
    /// drop-off is an origin. Absent flags mean allowed.
    pub fn from_flags(pickup_allowed: Option<bool>, drop_off_allowed: Option<bool>) -> Self {
        if pickup_allowed == Some(false) {
            StopStatus::Terminus
        } else if drop_off_allowed == Some(false) {
            StopStatus::Origin
        } else {
            StopStatus::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopStatus::Origin => "origin",
            StopStatus::Terminus => "terminus",
            StopStatus::Standard => "standard",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a journey's stop-time table.
///
/// At least one of `arrival_time` / `departure_time` is present; the
/// converter fills a missing one from the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub station_name: String,
    /// Stop area the stop point belongs to, used for equipment lookup.
    pub stop_area_id: Option<String>,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
    pub base_arrival_time: Option<NaiveDateTime>,
    pub base_departure_time: Option<NaiveDateTime>,
    pub platform: String,
    pub arrival_delay_minutes: Option<i64>,
    pub departure_delay_minutes: Option<i64>,
    pub status: StopStatus,
}
