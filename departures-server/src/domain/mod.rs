//! Domain types for the departures board.
//!
//! These are the flat view-model entities produced from provider payloads.
//! All are created fresh on each fetch and never mutated in place.

mod departure;
mod disruption;
mod equipment;
mod station;
mod stop;
mod time;

pub use departure::{Departure, DepartureId, Line, Route, UNKNOWN_PLATFORM};
pub use disruption::{
    ApplicationPeriod, Channel, Disruption, DisruptionStatus, ImpactedObject, Message, Severity,
};
pub use equipment::{Availability, Equipment, EquipmentKind, EquipmentReport};
pub use station::{Coord, Station};
pub use stop::{Stop, StopStatus};
pub use time::{
    ClockSequence, TIME_PLACEHOLDER, delay_minutes, format_compact_datetime, format_display_time,
    parse_clock_time, parse_compact_datetime,
};
