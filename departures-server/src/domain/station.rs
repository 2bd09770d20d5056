//! Stations (Navitia stop areas).

use serde::Serialize;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    /// Parse a coordinate from the string pair Navitia sends.
    ///
    /// Returns `None` unless both parts are finite numbers in range.
    ///
    /// # Examples
    ///
    /// ```
    /// use departures_server::domain::Coord;
    ///
    /// let c = Coord::parse("48.844922", "2.373462").unwrap();
    /// assert_eq!(c.lat, 48.844922);
    ///
    /// assert!(Coord::parse("", "2.37").is_none());
    /// assert!(Coord::parse("91.0", "2.37").is_none());
    /// ```
    pub fn parse(lat: &str, lon: &str) -> Option<Self> {
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;

        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }

        Some(Self { lat, lon })
    }
}

/// A searchable, selectable station.
///
/// Identity is the stop area id, e.g. `stop_area:SNCF:87686006`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub coord: Coord,
}
