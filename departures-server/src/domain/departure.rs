//! Departure board entries.

use chrono::{NaiveDate, NaiveDateTime};

/// Platform label used when the provider gives none.
pub const UNKNOWN_PLATFORM: &str = "N/A";

/// Commercial mode Navitia uses for substitution services.
const ADDITIONAL_SERVICE: &str = "additional service";

/// Identifier of a departure within one fetched board.
///
/// Synthesized from the headsign and the list position. It is stable for the
/// lifetime of one fetched list and means nothing across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DepartureId(String);

impl DepartureId {
    /// Build the id for the entry at `index` with the given headsign.
    ///
    /// # Examples
    ///
    /// ```
    /// use departures_server::domain::DepartureId;
    ///
    /// let id = DepartureId::synthesize("6611", 3);
    /// assert_eq!(id.as_str(), "6611_3");
    /// ```
    pub fn synthesize(headsign: &str, index: usize) -> Self {
        Self(format!("{headsign}_{index}"))
    }

    /// Wrap an id received back from the browser.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DepartureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commercial line, as carried on a route.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub id: String,
    pub name: Option<String>,
    pub code: Option<String>,
    /// Hex colour without the leading `#`.
    pub color: Option<String>,
    /// Hex colour without the leading `#`.
    pub text_color: Option<String>,
}

/// The route a departure runs on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Route {
    pub id: String,
    pub name: Option<String>,
    pub line: Option<Line>,
}

/// One departure from a station.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub id: DepartureId,
    /// Headsign, usually the train number.
    pub train_number: String,
    /// Direction label.
    pub destination: String,
    pub platform: String,
    pub scheduled_time: Option<NaiveDateTime>,
    pub real_time: Option<NaiveDateTime>,
    pub delay_minutes: Option<i64>,
    /// Commercial mode, e.g. "TER", "TGV INOUI", "additional service".
    pub service_type: String,
    pub network: Option<String>,
    /// Ids of disruptions the provider linked to this departure.
    pub disruption_refs: Vec<String>,
    pub route: Option<Route>,
    pub stop_area_id: String,
    pub vehicle_journey_id: Option<String>,
}

impl Departure {
    /// Line id used to look up disruptions.
    pub fn line_id(&self) -> Option<&str> {
        self.route
            .as_ref()
            .and_then(|r| r.line.as_ref())
            .map(|l| l.id.as_str())
    }

    /// Service day of the departure: the scheduled date, else the realtime one.
    pub fn service_day(&self) -> Option<NaiveDate> {
        self.scheduled_time.or(self.real_time).map(|t| t.date())
    }

    /// Whether this is a substitution (replacement) service.
    pub fn is_substitution(&self) -> bool {
        self.service_type == ADDITIONAL_SERVICE
    }

    /// The network label, hidden when the provider sends a placeholder zero.
    pub fn display_network(&self) -> Option<&str> {
        self.network
            .as_deref()
            .filter(|n| !n.is_empty() && n.parse::<f64>().map_or(true, |v| v != 0.0))
    }
}
