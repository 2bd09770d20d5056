//! UI state of the single local user.
//!
//! Handlers mutate the session in two steps around each network call: a
//! `begin`/`select` step that updates the visible state and hands out a
//! [`Ticket`], and an `apply` step that stores the response only if the
//! ticket is still current. A newer request for the same slot invalidates
//! older tickets, so a slow early response never overwrites a later one.

use tracing::debug;

use crate::domain::{Departure, DepartureId, Station, Stop};
use crate::sncf::SncfError;

/// Shown when station search fails.
pub const SEARCH_ERROR: &str = "Erreur lors de la recherche des gares.";

/// Shown when the departure board fails to load.
pub const DEPARTURES_ERROR: &str = "Erreur lors du chargement des départs.";

/// Shown when the journey details fail to load.
pub const JOURNEY_ERROR: &str = "Erreur lors du chargement des détails du trajet.";

/// A request slot. Each slot has its own sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Search,
    Departures,
    Journey,
}

/// Proof that a response belongs to the latest request of its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    seq: u64,
}

/// Outcome of a change to the search text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// Input was empty; suggestions were cleared.
    Cleared,
    /// Input too short to search; nothing changes.
    TooShort,
    /// A search should be issued with this ticket.
    Fetch(Ticket),
}

/// The station whose departures are shown.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedStation {
    pub id: String,
    pub name: String,
}

/// Per-slot request counters.
#[derive(Debug, Default)]
struct Sequences {
    search: u64,
    departures: u64,
    journey: u64,
}

impl Sequences {
    fn counter(&mut self, slot: Slot) -> &mut u64 {
        match slot {
            Slot::Search => &mut self.search,
            Slot::Departures => &mut self.departures,
            Slot::Journey => &mut self.journey,
        }
    }

    fn issue(&mut self, slot: Slot) -> Ticket {
        let seq = self.counter(slot);
        *seq += 1;
        Ticket { slot, seq: *seq }
    }

    fn is_current(&mut self, ticket: Ticket) -> bool {
        *self.counter(ticket.slot) == ticket.seq
    }
}

/// All UI state.
#[derive(Debug, Default)]
pub struct ViewSession {
    pub search_text: String,
    pub suggestions: Vec<Station>,
    pub selected_station: Option<SelectedStation>,
    pub departures: Vec<Departure>,
    pub selected_departure: Option<Departure>,
    pub journey_stops: Vec<Stop>,
    /// Last failure and the slot that caused it.
    error: Option<(Slot, &'static str)>,
    seqs: Sequences,
}

impl ViewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// User-visible error message, in French.
    pub fn error(&self) -> Option<&'static str> {
        self.error.map(|(_, message)| message)
    }

    fn fail(&mut self, slot: Slot, message: &'static str) {
        self.error = Some((slot, message));
    }

    /// Drop the error only if `slot` set it.
    fn clear_error(&mut self, slot: Slot) {
        if self.error.is_some_and(|(s, _)| s == slot) {
            self.error = None;
        }
    }

    /// Record new search input.
    ///
    /// Any search still in flight is invalidated. Empty input clears the
    /// suggestions; input shorter than `min_chars` characters is not searched.
    pub fn begin_search(&mut self, text: &str, min_chars: usize) -> SearchStep {
        self.search_text = text.to_string();
        let ticket = self.seqs.issue(Slot::Search);

        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.suggestions.clear();
            return SearchStep::Cleared;
        }
        if trimmed.chars().count() < min_chars {
            return SearchStep::TooShort;
        }
        SearchStep::Fetch(ticket)
    }

    /// Store a search response. Returns `false` if it was stale.
    pub fn apply_search(&mut self, ticket: Ticket, result: Result<Vec<Station>, SncfError>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(stations) => {
                self.suggestions = stations;
                self.clear_error(Slot::Search);
            }
            Err(_) => {
                self.suggestions.clear();
                self.fail(Slot::Search, SEARCH_ERROR);
            }
        }
        true
    }

    /// Select a station: show its name in the search box and load its board.
    ///
    /// Pending searches and journey loads are invalidated, the previous
    /// board is cleared and any error is dropped.
    pub fn select_station(&mut self, station: SelectedStation) -> Ticket {
        self.search_text = station.name.clone();
        self.suggestions.clear();
        self.seqs.issue(Slot::Search);

        self.selected_station = Some(station);
        self.departures.clear();
        self.close_journey();
        self.error = None;

        self.seqs.issue(Slot::Departures)
    }

    /// Store a departures response. Returns `false` if it was stale.
    pub fn apply_departures(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Departure>, SncfError>,
    ) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(departures) => {
                self.departures = departures;
                self.clear_error(Slot::Departures);
            }
            Err(_) => {
                self.departures.clear();
                self.fail(Slot::Departures, DEPARTURES_ERROR);
            }
        }
        true
    }

    /// Open the journey view for a departure of the current board.
    ///
    /// Returns the ticket and a copy of the departure to fetch, or `None` if
    /// the id is not on the current board.
    pub fn select_departure(&mut self, id: &DepartureId) -> Option<(Ticket, Departure)> {
        let departure = self.departures.iter().find(|d| &d.id == id)?.clone();
        self.selected_departure = Some(departure.clone());
        self.journey_stops.clear();
        self.clear_error(Slot::Journey);
        Some((self.seqs.issue(Slot::Journey), departure))
    }

    /// Store a journey response. Returns `false` if it was stale.
    pub fn apply_journey(&mut self, ticket: Ticket, result: Result<Vec<Stop>, SncfError>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        match result {
            Ok(stops) => {
                self.journey_stops = stops;
                self.clear_error(Slot::Journey);
            }
            Err(_) => {
                self.journey_stops.clear();
                self.fail(Slot::Journey, JOURNEY_ERROR);
            }
        }
        true
    }

    /// Close the journey view. A journey load in flight is discarded.
    pub fn close_journey(&mut self) {
        self.selected_departure = None;
        self.journey_stops.clear();
        self.clear_error(Slot::Journey);
        self.seqs.issue(Slot::Journey);
    }

    fn accept(&mut self, ticket: Ticket) -> bool {
        let current = self.seqs.is_current(ticket);
        if !current {
            debug!(slot = ?ticket.slot, seq = ticket.seq, "discarding stale response");
        }
        current
    }
}
