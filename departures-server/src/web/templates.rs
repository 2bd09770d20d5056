//! Askama templates for the web frontend.

use askama::Template;
use chrono::NaiveDateTime;

use crate::domain::{
    Departure, Disruption, EquipmentReport, Line, Stop, StopStatus, format_display_time,
};
use crate::matcher::{disruptions_for_line, equipment_for_station};

use super::session::ViewSession;

/// Badge colours used when the line has none.
const DEFAULT_BADGE_BACKGROUND: &str = "#4a4a4a";
const DEFAULT_BADGE_FOREGROUND: &str = "#ffffff";

/// Label shown on substitution services.
const SUBSTITUTION_LABEL: &str = "Service de substitution";

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page, rendered from the whole session.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub search_text: String,
    pub error: Option<String>,
    pub suggestions: Vec<StationView>,
    pub board: Option<BoardView>,
    pub journey: Option<JourneyView>,
}

// ============================================================================
// Fragment Templates (swapped in by app.js, no base.html)
// ============================================================================

/// Station suggestions fragment.
#[derive(Template)]
#[template(path = "fragments/suggestions.html")]
pub struct SuggestionsTemplate {
    pub error: Option<String>,
    pub suggestions: Vec<StationView>,
}

/// Departure board fragment.
#[derive(Template)]
#[template(path = "fragments/board.html")]
pub struct BoardTemplate {
    pub error: Option<String>,
    pub board: Option<BoardView>,
}

/// Journey detail fragment.
#[derive(Template)]
#[template(path = "fragments/journey.html")]
pub struct JourneyTemplate {
    pub error: Option<String>,
    pub journey: Option<JourneyView>,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Reports consulted while rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportsView<'a> {
    pub disruptions: Option<&'a [Disruption]>,
    pub equipment: Option<&'a [EquipmentReport]>,
}

/// A station suggestion.
#[derive(Debug, Clone)]
pub struct StationView {
    pub id: String,
    pub name: String,
}

/// Signed delay label, e.g. "+7 min" or "-2 min". `None` when on time or
/// unknown.
pub fn delay_label(minutes: Option<i64>) -> Option<String> {
    match minutes? {
        0 => None,
        m if m > 0 => Some(format!("+{m} min")),
        m => Some(format!("{m} min")),
    }
}

/// CSS class of a delay: late in red, early in green.
pub fn delay_class(minutes: Option<i64>) -> &'static str {
    match minutes {
        Some(m) if m > 0 => "late",
        Some(m) if m < 0 => "early",
        _ => "on-time",
    }
}

/// Prefix a Navitia hex colour with `#`.
fn css_color(hex: Option<&str>) -> Option<String> {
    let hex = hex?.trim();
    if hex.is_empty() {
        return None;
    }
    Some(if hex.starts_with('#') {
        hex.to_string()
    } else {
        format!("#{hex}")
    })
}

/// Line badge: the line name or code on the line's colour.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBadge {
    pub label: String,
    pub background: String,
    pub foreground: String,
}

impl LineBadge {
    /// Build a badge; `None` if the line has neither name nor code.
    pub fn from_line(line: &Line) -> Option<Self> {
        let label = [&line.name, &line.code]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())?
            .clone();

        Some(Self {
            label,
            background: css_color(line.color.as_deref())
                .unwrap_or_else(|| DEFAULT_BADGE_BACKGROUND.to_string()),
            foreground: css_color(line.text_color.as_deref())
                .unwrap_or_else(|| DEFAULT_BADGE_FOREGROUND.to_string()),
        })
    }
}

/// A disruption shown on a departure row: severity and first message.
#[derive(Debug, Clone)]
pub struct DisruptionSummary {
    pub severity: String,
    pub message: Option<String>,
    pub color: Option<String>,
}

impl DisruptionSummary {
    pub fn from_disruption(disruption: &Disruption) -> Self {
        Self {
            severity: severity_label(disruption),
            message: disruption.headline().map(str::to_string),
            color: disruption.severity.color.clone(),
        }
    }
}

/// A disruption shown in the journey view, with all its messages.
#[derive(Debug, Clone)]
pub struct DisruptionDetail {
    pub severity: String,
    pub messages: Vec<String>,
    pub color: Option<String>,
    /// False when none of the application periods covers the train's time.
    pub in_effect: bool,
}

impl DisruptionDetail {
    /// `at` is the departure instant the periods are checked against.
    pub fn from_disruption(disruption: &Disruption, at: Option<NaiveDateTime>) -> Self {
        Self {
            severity: severity_label(disruption),
            messages: disruption.messages.iter().map(|m| m.text.clone()).collect(),
            color: disruption.severity.color.clone(),
            in_effect: at.is_none_or(|t| disruption.applies_at(t)),
        }
    }
}

fn severity_label(disruption: &Disruption) -> String {
    disruption
        .severity
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Perturbation".to_string())
}

/// One elevator or escalator line in an equipment panel.
#[derive(Debug, Clone)]
pub struct EquipmentItemView {
    pub kind: &'static str,
    pub name: String,
    pub status: String,
    pub available: bool,
    pub cause: Option<String>,
}

/// Equipment status of a station.
#[derive(Debug, Clone)]
pub struct EquipmentView {
    pub items: Vec<EquipmentItemView>,
}

impl EquipmentView {
    /// Build from a report; `None` if it lists no equipment.
    pub fn from_report(report: &EquipmentReport) -> Option<Self> {
        if report.equipments.is_empty() {
            return None;
        }
        let items = report
            .equipments
            .iter()
            .map(|e| EquipmentItemView {
                kind: e.kind.label(),
                name: e.name.clone(),
                status: e
                    .availability
                    .as_ref()
                    .map_or_else(|| "Inconnu".to_string(), |a| a.summary().to_string()),
                available: e.availability.as_ref().is_some_and(|a| a.is_available()),
                cause: e.availability.as_ref().and_then(|a| a.cause.clone()),
            })
            .collect();
        Some(Self { items })
    }

    /// Number of pieces of equipment out of service.
    pub fn unavailable_count(&self) -> usize {
        self.items.iter().filter(|i| !i.available).count()
    }
}

/// Departure row view model.
#[derive(Debug, Clone)]
pub struct DepartureView {
    pub id: String,
    pub train_number: String,
    pub destination: String,
    pub platform: String,
    pub time: String,
    pub scheduled_time: String,
    pub delay: Option<String>,
    pub delay_class: &'static str,
    pub service_type: String,
    pub network: Option<String>,
    pub badge: Option<LineBadge>,
    pub is_substitution: bool,
    pub disruptions: Vec<DisruptionSummary>,
    pub selected: bool,
}

impl DepartureView {
    /// Create from a domain Departure, matching its line's disruptions.
    pub fn from_departure(
        departure: &Departure,
        disruptions: Option<&[Disruption]>,
        selected: bool,
    ) -> Self {
        let disruptions = disruptions_for_line(departure.line_id(), disruptions)
            .unwrap_or_default()
            .into_iter()
            .map(DisruptionSummary::from_disruption)
            .collect();

        Self {
            id: departure.id.to_string(),
            train_number: departure.train_number.clone(),
            destination: departure.destination.clone(),
            platform: departure.platform.clone(),
            time: format_display_time(departure.real_time.or(departure.scheduled_time)),
            scheduled_time: format_display_time(departure.scheduled_time),
            delay: delay_label(departure.delay_minutes),
            delay_class: delay_class(departure.delay_minutes),
            service_type: if departure.is_substitution() {
                SUBSTITUTION_LABEL.to_string()
            } else {
                departure.service_type.clone()
            },
            network: departure.display_network().map(str::to_string),
            badge: departure
                .route
                .as_ref()
                .and_then(|r| r.line.as_ref())
                .and_then(LineBadge::from_line),
            is_substitution: departure.is_substitution(),
            disruptions,
            selected,
        }
    }

    /// Whether the displayed time differs from the timetable.
    pub fn is_retimed(&self) -> bool {
        self.time != self.scheduled_time
    }
}

/// Departure board of the selected station.
#[derive(Debug, Clone)]
pub struct BoardView {
    pub station_id: String,
    pub station_name: String,
    pub departures: Vec<DepartureView>,
    pub equipment: Option<EquipmentView>,
}

impl BoardView {
    /// Build from the session; `None` when no station is selected.
    pub fn from_session(session: &ViewSession, reports: ReportsView<'_>) -> Option<Self> {
        let station = session.selected_station.as_ref()?;
        let selected_id = session.selected_departure.as_ref().map(|d| &d.id);

        let departures = session
            .departures
            .iter()
            .map(|d| {
                DepartureView::from_departure(d, reports.disruptions, selected_id == Some(&d.id))
            })
            .collect();

        Some(Self {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            departures,
            equipment: equipment_for_station(&station.id, reports.equipment)
                .and_then(EquipmentView::from_report),
        })
    }
}

/// Stop row view model.
#[derive(Debug, Clone)]
pub struct StopView {
    pub station_name: String,
    pub arrival: String,
    pub departure: String,
    pub scheduled_arrival: Option<String>,
    pub scheduled_departure: Option<String>,
    pub platform: String,
    pub arrival_delay: Option<String>,
    pub arrival_delay_class: &'static str,
    pub departure_delay: Option<String>,
    pub departure_delay_class: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub equipment: Option<EquipmentView>,
}

impl StopView {
    pub fn from_stop(stop: &Stop, equipment: Option<&[EquipmentReport]>) -> Self {
        let arrival = format_display_time(Some(stop.arrival_time));
        let departure = format_display_time(Some(stop.departure_time));
        let retimed = |base: Option<NaiveDateTime>, shown: &str| {
            let base = format_display_time(Some(base?));
            (base != shown).then_some(base)
        };

        Self {
            station_name: stop.station_name.clone(),
            scheduled_arrival: retimed(stop.base_arrival_time, &arrival),
            scheduled_departure: retimed(stop.base_departure_time, &departure),
            arrival,
            departure,
            platform: stop.platform.clone(),
            arrival_delay: delay_label(stop.arrival_delay_minutes),
            arrival_delay_class: delay_class(stop.arrival_delay_minutes),
            departure_delay: delay_label(stop.departure_delay_minutes),
            departure_delay_class: delay_class(stop.departure_delay_minutes),
            status: stop.status.as_str(),
            status_label: match stop.status {
                StopStatus::Origin => "Départ",
                StopStatus::Terminus => "Terminus",
                StopStatus::Standard => "",
            },
            equipment: stop
                .stop_area_id
                .as_deref()
                .and_then(|id| equipment_for_station(id, equipment))
                .and_then(EquipmentView::from_report),
        }
    }
}

/// Journey view of the selected departure.
#[derive(Debug, Clone)]
pub struct JourneyView {
    pub train_number: String,
    pub destination: String,
    pub service_type: String,
    pub badge: Option<LineBadge>,
    pub stops: Vec<StopView>,
    pub disruptions: Vec<DisruptionDetail>,
}

impl JourneyView {
    /// Build from the session; `None` when no departure is selected.
    pub fn from_session(session: &ViewSession, reports: ReportsView<'_>) -> Option<Self> {
        let departure = session.selected_departure.as_ref()?;
        let row = DepartureView::from_departure(departure, None, true);

        let disruptions = disruptions_for_line(departure.line_id(), reports.disruptions)
            .unwrap_or_default()
            .into_iter()
            .map(|d| DisruptionDetail::from_disruption(d, departure.scheduled_time))
            .collect();

        Some(Self {
            train_number: row.train_number,
            destination: row.destination,
            service_type: row.service_type,
            badge: row.badge,
            stops: session
                .journey_stops
                .iter()
                .map(|s| StopView::from_stop(s, reports.equipment))
                .collect(),
            disruptions,
        })
    }
}

impl IndexTemplate {
    /// Render the whole session.
    pub fn from_session(session: &ViewSession, reports: ReportsView<'_>) -> Self {
        Self {
            search_text: session.search_text.clone(),
            error: session.error().map(String::from),
            suggestions: suggestions(session),
            board: BoardView::from_session(session, reports),
            journey: JourneyView::from_session(session, reports),
        }
    }
}

/// Suggestion views of the session.
pub fn suggestions(session: &ViewSession) -> Vec<StationView> {
    session
        .suggestions
        .iter()
        .map(|s| StationView {
            id: s.id.clone(),
            name: s.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{
        ApplicationPeriod, Availability, DepartureId, DisruptionStatus, Equipment, EquipmentKind,
        ImpactedObject, Message, Route, Severity, UNKNOWN_PLATFORM,
    };
    use crate::web::session::SelectedStation;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn line(name: Option<&str>, code: Option<&str>) -> Line {
        Line {
            id: "line:SNCF:TGV".into(),
            name: name.map(Into::into),
            code: code.map(Into::into),
            color: Some("B5005F".into()),
            text_color: None,
        }
    }

    fn departure() -> Departure {
        Departure {
            id: DepartureId::synthesize("6611", 0),
            train_number: "6611".into(),
            destination: "Marseille".into(),
            platform: UNKNOWN_PLATFORM.into(),
            scheduled_time: Some(at(9, 0)),
            real_time: Some(at(9, 7)),
            delay_minutes: Some(7),
            service_type: "TGV INOUI".into(),
            network: Some("SNCF".into()),
            disruption_refs: vec![],
            route: Some(Route {
                id: "route:1".into(),
                name: None,
                line: Some(line(Some("Paris - Marseille"), Some("TGV"))),
            }),
            stop_area_id: "sa:PGL".into(),
            vehicle_journey_id: Some("vj:1".into()),
        }
    }

    fn disruption(line_id: &str) -> Disruption {
        Disruption {
            id: "d1".into(),
            status: DisruptionStatus::Active,
            severity: Severity {
                name: Some("trip delayed".into()),
                effect: None,
                color: Some("#EF662F".into()),
            },
            messages: vec![
                Message {
                    text: "Travaux".into(),
                    channel: None,
                },
                Message {
                    text: "Excuses".into(),
                    channel: None,
                },
            ],
            impacted_objects: vec![ImpactedObject {
                id: line_id.into(),
                name: None,
                kind: None,
            }],
            application_periods: vec![],
        }
    }

    fn equipment_report(stop_area_id: &str) -> EquipmentReport {
        EquipmentReport {
            stop_area_id: stop_area_id.into(),
            stop_area_name: None,
            equipments: vec![Equipment {
                id: "e1".into(),
                name: "Ascenseur quai K".into(),
                kind: EquipmentKind::Elevator,
                availability: Some(Availability {
                    status: "unavailable".into(),
                    effect: Some("Hors service".into()),
                    cause: Some("Panne".into()),
                }),
            }],
        }
    }

    #[test]
    fn delay_labels() {
        assert_eq!(delay_label(Some(7)).as_deref(), Some("+7 min"));
        assert_eq!(delay_label(Some(-2)).as_deref(), Some("-2 min"));
        assert_eq!(delay_label(Some(0)), None);
        assert_eq!(delay_label(None), None);

        assert_eq!(delay_class(Some(7)), "late");
        assert_eq!(delay_class(Some(-2)), "early");
        assert_eq!(delay_class(Some(0)), "on-time");
    }

    #[test]
    fn badge_prefers_name_then_code() {
        let badge = LineBadge::from_line(&line(Some("Paris - Marseille"), Some("TGV"))).unwrap();
        assert_eq!(badge.label, "Paris - Marseille");
        assert_eq!(badge.background, "#B5005F");
        assert_eq!(badge.foreground, DEFAULT_BADGE_FOREGROUND);

        let badge = LineBadge::from_line(&line(Some(""), Some("R"))).unwrap();
        assert_eq!(badge.label, "R");

        assert!(LineBadge::from_line(&line(None, None)).is_none());
    }

    #[test]
    fn departure_view_late_with_disruption() {
        let reports = vec![disruption("line:SNCF:TGV:forward")];
        let view = DepartureView::from_departure(&departure(), Some(&reports), false);

        assert_eq!(view.time, "09:07");
        assert_eq!(view.scheduled_time, "09:00");
        assert!(view.is_retimed());
        assert_eq!(view.delay.as_deref(), Some("+7 min"));
        assert_eq!(view.delay_class, "late");
        assert_eq!(view.disruptions.len(), 1);
        assert_eq!(view.disruptions[0].severity, "trip delayed");
        assert_eq!(view.disruptions[0].message.as_deref(), Some("Travaux"));
    }

    #[test]
    fn departure_view_substitution() {
        let mut dep = departure();
        dep.service_type = "additional service".into();
        dep.network = Some("0".into());
        dep.real_time = None;
        dep.delay_minutes = None;

        let view = DepartureView::from_departure(&dep, None, false);
        assert!(view.is_substitution);
        assert_eq!(view.service_type, SUBSTITUTION_LABEL);
        assert!(view.network.is_none());
        assert_eq!(view.time, "09:00");
        assert!(view.delay.is_none());
        assert!(view.disruptions.is_empty());
    }

    #[test]
    fn stop_view_equipment_and_status() {
        let stop = Stop {
            id: "6611_0".into(),
            station_name: "Paris Gare de Lyon".into(),
            stop_area_id: Some("sa:PGL".into()),
            arrival_time: at(9, 7),
            departure_time: at(9, 7),
            base_arrival_time: Some(at(9, 0)),
            base_departure_time: Some(at(9, 7)),
            platform: "K".into(),
            arrival_delay_minutes: Some(7),
            departure_delay_minutes: Some(0),
            status: StopStatus::Origin,
        };
        let reports = vec![equipment_report("sa:PGL")];

        let view = StopView::from_stop(&stop, Some(&reports));
        assert_eq!(view.arrival, "09:07");
        assert_eq!(view.scheduled_arrival.as_deref(), Some("09:00"));
        assert!(view.scheduled_departure.is_none());
        assert_eq!(view.arrival_delay.as_deref(), Some("+7 min"));
        assert!(view.departure_delay.is_none());
        assert_eq!(view.status_label, "Départ");

        let equipment = view.equipment.unwrap();
        assert_eq!(equipment.unavailable_count(), 1);
        assert_eq!(equipment.items[0].kind, "Ascenseur");
        assert_eq!(equipment.items[0].status, "Hors service");
        assert_eq!(equipment.items[0].cause.as_deref(), Some("Panne"));
    }

    #[test]
    fn board_and_journey_from_session() {
        let mut session = ViewSession::new();
        let ticket = session.select_station(SelectedStation {
            id: "sa:PGL".into(),
            name: "Paris Gare de Lyon".into(),
        });
        session.apply_departures(ticket, Ok(vec![departure()]));

        let disruptions = vec![disruption("line:SNCF:TGV")];
        let equipment = vec![equipment_report("sa:PGL")];
        let reports = ReportsView {
            disruptions: Some(&disruptions),
            equipment: Some(&equipment),
        };

        let board = BoardView::from_session(&session, reports).unwrap();
        assert_eq!(board.station_name, "Paris Gare de Lyon");
        assert_eq!(board.departures.len(), 1);
        assert!(!board.departures[0].selected);
        assert!(board.equipment.is_some());
        assert!(JourneyView::from_session(&session, reports).is_none());

        session.select_departure(&DepartureId::synthesize("6611", 0));
        let board = BoardView::from_session(&session, reports).unwrap();
        assert!(board.departures[0].selected);

        let journey = JourneyView::from_session(&session, reports).unwrap();
        assert_eq!(journey.train_number, "6611");
        assert_eq!(journey.disruptions.len(), 1);
        assert_eq!(journey.disruptions[0].messages, vec!["Travaux", "Excuses"]);
        assert!(journey.disruptions[0].in_effect);
    }

    #[test]
    fn disruption_detail_outside_period() {
        let mut d = disruption("line:SNCF:TGV");
        d.application_periods = vec![ApplicationPeriod {
            begin: Some(at(12, 0)),
            end: Some(at(18, 0)),
        }];

        assert!(!DisruptionDetail::from_disruption(&d, Some(at(9, 0))).in_effect);
        assert!(DisruptionDetail::from_disruption(&d, Some(at(13, 0))).in_effect);
        assert!(DisruptionDetail::from_disruption(&d, None).in_effect);
    }

    #[test]
    fn templates_render() {
        let mut session = ViewSession::new();
        let ticket = session.select_station(SelectedStation {
            id: "sa:PGL".into(),
            name: "Paris Gare de Lyon".into(),
        });
        session.apply_departures(ticket, Ok(vec![departure()]));

        let html = IndexTemplate::from_session(&session, ReportsView::default())
            .render()
            .unwrap();
        assert!(html.contains("Paris Gare de Lyon"));
        assert!(html.contains("+7 min"));

        let html = SuggestionsTemplate {
            error: Some("Erreur".into()),
            suggestions: vec![],
        }
        .render()
        .unwrap();
        assert!(html.contains("Erreur"));
    }
}
