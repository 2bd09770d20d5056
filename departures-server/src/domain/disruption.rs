//! Disruptions (traffic information).
//!
//! A disruption is a provider-issued service impact notice, tied to one or
//! more transit objects (lines, stop areas, networks) through its impacted
//! objects.

use chrono::NaiveDateTime;

/// Lifecycle status of a disruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisruptionStatus {
    Active,
    Future,
    Past,
    Unknown,
}

impl DisruptionStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => DisruptionStatus::Active,
            "future" => DisruptionStatus::Future,
            "past" => DisruptionStatus::Past,
            _ => DisruptionStatus::Unknown,
        }
    }
}

/// How serious a disruption is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Severity {
    pub name: Option<String>,
    /// Navitia effect, e.g. "SIGNIFICANT_DELAYS", "NO_SERVICE".
    pub effect: Option<String>,
    /// CSS colour, e.g. "#EF662F".
    pub color: Option<String>,
}

/// Distribution channel of a message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Channel {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub types: Vec<String>,
}

/// A message describing a disruption.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub channel: Option<Channel>,
}

/// A transit object a disruption applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactedObject {
    pub id: String,
    pub name: Option<String>,
    /// Navitia embedded type, e.g. "line", "stop_area".
    pub kind: Option<String>,
}

/// A period during which a disruption applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplicationPeriod {
    pub begin: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl ApplicationPeriod {
    /// Whether `instant` falls in this period. Open ends are unbounded.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.begin.is_none_or(|b| b <= instant) && self.end.is_none_or(|e| instant < e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disruption {
    pub id: String,
    pub status: DisruptionStatus,
    pub severity: Severity,
    pub messages: Vec<Message>,
    pub impacted_objects: Vec<ImpactedObject>,
    pub application_periods: Vec<ApplicationPeriod>,
}

impl Disruption {
    /// Whether any impacted object id equals or contains `object_id`.
    ///
    /// Substring matching catches provider ids that carry directional
    /// suffixes for the same physical line.
    pub fn impacts(&self, object_id: &str) -> bool {
        self.impacted_objects
            .iter()
            .any(|o| o.id == object_id || o.id.contains(object_id))
    }

    /// First message text, if any.
    pub fn headline(&self) -> Option<&str> {
        self.messages.first().map(|m| m.text.as_str())
    }

    /// Whether the disruption applies at `instant`.
    ///
    /// A disruption without application periods is taken to apply always.
    pub fn applies_at(&self, instant: NaiveDateTime) -> bool {
        self.application_periods.is_empty()
            || self.application_periods.iter().any(|p| p.contains(instant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn disruption(impacted: &[&str]) -> Disruption {
        Disruption {
            id: "d1".into(),
            status: DisruptionStatus::Active,
            severity: Severity::default(),
            messages: vec![],
            impacted_objects: impacted
                .iter()
                .map(|id| ImpactedObject {
                    id: id.to_string(),
                    name: None,
                    kind: Some("line".into()),
                })
                .collect(),
            application_periods: vec![],
        }
    }

    #[test]
    fn status_parse() {
        assert_eq!(DisruptionStatus::parse("active"), DisruptionStatus::Active);
        assert_eq!(DisruptionStatus::parse("future"), DisruptionStatus::Future);
        assert_eq!(DisruptionStatus::parse("past"), DisruptionStatus::Past);
        assert_eq!(DisruptionStatus::parse("weird"), DisruptionStatus::Unknown);
    }

    #[test]
    fn impacts_exact_and_substring() {
        let d = disruption(&["line:L1:forward"]);
        assert!(d.impacts("line:L1:forward"));
        assert!(d.impacts("L1"));
        assert!(!d.impacts("L2"));
    }

    #[test]
    fn headline_is_first_message() {
        let mut d = disruption(&[]);
        assert_eq!(d.headline(), None);
        d.messages = vec![
            Message {
                text: "Travaux".into(),
                channel: None,
            },
            Message {
                text: "Second".into(),
                channel: None,
            },
        ];
        assert_eq!(d.headline(), Some("Travaux"));
    }

    #[test]
    fn application_periods() {
        let mut d = disruption(&[]);
        assert!(d.applies_at(at(10)));

        d.application_periods = vec![ApplicationPeriod {
            begin: Some(at(8)),
            end: Some(at(12)),
        }];
        assert!(d.applies_at(at(8)));
        assert!(d.applies_at(at(11)));
        assert!(!d.applies_at(at(12)));
        assert!(!d.applies_at(at(7)));

        d.application_periods = vec![ApplicationPeriod {
            begin: Some(at(8)),
            end: None,
        }];
        assert!(d.applies_at(at(23)));
    }
}
