//! Station accessibility equipment (elevators, escalators).

/// Kind of equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipmentKind {
    Elevator,
    Escalator,
}

impl EquipmentKind {
    /// Parse a Navitia `embedded_type`. Other kinds are not tracked.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "elevator" => Some(EquipmentKind::Elevator),
            "escalator" => Some(EquipmentKind::Escalator),
            _ => None,
        }
    }

    /// French label for display.
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentKind::Elevator => "Ascenseur",
            EquipmentKind::Escalator => "Escalator",
        }
    }
}

/// Availability of a piece of equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability {
    /// Navitia status, e.g. "available", "unavailable", "unknown".
    pub status: String,
    pub effect: Option<String>,
    pub cause: Option<String>,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        self.status == "available"
    }

    /// Effect label if the provider gave one, otherwise a generic label.
    pub fn summary(&self) -> &str {
        match self.effect.as_deref() {
            Some(effect) if !effect.is_empty() => effect,
            _ if self.is_available() => "Disponible",
            _ => "Non disponible",
        }
    }
}

/// One elevator or escalator.
#[derive(Debug, Clone, PartialEq)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub kind: EquipmentKind,
    pub availability: Option<Availability>,
}

/// Equipment status of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentReport {
    pub stop_area_id: String,
    pub stop_area_name: Option<String>,
    pub equipments: Vec<Equipment>,
}
