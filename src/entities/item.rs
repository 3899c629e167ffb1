// 🚗 Item Entity - Inspectable vehicle parts, partitioned by stage
//
// "Parabrisas", "Puerta delantera izquierda", "Motor" ...
// Items are the only catalog kind filtered by inspection stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::CatalogEntry;

// ============================================================================
// STAGE
// ============================================================================

/// Inspection phase. Partitions items only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Bodywork, glass, lights, wheels
    Exterior,

    /// Engine bay and running gear
    Mecanica,

    /// Cabin, seats, dashboard
    Interior,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Exterior => "exterior",
            Stage::Mecanica => "mecanica",
            Stage::Interior => "interior",
        }
    }

    /// Loose mapping used for imported spreadsheet values
    ///
    /// Example: "Mecánica / Motor" → Mecanica, "INTERIOR" → Interior, "" → Exterior
    pub fn from_loose(raw: &str) -> Stage {
        let lowered = raw.trim().to_lowercase();

        if lowered.contains("mec") || lowered.contains("motor") {
            return Stage::Mecanica;
        }
        if lowered.contains("int") {
            return Stage::Interior;
        }
        Stage::Exterior
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exterior" => Ok(Stage::Exterior),
            "mecanica" => Ok(Stage::Mecanica),
            "interior" => Ok(Stage::Interior),
            other => Err(format!("unknown stage: {}", other)),
        }
    }
}

// ============================================================================
// ITEM ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identity (UUID)
    pub id: String,

    /// Display name, the value scored by the matcher
    pub name: String,

    /// Unique business code (e.g., "PARABRISAS")
    pub code: String,

    /// Stage this item is inspected in
    pub category: Stage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Item {
    /// Create new item with a fresh UUID
    pub fn new(name: &str, code: &str, category: Stage) -> Self {
        Item {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            category,
            description: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl CatalogEntry for Item {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = Item::new("Parabrisas", "PARABRISAS", Stage::Exterior);

        assert!(!item.id.is_empty());
        assert_eq!(item.name, "Parabrisas");
        assert_eq!(item.category, Stage::Exterior);
        assert!(item.description.is_none());
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_stage_round_trips_as_lowercase() {
        let json = serde_json::to_string(&Stage::Mecanica).unwrap();
        assert_eq!(json, "\"mecanica\"");

        let stage: Stage = serde_json::from_str("\"interior\"").unwrap();
        assert_eq!(stage, Stage::Interior);
        assert!("Mecanica".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_from_loose() {
        assert_eq!(Stage::from_loose("Mecánica"), Stage::Mecanica);
        assert_eq!(Stage::from_loose("  MOTOR "), Stage::Mecanica);
        assert_eq!(Stage::from_loose("Interior"), Stage::Interior);
        assert_eq!(Stage::from_loose("carrocería"), Stage::Exterior);
        assert_eq!(Stage::from_loose(""), Stage::Exterior);
    }

    #[test]
    fn test_item_skips_absent_optionals() {
        let mut item = Item::new("Motor", "MOTOR", Stage::Mecanica);
        item.created_at = None;

        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("description").is_none());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["category"], "mecanica");
    }
}
