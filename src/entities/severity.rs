// 🚦 Severity Entity - Ordinal damage level (1 = leve ... 4 = crítico)
//
// Severities are resolved mostly through keywords, not names: "golpe leve"
// maps to level 1 even though no severity is literally called "leve".

use serde::{Deserialize, Serialize};

use super::CatalogEntry;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Severity {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    /// Unique business code
    pub code: String,

    /// 1-4, totally orders severities
    pub level: u8,

    /// Optional color for UI (e.g., "#FF5733")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Severity {
    /// Create new severity with a fresh UUID
    ///
    /// Levels outside 1-4 are clamped into range.
    pub fn new(name: &str, code: &str, level: u8) -> Self {
        Severity {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            color: None,
            description: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

impl CatalogEntry for Severity {
    fn name(&self) -> &str {
        &self.name
    }
}
