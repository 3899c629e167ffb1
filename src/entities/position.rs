// 📍 Position Entity - Where on the vehicle a finding sits
//
// "Delantera", "Trasera izquierda", "Techo" ...

use serde::{Deserialize, Serialize};

use super::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    /// Unique business code
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Position {
    /// Create new position with a fresh UUID
    pub fn new(name: &str, code: &str) -> Self {
        Position {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            description: None,
        }
    }
}

impl CatalogEntry for Position {
    fn name(&self) -> &str {
        &self.name
    }
}
