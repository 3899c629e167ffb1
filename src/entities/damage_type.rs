// 💥 Damage Type Entity - What happened to the part
//
// "Rayón", "Abolladura", "Fisura" ...

use serde::{Deserialize, Serialize};

use super::CatalogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageType {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    /// Unique business code
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DamageType {
    /// Create new damage type with a fresh UUID
    pub fn new(name: &str, code: &str) -> Self {
        DamageType {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            code: code.to_string(),
            description: None,
        }
    }
}

impl CatalogEntry for DamageType {
    fn name(&self) -> &str {
        &self.name
    }
}
