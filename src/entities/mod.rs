// Catalog Entities
// The fixed reference set free text is resolved against.
//
// Each entity has:
// - Stable identity (UUID) assigned when the row is created
// - A unique business code (import upserts on it)
// - A display name, which is what the matcher scores

pub mod item;
pub mod position;
pub mod damage_type;
pub mod severity;

pub use item::{Item, Stage};
pub use position::Position;
pub use damage_type::DamageType;
pub use severity::Severity;

/// Anything the matcher can score by name
pub trait CatalogEntry {
    fn name(&self) -> &str;
}
