// 📚 Catalog Source - the storage read collaborator seen by the matcher
//
// The matcher never caches: every call re-reads the whole catalog through
// `load_catalog`, so results always reflect current storage state.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::entities::{DamageType, Item, Position, Severity, Stage};
use crate::error::StorageResult;

/// Read-only listing of each catalog kind
///
/// Only items accept a stage filter.
pub trait CatalogSource: Send + Sync {
    fn items(&self, stage: Option<Stage>) -> impl Future<Output = StorageResult<Vec<Item>>> + Send;

    fn positions(&self) -> impl Future<Output = StorageResult<Vec<Position>>> + Send;

    fn damage_types(&self) -> impl Future<Output = StorageResult<Vec<DamageType>>> + Send;

    fn severities(&self) -> impl Future<Output = StorageResult<Vec<Severity>>> + Send;
}

/// Full catalog as of one read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub items: Vec<Item>,
    pub positions: Vec<Position>,
    #[serde(rename = "damageTypes")]
    pub damage_types: Vec<DamageType>,
    pub severities: Vec<Severity>,
}

/// Read all four catalog kinds concurrently
///
/// Fails as soon as any read fails; no partial snapshot is returned.
pub async fn load_catalog<S: CatalogSource>(
    source: &S,
    stage: Option<Stage>,
) -> StorageResult<CatalogSnapshot> {
    let (items, positions, damage_types, severities) = tokio::try_join!(
        source.items(stage),
        source.positions(),
        source.damage_types(),
        source.severities(),
    )?;

    Ok(CatalogSnapshot {
        items,
        positions,
        damage_types,
        severities,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::error::StorageError;

    #[tokio::test]
    async fn test_load_catalog_filters_items_only() {
        let source = MemoryCatalog::new(sample_snapshot());

        let snapshot = load_catalog(&source, Some(Stage::Mecanica)).await.unwrap();

        assert_eq!(snapshot.items.len(), 2);
        assert!(snapshot.items.iter().all(|i| i.category == Stage::Mecanica));
        assert_eq!(snapshot.positions.len(), 2);
        assert_eq!(snapshot.damage_types.len(), 2);
        assert_eq!(snapshot.severities.len(), 4);
    }

    #[tokio::test]
    async fn test_load_catalog_fails_fast() {
        let source = BrokenPositions(MemoryCatalog::new(sample_snapshot()));

        let err = load_catalog(&source, None).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
    }
}
