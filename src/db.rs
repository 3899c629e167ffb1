// 🗄️ SQLite Catalog Store - rows for items, positions, damage types, severities
//
// Writers (import, CLI) use the free functions on a `Connection`.
// The matcher reads through `SqliteCatalog`, which opens its own connection
// per listing so the four reads really run side by side (WAL).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use crate::catalog::CatalogSource;
use crate::entities::{DamageType, Item, Position, Severity, Stage};
use crate::error::StorageResult;

/// Rows fetched per round trip when listing items
pub const PAGE_SIZE: i64 = 1000;

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode so readers never block on the importer
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS catalog_items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(name) > 0),
            code TEXT NOT NULL UNIQUE,
            category TEXT NOT NULL CHECK (category IN ('exterior', 'mecanica', 'interior')),
            description TEXT,
            created_at TEXT
        );

        CREATE TABLE IF NOT EXISTS catalog_positions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(name) > 0),
            code TEXT NOT NULL UNIQUE,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS catalog_damage_types (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(name) > 0),
            code TEXT NOT NULL UNIQUE,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS catalog_severities (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK (length(name) > 0),
            code TEXT NOT NULL UNIQUE,
            level INTEGER NOT NULL CHECK (level BETWEEN 1 AND 4),
            color TEXT,
            description TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_items_category ON catalog_items(category);
        CREATE INDEX IF NOT EXISTS idx_items_name ON catalog_items(name);",
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn item_from_row(row: &Row) -> rusqlite::Result<Item> {
    let category: String = row.get(3)?;
    let created_at: Option<String> = row.get(5)?;

    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        category: category.parse().map_err(|e| conversion_error(3, e))?,
        description: row.get(4)?,
        created_at: created_at
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| conversion_error(5, e.to_string()))
            })
            .transpose()?,
    })
}

fn position_from_row(row: &Row) -> rusqlite::Result<Position> {
    Ok(Position {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
    })
}

fn damage_type_from_row(row: &Row) -> rusqlite::Result<DamageType> {
    Ok(DamageType {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
    })
}

fn severity_from_row(row: &Row) -> rusqlite::Result<Severity> {
    Ok(Severity {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        level: row.get(3)?,
        color: row.get(4)?,
        description: row.get(5)?,
    })
}

const ITEM_COLUMNS: &str = "id, name, code, category, description, created_at";
const POSITION_COLUMNS: &str = "id, name, code, description";
const SEVERITY_COLUMNS: &str = "id, name, code, level, color, description";

// ============================================================================
// READS
// ============================================================================

/// All items ordered by name, optionally only one stage
///
/// Paged in `PAGE_SIZE` chunks until a short page comes back.
pub fn list_items(conn: &Connection, stage: Option<Stage>) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM catalog_items
         WHERE (?1 IS NULL OR category = ?1)
         ORDER BY name, id
         LIMIT ?2 OFFSET ?3"
    ))?;

    let category = stage.map(|s| s.as_str());
    let mut items = Vec::new();
    let mut page = 0;

    loop {
        let rows = stmt
            .query_map(params![category, PAGE_SIZE, page * PAGE_SIZE], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let fetched = rows.len() as i64;
        items.extend(rows);

        if fetched < PAGE_SIZE {
            break;
        }
        page += 1;
    }

    Ok(items)
}

pub fn list_positions(conn: &Connection) -> rusqlite::Result<Vec<Position>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POSITION_COLUMNS} FROM catalog_positions ORDER BY name, id"
    ))?;
    let rows = stmt.query_map([], position_from_row)?;
    rows.collect()
}

pub fn list_damage_types(conn: &Connection) -> rusqlite::Result<Vec<DamageType>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POSITION_COLUMNS} FROM catalog_damage_types ORDER BY name, id"
    ))?;
    let rows = stmt.query_map([], damage_type_from_row)?;
    rows.collect()
}

/// All severities ordered by level
pub fn list_severities(conn: &Connection) -> rusqlite::Result<Vec<Severity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SEVERITY_COLUMNS} FROM catalog_severities ORDER BY level, name"
    ))?;
    let rows = stmt.query_map([], severity_from_row)?;
    rows.collect()
}

pub fn item_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Item>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM catalog_items WHERE id = ?1"),
        params![id],
        item_from_row,
    )
    .optional()
}

pub fn position_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Position>> {
    conn.query_row(
        &format!("SELECT {POSITION_COLUMNS} FROM catalog_positions WHERE id = ?1"),
        params![id],
        position_from_row,
    )
    .optional()
}

pub fn damage_type_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<DamageType>> {
    conn.query_row(
        &format!("SELECT {POSITION_COLUMNS} FROM catalog_damage_types WHERE id = ?1"),
        params![id],
        damage_type_from_row,
    )
    .optional()
}

pub fn severity_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Severity>> {
    conn.query_row(
        &format!("SELECT {SEVERITY_COLUMNS} FROM catalog_severities WHERE id = ?1"),
        params![id],
        severity_from_row,
    )
    .optional()
}

/// Distinct stages that currently have items
pub fn categories(conn: &Connection) -> rusqlite::Result<Vec<Stage>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT category FROM catalog_items ORDER BY category")?;

    let stages = stmt
        .query_map([], |row| {
            let raw: String = row.get(0)?;
            raw.parse::<Stage>().map_err(|e| conversion_error(0, e))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(stages)
}

// ============================================================================
// WRITES (upsert on code, the way bulk import expects)
// ============================================================================

/// Insert or update by `code`; returns the id of the stored row
///
/// An existing row keeps its id, so references to it stay valid.
pub fn upsert_item(conn: &Connection, item: &Item) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO catalog_items (id, name, code, category, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            description = excluded.description
         RETURNING id",
        params![
            item.id,
            item.name,
            item.code,
            item.category.as_str(),
            item.description,
            item.created_at.map(|dt| dt.to_rfc3339()),
        ],
        |row| row.get(0),
    )
}

pub fn upsert_position(conn: &Connection, position: &Position) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO catalog_positions (id, name, code, description)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            description = excluded.description
         RETURNING id",
        params![position.id, position.name, position.code, position.description],
        |row| row.get(0),
    )
}

pub fn upsert_damage_type(conn: &Connection, damage_type: &DamageType) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO catalog_damage_types (id, name, code, description)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            description = excluded.description
         RETURNING id",
        params![
            damage_type.id,
            damage_type.name,
            damage_type.code,
            damage_type.description
        ],
        |row| row.get(0),
    )
}

pub fn upsert_severity(conn: &Connection, severity: &Severity) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO catalog_severities (id, name, code, level, color, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(code) DO UPDATE SET
            name = excluded.name,
            level = excluded.level,
            color = excluded.color,
            description = excluded.description
         RETURNING id",
        params![
            severity.id,
            severity.name,
            severity.code,
            severity.level,
            severity.color,
            severity.description
        ],
        |row| row.get(0),
    )
}

/// Plain insert; a duplicate code is a constraint violation
pub fn insert_item(conn: &Connection, item: &Item) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO catalog_items (id, name, code, category, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            item.id,
            item.name,
            item.code,
            item.category.as_str(),
            item.description,
            item.created_at.map(|dt| dt.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn insert_position(conn: &Connection, position: &Position) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO catalog_positions (id, name, code, description) VALUES (?1, ?2, ?3, ?4)",
        params![position.id, position.name, position.code, position.description],
    )?;
    Ok(())
}

pub fn insert_damage_type(conn: &Connection, damage_type: &DamageType) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO catalog_damage_types (id, name, code, description) VALUES (?1, ?2, ?3, ?4)",
        params![
            damage_type.id,
            damage_type.name,
            damage_type.code,
            damage_type.description
        ],
    )?;
    Ok(())
}

pub fn insert_severity(conn: &Connection, severity: &Severity) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO catalog_severities (id, name, code, level, color, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            severity.id,
            severity.name,
            severity.code,
            severity.level,
            severity.color,
            severity.description
        ],
    )?;
    Ok(())
}

/// Overwrite the row with `item.id`; false when no such row
pub fn update_item(conn: &Connection, item: &Item) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE catalog_items SET name = ?2, code = ?3, category = ?4, description = ?5
         WHERE id = ?1",
        params![
            item.id,
            item.name,
            item.code,
            item.category.as_str(),
            item.description
        ],
    )?;
    Ok(changed > 0)
}

pub fn update_position(conn: &Connection, position: &Position) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE catalog_positions SET name = ?2, code = ?3, description = ?4 WHERE id = ?1",
        params![position.id, position.name, position.code, position.description],
    )?;
    Ok(changed > 0)
}

pub fn update_damage_type(conn: &Connection, damage_type: &DamageType) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE catalog_damage_types SET name = ?2, code = ?3, description = ?4 WHERE id = ?1",
        params![
            damage_type.id,
            damage_type.name,
            damage_type.code,
            damage_type.description
        ],
    )?;
    Ok(changed > 0)
}

pub fn update_severity(conn: &Connection, severity: &Severity) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE catalog_severities
         SET name = ?2, code = ?3, level = ?4, color = ?5, description = ?6
         WHERE id = ?1",
        params![
            severity.id,
            severity.name,
            severity.code,
            severity.level,
            severity.color,
            severity.description
        ],
    )?;
    Ok(changed > 0)
}

/// Catalog tables, one per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTable {
    Items,
    Positions,
    DamageTypes,
    Severities,
}

impl CatalogTable {
    pub const ALL: [CatalogTable; 4] = [
        CatalogTable::Items,
        CatalogTable::Positions,
        CatalogTable::DamageTypes,
        CatalogTable::Severities,
    ];

    /// URL segment naming the kind ("damage-types")
    pub fn slug(&self) -> &'static str {
        match self {
            CatalogTable::Items => "items",
            CatalogTable::Positions => "positions",
            CatalogTable::DamageTypes => "damage-types",
            CatalogTable::Severities => "severities",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.slug() == slug)
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            CatalogTable::Items => "catalog_items",
            CatalogTable::Positions => "catalog_positions",
            CatalogTable::DamageTypes => "catalog_damage_types",
            CatalogTable::Severities => "catalog_severities",
        }
    }
}

/// Delete a row by id; false when nothing had that id
pub fn delete_by_id(conn: &Connection, table: CatalogTable, id: &str) -> rusqlite::Result<bool> {
    let deleted = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table.table_name()),
        params![id],
    )?;
    Ok(deleted > 0)
}

pub fn count_rows(conn: &Connection, table: CatalogTable) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.table_name()),
        [],
        |row| row.get(0),
    )
}

// ============================================================================
// READ COLLABORATOR FOR THE MATCHER
// ============================================================================

/// Catalog stored in an SQLite file
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    path: PathBuf,
}

impl SqliteCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        SqliteCatalog {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-write connection with the schema in place
    pub fn connect(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        setup_database(&conn)?;
        Ok(conn)
    }

    /// Run a read on the blocking pool with a fresh connection
    ///
    /// The file must already exist; a missing database is a storage failure.
    pub async fn read<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        self.blocking(f).await
    }

    /// Run a write on the blocking pool, inside one transaction
    pub async fn write<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        self.blocking(move |conn| {
            let tx = conn.unchecked_transaction()?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
    }

    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();

        let value = tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            f(&conn)
        })
        .await??;

        Ok(value)
    }
}

impl CatalogSource for SqliteCatalog {
    async fn items(&self, stage: Option<Stage>) -> StorageResult<Vec<Item>> {
        self.read(move |conn| list_items(conn, stage)).await
    }

    async fn positions(&self) -> StorageResult<Vec<Position>> {
        self.read(list_positions).await
    }

    async fn damage_types(&self) -> StorageResult<Vec<DamageType>> {
        self.read(list_damage_types).await
    }

    async fn severities(&self) -> StorageResult<Vec<Severity>> {
        self.read(list_severities).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_catalog;
    use crate::error::StorageError;
    use tempfile::TempDir;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_upsert_keeps_id_on_code_conflict() {
        let conn = memory_db();

        let first = Item::new("Parabrisas", "PARABRISAS", Stage::Exterior);
        let first_id = upsert_item(&conn, &first).unwrap();
        assert_eq!(first_id, first.id);

        let renamed = Item::new("Parabrisas delantero", "PARABRISAS", Stage::Exterior);
        let second_id = upsert_item(&conn, &renamed).unwrap();
        assert_eq!(second_id, first.id);

        let stored = item_by_id(&conn, &first.id).unwrap().unwrap();
        assert_eq!(stored.name, "Parabrisas delantero");
        assert_eq!(count_rows(&conn, CatalogTable::Items).unwrap(), 1);
    }

    #[test]
    fn test_item_round_trip_preserves_fields() {
        let conn = memory_db();
        let item = Item::new("Motor", "MOTOR", Stage::Mecanica).with_description("Bloque y culata");
        upsert_item(&conn, &item).unwrap();

        let stored = item_by_id(&conn, &item.id).unwrap().unwrap();
        assert_eq!(stored.category, Stage::Mecanica);
        assert_eq!(stored.description.as_deref(), Some("Bloque y culata"));
        assert_eq!(
            stored.created_at.map(|dt| dt.timestamp()),
            item.created_at.map(|dt| dt.timestamp())
        );
    }

    #[test]
    fn test_list_items_filters_by_stage_and_sorts() {
        let conn = memory_db();
        upsert_item(&conn, &Item::new("Puerta", "PUERTA", Stage::Exterior)).unwrap();
        upsert_item(&conn, &Item::new("Motor", "MOTOR", Stage::Mecanica)).unwrap();
        upsert_item(&conn, &Item::new("Capot", "CAPOT", Stage::Exterior)).unwrap();

        let all: Vec<String> = list_items(&conn, None).unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(all, vec!["Capot", "Motor", "Puerta"]);

        let exterior = list_items(&conn, Some(Stage::Exterior)).unwrap();
        assert_eq!(exterior.len(), 2);
        assert!(exterior.iter().all(|i| i.category == Stage::Exterior));

        assert!(list_items(&conn, Some(Stage::Interior)).unwrap().is_empty());
    }

    #[test]
    fn test_list_items_pages_past_page_size() {
        let conn = memory_db();
        let total = PAGE_SIZE as usize + 5;
        for i in 0..total {
            let name = format!("Item {:05}", i);
            upsert_item(&conn, &Item::new(&name, &name, Stage::Interior)).unwrap();
        }

        let items = list_items(&conn, None).unwrap();
        assert_eq!(items.len(), total);
        assert_eq!(items.last().unwrap().name, format!("Item {:05}", total - 1));
    }

    #[test]
    fn test_severities_ordered_by_level() {
        let conn = memory_db();
        upsert_severity(&conn, &Severity::new("Crítico", "CRITICO", 4)).unwrap();
        upsert_severity(&conn, &Severity::new("Leve", "LEVE", 1)).unwrap();
        upsert_severity(&conn, &Severity::new("Grave", "GRAVE", 3)).unwrap();

        let levels: Vec<u8> = list_severities(&conn).unwrap().iter().map(|s| s.level).collect();
        assert_eq!(levels, vec![1, 3, 4]);
    }

    #[test]
    fn test_schema_rejects_empty_name() {
        let conn = memory_db();
        assert!(upsert_position(&conn, &Position::new("", "EMPTY")).is_err());
    }

    #[test]
    fn test_categories_distinct() {
        let conn = memory_db();
        upsert_item(&conn, &Item::new("Puerta", "PUERTA", Stage::Exterior)).unwrap();
        upsert_item(&conn, &Item::new("Capot", "CAPOT", Stage::Exterior)).unwrap();
        upsert_item(&conn, &Item::new("Tablero", "TABLERO", Stage::Interior)).unwrap();

        assert_eq!(categories(&conn).unwrap(), vec![Stage::Exterior, Stage::Interior]);
    }

    #[test]
    fn test_delete_by_id() {
        let conn = memory_db();
        let damage = DamageType::new("Fisura", "FISURA");
        upsert_damage_type(&conn, &damage).unwrap();

        assert!(delete_by_id(&conn, CatalogTable::DamageTypes, &damage.id).unwrap());
        assert!(!delete_by_id(&conn, CatalogTable::DamageTypes, &damage.id).unwrap());
        assert!(damage_type_by_id(&conn, &damage.id).unwrap().is_none());
    }

    #[test]
    fn test_insert_rejects_duplicate_code() {
        let conn = memory_db();
        insert_position(&conn, &Position::new("Delantera", "DELANTERA")).unwrap();

        let err = insert_position(&conn, &Position::new("Frontal", "DELANTERA")).unwrap_err();
        assert_eq!(err.sqlite_error_code(), Some(rusqlite::ErrorCode::ConstraintViolation));
    }

    #[test]
    fn test_update_by_id() {
        let conn = memory_db();
        let mut severity = Severity::new("Grave", "GRAVE", 3);
        insert_severity(&conn, &severity).unwrap();

        severity.level = 4;
        severity.color = Some("#D32F2F".to_string());
        assert!(update_severity(&conn, &severity).unwrap());

        let stored = severity_by_id(&conn, &severity.id).unwrap().unwrap();
        assert_eq!(stored.level, 4);
        assert_eq!(stored.color.as_deref(), Some("#D32F2F"));

        let unknown = Severity::new("Leve", "LEVE", 1);
        assert!(!update_severity(&conn, &unknown).unwrap());
    }

    #[test]
    fn test_table_slugs() {
        assert_eq!(CatalogTable::from_slug("damage-types"), Some(CatalogTable::DamageTypes));
        assert_eq!(CatalogTable::from_slug("items"), Some(CatalogTable::Items));
        assert_eq!(CatalogTable::from_slug("merchants"), None);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let dir = TempDir::new().unwrap();
        let catalog = SqliteCatalog::new(dir.path().join("catalog.db"));
        catalog.connect().unwrap();

        let result = catalog
            .write(|conn| {
                insert_damage_type(conn, &DamageType::new("Fisura", "FISURA"))?;
                insert_damage_type(conn, &DamageType::new("Grieta", "FISURA"))
            })
            .await;
        assert!(result.is_err());

        let count = catalog
            .read(|conn| count_rows(conn, CatalogTable::DamageTypes))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_sqlite_catalog_loads_snapshot() {
        let dir = TempDir::new().unwrap();
        let catalog = SqliteCatalog::new(dir.path().join("catalog.db"));
        {
            let conn = catalog.connect().unwrap();
            upsert_item(&conn, &Item::new("Motor", "MOTOR", Stage::Mecanica)).unwrap();
            upsert_item(&conn, &Item::new("Puerta", "PUERTA", Stage::Exterior)).unwrap();
            upsert_position(&conn, &Position::new("Delantera", "DELANTERA")).unwrap();
            upsert_damage_type(&conn, &DamageType::new("Rayón", "RAYON")).unwrap();
            upsert_severity(&conn, &Severity::new("Leve", "LEVE", 1)).unwrap();
        }

        let snapshot = load_catalog(&catalog, Some(Stage::Exterior)).await.unwrap();

        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].name, "Puerta");
        assert_eq!(snapshot.positions.len(), 1);
        assert_eq!(snapshot.damage_types.len(), 1);
        assert_eq!(snapshot.severities.len(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_catalog_missing_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let catalog = SqliteCatalog::new(dir.path().join("missing.db"));

        let err = load_catalog(&catalog, None).await.unwrap_err();
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
