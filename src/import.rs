// 📥 Catalog Import - bulk load catalog rows from CSV files
//
// One file per catalog kind, English or Spanish file names and headers:
//   items.csv                          name|nombre, code|codigo, category|categoria, description|descripcion
//   positions.csv / posiciones.csv     name|nombre, code|codigo, description|descripcion
//   damage_types.csv / tipos_dano.csv  name|nombre, code|codigo, description|descripcion
//   severities.csv / severidades.csv   name|nombre, code|codigo, level|nivel, color, description|descripcion
//
// Rows upsert on code. Bad rows are reported and skipped; they never abort the import.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::{upsert_damage_type, upsert_item, upsert_position, upsert_severity, CatalogTable};
use crate::entities::severity::{MAX_LEVEL, MIN_LEVEL};
use crate::entities::{DamageType, Item, Position, Severity, Stage};
use crate::normalize::generate_code;

pub const ITEM_FILES: &[&str] = &["items.csv"];
pub const POSITION_FILES: &[&str] = &["positions.csv", "posiciones.csv"];
pub const DAMAGE_TYPE_FILES: &[&str] = &["damage_types.csv", "tipos_dano.csv"];
pub const SEVERITY_FILES: &[&str] = &["severities.csv", "severidades.csv"];

// ============================================================================
// REPORT
// ============================================================================

/// Outcome for one catalog kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KindReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub items: KindReport,
    pub positions: KindReport,
    #[serde(rename = "damageTypes")]
    pub damage_types: KindReport,
    pub severities: KindReport,
}

impl ImportReport {
    pub fn total_imported(&self) -> usize {
        self.items.imported
            + self.positions.imported
            + self.damage_types.imported
            + self.severities.imported
    }

    pub fn total_errors(&self) -> usize {
        self.items.errors.len()
            + self.positions.errors.len()
            + self.damage_types.errors.len()
            + self.severities.errors.len()
    }
}

// ============================================================================
// CSV ROW
// ============================================================================

/// One CSV record keyed by lowercased header
struct CsvRow(HashMap<String, String>);

impl CsvRow {
    /// First non-blank value among `keys`
    fn field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    fn name(&self) -> Option<&str> {
        self.field(&["name", "nombre"])
    }

    fn code(&self, name: &str) -> String {
        self.field(&["code", "codigo"])
            .map(str::to_string)
            .unwrap_or_else(|| generate_code(name))
    }

    fn description(&self) -> Option<String> {
        self.field(&["description", "descripcion"]).map(str::to_string)
    }

    fn describe(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Leading integer of a level cell, clamped to 1-4; missing, zero or garbage → 1
///
/// Example: "3" → 3, "2.0" → 2, "3abc" → 3, "alto" → 1, "9" → 4
pub fn parse_level(raw: Option<&str>) -> u8 {
    let parsed = raw
        .map(str::trim)
        .and_then(leading_integer)
        .filter(|level| *level != 0)
        .unwrap_or(1);

    parsed.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8
}

/// Optional sign then the run of ASCII digits that follows it
fn leading_integer(s: &str) -> Option<i64> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let digits = unsigned.len()
        - unsigned
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .len();
    let sign_len = s.len() - unsigned.len();

    s[..sign_len + digits].parse::<i64>().ok()
}

fn item_from_csv(row: &CsvRow, name: &str) -> Item {
    let category = Stage::from_loose(row.field(&["category", "categoria"]).unwrap_or(""));
    let mut item = Item::new(name, &row.code(name), category);
    item.description = row.description();
    item
}

fn position_from_csv(row: &CsvRow, name: &str) -> Position {
    let mut position = Position::new(name, &row.code(name));
    position.description = row.description();
    position
}

fn damage_type_from_csv(row: &CsvRow, name: &str) -> DamageType {
    let mut damage_type = DamageType::new(name, &row.code(name));
    damage_type.description = row.description();
    damage_type
}

fn severity_from_csv(row: &CsvRow, name: &str) -> Severity {
    let level = parse_level(row.field(&["level", "nivel"]));
    let mut severity = Severity::new(name, &row.code(name), level);
    severity.color = row.field(&["color"]).map(str::to_string);
    severity.description = row.description();
    severity
}

// ============================================================================
// IMPORT
// ============================================================================

/// Read every record of one CSV and upsert it
fn import_rows<R, T, B, U>(conn: &Connection, reader: R, build: B, upsert: U) -> Result<KindReport>
where
    R: Read,
    B: Fn(&CsvRow, &str) -> T,
    U: Fn(&Connection, &T) -> rusqlite::Result<String>,
{
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut report = KindReport::default();

    for (line, record) in rdr.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(format!("Failed to read row {}: {}", line + 1, e));
                continue;
            }
        };

        let row = CsvRow(
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        );

        let Some(name) = row.name() else {
            warn!(row = line + 1, "skipping catalog row without a name");
            report.errors.push(format!("Row without name: {}", row.describe()));
            continue;
        };

        let entry = build(&row, name);
        match upsert(conn, &entry) {
            Ok(_) => report.imported += 1,
            Err(e) => report
                .errors
                .push(format!("Failed to import \"{}\": {}", name, e)),
        }
    }

    Ok(report)
}

pub fn import_items<R: Read>(conn: &Connection, reader: R) -> Result<KindReport> {
    import_rows(conn, reader, item_from_csv, upsert_item)
}

pub fn import_positions<R: Read>(conn: &Connection, reader: R) -> Result<KindReport> {
    import_rows(conn, reader, position_from_csv, upsert_position)
}

pub fn import_damage_types<R: Read>(conn: &Connection, reader: R) -> Result<KindReport> {
    import_rows(conn, reader, damage_type_from_csv, upsert_damage_type)
}

pub fn import_severities<R: Read>(conn: &Connection, reader: R) -> Result<KindReport> {
    import_rows(conn, reader, severity_from_csv, upsert_severity)
}

/// One kind from any reader (a file, an uploaded body)
pub fn import_table<R: Read>(conn: &Connection, table: CatalogTable, reader: R) -> Result<KindReport> {
    match table {
        CatalogTable::Items => import_items(conn, reader),
        CatalogTable::Positions => import_positions(conn, reader),
        CatalogTable::DamageTypes => import_damage_types(conn, reader),
        CatalogTable::Severities => import_severities(conn, reader),
    }
}

/// Accepted file names for a kind, in lookup order
pub fn file_names(table: CatalogTable) -> &'static [&'static str] {
    match table {
        CatalogTable::Items => ITEM_FILES,
        CatalogTable::Positions => POSITION_FILES,
        CatalogTable::DamageTypes => DAMAGE_TYPE_FILES,
        CatalogTable::Severities => SEVERITY_FILES,
    }
}

/// First of `names` that exists in `dir`
fn find_file(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

fn import_file(conn: &Connection, dir: &Path, table: CatalogTable) -> Result<KindReport> {
    let Some(path) = find_file(dir, file_names(table)) else {
        return Ok(KindReport::default());
    };

    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let report =
        import_table(conn, table, file).with_context(|| format!("Failed to import {:?}", path))?;

    info!(
        file = %path.display(),
        imported = report.imported,
        errors = report.errors.len(),
        "imported catalog file"
    );
    Ok(report)
}

/// Import whichever catalog files are present in `dir`
pub fn import_dir(conn: &Connection, dir: &Path) -> Result<ImportReport> {
    if !dir.is_dir() {
        anyhow::bail!("Import directory not found: {:?}", dir);
    }

    Ok(ImportReport {
        items: import_file(conn, dir, CatalogTable::Items)?,
        positions: import_file(conn, dir, CatalogTable::Positions)?,
        damage_types: import_file(conn, dir, CatalogTable::DamageTypes)?,
        severities: import_file(conn, dir, CatalogTable::Severities)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{count_rows, list_items, list_severities, setup_database};
    use tempfile::TempDir;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level(Some("3")), 3);
        assert_eq!(parse_level(Some(" 2.0 ")), 2);
        assert_eq!(parse_level(Some("alto")), 1);
        assert_eq!(parse_level(Some("0")), 1);
        assert_eq!(parse_level(Some("9")), 4);
        assert_eq!(parse_level(Some("-2")), 1);
        assert_eq!(parse_level(Some("3abc")), 3);
        assert_eq!(parse_level(Some("4 - crítico")), 4);
        assert_eq!(parse_level(Some("+2")), 2);
        assert_eq!(parse_level(Some("-")), 1);
        assert_eq!(parse_level(None), 1);
    }

    #[test]
    fn test_import_items_maps_spanish_headers() {
        let conn = memory_db();
        let csv = "nombre,codigo,categoria,descripcion\n\
                   Parabrisas,,Exterior,Vidrio frontal\n\
                   Motor,MOT,Mecánica,\n\
                   Tablero,,interior,\n";

        let report = import_items(&conn, csv.as_bytes()).unwrap();
        assert_eq!(report.imported, 3);
        assert!(report.errors.is_empty());

        let items = list_items(&conn, None).unwrap();
        let motor = items.iter().find(|i| i.name == "Motor").unwrap();
        assert_eq!(motor.code, "MOT");
        assert_eq!(motor.category, Stage::Mecanica);

        let parabrisas = items.iter().find(|i| i.name == "Parabrisas").unwrap();
        assert_eq!(parabrisas.code, "PARABRISAS");
        assert_eq!(parabrisas.description.as_deref(), Some("Vidrio frontal"));

        let tablero = items.iter().find(|i| i.name == "Tablero").unwrap();
        assert_eq!(tablero.category, Stage::Interior);
    }

    #[test]
    fn test_rows_without_name_are_reported() {
        let conn = memory_db();
        let csv = "name,code\n,ORPHAN\nDelantera,\n";

        let report = import_positions(&conn, csv.as_bytes()).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Row without name"));
    }

    #[test]
    fn test_reimport_upserts_on_code() {
        let conn = memory_db();
        import_damage_types(&conn, "name,code\nRayon,RAYON\n".as_bytes()).unwrap();
        import_damage_types(&conn, "name,code\nRayón,RAYON\n".as_bytes()).unwrap();

        assert_eq!(count_rows(&conn, CatalogTable::DamageTypes).unwrap(), 1);
    }

    #[test]
    fn test_import_severities_levels_and_colors() {
        let conn = memory_db();
        let csv = "nombre,nivel,color\nLeve,1,#4CAF50\nGrave,3,\nSin nivel,,\n";

        let report = import_severities(&conn, csv.as_bytes()).unwrap();
        assert_eq!(report.imported, 3);

        let severities = list_severities(&conn).unwrap();
        let leve = severities.iter().find(|s| s.name == "Leve").unwrap();
        assert_eq!(leve.color.as_deref(), Some("#4CAF50"));
        let sin_nivel = severities.iter().find(|s| s.name == "Sin nivel").unwrap();
        assert_eq!(sin_nivel.level, 1);
        assert_eq!(sin_nivel.code, "SIN_NIVEL");
    }

    #[test]
    fn test_import_dir_uses_available_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("items.csv"), "name,category\nPuerta,exterior\n").unwrap();
        std::fs::write(dir.path().join("posiciones.csv"), "nombre\nTrasera\nDelantera\n").unwrap();

        let conn = memory_db();
        let report = import_dir(&conn, dir.path()).unwrap();

        assert_eq!(report.items.imported, 1);
        assert_eq!(report.positions.imported, 2);
        assert_eq!(report.damage_types, KindReport::default());
        assert_eq!(report.total_imported(), 3);
        assert_eq!(report.total_errors(), 0);
    }

    #[test]
    fn test_import_dir_missing_directory() {
        let conn = memory_db();
        assert!(import_dir(&conn, Path::new("/definitely/not/here")).is_err());
    }
}
