// Catalog Match - Core Library
// Resolves noisy inspection phrases (item, position, damage, severity) to catalog rows.
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod normalize;      // Accent/case/punctuation-free text
pub mod score;          // Partial-match similarity
pub mod matcher;        // Best match, severity keywords, orchestration
pub mod entities;       // Catalog entity models
pub mod catalog;        // Storage read collaborator
pub mod db;             // SQLite catalog store
pub mod import;         // CSV bulk import
pub mod config;
pub mod logging;
pub mod error;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use normalize::{normalize, generate_code};
pub use score::{score, CONTAINMENT_SCORE, MAX_NOISE_TOKEN_LEN};
pub use matcher::{
    find_best_match, find_severity_match, keyword_level,
    match_entities, match_entities_in, match_request, match_text, match_text_in,
    ExtractedEntities, MatchRequest, MatchResult,
    ACCEPTANCE_THRESHOLD, SEVERITY_KEYWORDS,
};
pub use entities::{
    CatalogEntry, DamageType, Item, Position, Severity, Stage,
};
pub use catalog::{load_catalog, CatalogSnapshot, CatalogSource};
pub use db::{setup_database, CatalogTable, SqliteCatalog};
pub use import::{import_dir, import_table, ImportReport, KindReport};
pub use config::Config;
pub use error::{MatchError, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
