// 🎯 Catalog Matcher - resolve noisy entity strings to catalog rows
//
// Two entry points, one core:
// - Whole text: the same sentence is scored against every catalog kind
// - Pre-segmented entities: each field only against its own kind
//
// "No match" is a first-class outcome (an absent field), never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{load_catalog, CatalogSnapshot, CatalogSource};
use crate::entities::{CatalogEntry, DamageType, Item, Position, Severity, Stage};
use crate::error::MatchError;
use crate::normalize::normalize;
use crate::score::score;

/// Best score must be strictly above this to count as a match
pub const ACCEPTANCE_THRESHOLD: f64 = 0.3;

/// Keyword → severity level, scanned in THIS order; first hit wins.
///
/// Keep it a list: reordering entries changes results when keywords overlap.
pub const SEVERITY_KEYWORDS: &[(&str, u8)] = &[
    ("leve", 1),
    ("menor", 1),
    ("pequeño", 1),
    ("pequeña", 1),
    ("minimo", 1),
    ("moderado", 2),
    ("moderada", 2),
    ("medio", 2),
    ("media", 2),
    ("grave", 3),
    ("severo", 3),
    ("severa", 3),
    ("importante", 3),
    ("critico", 4),
    ("critica", 4),
    ("total", 4),
    ("urgente", 4),
];

// ============================================================================
// REQUEST / RESULT
// ============================================================================

/// Field strings already isolated by the upstream extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_text: Option<String>,
}

/// A match call; `entities` wins over `text` when both are present
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRequest {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub entities: Option<ExtractedEntities>,

    #[serde(default)]
    pub stage: Option<Stage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub item: Option<Item>,
    pub position: Option<Position>,
    pub damage_type: Option<DamageType>,
    pub severity: Option<Severity>,

    /// Resolved fields / 4 (not an average of scores)
    pub confidence: f64,

    pub raw_extraction: ExtractedEntities,
}

impl MatchResult {
    fn new(
        item: Option<Item>,
        position: Option<Position>,
        damage_type: Option<DamageType>,
        severity: Option<Severity>,
        raw_extraction: ExtractedEntities,
    ) -> Self {
        let resolved = [
            item.is_some(),
            position.is_some(),
            damage_type.is_some(),
            severity.is_some(),
        ]
        .iter()
        .filter(|found| **found)
        .count();

        MatchResult {
            item,
            position,
            damage_type,
            severity,
            confidence: resolved as f64 / 4.0,
            raw_extraction,
        }
    }
}

// ============================================================================
// CORE MATCHING
// ============================================================================

/// Best-scoring candidate for an already normalized query
///
/// Ties keep the first candidate seen. Returns None unless the best score
/// is strictly above `ACCEPTANCE_THRESHOLD`.
pub fn find_best_match<'a, T: CatalogEntry>(query: &str, candidates: &'a [T]) -> Option<&'a T> {
    let mut best: Option<&T> = None;
    let mut best_score = 0.0;

    for candidate in candidates {
        let s = score(query, &normalize(candidate.name()));
        if s > best_score && s > ACCEPTANCE_THRESHOLD {
            best_score = s;
            best = Some(candidate);
        }
    }

    best
}

/// Severity for an already normalized query
///
/// A keyword hit decides the level outright (even if no severity has that
/// level, in which case the result is None). Without a hit, falls back to
/// matching severity names.
pub fn find_severity_match<'a>(query: &str, severities: &'a [Severity]) -> Option<&'a Severity> {
    if let Some(level) = keyword_level(query) {
        return severities.iter().find(|s| s.level == level);
    }

    find_best_match(query, severities)
}

/// Level of the first keyword (in table order) contained in the query
pub fn keyword_level(query: &str) -> Option<u8> {
    SEVERITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| query.contains(keyword))
        .map(|(_, level)| *level)
}

/// Normalize a caller field; blank (or all-punctuation) text counts as absent
fn normalized_field(raw: Option<&str>) -> Option<String> {
    raw.map(normalize).filter(|q| !q.is_empty())
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Whole-text mode against a catalog already in hand
///
/// The same normalized sentence is scored against every kind. Blank text
/// resolves nothing here; `match_text` rejects it before reading storage.
pub fn match_text_in(catalog: &CatalogSnapshot, text: &str) -> MatchResult {
    let Some(query) = normalized_field(Some(text)) else {
        return MatchResult::new(None, None, None, None, extract_entities_from_text(text));
    };

    MatchResult::new(
        find_best_match(&query, &catalog.items).cloned(),
        find_best_match(&query, &catalog.positions).cloned(),
        find_best_match(&query, &catalog.damage_types).cloned(),
        find_severity_match(&query, &catalog.severities).cloned(),
        extract_entities_from_text(text),
    )
}

/// Pre-segmented mode against a catalog already in hand
///
/// Missing fields are skipped entirely, not scored.
pub fn match_entities_in(catalog: &CatalogSnapshot, entities: &ExtractedEntities) -> MatchResult {
    let item = normalized_field(entities.item_text.as_deref())
        .and_then(|q| find_best_match(&q, &catalog.items).cloned());
    let position = normalized_field(entities.position_text.as_deref())
        .and_then(|q| find_best_match(&q, &catalog.positions).cloned());
    let damage_type = normalized_field(entities.damage_text.as_deref())
        .and_then(|q| find_best_match(&q, &catalog.damage_types).cloned());
    let severity = normalized_field(entities.severity_text.as_deref())
        .and_then(|q| find_severity_match(&q, &catalog.severities).cloned());

    MatchResult::new(item, position, damage_type, severity, entities.clone())
}

/// Whole-text mode; re-reads the catalog (items filtered by `stage`)
///
/// Text that normalizes to nothing (blank, punctuation only) is `InvalidInput`.
pub async fn match_text<S: CatalogSource>(
    source: &S,
    text: &str,
    stage: Option<Stage>,
) -> Result<MatchResult, MatchError> {
    if normalized_field(Some(text)).is_none() {
        return Err(MatchError::InvalidInput(
            "text has no letters or digits to match".to_string(),
        ));
    }

    let catalog = load_catalog(source, stage).await?;
    let result = match_text_in(&catalog, text);
    log_result("text", &result);
    Ok(result)
}

/// Pre-segmented mode; re-reads the catalog (items filtered by `stage`)
pub async fn match_entities<S: CatalogSource>(
    source: &S,
    entities: &ExtractedEntities,
    stage: Option<Stage>,
) -> Result<MatchResult, MatchError> {
    debug!(
        has_item = entities.item_text.is_some(),
        has_position = entities.position_text.is_some(),
        has_damage = entities.damage_text.is_some(),
        has_severity = entities.severity_text.is_some(),
        "processing extracted entities"
    );

    let catalog = load_catalog(source, stage).await?;
    let result = match_entities_in(&catalog, entities);
    log_result("entities", &result);
    Ok(result)
}

/// Dispatch a request to the right mode
pub async fn match_request<S: CatalogSource>(
    source: &S,
    request: &MatchRequest,
) -> Result<MatchResult, MatchError> {
    if let Some(entities) = &request.entities {
        return match_entities(source, entities, request.stage).await;
    }

    match request.text.as_deref() {
        Some(text) => match_text(source, text, request.stage).await,
        None => Err(MatchError::InvalidInput(
            "either text or extracted entities are required".to_string(),
        )),
    }
}

// TODO: whole-text extraction is owned by the upstream pipeline; echo stays empty until it sends fields back
fn extract_entities_from_text(_text: &str) -> ExtractedEntities {
    ExtractedEntities::default()
}

fn log_result(mode: &str, result: &MatchResult) {
    debug!(
        mode,
        item_id = result.item.as_ref().map(|i| i.id.as_str()),
        has_position = result.position.is_some(),
        has_damage = result.damage_type.is_some(),
        severity_id = result.severity.as_ref().map(|s| s.id.as_str()),
        confidence = result.confidence,
        "match result"
    );
}

// ============================================================================
// TESTS
// ============================================================================
