// 🌐 HTTP API - catalog reads, writes, CSV import and the /match endpoint (Axum)
//
// Every response is wrapped as { success, data?, error? }.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use crate::catalog::{load_catalog, CatalogSnapshot, CatalogSource};
use crate::db::{self, CatalogTable, SqliteCatalog};
use crate::entities::severity::{MAX_LEVEL, MIN_LEVEL};
use crate::entities::{DamageType, Item, Position, Severity, Stage};
use crate::error::{MatchError, StorageError};
use crate::import::{import_table, KindReport};
use crate::matcher::{match_request, MatchRequest, MatchResult};
use crate::normalize::generate_code;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: SqliteCatalog,
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// Unique code taken, or a row failed a schema check
    Conflict(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        if let StorageError::Sqlite(sqlite) = &err {
            if sqlite.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
                warn!(error = %err, "catalog write rejected");
                return ApiError::Conflict(err.to_string());
            }
        }

        error!(error = %err, "catalog storage failed");
        ApiError::Internal(err.to_string())
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::InvalidInput(message) => ApiError::BadRequest(message),
            MatchError::Storage(err) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

/// GET /health
async fn health_check() -> Json<Health> {
    Json(Health {
        status: "ok",
        service: "catalog-service",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /api/catalog/all
async fn get_all(State(state): State<AppState>) -> ApiResult<CatalogSnapshot> {
    let snapshot = load_catalog(&state.catalog, None).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

#[derive(Debug, Deserialize)]
struct ItemsQuery {
    category: Option<Stage>,
}

/// GET /api/catalog/items?category=…
async fn get_items(
    State(state): State<AppState>,
    Query(query): Query<ItemsQuery>,
) -> ApiResult<Vec<Item>> {
    Ok(Json(ApiResponse::ok(state.catalog.items(query.category).await?)))
}

/// GET /api/catalog/positions
async fn get_positions(State(state): State<AppState>) -> ApiResult<Vec<Position>> {
    Ok(Json(ApiResponse::ok(state.catalog.positions().await?)))
}

/// GET /api/catalog/damage-types
async fn get_damage_types(State(state): State<AppState>) -> ApiResult<Vec<DamageType>> {
    Ok(Json(ApiResponse::ok(state.catalog.damage_types().await?)))
}

/// GET /api/catalog/severities
async fn get_severities(State(state): State<AppState>) -> ApiResult<Vec<Severity>> {
    Ok(Json(ApiResponse::ok(state.catalog.severities().await?)))
}

/// GET /api/catalog/categories
async fn get_categories(State(state): State<AppState>) -> ApiResult<Vec<Stage>> {
    Ok(Json(ApiResponse::ok(state.catalog.read(db::categories).await?)))
}

/// Single row by id, 404 when absent
async fn fetch_one<T, F>(state: &AppState, id: String, what: &str, lookup: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection, &str) -> rusqlite::Result<Option<T>> + Send + 'static,
{
    let key = id.clone();
    let found = state.catalog.read(move |conn| lookup(conn, &key)).await?;

    found
        .map(|row| Json(ApiResponse::ok(row)))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found: {}", what, id)))
}

/// GET /api/catalog/items/:id
async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Item> {
    fetch_one(&state, id, "Item", db::item_by_id).await
}

/// GET /api/catalog/positions/:id
async fn get_position(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Position> {
    fetch_one(&state, id, "Position", db::position_by_id).await
}

/// GET /api/catalog/damage-types/:id
async fn get_damage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DamageType> {
    fetch_one(&state, id, "Damage type", db::damage_type_by_id).await
}

/// GET /api/catalog/severities/:id
async fn get_severity(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Severity> {
    fetch_one(&state, id, "Severity", db::severity_by_id).await
}

// ============================================================================
// WRITES
// ============================================================================

/// Body of POST/PUT for items; on PUT only the fields sent are changed
#[derive(Debug, Default, Deserialize)]
pub struct ItemInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<Stage>,
    pub description: Option<String>,
}

/// Body of POST/PUT for positions and damage types
#[derive(Debug, Default, Deserialize)]
pub struct EntryInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeverityInput {
    pub name: Option<String>,
    pub code: Option<String>,
    pub level: Option<u8>,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct Deleted {
    id: String,
}

/// Trimmed name when sent; a blank one is rejected
fn checked_name(name: Option<&str>) -> Result<Option<&str>, ApiError> {
    match name.map(str::trim) {
        Some("") => Err(ApiError::BadRequest("name must not be blank".to_string())),
        other => Ok(other),
    }
}

fn required_name(name: Option<&str>) -> Result<&str, ApiError> {
    checked_name(name)?.ok_or_else(|| ApiError::BadRequest("name is required".to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Sent code, else one derived from the name
fn code_for(code: Option<String>, name: &str) -> String {
    non_blank(code).unwrap_or_else(|| generate_code(name))
}

impl ItemInput {
    fn apply(self, item: &mut Item) {
        if let Some(name) = non_blank(self.name) {
            item.name = name;
        }
        if let Some(code) = non_blank(self.code) {
            item.code = code;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if self.description.is_some() {
            item.description = self.description;
        }
    }
}

impl EntryInput {
    fn apply(self, name: &mut String, code: &mut String, description: &mut Option<String>) {
        if let Some(new_name) = non_blank(self.name) {
            *name = new_name;
        }
        if let Some(new_code) = non_blank(self.code) {
            *code = new_code;
        }
        if self.description.is_some() {
            *description = self.description;
        }
    }
}

impl SeverityInput {
    fn apply(self, severity: &mut Severity) {
        if let Some(name) = non_blank(self.name) {
            severity.name = name;
        }
        if let Some(code) = non_blank(self.code) {
            severity.code = code;
        }
        if let Some(level) = self.level {
            severity.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        }
        if self.color.is_some() {
            severity.color = self.color;
        }
        if self.description.is_some() {
            severity.description = self.description;
        }
    }
}

async fn create_one<T, F>(state: &AppState, row: T, insert: F) -> Created<T>
where
    T: Clone + Send + 'static,
    F: FnOnce(&Connection, &T) -> rusqlite::Result<()> + Send + 'static,
{
    let stored = row.clone();
    state.catalog.write(move |conn| insert(conn, &stored)).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(row))))
}

/// Load by id, patch, write back; 404 when the id is unknown
async fn update_one<T, L, P, U>(
    state: &AppState,
    id: String,
    what: &str,
    lookup: L,
    patch: P,
    update: U,
) -> ApiResult<T>
where
    T: Send + 'static,
    L: FnOnce(&Connection, &str) -> rusqlite::Result<Option<T>> + Send + 'static,
    P: FnOnce(&mut T) + Send + 'static,
    U: FnOnce(&Connection, &T) -> rusqlite::Result<bool> + Send + 'static,
{
    let key = id.clone();
    let updated = state
        .catalog
        .write(move |conn| {
            let Some(mut row) = lookup(conn, &key)? else {
                return Ok(None);
            };
            patch(&mut row);
            update(conn, &row)?;
            Ok(Some(row))
        })
        .await?;

    updated
        .map(|row| Json(ApiResponse::ok(row)))
        .ok_or_else(|| ApiError::NotFound(format!("{} not found: {}", what, id)))
}

async fn delete_one(state: &AppState, table: CatalogTable, id: String) -> ApiResult<Deleted> {
    let key = id.clone();
    let deleted = state
        .catalog
        .write(move |conn| db::delete_by_id(conn, table, &key))
        .await?;

    if !deleted {
        return Err(ApiError::NotFound(format!(
            "No row with id {} in {}",
            id,
            table.slug()
        )));
    }
    Ok(Json(ApiResponse::ok(Deleted { id })))
}

/// POST /api/catalog/items
async fn post_item(State(state): State<AppState>, Json(input): Json<ItemInput>) -> Created<Item> {
    let name = required_name(input.name.as_deref())?;
    let mut item = Item::new(
        name,
        &code_for(input.code.clone(), name),
        input.category.unwrap_or(Stage::Exterior),
    );
    item.description = input.description;
    create_one(&state, item, db::insert_item).await
}

/// PUT /api/catalog/items/:id
async fn put_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ItemInput>,
) -> ApiResult<Item> {
    checked_name(input.name.as_deref())?;
    update_one(
        &state,
        id,
        "Item",
        db::item_by_id,
        move |item: &mut Item| input.apply(item),
        db::update_item,
    )
    .await
}

/// DELETE /api/catalog/items/:id
async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Deleted> {
    delete_one(&state, CatalogTable::Items, id).await
}

/// POST /api/catalog/positions
async fn post_position(
    State(state): State<AppState>,
    Json(input): Json<EntryInput>,
) -> Created<Position> {
    let name = required_name(input.name.as_deref())?;
    let mut position = Position::new(name, &code_for(input.code.clone(), name));
    position.description = input.description;
    create_one(&state, position, db::insert_position).await
}

/// PUT /api/catalog/positions/:id
async fn put_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EntryInput>,
) -> ApiResult<Position> {
    checked_name(input.name.as_deref())?;
    update_one(
        &state,
        id,
        "Position",
        db::position_by_id,
        move |p: &mut Position| input.apply(&mut p.name, &mut p.code, &mut p.description),
        db::update_position,
    )
    .await
}

/// DELETE /api/catalog/positions/:id
async fn delete_position(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    delete_one(&state, CatalogTable::Positions, id).await
}

/// POST /api/catalog/damage-types
async fn post_damage_type(
    State(state): State<AppState>,
    Json(input): Json<EntryInput>,
) -> Created<DamageType> {
    let name = required_name(input.name.as_deref())?;
    let mut damage_type = DamageType::new(name, &code_for(input.code.clone(), name));
    damage_type.description = input.description;
    create_one(&state, damage_type, db::insert_damage_type).await
}

/// PUT /api/catalog/damage-types/:id
async fn put_damage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EntryInput>,
) -> ApiResult<DamageType> {
    checked_name(input.name.as_deref())?;
    update_one(
        &state,
        id,
        "Damage type",
        db::damage_type_by_id,
        move |d: &mut DamageType| input.apply(&mut d.name, &mut d.code, &mut d.description),
        db::update_damage_type,
    )
    .await
}

/// DELETE /api/catalog/damage-types/:id
async fn delete_damage_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    delete_one(&state, CatalogTable::DamageTypes, id).await
}

/// POST /api/catalog/severities
async fn post_severity(
    State(state): State<AppState>,
    Json(input): Json<SeverityInput>,
) -> Created<Severity> {
    let name = required_name(input.name.as_deref())?;
    let mut severity = Severity::new(
        name,
        &code_for(input.code.clone(), name),
        input.level.unwrap_or(MIN_LEVEL),
    );
    severity.color = input.color;
    severity.description = input.description;
    create_one(&state, severity, db::insert_severity).await
}

/// PUT /api/catalog/severities/:id
async fn put_severity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SeverityInput>,
) -> ApiResult<Severity> {
    checked_name(input.name.as_deref())?;
    update_one(
        &state,
        id,
        "Severity",
        db::severity_by_id,
        move |severity: &mut Severity| input.apply(severity),
        db::update_severity,
    )
    .await
}

/// DELETE /api/catalog/severities/:id
async fn delete_severity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    delete_one(&state, CatalogTable::Severities, id).await
}

/// POST /api/catalog/import/:kind with a CSV body
async fn post_import(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    body: Bytes,
) -> ApiResult<KindReport> {
    let table = CatalogTable::from_slug(&kind)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown catalog kind: {}", kind)))?;

    let report = state
        .catalog
        .write(move |conn| Ok(import_table(conn, table, &body[..])))
        .await?
        .map_err(|e| ApiError::BadRequest(format!("{:#}", e)))?;

    info!(
        kind = table.slug(),
        imported = report.imported,
        errors = report.errors.len(),
        "imported catalog upload"
    );
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/catalog/match
async fn post_match(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> ApiResult<MatchResult> {
    let result = match_request(&state.catalog, &request).await?;
    Ok(Json(ApiResponse::ok(result)))
}

// ============================================================================
// ROUTER
// ============================================================================

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let catalog_routes = Router::new()
        .route("/all", get(get_all))
        .route("/items", get(get_items).post(post_item))
        .route("/items/:id", get(get_item).put(put_item).delete(delete_item))
        .route("/positions", get(get_positions).post(post_position))
        .route(
            "/positions/:id",
            get(get_position).put(put_position).delete(delete_position),
        )
        .route("/damage-types", get(get_damage_types).post(post_damage_type))
        .route(
            "/damage-types/:id",
            get(get_damage_type).put(put_damage_type).delete(delete_damage_type),
        )
        .route("/severities", get(get_severities).post(post_severity))
        .route(
            "/severities/:id",
            get(get_severity).put(put_severity).delete(delete_severity),
        )
        .route("/categories", get(get_categories))
        .route("/import/:kind", post(post_import))
        .route("/match", post(post_match))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/catalog", catalog_routes)
        .layer(ServiceBuilder::new().layer(cors_layer(allowed_origins)))
}

// ============================================================================
// TESTS
// ============================================================================
