//! HTTP API for the formbind mapper.
//!
//! Exposes the registered schema types so request handlers (or other
//! services) can post urlencoded forms and get the mapped object back.

mod config;
mod error;

pub use config::ServerConfig;
pub use error::ServerError;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
};
use formbind_mapper::{FormBody, MapOptions, Mapper};
use formbind_model::SchemaRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared state of the HTTP API.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<SchemaRegistry>,
    pub defaults: MapOptions,
}

impl AppState {
    pub fn new(registry: SchemaRegistry, defaults: MapOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            defaults,
        }
    }
}

/// Query parameters of `POST /api/v1/map/{type_name}`.
#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    /// Comma-separated whitelist paths.
    #[serde(default)]
    pub allow: Option<String>,
    #[serde(default)]
    pub overwrite: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapResponse {
    pub changed: bool,
    pub object: Map<String, Value>,
}

/// Splits a comma-separated whitelist parameter.
pub fn split_allow(allow: Option<&str>) -> Vec<String> {
    allow
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps an urlencoded `body` onto a fresh instance of `type_name`.
pub async fn map_form(
    registry: &SchemaRegistry,
    type_name: &str,
    allow: &[String],
    options: MapOptions,
    body: impl Into<Vec<u8>>,
) -> Result<MapResponse, ServerError> {
    let def = registry
        .get(type_name)
        .ok_or_else(|| ServerError::UnknownType(type_name.to_string()))?;

    let mut object = def.instantiate().unwrap_or_default();
    let changed = Mapper::new(FormBody::new(body))
        .map(&mut object, &def, allow, options)
        .await?;
    debug!(type_name, changed, "mapped form");
    Ok(MapResponse { changed, object })
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn types_handler(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.registry.type_names())
}

async fn map_handler(
    State(state): State<AppState>,
    Path(type_name): Path<String>,
    Query(params): Query<MapParams>,
    body: Bytes,
) -> Result<Json<MapResponse>, ServerError> {
    let allow = split_allow(params.allow.as_deref());
    let options = MapOptions {
        overwrite: params.overwrite.unwrap_or(state.defaults.overwrite),
    };
    map_form(&state.registry, &type_name, &allow, options, body.to_vec())
        .await
        .map(Json)
        .inspect_err(|e| warn!(type_name = %type_name, "mapping failed: {}", e))
}

/// Build the HTTP API router with the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/types", get(types_handler))
        .route("/api/v1/map/{type_name}", post(map_handler))
        .with_state(state)
}
