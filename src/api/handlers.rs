//! API Handlers
//!
//! HTTP request handlers for the group cache and URL resolution endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheFacade, MAX_VALUE_SIZE};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, GroupStats, HealthResponse, ResolveRequest,
    ResolveResponse, SetResponse, SetValueRequest, StatsResponse,
};
use crate::remote::RemoteStore;
use crate::resolver::{FanOutResolver, HttpUrlSigner};

/// Application state shared across all handlers.
///
/// The facade and resolver synchronise internally, so the state is a pair of
/// shared handles with no outer lock.
#[derive(Clone)]
pub struct AppState {
    /// Two-tier group cache
    pub cache: Arc<CacheFacade>,
    /// URL resolver; None when no signing service is configured
    pub resolver: Option<Arc<FanOutResolver>>,
}

impl AppState {
    /// Creates a new AppState from already-built components.
    pub fn new(cache: CacheFacade, resolver: Option<FanOutResolver>) -> Self {
        Self {
            cache: Arc::new(cache),
            resolver: resolver.map(Arc::new),
        }
    }

    /// Creates a new AppState from configuration and a connected remote tier.
    pub fn from_config(config: &Config, remote: Arc<dyn RemoteStore>) -> Result<Self> {
        let cache = CacheFacade::new(config.cache_groups.clone(), remote)?;

        let resolver = match &config.signer {
            Some(signer) => {
                let signer = HttpUrlSigner::new(signer.clone())?;
                Some(FanOutResolver::new(Arc::new(signer), config.resolver.clone()))
            }
            None => None,
        };

        Ok(Self::new(cache, resolver))
    }
}

fn check_key(kind: &str, key: &str) -> Result<()> {
    match validate_key(kind, key) {
        Some(msg) => Err(AppError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

fn check_value_size(value: &Value) -> Result<()> {
    let size = serde_json::to_vec(value)?.len();
    if size > MAX_VALUE_SIZE {
        return Err(AppError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

/// Handler for GET /cache/:group/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    check_key("Key", &key)?;

    let value: Value = state
        .cache
        .get(&group, &key)
        .await?
        .ok_or_else(|| AppError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(group, key, value)))
}

/// Handler for PUT /cache/:group/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
    Json(req): Json<SetValueRequest>,
) -> Result<Json<SetResponse>> {
    check_key("Key", &key)?;
    check_value_size(&req.value)?;

    state.cache.set(&group, &key, &req.value).await?;

    Ok(Json(SetResponse::new(&group, key)))
}

/// Handler for DELETE /cache/:group/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    check_key("Key", &key)?;

    state.cache.delete(&group, &key).await?;

    Ok(Json(DeleteResponse::new(&group, key)))
}

/// Handler for GET /cache/:group/:key/:field
pub async fn hget_handler(
    State(state): State<AppState>,
    Path((group, key, field)): Path<(String, String, String)>,
) -> Result<Json<GetResponse>> {
    check_key("Key", &key)?;
    check_key("Field", &field)?;

    let value: Value = state
        .cache
        .hget(&group, &key, &field)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{key}/{field}")))?;

    Ok(Json(GetResponse::new(group, key, value).with_field(field)))
}

/// Handler for PUT /cache/:group/:key/:field
pub async fn hset_handler(
    State(state): State<AppState>,
    Path((group, key, field)): Path<(String, String, String)>,
    Json(req): Json<SetValueRequest>,
) -> Result<Json<SetResponse>> {
    check_key("Key", &key)?;
    check_key("Field", &field)?;
    check_value_size(&req.value)?;

    state.cache.hset(&group, &key, &field, &req.value).await?;

    Ok(Json(SetResponse::new(&group, format!("{key}/{field}"))))
}

/// Handler for GET /stats
///
/// Returns local-tier statistics for every configured group.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let groups = state
        .cache
        .groups()
        .into_iter()
        .map(|group| {
            let stats = state.cache.local_stats(&group.name).unwrap_or_default();
            GroupStats {
                group: group.name.clone(),
                enabled: group.enabled,
                hit_rate: stats.hit_rate(),
                stats,
            }
        })
        .collect();

    Json(StatsResponse { groups })
}

/// Handler for POST /urls/resolve
///
/// Resolves every record's storage references into signed URLs.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>> {
    let resolver = state
        .resolver
        .as_ref()
        .ok_or_else(|| AppError::Unavailable("URL signing is not configured".to_string()))?;

    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let urls = resolver.resolve_all(&req.records).await;

    Ok(Json(ResolveResponse { urls }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
