//! API Handlers
//!
//! HTTP request handlers for the peer protocol and the front-end API.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::cache::ByteView;
use crate::error::{CacheError, Result};
use crate::group::{Group, Registry};
use crate::models::{HealthResponse, KeyQuery, StatsResponse};

/// State of the peer protocol server: every group registered on this node.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

/// State of the front-end API: the single group it serves.
#[derive(Clone)]
pub struct ApiState {
    pub group: Group,
}

impl ApiState {
    pub fn new(group: Group) -> Self {
        Self { group }
    }
}

/// Raw value bytes as `application/octet-stream`.
fn octet_stream(view: ByteView) -> Response {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_bytes(),
    )
        .into_response()
}

/// Handler for GET `<base-path>/<group>/<key>`
///
/// `path` is everything after the base path, already percent-decoded. The
/// key is taken as everything after the first `/`, so it may contain `/`.
pub async fn peer_get_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response> {
    let (group_name, key) = path
        .split_once('/')
        .ok_or_else(|| CacheError::InvalidArgument("bad request".to_string()))?;
    debug!(group = group_name, key, "peer request");

    let group = state
        .registry
        .get_group(group_name)
        .ok_or_else(|| CacheError::NotFound(format!("no such group: {group_name}")))?;
    group.record_server_request();

    let view = group.get(key).await?;
    Ok(octet_stream(view))
}

/// Fallback for peer paths without a group and key.
pub async fn bad_request_handler() -> CacheError {
    CacheError::InvalidArgument("bad request".to_string())
}

/// Handler for GET /api?key=<key>
pub async fn api_get_handler(
    State(state): State<ApiState>,
    Query(query): Query<KeyQuery>,
) -> Result<Response> {
    let view = state.group.get(&query.key).await?;
    Ok(octet_stream(view))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<ApiState>) -> Json<StatsResponse> {
    let group = &state.group;
    Json(StatsResponse::new(
        group.name(),
        group.stats(),
        group.cache_stats(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::LoaderFn;

    fn scores_registry() -> Registry {
        let registry = Registry::new();
        registry
            .create_group(
                "scores",
                2 << 10,
                LoaderFn(|key: String| async move {
                    match key.as_str() {
                        "Tom" => Ok(b"630".to_vec()),
                        _ => Err(anyhow::anyhow!("{key} not exist")),
                    }
                }),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_peer_get_handler() {
        let state = AppState::new(scores_registry());

        let response = peer_get_handler(State(state.clone()), Path("scores/Tom".to_string()))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );

        let group = state.registry.get_group("scores").unwrap();
        assert_eq!(group.stats().server_requests, 1);
    }

    #[tokio::test]
    async fn test_peer_get_handler_errors() {
        let state = AppState::new(scores_registry());

        let missing_key = peer_get_handler(State(state.clone()), Path("scores".to_string())).await;
        assert!(matches!(missing_key, Err(CacheError::InvalidArgument(_))));

        let unknown_group =
            peer_get_handler(State(state.clone()), Path("Ghost/Tom".to_string())).await;
        assert!(matches!(unknown_group, Err(CacheError::NotFound(_))));

        let failed_load = peer_get_handler(State(state), Path("scores/kkk".to_string())).await;
        assert!(matches!(failed_load, Err(CacheError::Load(msg)) if msg == "kkk not exist"));
    }

    #[tokio::test]
    async fn test_api_get_handler_requires_key() {
        let group = scores_registry().get_group("scores").unwrap();
        let state = ApiState::new(group);

        let result = api_get_handler(State(state), Query(KeyQuery::default())).await;
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let group = scores_registry().get_group("scores").unwrap();
        let state = ApiState::new(group.clone());
        group.get("Tom").await.unwrap();
        group.get("Tom").await.unwrap();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.group, "scores");
        assert_eq!(response.group_stats.gets, 2);
        assert_eq!(response.group_stats.cache_hits, 1);
        assert_eq!(response.cache_stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
