//! API Routes
//!
//! Configures the Axum routers for the peer protocol and the front-end API.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    api_get_handler, bad_request_handler, health_handler, peer_get_handler, stats_handler,
    ApiState, AppState,
};

/// Creates the router that answers other peers.
///
/// # Endpoints
/// - `GET <base_path><group>/<key>` - Raw value bytes (404 unknown group,
///   500 loader failure)
/// - anything else - 400
///
/// `base_path` must start and end with `/`.
pub fn create_peer_router(state: AppState, base_path: &str) -> Router {
    Router::new()
        .route(&format!("{base_path}*path"), get(peer_get_handler))
        .fallback(bad_request_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Creates the front-end router for a single group.
///
/// # Endpoints
/// - `GET /api?key=<key>` - Raw value bytes
/// - `GET /stats` - Group and cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", get(api_get_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{LoaderFn, Registry};
    use crate::peers::http::DEFAULT_BASE_PATH;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use tower::util::ServiceExt;

    fn create_test_registry() -> Registry {
        let registry = Registry::new();
        registry
            .create_group(
                "scores",
                2 << 10,
                LoaderFn(|key: String| async move {
                    match key.as_str() {
                        "Tom" => Ok(b"630".to_vec()),
                        "Jack" => Ok(b"589".to_vec()),
                        _ => Err(anyhow::anyhow!("{key} not exist")),
                    }
                }),
            )
            .unwrap();
        registry
            .create_group(
                "echo",
                0,
                LoaderFn(|key: String| async move { Ok::<_, anyhow::Error>(key.into_bytes()) }),
            )
            .unwrap();
        registry
    }

    fn create_test_app() -> Router {
        create_peer_router(AppState::new(create_test_registry()), DEFAULT_BASE_PATH)
    }

    async fn send(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_peer_get_success() {
        let response = send(create_test_app(), "/_cache/scores/Tom").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_string(response).await, "630");
    }

    #[tokio::test]
    async fn test_peer_get_unknown_group() {
        let response = send(create_test_app(), "/_cache/Ghost/Tom").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(response).await, "no such group: Ghost");
    }

    #[tokio::test]
    async fn test_peer_get_loader_failure() {
        let response = send(create_test_app(), "/_cache/scores/Ghost").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "Ghost not exist");
    }

    #[tokio::test]
    async fn test_peer_get_malformed_paths() {
        for uri in ["/_cache/", "/_cache/scores", "/_cache/scores/", "/elsewhere"] {
            let response = send(create_test_app(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        }
    }

    #[tokio::test]
    async fn test_peer_get_decodes_key_with_slash() {
        let response = send(create_test_app(), "/_cache/echo/a%2Fb%20c").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "a/b c");

        let response = send(create_test_app(), "/_cache/echo/dir/file").await;
        assert_eq!(body_string(response).await, "dir/file");
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let app = create_peer_router(AppState::new(create_test_registry()), "/peers/");

        let response = send(app.clone(), "/peers/scores/Jack").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "589");

        let response = send(app, "/_cache/scores/Jack").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_router() {
        let group = create_test_registry().get_group("scores").unwrap();
        let app = create_api_router(ApiState::new(group));

        let response = send(app.clone(), "/api?key=Tom").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "630");

        let response = send(app.clone(), "/api?key=kkk").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "kkk not exist");

        let response = send(app.clone(), "/api").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(app.clone(), "/stats").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["group"], "scores");
        assert_eq!(json["group_stats"]["local_loads"], 1);

        let response = send(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
