//! HTTP surface: one suggestion endpoint plus service info and health checks.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::{
    config::AllowedOrigins,
    core::VegaPipeline,
    types::{SuggestResponse, TripRequest},
};

pub const SUGGEST_PATH: &str = "/api/ai/vega/suggest";
pub const HEALTH_PATH: &str = "/health";

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pipeline: Arc<VegaPipeline>, origins: &AllowedOrigins) -> Result<Router> {
    Ok(Router::new()
        .route("/", get(service_info))
        .route(HEALTH_PATH, get(health))
        .route(SUGGEST_PATH, post(suggest))
        .layer(cors_layer(origins)?)
        .with_state(pipeline))
}

fn cors_layer(origins: &AllowedOrigins) -> Result<CorsLayer> {
    Ok(match origins {
        // Credentials cannot be combined with a wildcard origin.
        AllowedOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        AllowedOrigins::List(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .with_context(|| format!("invalid allowed origin `{origin}`"))
                })
                .collect::<Result<Vec<_>>>()?;

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_methods(AllowMethods::list([Method::GET, Method::POST, Method::OPTIONS]))
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn serve(pipeline: Arc<VegaPipeline>, origins: &AllowedOrigins, addr: SocketAddr) -> Result<()> {
    let app = build_router(pipeline.clone(), origins)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        target: "vega::server",
        backend = pipeline.gateway_name(),
        "vega listening on http://{addr}"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!(target: "vega::server", "vega shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(target: "vega::server", error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "Voyara Vega AI",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "suggest": SUGGEST_PATH,
            "health": HEALTH_PATH
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn suggest(
    State(pipeline): State<Arc<VegaPipeline>>,
    Json(request): Json<TripRequest>,
) -> Json<SuggestResponse> {
    Json(pipeline.suggest(&request).await)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GenerationGateway;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct DownGateway;

    #[async_trait]
    impl GenerationGateway for DownGateway {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn generate(&self, _system: &str, _task: &str) -> crate::Result<String> {
            Err(crate::VegaError::GenerationUnavailable("connection refused".to_string()))
        }
    }

    fn router(origins: AllowedOrigins) -> Router {
        let pipeline = Arc::new(VegaPipeline::new(Arc::new(DownGateway)));
        build_router(pipeline, &origins).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(SUGGEST_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let resp = router(AllowedOrigins::Any)
            .oneshot(Request::builder().uri(HEALTH_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_service_info_lists_endpoints() {
        let resp = router(AllowedOrigins::Any)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "running");
        assert_eq!(json["endpoints"]["suggest"], SUGGEST_PATH);
    }

    #[tokio::test]
    async fn test_suggest_degrades_when_backend_down() {
        let resp = router(AllowedOrigins::Any)
            .oneshot(post_json(json!({
                "trip_id": "t1",
                "city": "Paris",
                "country": "France",
                "day": 3,
                "time_slot": "Afternoon",
                "total_budget": 15000,
                "remaining_budget": 3500,
                "preferences": ["food", "walking"],
                "adults": 2,
                "children": 1
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["suggestions"], json!([]));
        assert_eq!(json["message"], "Generated 0 suggestions");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_suggest_reports_constraint_failure() {
        let resp = router(AllowedOrigins::Any)
            .oneshot(post_json(json!({
                "trip_id": "t1",
                "city": "Paris",
                "country": "France",
                "day": 3,
                "time_slot": "Afternoon",
                "total_budget": 15000,
                "remaining_budget": 0
            })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "No remaining budget available");
        assert_eq!(json["suggestions"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected_by_extractor() {
        let resp = router(AllowedOrigins::Any)
            .oneshot(post_json(json!({ "trip_id": "t1" })))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_cors_echoes_listed_origin() {
        let app = router(AllowedOrigins::List(vec!["https://voyara.app".to_string()]));
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(HEALTH_PATH)
                    .header(header::ORIGIN, "https://voyara.app")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://voyara.app"
        );
        assert_eq!(
            resp.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[test]
    fn test_invalid_origin_is_startup_error() {
        let pipeline = Arc::new(VegaPipeline::new(Arc::new(DownGateway)));
        let origins = AllowedOrigins::List(vec!["bad\norigin".to_string()]);
        assert!(build_router(pipeline, &origins).is_err());
    }
}
