//! HTTP surface
//!
//! - `GET /`, `GET /{username}`: HTML page with today's count
//! - `GET /api/scrobbles/{username}`: the same data as JSON
//! - `GET /api/og?username=&scrobbles=`: PNG preview image
//! - `GET /health`
//! - `/assets/*`: static files, including the bundled preview font

mod page;
mod preview;

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use reqwest::Client;
use scrobbles_common::PREVIEW_ROUTE;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::aggregator::ScrobbleAggregator;
use crate::config::ServerConfig;
use crate::render::PreviewRenderer;

pub use page::{CACHE_CONTROL_VALUE, render_page};

/// Per-process handles; nothing in here changes after startup.
pub struct AppState {
    pub aggregator: ScrobbleAggregator,
    pub renderer: PreviewRenderer,
    pub http: Client,
    pub config: ServerConfig,
}

pub type SharedState = Arc<AppState>;

/// Origin for links handed back to clients: `public_url` when configured,
/// else rebuilt from the `Host` and `X-Forwarded-Proto` headers. Only used
/// to build page links, never as a fetch target.
pub fn request_origin(config: &ServerConfig, headers: &HeaderMap) -> Option<String> {
    if let Some(public_url) = &config.public_url {
        return Some(public_url.trim_end_matches('/').to_string());
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    Some(format!("{}://{}", scheme, host))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn router(state: SharedState) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/health", get(health_check))
        .route(PREVIEW_ROUTE, get(preview::preview_image))
        .route("/api/scrobbles/{username}", get(page::scrobbles_json))
        .route("/", get(page::default_page))
        .route("/{username}", get(page::user_page))
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[test]
    fn test_request_origin() {
        let mut headers = HeaderMap::new();
        let config = ServerConfig::default();
        assert_eq!(request_origin(&config, &headers), None);

        headers.insert(header::HOST, "localhost:3000".parse().unwrap());
        assert_eq!(request_origin(&config, &headers).as_deref(), Some("http://localhost:3000"));

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(request_origin(&config, &headers).as_deref(), Some("https://localhost:3000"));

        let config = ServerConfig {
            public_url: Some("https://scrobbles.today/".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(request_origin(&config, &headers).as_deref(), Some("https://scrobbles.today"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(test_support::state(Some(1)))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_asset_is_not_found() {
        let response = router(test_support::state(Some(1)))
            .oneshot(
                Request::builder()
                    .uri("/assets/subset-Inter-Bold.ttf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
