//! Last.fm API client for recent-track history

use async_trait::async_trait;
use reqwest::{Client, Url};
use scrobbles_common::{PageResult, TimeWindow};

use super::parser::parse_page;
use crate::error::FetchError;

/// Largest page size `user.getrecenttracks` accepts
pub const PAGE_LIMIT: u32 = 200;

/// One page request against a user's history
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub username: &'a str,
    pub api_key: &'a str,
    pub window: TimeWindow,
    pub page: u32,
    pub limit: u32,
}

/// Source of paginated track history.
///
/// `Ok(None)` means the page carried no track list and pagination should stop.
#[async_trait]
pub trait TrackHistorySource: Send + Sync {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<Option<PageResult>, FetchError>;
}

/// reqwest-backed [`TrackHistorySource`]. No retries and no client timeout.
#[derive(Debug, Clone)]
pub struct LastFmClient {
    client: Client,
    base_url: String,
}

impl LastFmClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `query`
    pub fn request_url(&self, query: &PageQuery<'_>) -> Result<Url, FetchError> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("method", "user.getrecenttracks".to_string()),
                ("user", query.username.to_string()),
                ("api_key", query.api_key.to_string()),
                ("format", "json".to_string()),
                ("from", query.window.start.to_string()),
                ("to", query.window.end.to_string()),
                ("limit", query.limit.to_string()),
                ("page", query.page.to_string()),
            ],
        )
        .map_err(|_| FetchError::InvalidUrl(self.base_url.clone()))
    }
}

#[async_trait]
impl TrackHistorySource for LastFmClient {
    async fn fetch_page(&self, query: &PageQuery<'_>) -> Result<Option<PageResult>, FetchError> {
        let url = self.request_url(query)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await?;
        tracing::debug!(
            "Fetched page {} of scrobbles for {} ({} bytes)",
            query.page,
            query.username,
            body.len()
        );

        parse_page(&body, query.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use std::collections::HashMap;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn query(page: u32) -> PageQuery<'static> {
        PageQuery {
            username: "alice",
            api_key: "secret",
            window: TimeWindow::starting_at(1_700_000_000),
            page,
            limit: PAGE_LIMIT,
        }
    }

    async fn stub_upstream(
        State(hits): State<Arc<AtomicUsize>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        hits.fetch_add(1, Ordering::SeqCst);
        match params.get("user").map(String::as_str) {
            Some("alice") => {
                assert_eq!(params.get("method").map(String::as_str), Some("user.getrecenttracks"));
                assert_eq!(params.get("from").map(String::as_str), Some("1700000000"));
                assert_eq!(params.get("to").map(String::as_str), Some("1700086399"));
                assert_eq!(params.get("limit").map(String::as_str), Some("200"));
                let body = serde_json::json!({
                    "recenttracks": {
                        "track": [{}, {}, {}],
                        "@attr": { "totalPages": "4" }
                    }
                });
                (StatusCode::OK, body.to_string())
            }
            Some("broken") => (StatusCode::OK, "not json".to_string()),
            _ => (StatusCode::NOT_FOUND, r#"{"error":6,"message":"User not found"}"#.to_string()),
        }
    }

    async fn spawn_stub() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/2.0/", get(stub_upstream))
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/2.0/", addr), hits)
    }

    #[test]
    fn test_request_url_params() {
        let client = LastFmClient::new(Client::new(), "http://ws.audioscrobbler.com/2.0/");
        let url = client.request_url(&query(3)).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["method"], "user.getrecenttracks");
        assert_eq!(params["user"], "alice");
        assert_eq!(params["api_key"], "secret");
        assert_eq!(params["format"], "json");
        assert_eq!(params["from"], "1700000000");
        assert_eq!(params["to"], "1700086399");
        assert_eq!(params["limit"], "200");
        assert_eq!(params["page"], "3");
    }

    #[test]
    fn test_invalid_base_url() {
        let client = LastFmClient::new(Client::new(), "not a url");
        assert!(matches!(client.request_url(&query(1)), Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_from_stub() {
        let (base, hits) = spawn_stub().await;
        let client = LastFmClient::new(Client::new(), base);

        let page = client.fetch_page(&query(1)).await.unwrap().unwrap();
        assert_eq!(page.track_count, 3);
        assert_eq!(page.total_pages, 4);
        assert!(page.has_more);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (base, _) = spawn_stub().await;
        let client = LastFmClient::new(Client::new(), base);

        let q = PageQuery { username: "ghost", ..query(1) };
        let err = client.fetch_page(&q).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s == reqwest::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_malformed_body_is_error() {
        let (base, _) = spawn_stub().await;
        let client = LastFmClient::new(Client::new(), base);

        let q = PageQuery { username: "broken", ..query(1) };
        assert!(matches!(client.fetch_page(&q).await, Err(FetchError::Payload(_))));
    }

    #[tokio::test]
    async fn test_transport_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LastFmClient::new(Client::new(), format!("http://{}/2.0/", addr));
        assert!(matches!(client.fetch_page(&query(1)).await, Err(FetchError::Transport(_))));
    }
}
