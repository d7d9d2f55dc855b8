use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Response},
};
use scrobbles_common::{AggregateResult, PageData};

use super::{request_origin, SharedState};
use crate::render::preview::escape_xml;

const PAGE_TEMPLATE: &str = include_str!("../../resources/page_template.html");

/// Shared CDN caching for both page and JSON responses
pub const CACHE_CONTROL_VALUE: &str = "s-maxage=59, stale-while-revalidate=120";

/// Fill the page template for `result`. `origin` makes the preview URL
/// absolute, as link-preview crawlers require.
pub fn render_page(result: &AggregateResult, origin: Option<&str>) -> String {
    let data = PageData::from(result);
    let spec = result.image_spec();
    let preview_url = format!("{}{}", origin.unwrap_or_default(), spec.preview_path());

    PAGE_TEMPLATE
        .replace("{{MESSAGE}}", &escape_xml(&data.message))
        .replace("{{SCROBBLES}}", &data.scrobbles.to_string())
        .replace("{{PREVIEW_URL}}", &escape_xml(&preview_url))
        .replace("{{PREVIEW_WIDTH}}", &spec.width.to_string())
        .replace("{{PREVIEW_HEIGHT}}", &spec.height.to_string())
}

async fn page_for(state: &SharedState, username: &str, headers: &HeaderMap) -> Response {
    let result = state.aggregator.aggregate(username).await;
    let origin = request_origin(&state.config, headers);
    let html = render_page(&result, origin.as_deref());

    ([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Html(html)).into_response()
}

pub async fn default_page(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let username = state.config.default_username.clone();
    page_for(&state, &username, &headers).await
}

pub async fn user_page(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    headers: HeaderMap,
) -> Response {
    page_for(&state, &username, &headers).await
}

pub async fn scrobbles_json(State(state): State<SharedState>, Path(username): Path<String>) -> impl IntoResponse {
    let result = state.aggregator.aggregate(&username).await;
    ([(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)], Json(PageData::from(&result)))
}
