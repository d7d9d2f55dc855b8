use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use scrobbles_common::ImageSpec;
use serde::Deserialize;

use super::SharedState;
use crate::render::FontSource;

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub username: Option<String>,
    pub scrobbles: Option<String>,
}

/// Local file first, then the same asset through the service's own origin.
/// The origin comes from config only, request headers are not consulted.
fn font_sources(state: &SharedState) -> Vec<FontSource> {
    let origin = state.config.asset_origin();
    vec![
        FontSource::LocalFile(PathBuf::from(&state.config.font_path)),
        FontSource::bundled(Some(&origin), &state.config.font_asset_path),
    ]
}

pub async fn preview_image(
    State(state): State<SharedState>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let spec = ImageSpec::from_query(params.username.as_deref(), params.scrobbles.as_deref());
    let sources = font_sources(&state);

    match state.renderer.render_with_sources(&spec, &sources, &state.http).await {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(e) => {
            tracing::error!("Failed to render preview for {}: {}", spec.username, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate the image").into_response()
        }
    }
}
