//! Error types for upstream fetches, font loading and rendering

use reqwest::StatusCode;
use thiserror::Error;

/// Failure while fetching one page of track history.
///
/// Every variant collapses into `AggregateResult::Unavailable` at the
/// aggregator boundary; the cause is only logged.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Last.fm API key is not configured")]
    MissingCredential,

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Last.fm responded with status {0}")]
    Status(StatusCode),

    #[error("Unexpected Last.fm payload: {0}")]
    Payload(String),

    #[error("Last.fm error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Invalid Last.fm API URL '{0}'")]
    InvalidUrl(String),
}

/// Failure of a single font source. Absorbed by the renderer.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch bundled font: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Bundled font responded with status {0}")]
    Status(StatusCode),

    #[error("No service origin known for bundled font {0}")]
    NoOrigin(String),

    #[error("Bundled font exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Font data contains no usable face")]
    InvalidFont,
}

/// Failure of the rendering backend itself. Surfaced to the client.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("Failed to create {width}x{height} pixmap")]
    Pixmap { width: u32, height: u32 },

    #[error("Failed to encode PNG: {0}")]
    Encode(String),
}
