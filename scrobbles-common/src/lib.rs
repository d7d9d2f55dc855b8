//! Request-scoped data model shared by the page and the preview image.
//!
//! Nothing here is persisted. The page side computes an [`AggregateResult`] and
//! hands the preview side an [`ImageSpec`] through the preview URL; that URL is
//! the only contract between the two.

pub mod types;

pub use types::{
    AggregateResult, ImageSpec, PageData, PageResult, TimeWindow, DEFAULT_IMAGE_HEIGHT,
    DEFAULT_IMAGE_WIDTH, PLACEHOLDER_COUNT, PLACEHOLDER_USERNAME, PREVIEW_ROUTE,
};
