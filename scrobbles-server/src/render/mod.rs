//! Preview image rendering
//!
//! Font resolution is an ordered fallback chain: local file, then the same
//! file fetched from the service's own asset route, then whatever fonts the
//! fallback database holds. Only the SVG→PNG step can fail.

pub mod font;
pub mod preview;

pub use font::{resolve_font, FontResolution, FontSource};
pub use preview::PreviewRenderer;
