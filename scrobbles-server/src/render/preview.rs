//! Social preview image: "<user>'s / Scrobbles Today: / [count]"
//!
//! The layout is an SVG template filled by placeholder replacement and
//! rasterized with resvg. Always produces `spec.width × spec.height`.

use std::sync::Arc;

use reqwest::Client;
use resvg::tiny_skia;
use scrobbles_common::ImageSpec;
use usvg::{fontdb::Database, Options, Tree};

use super::font::{resolve_font, FontResolution, FontSource, FALLBACK_FAMILY};
use crate::error::RenderError;

const PREVIEW_SVG_TEMPLATE: &str = include_str!("../../resources/preview_template.svg");

pub struct PreviewRenderer {
    fallback_fonts: Arc<Database>,
}

impl PreviewRenderer {
    const CENTER_X: f32 = 400.0;
    const USERNAME_Y: f32 = 112.0;
    const USERNAME_FONT_SIZE: f32 = 48.0;
    const USERNAME_MIN_FONT_SIZE: f32 = 24.0;
    /// Longest username line that still fits at full size
    const USERNAME_FIT_CHARS: usize = 26;
    const HEADLINE_Y: f32 = 188.0;

    const COUNT_FONT_SIZE: f32 = 72.0;
    /// Average advance of a bold digit, in em
    const COUNT_GLYPH_ADVANCE: f32 = 0.62;
    const BADGE_Y: f32 = 216.0;
    const BADGE_PADDING_X: f32 = 32.0;
    const BADGE_PADDING_Y: f32 = 16.0;
    const BADGE_MAX_WIDTH: f32 = 720.0;
    /// Baseline offset that visually centres digits in the badge
    const COUNT_BASELINE_OFFSET: f32 = 26.0;

    pub fn new(fallback_fonts: Arc<Database>) -> Self {
        Self { fallback_fonts }
    }

    /// Renderer whose fallback is the host's installed fonts
    pub fn with_system_fonts() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        tracing::debug!("Loaded {} system font faces for fallback rendering", db.len());
        Self::new(Arc::new(db))
    }

    pub fn fallback_fonts(&self) -> Arc<Database> {
        self.fallback_fonts.clone()
    }

    /// Resolve a font from `sources`, then render. Font failures only
    /// degrade the typeface; backend failures are returned.
    pub async fn render_with_sources(
        &self,
        spec: &ImageSpec,
        sources: &[FontSource],
        client: &Client,
    ) -> Result<Vec<u8>, RenderError> {
        let fonts = resolve_font(sources, client, self.fallback_fonts.clone()).await;
        let png = self.render(spec, &fonts)?;

        tracing::info!(
            "Rendered preview for {} ({}, custom font: {})",
            spec.username,
            spec.display_count,
            fonts.is_custom()
        );
        Ok(png)
    }

    /// Render `spec` to PNG bytes with already-resolved fonts.
    pub fn render(&self, spec: &ImageSpec, fonts: &FontResolution) -> Result<Vec<u8>, RenderError> {
        let svg = Self::build_svg(spec, &fonts.family());
        render_svg_to_png(&svg, fonts.database())
    }

    pub fn build_svg(spec: &ImageSpec, family: &str) -> String {
        let username_line = format!("{}'s", spec.username);
        let username_size = Self::username_font_size(&username_line);

        let badge_width = Self::badge_width(&spec.display_count);
        let badge_height = Self::COUNT_FONT_SIZE + Self::BADGE_PADDING_Y * 2.0;
        let badge_x = Self::CENTER_X - badge_width / 2.0;
        let count_y = Self::BADGE_Y + badge_height / 2.0 + Self::COUNT_BASELINE_OFFSET;

        PREVIEW_SVG_TEMPLATE
            .replace("{{WIDTH}}", &spec.width.to_string())
            .replace("{{HEIGHT}}", &spec.height.to_string())
            .replace("{{FONT_FAMILY}}", &Self::font_family_list(family))
            .replace("{{USERNAME_Y}}", &format!("{:.0}", Self::USERNAME_Y))
            .replace("{{USERNAME_SIZE}}", &format!("{:.1}", username_size))
            .replace("{{USERNAME_LINE}}", &escape_xml(&username_line))
            .replace("{{HEADLINE_Y}}", &format!("{:.0}", Self::HEADLINE_Y))
            .replace("{{BADGE_X}}", &format!("{:.1}", badge_x))
            .replace("{{BADGE_Y}}", &format!("{:.0}", Self::BADGE_Y))
            .replace("{{BADGE_WIDTH}}", &format!("{:.1}", badge_width))
            .replace("{{BADGE_HEIGHT}}", &format!("{:.0}", badge_height))
            .replace("{{COUNT_Y}}", &format!("{:.1}", count_y))
            .replace("{{COUNT}}", &escape_xml(&spec.display_count))
    }

    /// Shrinks long username lines so they stay inside the canvas
    fn username_font_size(line: &str) -> f32 {
        let chars = line.chars().count();
        if chars <= Self::USERNAME_FIT_CHARS {
            return Self::USERNAME_FONT_SIZE;
        }
        let scaled = Self::USERNAME_FONT_SIZE * Self::USERNAME_FIT_CHARS as f32 / chars as f32;
        scaled.max(Self::USERNAME_MIN_FONT_SIZE)
    }

    fn badge_width(count: &str) -> f32 {
        let chars = count.chars().count().max(1) as f32;
        let text_width = chars * Self::COUNT_FONT_SIZE * Self::COUNT_GLYPH_ADVANCE;
        (text_width + Self::BADGE_PADDING_X * 2.0).min(Self::BADGE_MAX_WIDTH)
    }

    fn font_family_list(family: &str) -> String {
        if family == FALLBACK_FAMILY {
            FALLBACK_FAMILY.to_string()
        } else {
            escape_xml(&format!("'{}', {}", family, FALLBACK_FAMILY))
        }
    }
}

/// Rasterize SVG source to PNG bytes
fn render_svg_to_png(svg_content: &str, fontdb: Arc<Database>) -> Result<Vec<u8>, RenderError> {
    let mut options = Options::default();
    options.fontdb = fontdb;

    let tree = Tree::from_str(svg_content, &options)?;

    let size = tree.size();
    let width = size.width().round() as u32;
    let height = size.height().round() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Pixmap { width, height })?;

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap.encode_png().map_err(|e| RenderError::Encode(e.to_string()))
}

/// Escape for XML/HTML text and attributes. Braces become character
/// references so filled-in text can never form a `{{...}}` placeholder.
pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
        .replace('{', "&#123;")
        .replace('}', "&#125;")
}
