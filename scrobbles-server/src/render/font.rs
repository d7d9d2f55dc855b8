//! Preview font sources and the ordered fallback between them

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use usvg::fontdb::Database;

use crate::error::FontError;

/// Generic family used when no custom face is available
pub const FALLBACK_FAMILY: &str = "sans-serif";

/// Upper bound on a fetched font body
pub const MAX_FONT_BYTES: usize = 4 * 1024 * 1024;

/// One place the preview font can come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    LocalFile(PathBuf),
    /// `path` relative to the service origin, e.g. `/assets/subset-Inter-Bold.ttf`
    Bundled { origin: Option<String>, path: String },
}

impl FontSource {
    pub fn bundled(origin: Option<&str>, path: &str) -> Self {
        FontSource::Bundled {
            origin: origin.map(|o| o.trim_end_matches('/').to_string()),
            path: path.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FontSource::LocalFile(path) => format!("file {}", path.display()),
            FontSource::Bundled { origin: Some(origin), path } => format!("{}{}", origin, path),
            FontSource::Bundled { origin: None, path } => format!("<unknown origin>{}", path),
        }
    }

    pub async fn load(&self, client: &Client) -> Result<Vec<u8>, FontError> {
        self.load_with_limit(client, MAX_FONT_BYTES).await
    }

    /// Like [`load`](Self::load), refusing bundled bodies over `limit` bytes
    pub async fn load_with_limit(&self, client: &Client, limit: usize) -> Result<Vec<u8>, FontError> {
        match self {
            FontSource::LocalFile(path) => Ok(tokio::fs::read(path).await?),
            FontSource::Bundled { origin, path } => {
                let origin = origin.as_deref().ok_or_else(|| FontError::NoOrigin(path.clone()))?;
                let mut response = client.get(format!("{}{}", origin, path)).send().await?;
                if !response.status().is_success() {
                    return Err(FontError::Status(response.status()));
                }
                if response.content_length().is_some_and(|len| len > limit as u64) {
                    return Err(FontError::TooLarge { limit });
                }

                let mut data = Vec::new();
                while let Some(chunk) = response.chunk().await? {
                    if data.len() + chunk.len() > limit {
                        return Err(FontError::TooLarge { limit });
                    }
                    data.extend_from_slice(&chunk);
                }
                Ok(data)
            }
        }
    }
}

/// Outcome of walking the font sources. Both variants are renderable.
#[derive(Clone)]
pub enum FontResolution {
    Custom {
        db: Arc<Database>,
        family: String,
        source: String,
    },
    Fallback {
        db: Arc<Database>,
    },
}

impl FontResolution {
    pub fn fallback(db: Arc<Database>) -> Self {
        FontResolution::Fallback { db }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, FontResolution::Custom { .. })
    }

    pub fn database(&self) -> Arc<Database> {
        match self {
            FontResolution::Custom { db, .. } | FontResolution::Fallback { db } => db.clone(),
        }
    }

    /// Family to name first in the SVG
    pub fn family(&self) -> String {
        match self {
            FontResolution::Custom { family, .. } => family.clone(),
            FontResolution::Fallback { db } => first_family(db).unwrap_or_else(|| FALLBACK_FAMILY.to_string()),
        }
    }
}

impl std::fmt::Debug for FontResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontResolution::Custom { family, source, .. } => f
                .debug_struct("Custom")
                .field("family", family)
                .field("source", source)
                .finish(),
            FontResolution::Fallback { db } => f.debug_struct("Fallback").field("faces", &db.len()).finish(),
        }
    }
}

fn first_family(db: &Database) -> Option<String> {
    db.faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
}

/// Load raw bytes into a fresh database, rejecting data without a face.
pub fn database_from_bytes(data: Vec<u8>) -> Result<(Database, String), FontError> {
    let mut db = Database::new();
    db.load_font_data(data);
    let family = first_family(&db).ok_or(FontError::InvalidFont)?;
    Ok((db, family))
}

/// Try `sources` in order and keep the first one that yields a usable face.
pub async fn resolve_font(sources: &[FontSource], client: &Client, fallback: Arc<Database>) -> FontResolution {
    for source in sources {
        let loaded = source.load(client).await.and_then(database_from_bytes);
        match loaded {
            Ok((db, family)) => {
                tracing::debug!("Loaded font family '{}' from {}", family, source.describe());
                return FontResolution::Custom {
                    db: Arc::new(db),
                    family,
                    source: source.describe(),
                };
            }
            Err(e) => {
                tracing::warn!("Font source {} unavailable: {}", source.describe(), e);
            }
        }
    }

    tracing::warn!("No custom font available, rendering with {} fallback faces", fallback.len());
    FontResolution::fallback(fallback)
}
