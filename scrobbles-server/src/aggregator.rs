//! Daily scrobble aggregation
//!
//! Walks the user's recent-track pages for one [`TimeWindow`] and sums the
//! track list lengths. Pages are requested strictly one after another, the
//! next only once the previous one resolved.
//!
//! Entries are counted as returned: no dedup, no timestamp re-check, and a
//! now-playing entry counts like any other.

use std::sync::Arc;

use scrobbles_common::{AggregateResult, TimeWindow};

use crate::error::FetchError;
use crate::lastfm::{PageQuery, TrackHistorySource, PAGE_LIMIT};

pub struct ScrobbleAggregator {
    source: Arc<dyn TrackHistorySource>,
    api_key: Option<String>,
}

impl ScrobbleAggregator {
    /// A blank `api_key` is treated as missing.
    pub fn new(source: Arc<dyn TrackHistorySource>, api_key: Option<String>) -> Self {
        Self {
            source,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Count `username`'s scrobbles for the server's current local day.
    pub async fn aggregate(&self, username: &str) -> AggregateResult {
        self.aggregate_in(username, TimeWindow::local_today()).await
    }

    /// Count `username`'s scrobbles inside `window`.
    ///
    /// Any fetch failure yields `Unavailable`, never a partial count.
    pub async fn aggregate_in(&self, username: &str, window: TimeWindow) -> AggregateResult {
        match self.count_scrobbles(username, window).await {
            Ok(scrobble_count) => {
                tracing::info!("Total scrobbles for {} today: {}", username, scrobble_count);
                AggregateResult::Counted {
                    username: username.to_string(),
                    scrobble_count,
                }
            }
            Err(e) => {
                tracing::warn!("Error fetching scrobbles for {}: {}", username, e);
                AggregateResult::Unavailable {
                    username: username.to_string(),
                }
            }
        }
    }

    /// Raw pagination loop. Stops cleanly on a page without tracks, aborts on
    /// the first error.
    pub async fn count_scrobbles(&self, username: &str, window: TimeWindow) -> Result<u64, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingCredential)?;

        let mut page: u32 = 1;
        let mut total_pages: u32 = 1;
        let mut total: u64 = 0;

        loop {
            let query = PageQuery {
                username,
                api_key,
                window,
                page,
                limit: PAGE_LIMIT,
            };

            match self.source.fetch_page(&query).await? {
                Some(result) => {
                    total += result.track_count;
                    total_pages = result.total_pages;
                    page += 1;
                }
                None => {
                    tracing::debug!("No tracks found for {} on page {}", username, page);
                    break;
                }
            }

            if page > total_pages {
                break;
            }
        }

        Ok(total)
    }
}
