use chrono::{Duration, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Seconds covered by one aggregation window (inclusive bounds).
pub const WINDOW_SPAN_SECS: i64 = 86_399;

pub const DEFAULT_IMAGE_WIDTH: u32 = 800;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 400;

pub const PLACEHOLDER_USERNAME: &str = "Unknown";
pub const PLACEHOLDER_COUNT: &str = "???";

/// Route serving the preview image
pub const PREVIEW_ROUTE: &str = "/api/og";

/// Unix timestamp range for one calendar day.
///
/// The day is the server's local day, not the listener's. `end - start` is
/// always [`WINDOW_SPAN_SECS`], DST transitions are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn starting_at(start: i64) -> Self {
        Self {
            start,
            end: start + WINDOW_SPAN_SECS,
        }
    }

    /// Window for `date` with midnight taken in `tz`.
    ///
    /// A midnight that falls into a DST gap resolves to one hour later; an
    /// ambiguous midnight resolves to the earlier instant.
    pub fn for_date_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let start = tz
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
            .timestamp();

        Self::starting_at(start)
    }

    pub fn for_local_date(date: NaiveDate) -> Self {
        Self::for_date_in(date, &Local)
    }

    /// Today's window in the server time zone
    pub fn local_today() -> Self {
        Self::for_local_date(Local::now().date_naive())
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// What one upstream page contributed to the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageResult {
    pub track_count: u64,
    pub total_pages: u32,
    pub has_more: bool,
}

impl PageResult {
    pub fn new(page: u32, track_count: u64, total_pages: u32) -> Self {
        Self {
            track_count,
            total_pages,
            has_more: page < total_pages,
        }
    }
}

/// Outcome of counting one user's scrobbles for today.
///
/// `Unavailable` deliberately carries no cause: callers render a generic
/// failure state instead of a count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateResult {
    Counted { username: String, scrobble_count: u64 },
    Unavailable { username: String },
}

impl AggregateResult {
    pub fn username(&self) -> &str {
        match self {
            AggregateResult::Counted { username, .. } => username,
            AggregateResult::Unavailable { username } => username,
        }
    }

    pub fn scrobble_count(&self) -> Option<u64> {
        match self {
            AggregateResult::Counted { scrobble_count, .. } => Some(*scrobble_count),
            AggregateResult::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AggregateResult::Counted { .. })
    }

    /// Count to show on the page; zero placeholder when unavailable
    pub fn display_count(&self) -> u64 {
        self.scrobble_count().unwrap_or(0)
    }

    pub fn message(&self) -> String {
        match self {
            AggregateResult::Counted { username, .. } => {
                format!("{}'s Last.fm stats for today", username)
            }
            AggregateResult::Unavailable { username } => {
                format!("Failed to fetch scrobbles for {} today.", username)
            }
        }
    }

    /// Preview image for this result, with the count already formatted
    pub fn image_spec(&self) -> ImageSpec {
        ImageSpec::new(self.username(), self.display_count().to_string())
    }
}

/// Page payload, also served as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    pub username: String,
    pub message: String,
    pub scrobbles: u64,
    pub available: bool,
}

impl From<&AggregateResult> for PageData {
    fn from(result: &AggregateResult) -> Self {
        Self {
            username: result.username().to_string(),
            message: result.message(),
            scrobbles: result.display_count(),
            available: result.is_available(),
        }
    }
}

/// Input of the preview renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub username: String,
    /// Already formatted; may be a placeholder such as `???`
    pub display_count: String,
    pub width: u32,
    pub height: u32,
}

impl ImageSpec {
    pub fn new(username: impl Into<String>, display_count: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_count: display_count.into(),
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }

    /// Build from the preview route's query parameters. Missing or empty
    /// values fall back to the literal placeholders.
    pub fn from_query(username: Option<&str>, scrobbles: Option<&str>) -> Self {
        let username = username
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_USERNAME);
        let scrobbles = scrobbles
            .filter(|s| !s.is_empty())
            .unwrap_or(PLACEHOLDER_COUNT);
        Self::new(username, scrobbles)
    }

    /// Path plus query of the preview image for this spec
    pub fn preview_path(&self) -> String {
        format!(
            "{}?username={}&scrobbles={}",
            PREVIEW_ROUTE,
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.display_count)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_window_span_is_fixed() {
        let window = TimeWindow::starting_at(1_700_000_000);
        assert_eq!(window.end - window.start, 86_399);
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(window.end + 1));
        assert!(!window.contains(window.start - 1));
    }

    #[test]
    fn test_window_for_date_in_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = TimeWindow::for_date_in(date, &Utc);
        assert_eq!(window.start, 1_710_460_800);
        assert_eq!(window.end, 1_710_460_800 + 86_399);
    }

    #[test]
    fn test_window_follows_server_offset() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = TimeWindow::for_date_in(date, &Utc);
        let local = TimeWindow::for_date_in(date, &tokyo);
        assert_eq!(utc.start - local.start, 9 * 3600);
        assert_eq!(local.end - local.start, 86_399);
    }

    #[test]
    fn test_local_today_contains_now() {
        let window = TimeWindow::local_today();
        let now = Utc::now().timestamp();
        // Allow the test to straddle midnight
        assert!(window.contains(now) || now - window.end <= 2);
    }

    #[test]
    fn test_page_result_has_more() {
        assert!(PageResult::new(1, 200, 2).has_more);
        assert!(!PageResult::new(2, 15, 2).has_more);
        assert!(!PageResult::new(1, 37, 1).has_more);
    }

    #[test]
    fn test_aggregate_result_messages() {
        let ok = AggregateResult::Counted {
            username: "alice".to_string(),
            scrobble_count: 37,
        };
        assert_eq!(ok.message(), "alice's Last.fm stats for today");
        assert_eq!(ok.display_count(), 37);

        let failed = AggregateResult::Unavailable {
            username: "bob".to_string(),
        };
        assert_eq!(failed.message(), "Failed to fetch scrobbles for bob today.");
        assert_eq!(failed.scrobble_count(), None);
        assert_eq!(failed.display_count(), 0);
    }

    #[test]
    fn test_page_data_from_result() {
        let failed = AggregateResult::Unavailable {
            username: "bob".to_string(),
        };
        let data = PageData::from(&failed);
        assert!(!data.available);
        assert_eq!(data.scrobbles, 0);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["username"], "bob");
        assert_eq!(json["available"], false);
    }

    #[test]
    fn test_image_spec_placeholders() {
        let spec = ImageSpec::from_query(None, Some(""));
        assert_eq!(spec.username, "Unknown");
        assert_eq!(spec.display_count, "???");
        assert_eq!((spec.width, spec.height), (800, 400));

        let spec = ImageSpec::from_query(Some("alice"), Some("37"));
        assert_eq!(spec.username, "alice");
        assert_eq!(spec.display_count, "37");
    }

    #[test]
    fn test_preview_path_encodes_query() {
        let spec = ImageSpec::new("dj & co", "12");
        assert_eq!(
            spec.preview_path(),
            "/api/og?username=dj%20%26%20co&scrobbles=12"
        );
    }
}
