//! `user.getrecenttracks` JSON parser
//!
//! Only the shape needed for counting is read: the length of
//! `recenttracks.track` and `recenttracks["@attr"].totalPages`.

use scrobbles_common::PageResult;
use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;

/// Top-level response. `recenttracks` is kept loose so an odd shape reads as
/// "no tracks" rather than a decode failure.
#[derive(Debug, Deserialize)]
struct RecentTracksResponse {
    #[serde(default)]
    recenttracks: Option<Value>,
    #[serde(default)]
    error: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Last.fm sends `totalPages` as a string, tolerate a bare number too.
fn parse_total_pages(value: &Value) -> Option<u32> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Parse one page of recent tracks.
///
/// Returns `Ok(None)` when the body has no non-empty track list; that ends
/// pagination without failing the count.
pub fn parse_page(body: &str, page: u32) -> Result<Option<PageResult>, FetchError> {
    let resp: RecentTracksResponse = serde_json::from_str(body)
        .map_err(|e| FetchError::Payload(format!("invalid JSON on page {}: {}", page, e)))?;

    if let Some(code) = resp.error {
        return Err(FetchError::Upstream {
            code,
            message: resp.message.unwrap_or_default(),
        });
    }

    let Some(recent) = resp.recenttracks else {
        return Ok(None);
    };

    let track_count = match recent.get("track").and_then(Value::as_array) {
        Some(tracks) if !tracks.is_empty() => tracks.len() as u64,
        _ => return Ok(None),
    };

    let attr = recent
        .get("@attr")
        .ok_or_else(|| FetchError::Payload(format!("missing @attr on page {}", page)))?;
    let total_pages = attr
        .get("totalPages")
        .and_then(parse_total_pages)
        .ok_or_else(|| FetchError::Payload(format!("missing or invalid totalPages on page {}", page)))?;

    Ok(Some(PageResult::new(page, track_count, total_pages)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_with_tracks(count: usize, total_pages: &str) -> String {
        let tracks: Vec<Value> = (0..count)
            .map(|i| serde_json::json!({ "name": format!("Track {}", i), "date": { "uts": "1700000000" } }))
            .collect();
        serde_json::json!({
            "recenttracks": {
                "track": tracks,
                "@attr": { "user": "alice", "page": "1", "perPage": "200", "totalPages": total_pages, "total": "0" }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_counts_tracks() {
        let page = parse_page(&body_with_tracks(37, "1"), 1).unwrap().unwrap();
        assert_eq!(page.track_count, 37);
        assert_eq!(page.total_pages, 1);
        assert!(!page.has_more);
    }

    #[test]
    fn test_parse_first_of_many() {
        let page = parse_page(&body_with_tracks(200, "3"), 1).unwrap().unwrap();
        assert_eq!(page.track_count, 200);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);
    }

    #[test]
    fn test_numeric_total_pages() {
        let body = r#"{"recenttracks":{"track":[{}],"@attr":{"totalPages":2}}}"#;
        let page = parse_page(body, 1).unwrap().unwrap();
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_empty_day_is_end_of_data() {
        let body = r#"{"recenttracks":{"track":[],"@attr":{"totalPages":"0"}}}"#;
        assert!(parse_page(body, 1).unwrap().is_none());
    }

    #[test]
    fn test_missing_or_odd_track_list_is_end_of_data() {
        assert!(parse_page(r#"{}"#, 1).unwrap().is_none());
        assert!(parse_page(r#"{"recenttracks":{"@attr":{"totalPages":"1"}}}"#, 1).unwrap().is_none());
        // A lone track object instead of a list
        assert!(parse_page(r#"{"recenttracks":{"track":{"name":"x"},"@attr":{"totalPages":"1"}}}"#, 1)
            .unwrap()
            .is_none());
        assert!(parse_page(r#"{"recenttracks":"nope"}"#, 1).unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_payload_error() {
        let err = parse_page("<html>bad gateway</html>", 2).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_missing_attr_is_payload_error() {
        let err = parse_page(r#"{"recenttracks":{"track":[{}]}}"#, 1).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));

        let err = parse_page(r#"{"recenttracks":{"track":[{}],"@attr":{"totalPages":"many"}}}"#, 1).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_upstream_error_body() {
        let err = parse_page(r#"{"error":6,"message":"User not found"}"#, 1).unwrap_err();
        match err {
            FetchError::Upstream { code, message } => {
                assert_eq!(code, 6);
                assert_eq!(message, "User not found");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
