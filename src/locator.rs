use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::ShareError;

const HOST_FAMILIES: [&str; 2] = ["lu.ma", "luma.com"];

static EVENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid event id regex"));

/// Accepts `lu.ma/abc123`, `luma.com/city/abc123` and full URLs of either
/// host family. Returns the last path segment when it looks like an id.
pub fn extract_event_id(input: &str) -> Option<String> {
    let mut cleaned = input.trim().to_string();
    if cleaned.is_empty() {
        return None;
    }
    if !cleaned.starts_with("http") {
        cleaned = format!("https://{cleaned}");
    }

    let url = Url::parse(&cleaned).ok()?;
    let host = url.host_str()?;
    if !is_valid_host(host) {
        return None;
    }

    let candidate = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if EVENT_ID_RE.is_match(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

pub fn locate(input: &str) -> Result<String, ShareError> {
    extract_event_id(input).ok_or(ShareError::InvalidLink)
}

pub fn is_valid_host(host: &str) -> bool {
    HOST_FAMILIES.iter().any(|family| host.contains(family))
}

pub fn canonical_url(event_id: &str) -> String {
    format!("https://lu.ma/{event_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_full_links() {
        assert_eq!(extract_event_id("lu.ma/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            extract_event_id("https://luma.com/sf/xyz789").as_deref(),
            Some("xyz789")
        );
        assert_eq!(
            extract_event_id("  https://lu.ma/my_event-2  ").as_deref(),
            Some("my_event-2")
        );
        assert_eq!(
            extract_event_id("luma.com/abc123/?utm_source=x").as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_event_id("http://www.lu.ma/q1").as_deref(), Some("q1"));
    }

    #[test]
    fn rejects_unrecognized_hosts() {
        for input in [
            "https://example.com/abc123",
            "example.com/abc123",
            "https://eventbrite.com/e/abc123",
            "ftp://lumacom.net/abc123",
        ] {
            assert_eq!(extract_event_id(input), None, "{input}");
        }
    }

    #[test]
    fn rejects_empty_paths_and_bad_segments() {
        assert_eq!(extract_event_id(""), None);
        assert_eq!(extract_event_id("lu.ma"), None);
        assert_eq!(extract_event_id("https://lu.ma/"), None);
        assert_eq!(extract_event_id("lu.ma/abc%20123"), None);
        assert_eq!(extract_event_id("lu.ma/abc.123"), None);
        assert_eq!(extract_event_id("lu.ma/caf%C3%A9"), None);
    }

    #[test]
    fn locate_maps_rejection_to_invalid_link() {
        assert!(matches!(
            locate("https://example.com/abc123"),
            Err(ShareError::InvalidLink)
        ));
        assert_eq!(locate("lu.ma/abc123").unwrap(), "abc123");
        assert_eq!(canonical_url("abc123"), "https://lu.ma/abc123");
    }
}
