use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Document, ExtractionStage, Field, PartialEvent};

// Tied to the page's current markup; expect this to drift first.
static START_AT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""start_at":"([^"]+)""#).expect("start_at regex"));
static COVER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"images\.lumacdn\.com[^"'\s]+event-covers[^"'\s]+"#).expect("cover regex")
});

/// Last resort: pattern search over the raw page text.
pub struct TextScan;

impl ExtractionStage for TextScan {
    fn name(&self) -> &'static str {
        "text-scan"
    }

    fn provides(&self) -> &'static [Field] {
        &[Field::Start, Field::Image]
    }

    fn extract(&self, document: &Document<'_>) -> Result<PartialEvent> {
        let start = START_AT_RE
            .captures(document.raw)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        let image = COVER_RE
            .find(document.raw)
            .map(|m| format!("https://{}", m.as_str()));

        Ok(PartialEvent {
            start,
            image,
            ..PartialEvent::default()
        })
    }
}
