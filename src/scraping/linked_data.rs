use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::Selector;
use serde_json::Value;
use tracing::warn;

use super::base;
use super::{Document, ExtractionStage, Field, PartialEvent};

static LD_JSON_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("ld+json selector")
});

/// schema.org `Event` objects embedded as JSON-LD.
pub struct LinkedData;

impl ExtractionStage for LinkedData {
    fn name(&self) -> &'static str {
        "linked-data"
    }

    fn provides(&self) -> &'static [Field] {
        &[Field::Title, Field::Start, Field::End, Field::Image, Field::Location]
    }

    fn extract(&self, document: &Document<'_>) -> Result<PartialEvent> {
        for body in base::script_bodies(&document.html, &LD_JSON_SELECTOR) {
            let value: Value = match serde_json::from_str(body.trim()) {
                Ok(value) => value,
                Err(err) => {
                    warn!(error = %err, "could not parse JSON-LD block");
                    continue;
                }
            };
            if let Some(event) = find_event(&value) {
                return Ok(from_event(event));
            }
        }
        Ok(PartialEvent::default())
    }
}

fn find_event(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_event),
        Value::Object(map) => {
            if is_event_type(map.get("@type")) {
                return Some(value);
            }
            map.get("@graph").and_then(find_event)
        }
        _ => None,
    }
}

fn is_event_type(kind: Option<&Value>) -> bool {
    match kind {
        Some(Value::String(s)) => s == "Event",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("Event")),
        _ => false,
    }
}

fn from_event(event: &Value) -> PartialEvent {
    PartialEvent {
        title: base::str_at(event, "/name"),
        start: base::str_at(event, "/startDate"),
        end: base::str_at(event, "/endDate"),
        image: event.get("image").and_then(image_url),
        location: base::str_at(event, "/location/name")
            .or_else(|| base::str_at(event, "/location/address/addressLocality")),
    }
}

fn image_url(image: &Value) -> Option<String> {
    match image {
        Value::String(url) => base::non_empty(Some(url.clone())),
        Value::Array(items) => items.first().and_then(image_url),
        Value::Object(_) => base::str_at(image, "/url"),
        _ => None,
    }
}
