use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use scraper::Selector;
use serde_json::Value;

use super::base;
use super::{Document, ExtractionStage, Field, PartialEvent};

static NEXT_DATA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script#__NEXT_DATA__").expect("next data selector"));

/// Locations the page has been seen to keep its event object under.
const EVENT_POINTERS: [&str; 2] = ["/props/pageProps/event", "/props/pageProps/initialData/data/event"];

/// The hydration blob the page ships for its client-side app.
pub struct AppState;

impl ExtractionStage for AppState {
    fn name(&self) -> &'static str {
        "app-state"
    }

    fn provides(&self) -> &'static [Field] {
        &[Field::Title, Field::Start, Field::End, Field::Image, Field::Location]
    }

    fn extract(&self, document: &Document<'_>) -> Result<PartialEvent> {
        let Some(body) = base::script_bodies(&document.html, &NEXT_DATA_SELECTOR)
            .into_iter()
            .next()
        else {
            return Ok(PartialEvent::default());
        };

        let state: Value =
            serde_json::from_str(body.trim()).context("could not parse __NEXT_DATA__")?;
        let event = EVENT_POINTERS
            .iter()
            .find_map(|pointer| state.pointer(pointer).filter(|v| v.is_object()))
            .ok_or_else(|| anyhow!("no event object in __NEXT_DATA__"))?;

        Ok(PartialEvent {
            title: base::str_at(event, "/name"),
            start: base::str_at(event, "/start_at"),
            end: base::str_at(event, "/end_at"),
            image: base::str_at(event, "/cover_url"),
            location: base::str_at(event, "/geo_address_info/city")
                .or_else(|| base::str_at(event, "/location")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_page_props_event() {
        let html = r#"<html><head><script id="__NEXT_DATA__" type="application/json">
          {"props":{"pageProps":{"event":{"name":"Hack Night",
            "start_at":"2025-05-02T23:00:00.000Z","end_at":"2025-05-03T02:00:00.000Z",
            "cover_url":"https://images.lumacdn.com/event-covers/x.png",
            "geo_address_info":{"city":"Madrid"}}}}}
        </script></head></html>"#;

        let found = AppState.extract(&Document::parse(html)).expect("parses");
        assert_eq!(found.title.as_deref(), Some("Hack Night"));
        assert_eq!(found.start.as_deref(), Some("2025-05-02T23:00:00.000Z"));
        assert_eq!(found.end.as_deref(), Some("2025-05-03T02:00:00.000Z"));
        assert_eq!(
            found.image.as_deref(),
            Some("https://images.lumacdn.com/event-covers/x.png")
        );
        assert_eq!(found.location.as_deref(), Some("Madrid"));
    }

    #[test]
    fn reads_initial_data_event_and_string_location() {
        let html = r#"<html><head><script id="__NEXT_DATA__" type="application/json">
          {"props":{"pageProps":{"initialData":{"data":{"event":{"name":"Book Club",
            "location":"Online"}}}}}}
        </script></head></html>"#;

        let found = AppState.extract(&Document::parse(html)).expect("parses");
        assert_eq!(found.title.as_deref(), Some("Book Club"));
        assert_eq!(found.location.as_deref(), Some("Online"));
    }

    #[test]
    fn malformed_state_is_an_error() {
        let html = r#"<html><head><script id="__NEXT_DATA__">{"props":</script></head></html>"#;
        assert!(AppState.extract(&Document::parse(html)).is_err());

        let html = r#"<html><head><script id="__NEXT_DATA__">{"props":{}}</script></head></html>"#;
        assert!(AppState.extract(&Document::parse(html)).is_err());
    }

    #[test]
    fn missing_block_is_not_an_error() {
        let found = AppState.extract(&Document::parse("<html></html>")).expect("ok");
        assert_eq!(found, PartialEvent::default());
    }
}
