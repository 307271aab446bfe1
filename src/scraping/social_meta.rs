use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::Selector;

use super::base;
use super::{Document, ExtractionStage, Field, PartialEvent};

static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("og title"));
static TWITTER_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="twitter:title"]"#).expect("twitter title"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("document title"));
static OG_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("og image"));
static TWITTER_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="twitter:image"]"#).expect("twitter image"));

pub struct SocialMeta;

impl ExtractionStage for SocialMeta {
    fn name(&self) -> &'static str {
        "social-meta"
    }

    fn provides(&self) -> &'static [Field] {
        &[Field::Title, Field::Image]
    }

    fn extract(&self, document: &Document<'_>) -> Result<PartialEvent> {
        let html = &document.html;
        let title = base::first_attr(html, &OG_TITLE_SELECTOR, "content")
            .or_else(|| base::first_attr(html, &TWITTER_TITLE_SELECTOR, "content"))
            .or_else(|| base::first_text(html, &TITLE_SELECTOR));
        let image = base::first_attr(html, &OG_IMAGE_SELECTOR, "content")
            .or_else(|| base::first_attr(html, &TWITTER_IMAGE_SELECTOR, "content"));

        Ok(PartialEvent {
            title,
            image,
            ..PartialEvent::default()
        })
    }
}
