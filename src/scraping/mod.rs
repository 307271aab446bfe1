pub mod app_state;
pub mod base;
pub mod linked_data;
pub mod social_meta;
pub mod text_scan;

use scraper::Html;
use tracing::{debug, warn};

use crate::format::Formatter;
use crate::models::{EventRecord, DEFAULT_TITLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Title,
    Start,
    End,
    Image,
    Location,
}

/// Whatever one stage managed to find; `None` means "not found here".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartialEvent {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub image: Option<String>,
    pub location: Option<String>,
}

impl PartialEvent {
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Title => self.title.is_some(),
            Field::Start => self.start.is_some(),
            Field::End => self.end.is_some(),
            Field::Image => self.image.is_some(),
            Field::Location => self.location.is_some(),
        }
    }

    /// Fills only the fields still unset; earlier values always win.
    pub fn merge(&mut self, later: PartialEvent) {
        fill(&mut self.title, later.title);
        fill(&mut self.start, later.start);
        fill(&mut self.end, later.end);
        fill(&mut self.image, later.image);
        fill(&mut self.location, later.location);
    }
}

fn fill(slot: &mut Option<String>, candidate: Option<String>) {
    if slot.is_none() {
        *slot = base::non_empty(candidate);
    }
}

/// A fetched page, parsed once and shared by every stage.
pub struct Document<'a> {
    pub raw: &'a str,
    pub html: Html,
}

impl<'a> Document<'a> {
    pub fn parse(raw: &'a str) -> Self {
        Self {
            raw,
            html: Html::parse_document(raw),
        }
    }
}

pub trait ExtractionStage {
    fn name(&self) -> &'static str;
    fn provides(&self) -> &'static [Field];
    fn extract(&self, document: &Document<'_>) -> anyhow::Result<PartialEvent>;
}

fn cascade() -> Vec<Box<dyn ExtractionStage>> {
    vec![
        Box::new(linked_data::LinkedData),
        Box::new(app_state::AppState),
        Box::new(social_meta::SocialMeta),
        Box::new(text_scan::TextScan),
    ]
}

pub fn run_cascade(document: &Document<'_>) -> PartialEvent {
    let mut merged = PartialEvent::default();

    for stage in cascade() {
        if stage.provides().iter().all(|field| merged.has(*field)) {
            debug!(stage = stage.name(), "skipping stage, nothing left to fill");
            continue;
        }
        match stage.extract(document) {
            Ok(found) => {
                debug!(stage = stage.name(), ?found, "stage finished");
                merged.merge(found);
            }
            Err(err) => {
                warn!(stage = stage.name(), error = %err, "extraction stage failed");
            }
        }
    }

    merged
}

/// Never fails: a page with nothing usable still yields a record titled "Event".
pub fn extract(html: &str, event_id: &str, formatter: &Formatter) -> EventRecord {
    let document = Document::parse(html);
    let found = run_cascade(&document);

    let record = EventRecord {
        event_id: event_id.to_string(),
        title: found.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        raw_start: found.start,
        raw_end: found.end,
        formatted_date: String::new(),
        formatted_time: String::new(),
        image_url: found.image,
        location: found.location,
    };
    record.reformatted(formatter)
}
