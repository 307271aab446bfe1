use crate::format::{DisplayZone, Formatter};
use crate::models::{EventRecord, Language, Template};

/// What the user is currently looking at: the last extracted event and the
/// template/language picks. Owned by the driver and passed explicitly.
#[derive(Clone, Debug)]
pub struct Session {
    record: Option<EventRecord>,
    template_key: String,
    language: Language,
    zone: DisplayZone,
}

impl Session {
    pub fn new(template_key: impl Into<String>, language: Language, zone: DisplayZone) -> Self {
        Self {
            record: None,
            template_key: template_key.into(),
            language,
            zone,
        }
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.language, self.zone)
    }

    pub fn template(&self) -> Template {
        Template::resolve(&self.template_key)
    }

    pub fn record(&self) -> Option<&EventRecord> {
        self.record.as_ref()
    }

    /// Stores the record as extracted; it is expected to carry this
    /// session's formatting already.
    pub fn load(&mut self, record: EventRecord) {
        self.record = Some(record);
    }

    /// Re-renders date and time without touching the network.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        let formatter = self.formatter();
        if let Some(record) = self.record.as_mut() {
            *record = record.reformatted(&formatter);
        }
    }

    pub fn set_template(&mut self, key: impl Into<String>) {
        self.template_key = key.into();
    }
}
