//! Locale-aware date and time strings for the card.
//!
//! Everything here is best effort: a missing or unparsable instant renders
//! as an empty string, never as an error.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::Language;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayZone {
    Local,
    Named(Tz),
}

impl DisplayZone {
    /// Empty or unknown names fall back to the machine's local zone.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() {
            return DisplayZone::Local;
        }
        match name.parse::<Tz>() {
            Ok(tz) => DisplayZone::Named(tz),
            Err(err) => {
                tracing::warn!(zone = name, error = %err, "unknown time zone, using local time");
                DisplayZone::Local
            }
        }
    }

    fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            DisplayZone::Local => wall_clock(&Local, naive),
            DisplayZone::Named(tz) => wall_clock(tz, naive),
        }
    }

    fn render(&self, instant: &DateTime<FixedOffset>, pattern: &str, locale: chrono::Locale) -> String {
        match self {
            DisplayZone::Local => instant
                .with_timezone(&Local)
                .format_localized(pattern, locale)
                .to_string(),
            DisplayZone::Named(tz) => instant
                .with_timezone(tz)
                .format_localized(pattern, locale)
                .to_string(),
        }
    }
}

/// Ambiguous wall-clock times take the earlier instant. Times inside a DST
/// gap are pushed forward by the gap, so 02:30 on a spring-forward night
/// reads as 03:30.
fn wall_clock<Z: TimeZone>(zone: &Z, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(naive)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(*naive + Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.fixed_offset())
}

/// A locale the card knows how to spell dates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardLocale {
    EsEs,
    EnUs,
    PtBr,
}

impl CardLocale {
    pub fn resolve(language: Language) -> Self {
        match language {
            Language::Es => CardLocale::EsEs,
            Language::En => CardLocale::EnUs,
            Language::Pt => CardLocale::PtBr,
            Language::Auto => Self::from_tag(&ambient_locale()).unwrap_or(CardLocale::EnUs),
        }
    }

    /// Maps `es_AR.UTF-8`, `pt-PT`, `en` and friends by language prefix.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let language = tag
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "es" => Some(CardLocale::EsEs),
            "en" => Some(CardLocale::EnUs),
            "pt" => Some(CardLocale::PtBr),
            _ => None,
        }
    }

    fn chrono_locale(self) -> chrono::Locale {
        match self {
            CardLocale::EsEs => chrono::Locale::es_ES,
            CardLocale::EnUs => chrono::Locale::en_US,
            CardLocale::PtBr => chrono::Locale::pt_BR,
        }
    }

    fn date_pattern(self) -> &'static str {
        match self {
            CardLocale::EnUs => "%A, %B %-d, %Y",
            CardLocale::EsEs | CardLocale::PtBr => "%A, %-d de %B de %Y",
        }
    }

    fn time_pattern(self) -> &'static str {
        match self {
            CardLocale::EnUs => "%I:%M %p",
            CardLocale::EsEs | CardLocale::PtBr => "%H:%M",
        }
    }
}

fn ambient_locale() -> String {
    ["LC_ALL", "LC_TIME", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Formatter {
    locale: CardLocale,
    zone: DisplayZone,
}

impl Formatter {
    pub fn new(language: Language, zone: DisplayZone) -> Self {
        Self {
            locale: CardLocale::resolve(language),
            zone,
        }
    }

    pub fn format_date(&self, raw_start: Option<&str>) -> String {
        let Some(start) = raw_start.and_then(|raw| self.parse_instant(raw)) else {
            return String::new();
        };
        self.zone
            .render(&start, self.locale.date_pattern(), self.locale.chrono_locale())
    }

    pub fn format_time(&self, raw_start: Option<&str>, raw_end: Option<&str>) -> String {
        let Some(start) = raw_start.and_then(|raw| self.parse_instant(raw)) else {
            return String::new();
        };
        let pattern = self.locale.time_pattern();
        let locale = self.locale.chrono_locale();
        let mut time = self.zone.render(&start, pattern, locale);
        if let Some(end) = raw_end.and_then(|raw| self.parse_instant(raw)) {
            time.push_str(" - ");
            time.push_str(&self.zone.render(&end, pattern, locale));
        }
        time
    }

    fn parse_instant(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt);
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return self.zone.localize(&naive);
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
    }
}
