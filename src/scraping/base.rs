use scraper::{Html, Selector};
use serde_json::Value;

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| clean_text(&s)).filter(|s| !s.is_empty())
}

pub fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|node| non_empty(Some(node.text().collect::<Vec<_>>().join(" "))))
}

pub fn first_attr(document: &Html, selector: &Selector, attr: &str) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .and_then(|value| non_empty(Some(value.to_string())))
}

/// Raw contents of every element matching `selector`, untouched by whitespace cleanup.
pub fn script_bodies(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|el| el.text().collect::<String>())
        .collect()
}

pub fn str_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .and_then(|s| non_empty(Some(s.to_string())))
}
