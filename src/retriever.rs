use tracing::debug;

use crate::error::ShareError;
use crate::locator;
use crate::relay::{self, Transport, TransportError};

pub const DEFAULT_RELAYS: [&str; 3] = [
    "https://api.allorigins.win/raw?url=",
    "https://corsproxy.io/?",
    "https://api.codetabs.com/v1/proxy?quest=",
];

pub struct Retriever<'a, T: Transport> {
    transport: &'a T,
    relays: &'a [String],
}

impl<'a, T: Transport> Retriever<'a, T> {
    pub fn new(transport: &'a T, relays: &'a [String]) -> Self {
        Self { transport, relays }
    }

    pub async fn fetch_document(&self, event_id: &str) -> Result<String, ShareError> {
        let source = locator::canonical_url(event_id);
        let result = relay::first_success(self.relays, |template| {
            let url = relay::relay_url(template, &source);
            async move {
                let body = self.transport.get_text(&url).await?;
                if !looks_like_html(&body) {
                    return Err(TransportError::InvalidBody("not HTML".to_string()));
                }
                debug!(bytes = body.len(), "fetched event page");
                Ok::<_, TransportError>(body)
            }
        })
        .await;

        result.map_err(|exhausted| ShareError::FetchExhausted(exhausted.describe_last()))
    }
}

fn looks_like_html(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("<!doctype html") || lowered.contains("<html")
}
