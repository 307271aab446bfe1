use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed for {url}: {reason}")]
    Request { url: String, reason: String },
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidBody(String),
}

/// GET-only seam over the network so relays can be exercised without it.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError>;
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| TransportError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response)
    }
}

impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|err| TransportError::InvalidBody(err.to_string()))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.get(url)
            .await?
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| TransportError::InvalidBody(err.to_string()))
    }
}

/// Rewrites `target` through a relay template. Templates either carry a
/// `{url}` placeholder or expect the encoded address appended.
pub fn relay_url(template: &str, target: &str) -> String {
    let encoded = urlencoding::encode(target);
    if template.contains("{url}") {
        template.replace("{url}", &encoded)
    } else {
        format!("{template}{encoded}")
    }
}

#[derive(Debug)]
pub struct Exhausted<E> {
    pub failures: Vec<(String, E)>,
}

impl<E: Display> Exhausted<E> {
    pub fn last(&self) -> Option<&E> {
        self.failures.last().map(|(_, err)| err)
    }

    pub fn describe_last(&self) -> String {
        self.last()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "no relays configured".to_string())
    }
}

/// Tries each provider in order, one at a time, and returns the first
/// success. Every failure is logged and kept.
pub async fn first_success<P, T, E, F, Fut>(providers: &[P], mut attempt: F) -> Result<T, Exhausted<E>>
where
    P: Display,
    E: Display,
    F: FnMut(&P) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::new();
    for provider in providers {
        debug!(%provider, "trying relay");
        match attempt(provider).await {
            Ok(value) => {
                debug!(%provider, "relay succeeded");
                return Ok(value);
            }
            Err(err) => {
                warn!(%provider, error = %err, "relay failed");
                failures.push((provider.to_string(), err));
            }
        }
    }
    Err(Exhausted { failures })
}


#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn relay_url_appends_or_substitutes() {
        assert_eq!(
            relay_url("https://corsproxy.io/?", "https://lu.ma/abc"),
            "https://corsproxy.io/?https%3A%2F%2Flu.ma%2Fabc"
        );
        assert_eq!(
            relay_url("https://relay.test/get?u={url}&raw=1", "https://lu.ma/abc"),
            "https://relay.test/get?u=https%3A%2F%2Flu.ma%2Fabc&raw=1"
        );
    }

    #[tokio::test]
    async fn first_success_stops_at_first_working_provider() {
        let calls = RefCell::new(Vec::new());
        let providers = ["a", "b", "c"];
        let result = first_success(&providers, |p| {
            calls.borrow_mut().push(p.to_string());
            let p = *p;
            async move {
                if p == "b" {
                    Ok(format!("from {p}"))
                } else {
                    Err(format!("{p} down"))
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "from b");
        assert_eq!(*calls.borrow(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn first_success_aggregates_all_failures() {
        let providers = ["a", "b"];
        let result: Result<(), _> =
            first_success(&providers, |p| {
                let p = *p;
                async move { Err(format!("{p} down")) }
            })
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.failures.len(), 2);
        assert_eq!(exhausted.failures[0].0, "a");
        assert_eq!(exhausted.describe_last(), "b down");
    }

    #[tokio::test]
    async fn first_success_with_no_providers_is_exhausted() {
        let providers: [&str; 0] = [];
        let result: Result<(), Exhausted<String>> =
            first_success(&providers, |_| async { Ok(()) }).await;
        assert_eq!(result.unwrap_err().describe_last(), "no relays configured");
    }
}
