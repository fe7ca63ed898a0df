use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::FetchSettings;
use crate::error::FetchError;

/// Retrieves the raw HTML for a URL. Failures carry a human-readable reason
/// that callers pass on unchanged.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

struct ProxyApi {
    url: String,
    token: String,
}

/// Direct GET, or GET through a scraping-proxy API when one is configured.
pub struct HttpFetcher {
    client: reqwest::Client,
    proxy: Option<ProxyApi>,
}

impl HttpFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::new(format!("failed to build http client: {}", e)))?;

        let proxy = match (&settings.api_url, &settings.api_token) {
            (Some(url), Some(token)) => Some(ProxyApi {
                url: url.clone(),
                token: token.clone(),
            }),
            _ => None,
        };

        Ok(HttpFetcher { client, proxy })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request = match &self.proxy {
            Some(api) => self
                .client
                .get(&api.url)
                .query(&[("token", api.token.as_str()), ("url", url)]),
            None => self.client.get(url),
        };

        let start = std::time::Instant::now();
        let response = request.send().await.map_err(describe)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().await.map_err(describe)?;
        debug!(url, bytes = body.len(), latency_ms = start.elapsed().as_millis() as u64, "fetched");
        Ok(body)
    }
}

fn describe(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::new("timeout")
    } else {
        // the url is already on the page record
        FetchError::new(err.without_url().to_string())
    }
}

/// Fixed minimum gap between consecutive fetch starts, shared by all tasks.
pub struct Throttle {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Throttle {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's slot. The first call returns immediately.
    pub async fn wait(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.delay);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use super::*;

    /// Canned responses per URL, replayed in order; the last one repeats.
    #[derive(Default)]
    pub struct FakeFetcher {
        responses: Mutex<HashMap<String, VecDeque<Result<String, FetchError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(self, url: &str, html: &str) -> Self {
            self.respond(url, Ok(html.to_string()))
        }

        pub fn fail(self, url: &str, reason: &str) -> Self {
            self.respond(url, Err(FetchError::new(reason)))
        }

        fn respond(self, url: &str, response: Result<String, FetchError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(response);
            self
        }

        pub fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            let mut responses = self.responses.lock().unwrap();
            let queue = match responses.get_mut(url) {
                Some(q) => q,
                None => return Err(FetchError::new("HTTP 404")),
            };
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }
}

// ── Tests ──
