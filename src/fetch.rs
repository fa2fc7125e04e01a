//! HTTP fetching with a classified failure boundary and optional retries.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait, one GET per call, outcome as a `Result`
//! - [`HttpFetcher`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: decorator adding exponential backoff to any [`Fetch`]
//!
//! A fetch never panics and never lets a transport error escape as anything
//! other than a [`FetchError`]; callers inspect the kind and move on.
//!
//! # Retry Strategy
//!
//! Only transient kinds are retried (see [`FetchErrorKind::is_transient`]).
//! The delay doubles from `base_delay` up to `max_delay`, plus random jitter.

use crate::error::{FetchError, FetchErrorKind};
use crate::models::Document;
use rand::{Rng, rng};
use std::error::Error as StdError;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};
use url::Url;

/// One HTTP GET.
pub trait Fetch {
    /// Fetch `url`, which must be absolute.
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given user agent and per-request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::new(url.as_str(), FetchErrorKind::InvalidUrl));
        }

        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::new(url.as_str(), classify(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url.as_str(),
                FetchErrorKind::Status(status.as_u16()),
            ));
        }

        let body = response.text().await.map_err(|e| {
            let kind = if e.is_timeout() {
                FetchErrorKind::Timeout
            } else {
                FetchErrorKind::Body(e.to_string())
            };
            FetchError::new(url.as_str(), kind)
        })?;

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(Document {
            url: url.clone(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Map a transport error onto a [`FetchErrorKind`].
fn classify(e: &reqwest::Error) -> FetchErrorKind {
    if e.is_timeout() {
        FetchErrorKind::Timeout
    } else if e.is_connect() {
        if mentions_dns(e) {
            FetchErrorKind::Dns
        } else {
            FetchErrorKind::Connect(e.to_string())
        }
    } else if let Some(status) = e.status() {
        FetchErrorKind::Status(status.as_u16())
    } else if e.is_builder() {
        FetchErrorKind::InvalidUrl
    } else {
        FetchErrorKind::Request(e.to_string())
    }
}

/// hyper reports resolver failures as connect errors; the cause chain says "dns error".
fn mentions_dns(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        let msg = err.to_string().to_ascii_lowercase();
        if msg.contains("dns error") || msg.contains("failed to lookup address") {
            return true;
        }
        cur = err.source();
    }
    false
}

/// Wrapper that adds exponential backoff retry logic to any [`Fetch`] implementation.
///
/// With `max_retries == 0` it is a transparent pass-through.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: Fetch,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            delay
        } else {
            delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Fetch for RetryFetch<T>
where
    T: Fetch,
{
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries || !e.kind.is_transient() {
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        %url,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
