//! Error types for every stage of the crawl pipeline.
//!
//! Per-item errors ([`FetchError`], [`ParseError`], [`UpsertError`]) are plain
//! values: the pipeline inspects them, logs them and moves on to the next
//! candidate. Only [`CrawlError`] is meant to stop something, and even then
//! only the run of a single source or the startup of the binary.

use thiserror::Error;

/// A failed HTTP GET, carrying the URL and a classified cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetch of {url} failed: {kind}")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchErrorKind {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("DNS resolution failed")]
    Dns,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("could not read response body: {0}")]
    Body(String),
    #[error("not an absolute http(s) URL")]
    InvalidUrl,
    #[error("abandoned at the run deadline")]
    Cancelled,
    #[error("request failed: {0}")]
    Request(String),
}

impl FetchErrorKind {
    /// Whether a retry policy may try this request again.
    ///
    /// Client errors and invalid input never change on retry; a cancelled
    /// fetch was abandoned on purpose.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchErrorKind::Status(code) => *code == 429 || *code >= 500,
            FetchErrorKind::Dns
            | FetchErrorKind::Connect(_)
            | FetchErrorKind::Timeout
            | FetchErrorKind::Body(_)
            | FetchErrorKind::Request(_) => true,
            FetchErrorKind::InvalidUrl | FetchErrorKind::Cancelled => false,
        }
    }
}

/// Extraction failures on a fetched article page or its dateline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing {field} (selector `{selector}`)")]
    MissingField {
        field: &'static str,
        selector: String,
    },
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("unknown month name `{0}`")]
    UnknownMonth(String),
    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

impl ParseError {
    /// Dateline errors cost the article its date and city, nothing more.
    pub fn is_dateline_error(&self) -> bool {
        matches!(
            self,
            ParseError::UnknownMonth(_) | ParseError::InvalidDate { .. }
        )
    }
}

/// A single record that could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpsertError {
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("store unreachable: {0}")]
    Connectivity(String),
}

/// Why one candidate URL produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors that end a source run or the whole invocation.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("discovery failed: {0}")]
    Discovery(#[source] FetchError),
    #[error("unknown source `{0}`")]
    UnknownSource(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not read YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not open article store: {0}")]
    Store(#[from] sqlx::Error),
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
