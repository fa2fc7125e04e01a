//! News source definitions, URL discovery and article parsing.
//!
//! Every supported outlet is a [`SourceProfile`]: a bundle of selectors plus
//! the defaults stamped onto its records. Sources differ only in data, so
//! there is one discovery routine ([`discovery::discover`]) and one parser
//! ([`parser::parse`]); [`SourceId::profile`] is the dispatch table.
//!
//! # Supported Sources
//!
//! | Source | Module | Country | Discovery |
//! |--------|--------|---------|-----------|
//! | Sudan Tribune | [`sudan_tribune`] | SD | latest-news headings on the homepage |
//! | Afghanistan Times | [`afghanistan_times`] | AFG | homepage categories, then category listings |
//! | Hiiraan Online | [`hiiraan`] | SO | featured stories on the homepage |
//!
//! Selectors may contain an `{id}` placeholder, filled from the article URL
//! with the profile's `article_id_pattern`.

pub mod afghanistan_times;
pub mod discovery;
pub mod hiiraan;
pub mod parser;
pub mod sudan_tribune;

use crate::dateline::DatelinePolicy;
use crate::error::{CrawlError, ParseError};
use crate::models::SourceDefaults;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder substituted with the article id in selector templates.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Identifier of a supported news source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SourceId {
    SudanTribune,
    AfghanistanTimes,
    Hiiraan,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [
        SourceId::SudanTribune,
        SourceId::AfghanistanTimes,
        SourceId::Hiiraan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::SudanTribune => "sudan-tribune",
            SourceId::AfghanistanTimes => "afghanistan-times",
            SourceId::Hiiraan => "hiiraan",
        }
    }

    /// Built-in profile of this source.
    pub fn profile(&self) -> SourceProfile {
        match self {
            SourceId::SudanTribune => sudan_tribune::profile(),
            SourceId::AfghanistanTimes => afghanistan_times::profile(),
            SourceId::Hiiraan => hiiraan::profile(),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| CrawlError::UnknownSource(s.to_string()))
    }
}

/// Everything needed to crawl one outlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    pub id: SourceId,
    /// Country code and outlet name stamped on every record.
    pub defaults: SourceDefaults,
    /// Entry points of discovery.
    pub landing_pages: Vec<String>,
    /// Selector chain; every hop but the last yields index pages to fetch next.
    pub link_selectors: Vec<String>,
    /// Title element on an article page.
    pub title_selector: String,
    /// Body container on an article page.
    pub body_selector: String,
    /// Paragraph elements inside the body container.
    pub paragraph_selector: String,
    /// Pulls the article id out of its URL.
    pub article_id_pattern: Option<ArticleIdPattern>,
    pub dateline_policy: DatelinePolicy,
}

impl SourceProfile {
    /// Check that landing pages parse and every selector template compiles.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.landing_pages.is_empty() {
            return Err(CrawlError::Config(format!(
                "{}: no landing pages configured",
                self.id
            )));
        }
        if self.link_selectors.is_empty() {
            return Err(CrawlError::Config(format!(
                "{}: no link selectors configured",
                self.id
            )));
        }
        for page in &self.landing_pages {
            url::Url::parse(page).map_err(|e| {
                CrawlError::Config(format!("{}: landing page `{page}`: {e}", self.id))
            })?;
        }
        let templates = self
            .link_selectors
            .iter()
            .chain([&self.title_selector, &self.body_selector, &self.paragraph_selector]);
        for template in templates {
            compile_selector(&fill_id(template, "0"))
                .map_err(|e| CrawlError::Config(format!("{}: {e}", self.id)))?;
        }
        Ok(())
    }
}

/// Compiled regex whose first capture group is the article id.
///
/// Compiled once when the profile is built or configured, then shared by
/// every article of the run.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct ArticleIdPattern(Regex);

impl ArticleIdPattern {
    /// Compile `pattern`, which must contain at least one capture group.
    pub fn new(pattern: &str) -> Result<Self, CrawlError> {
        let re = Regex::new(pattern)
            .map_err(|e| CrawlError::Config(format!("article id pattern: {e}")))?;
        if re.captures_len() < 2 {
            return Err(CrawlError::Config(format!(
                "article id pattern `{pattern}` needs a capture group"
            )));
        }
        Ok(Self(re))
    }

    /// Pattern of a built-in profile.
    pub(crate) fn builtin(pattern: &'static str) -> Self {
        Self::new(pattern).expect("built-in article id pattern is valid")
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// First capture of the pattern in `url`.
    pub fn capture<'u>(&self, url: &'u str) -> Option<&'u str> {
        self.0.captures(url)?.get(1).map(|m| m.as_str())
    }
}

impl TryFrom<String> for ArticleIdPattern {
    type Error = CrawlError;

    fn try_from(pattern: String) -> Result<Self, Self::Error> {
        Self::new(&pattern)
    }
}

impl PartialEq for ArticleIdPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ArticleIdPattern {}

/// Parse a CSS selector, reporting the offending text on failure.
pub fn compile_selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::InvalidSelector(css.to_string()))
}

pub(crate) fn fill_id(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}
