//! YAML configuration file.
//!
//! Every key is optional. Per-source sections override the built-in
//! [`SourceProfile`] one field at a time:
//!
//! ```yaml
//! user_agent: "newsdesk-crawler/0.1"
//! concurrency: 8
//! request_timeout_secs: 20
//! sources:
//!   hiiraan:
//!     title_selector: "h1.title"
//!     body_selector: "div.article-body"
//!     article_id_pattern: null
//!   afghanistan-times:
//!     enabled: false
//! ```

use crate::dateline::DatelinePolicy;
use crate::error::CrawlError;
use crate::pipeline::MAX_CONCURRENCY;
use crate::scrapers::{ArticleIdPattern, SourceId, SourceProfile};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

pub const DEFAULT_USER_AGENT: &str = concat!("newsdesk-crawler/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    pub user_agent: Option<String>,
    pub concurrency: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub sources: BTreeMap<SourceId, SourceOverride>,
}

/// Field-by-field replacement of a built-in profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverride {
    pub enabled: Option<bool>,
    pub country: Option<String>,
    pub source_name: Option<String>,
    pub landing_pages: Option<Vec<String>>,
    pub link_selectors: Option<Vec<String>>,
    pub title_selector: Option<String>,
    pub body_selector: Option<String>,
    pub paragraph_selector: Option<String>,
    /// `null` disables `{id}` substitution.
    #[serde(deserialize_with = "explicit_option")]
    pub article_id_pattern: Option<Option<ArticleIdPattern>>,
    pub dateline_policy: Option<DatelinePolicy>,
}

/// Distinguish a missing key (`None`) from an explicit `null` (`Some(None)`).
fn explicit_option<'de, D>(de: D) -> Result<Option<Option<ArticleIdPattern>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<ArticleIdPattern>::deserialize(de).map(Some)
}

impl SourceOverride {
    fn apply(&self, profile: &mut SourceProfile) {
        if let Some(country) = &self.country {
            profile.defaults.country = country.clone();
        }
        if let Some(name) = &self.source_name {
            profile.defaults.source_name = name.clone();
        }
        if let Some(pages) = &self.landing_pages {
            profile.landing_pages = pages.clone();
        }
        if let Some(selectors) = &self.link_selectors {
            profile.link_selectors = selectors.clone();
        }
        if let Some(css) = &self.title_selector {
            profile.title_selector = css.clone();
        }
        if let Some(css) = &self.body_selector {
            profile.body_selector = css.clone();
        }
        if let Some(css) = &self.paragraph_selector {
            profile.paragraph_selector = css.clone();
        }
        if let Some(pattern) = &self.article_id_pattern {
            profile.article_id_pattern = pattern.clone();
        }
        if let Some(policy) = self.dateline_policy {
            profile.dateline_policy = policy;
        }
    }
}

impl CrawlConfig {
    /// Read and parse a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, CrawlError> {
        let text = tokio::fs::read_to_string(path).await?;
        let config = Self::from_yaml(&text)?;
        info!(overrides = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, CrawlError> {
        // An empty file is an empty mapping.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        if let Some(n) = config.concurrency {
            if !(1..=MAX_CONCURRENCY).contains(&n) {
                return Err(CrawlError::Config(format!(
                    "concurrency must be between 1 and {MAX_CONCURRENCY}, got {n}"
                )));
            }
        }
        Ok(config)
    }

    /// Validated profiles for `requested` sources (all when empty), in
    /// [`SourceId::ALL`] order, with overrides applied and disabled sources
    /// left out. A source named explicitly is crawled even if disabled.
    pub fn profiles(&self, requested: &[SourceId]) -> Result<Vec<SourceProfile>, CrawlError> {
        let mut profiles = Vec::new();
        for id in SourceId::ALL {
            let explicit = requested.contains(&id);
            if !requested.is_empty() && !explicit {
                continue;
            }
            let overrides = self.sources.get(&id);
            if !explicit && overrides.and_then(|o| o.enabled) == Some(false) {
                continue;
            }
            let mut profile = id.profile();
            if let Some(o) = overrides {
                o.apply(&mut profile);
            }
            profile.validate()?;
            profiles.push(profile);
        }
        Ok(profiles)
    }
}
