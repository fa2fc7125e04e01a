//! Candidate URL discovery by walking a source's selector chain.
//!
//! Each hop selects elements on the current set of pages. An element that is
//! itself a link contributes its `href`; any other element contributes the
//! first `a[href]` beneath it (the "heading anchor" of a story teaser).
//! Relative links are resolved against the page they were found on.

use super::{SourceProfile, compile_selector};
use crate::error::CrawlError;
use crate::fetch::Fetch;
use crate::models::{CandidateUrl, Document};
use itertools::Itertools;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Enumerate candidate article URLs for `profile`, in discovery order.
///
/// Intermediate index pages that fail are logged and skipped; pages
/// without the expected container contribute nothing.
///
/// # Arguments
///
/// * `fetcher` - Transport for landing and index pages
/// * `profile` - Landing pages and the link selector chain to walk
///
/// # Returns
///
/// Deduplicated absolute URLs, each tagged with its position in the
/// sequence. An empty vector is a valid outcome.
///
/// # Errors
///
/// [`CrawlError::Discovery`] when none of the landing pages can be fetched,
/// [`CrawlError::Config`] for an unparseable landing URL or selector.
///
/// # Examples
///
/// ```ignore
/// let candidates = discover(&fetcher, &SourceId::SudanTribune.profile()).await?;
/// assert_eq!(candidates[0].index, 0);
/// ```
#[instrument(level = "info", skip_all, fields(source = %profile.id))]
pub async fn discover<F: Fetch>(
    fetcher: &F,
    profile: &SourceProfile,
) -> Result<Vec<CandidateUrl>, CrawlError> {
    let mut pages = Vec::new();
    let mut first_error = None;
    for landing in &profile.landing_pages {
        let url = Url::parse(landing)
            .map_err(|e| CrawlError::Config(format!("landing page `{landing}`: {e}")))?;
        match fetcher.fetch(&url).await {
            Ok(doc) => pages.push(doc),
            Err(e) => {
                warn!(%url, error = %e, "Landing page fetch failed");
                first_error.get_or_insert(e);
            }
        }
    }
    if pages.is_empty() {
        if let Some(e) = first_error {
            return Err(CrawlError::Discovery(e));
        }
    }

    let hops = profile.link_selectors.len();
    let mut links = Vec::new();
    for (hop, css) in profile.link_selectors.iter().enumerate() {
        let selector = compile_selector(css).map_err(|e| CrawlError::Config(e.to_string()))?;
        links = pages
            .iter()
            .flat_map(|page| extract_links(page, &selector))
            .unique()
            .collect();
        debug!(hop, selector = %css, links = links.len(), "Applied link selector");

        if hop + 1 == hops {
            break;
        }

        pages = Vec::with_capacity(links.len());
        for url in &links {
            match fetcher.fetch(url).await {
                Ok(doc) => pages.push(doc),
                Err(e) => warn!(%url, error = %e, "Index page fetch failed; skipping"),
            }
        }
    }

    let candidates: Vec<CandidateUrl> = links
        .into_iter()
        .enumerate()
        .map(|(index, url)| CandidateUrl { url, index })
        .collect();
    info!(count = candidates.len(), "Discovered candidate URLs");
    debug!(urls = ?candidates.iter().map(|c| c.url.as_str()).collect::<Vec<_>>(), "Candidates");
    Ok(candidates)
}

/// Absolute http(s) links selected on one page, fragments dropped.
pub fn extract_links(page: &Document, selector: &Selector) -> Vec<Url> {
    let html = Html::parse_document(&page.body);
    // Infallible for a constant selector.
    let anchor = compile_selector("a[href]").ok();

    html.select(selector)
        .filter_map(|el| {
            el.value().attr("href").or_else(|| {
                let anchor = anchor.as_ref()?;
                el.select(anchor).next()?.value().attr("href")
            })
        })
        .filter_map(|href| page.url.join(href.trim()).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .map(|mut url| {
            url.set_fragment(None);
            url
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn links_for(
    page: &Document,
    css: &str,
) -> Result<Vec<Url>, crate::error::ParseError> {
    Ok(extract_links(page, &compile_selector(css)?))
}
