//! Afghanistan Times profile.
//!
//! Discovery takes two hops: category boxes on the homepage, then the
//! story list of each category page. Article pages are a stock WordPress
//! theme. Stories rarely carry a dateline, so the first paragraph is kept
//! as published.

use super::{SourceId, SourceProfile};
use crate::dateline::DatelinePolicy;
use crate::models::SourceDefaults;

pub const LANDING_PAGE: &str = "http://www.afghanistantimes.af/";

pub fn profile() -> SourceProfile {
    SourceProfile {
        id: SourceId::AfghanistanTimes,
        defaults: SourceDefaults {
            country: "AFG".to_string(),
            source_name: "Afghanistan Times".to_string(),
        },
        landing_pages: vec![LANDING_PAGE.to_string()],
        link_selectors: vec![
            "div.content div.cat-box-title h2".to_string(),
            "div.content article.item-list h2".to_string(),
        ],
        title_selector: "h1.name.post-title.entry-title".to_string(),
        body_selector: "div.entry".to_string(),
        paragraph_selector: "p".to_string(),
        article_id_pattern: None,
        dateline_policy: DatelinePolicy::Keep,
    }
}
