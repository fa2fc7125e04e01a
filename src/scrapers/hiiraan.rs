//! Hiiraan Online profile.
//!
//! Featured stories sit in two homepage containers, `div.featured` and
//! `div.featured-story2`; both are matched by a single selector group so
//! their links interleave in document order. Article selectors follow the
//! same `article-titre-<id>` / `article-texte-<id>` template as Sudan
//! Tribune.

use super::{ArticleIdPattern, SourceId, SourceProfile};
use crate::dateline::DatelinePolicy;
use crate::models::SourceDefaults;

pub const LANDING_PAGE: &str = "https://www.hiiraan.com/";

pub fn profile() -> SourceProfile {
    SourceProfile {
        id: SourceId::Hiiraan,
        defaults: SourceDefaults {
            country: "SO".to_string(),
            source_name: "Hiiraan Online".to_string(),
        },
        landing_pages: vec![LANDING_PAGE.to_string()],
        link_selectors: vec!["div.featured h1, div.featured-story2 h1".to_string()],
        title_selector: "h1.crayon.article-titre-{id}".to_string(),
        body_selector: "div.crayon.article-texte-{id}.texte.entry-content".to_string(),
        paragraph_selector: "p".to_string(),
        article_id_pattern: Some(ArticleIdPattern::builtin(r"article(\d+)")),
        dateline_policy: DatelinePolicy::Strip,
    }
}
