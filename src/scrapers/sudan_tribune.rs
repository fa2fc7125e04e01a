//! Sudan Tribune profile.
//!
//! The homepage lists current stories as `<h1>` headings inside
//! `div.latest_news`. Article pages come out of a SPIP CMS whose title and
//! body classes embed the numeric article id (`article-titre-<id>`,
//! `article-texte-<id>`), so both selectors are templates filled from the
//! `article<id>` part of the URL. Most stories open with a dateline, which
//! is stripped from the stored body.

use super::{ArticleIdPattern, SourceId, SourceProfile};
use crate::dateline::DatelinePolicy;
use crate::models::SourceDefaults;

pub const LANDING_PAGE: &str = "https://www.sudantribune.com/";

pub fn profile() -> SourceProfile {
    SourceProfile {
        id: SourceId::SudanTribune,
        defaults: SourceDefaults {
            country: "SD".to_string(),
            source_name: "Sudan Tribune".to_string(),
        },
        landing_pages: vec![LANDING_PAGE.to_string()],
        link_selectors: vec!["div.latest_news h1".to_string()],
        title_selector: "h1.crayon.article-titre-{id}".to_string(),
        body_selector: "div.crayon.article-texte-{id}.texte.entry-content".to_string(),
        paragraph_selector: "p".to_string(),
        article_id_pattern: Some(ArticleIdPattern::builtin(r"article(\d+)")),
        dateline_policy: DatelinePolicy::Strip,
    }
}
