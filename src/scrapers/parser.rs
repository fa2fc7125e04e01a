//! Article page extraction shared by every source profile.

use super::{SourceProfile, compile_selector, fill_id};
use crate::error::ParseError;
use crate::models::{Document, RawFields};
use scraper::{ElementRef, Html};
use tracing::{debug, instrument};
use url::Url;

/// Pull the title and body paragraphs out of an article page.
///
/// # Arguments
///
/// * `profile` - Selector templates; `{id}` is filled from the article URL
/// * `doc` - The fetched article page
///
/// # Returns
///
/// The title and the non-empty paragraph texts in document order, with
/// line breaks removed and ends trimmed.
///
/// # Errors
///
/// [`ParseError::MissingField`] when the title element, body container or
/// paragraph set is absent, or when a selector needs an article id the URL
/// does not carry. The caller drops the article.
///
/// # Examples
///
/// ```ignore
/// let raw = parse(&SourceId::Hiiraan.profile(), &doc)?;
/// println!("{}: {} paragraphs", raw.title, raw.body_paragraphs.len());
/// ```
#[instrument(level = "debug", skip_all, fields(source = %profile.id, url = %doc.url))]
pub fn parse(profile: &SourceProfile, doc: &Document) -> Result<RawFields, ParseError> {
    let id = article_id(profile, &doc.url);
    let title_css = resolve(&profile.title_selector, id, profile)?;
    let body_css = resolve(&profile.body_selector, id, profile)?;

    let html = Html::parse_document(&doc.body);
    let title_sel = compile_selector(&title_css)?;
    let body_sel = compile_selector(&body_css)?;
    let paragraph_sel = compile_selector(&profile.paragraph_selector)?;

    let title = html
        .select(&title_sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or(ParseError::MissingField {
            field: "title",
            selector: title_css.clone(),
        })?;

    let body = html
        .select(&body_sel)
        .next()
        .ok_or(ParseError::MissingField {
            field: "body",
            selector: body_css.clone(),
        })?;

    let body_paragraphs: Vec<String> = body
        .select(&paragraph_sel)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();
    if body_paragraphs.is_empty() {
        return Err(ParseError::MissingField {
            field: "body paragraphs",
            selector: format!("{body_css} {}", profile.paragraph_selector),
        });
    }

    debug!(status = doc.status, paragraphs = body_paragraphs.len(), "Parsed article");
    Ok(RawFields {
        title,
        body_paragraphs,
    })
}

/// Article id captured from the URL, when the profile defines a pattern.
fn article_id<'u>(profile: &SourceProfile, url: &'u Url) -> Option<&'u str> {
    profile.article_id_pattern.as_ref()?.capture(url.as_str())
}

fn resolve(
    template: &str,
    id: Option<&str>,
    profile: &SourceProfile,
) -> Result<String, ParseError> {
    if !template.contains(super::ID_PLACEHOLDER) {
        return Ok(template.to_string());
    }
    match id {
        Some(id) => Ok(fill_id(template, id)),
        None => Err(ParseError::MissingField {
            field: "article id",
            selector: profile
                .article_id_pattern
                .as_ref()
                .map(|p| p.as_str().to_string())
                .unwrap_or_default(),
        }),
    }
}

/// Element text with line breaks removed and ends trimmed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::SourceId;

    fn doc(url: &str, body: &str) -> Document {
        Document {
            url: Url::parse(url).unwrap(),
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_missing_title_is_missing_field() {
        let profile = SourceId::AfghanistanTimes.profile();
        let page = doc(
            "http://www.afghanistantimes.af/story/",
            r#"<html><body><div class="entry"><p>Text</p></div></body></html>"#,
        );
        let err = parse(&profile, &page).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "title", .. }));
    }

    #[test]
    fn test_missing_body_is_missing_field() {
        let profile = SourceId::AfghanistanTimes.profile();
        let page = doc(
            "http://www.afghanistantimes.af/story/",
            r#"<html><body><h1 class="name post-title entry-title">T</h1></body></html>"#,
        );
        let err = parse(&profile, &page).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { field: "body", .. }));
    }

    #[test]
    fn test_body_without_paragraphs_is_missing_field() {
        let profile = SourceId::AfghanistanTimes.profile();
        let page = doc(
            "http://www.afghanistantimes.af/story/",
            r#"<h1 class="name post-title entry-title">T</h1><div class="entry"><p>  </p></div>"#,
        );
        let err = parse(&profile, &page).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                field: "body paragraphs",
                ..
            }
        ));
    }

    #[test]
    fn test_id_template_without_id_in_url() {
        let profile = SourceId::SudanTribune.profile();
        let page = doc("https://www.sudantribune.com/about", "<html></html>");
        let err = parse(&profile, &page).unwrap_err();
        assert!(matches!(
            err,
            ParseError::MissingField {
                field: "article id",
                ..
            }
        ));
    }

    #[test]
    fn test_paragraph_line_breaks_are_flattened() {
        let profile = SourceId::AfghanistanTimes.profile();
        let page = doc(
            "http://www.afghanistantimes.af/story/",
            "<h1 class=\"name post-title entry-title\">\n Title \n</h1>\
             <div class=\"entry\"><p>one\ntwo</p><p></p><p>three</p></div>",
        );
        let raw = parse(&profile, &page).unwrap();
        assert_eq!(raw.title, "Title");
        assert_eq!(raw.body_paragraphs, vec!["one two", "three"]);
    }
}
