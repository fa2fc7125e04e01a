//! Data models flowing through the crawl pipeline.
//!
//! - [`CandidateUrl`]: a link found during discovery
//! - [`Document`]: a fetched page
//! - [`RawFields`]: what a source parser pulls out of a page
//! - [`Dateline`]: structured data recovered from the first paragraph
//! - [`ArticleRecord`]: the canonical, persisted unit
//!
//! [`StoredArticle`] accepts the canonical JSON shape plus the two legacy
//! shapes older crawl batches were written in, and converts them into
//! [`ArticleRecord`].

use crate::dateline::month_number;
use crate::error::ParseError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A discovered link that may or may not resolve to an article.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateUrl {
    /// Absolute URL of the candidate.
    pub url: Url,
    /// Position in discovery order, starting at zero.
    pub index: usize,
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.index, self.url)
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Document {
    /// The URL that was requested.
    pub url: Url,
    /// HTTP status of the response.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Title and ordered body paragraphs of one article page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub body_paragraphs: Vec<String>,
}

impl RawFields {
    /// The only paragraph ever scanned for a dateline.
    pub fn first_paragraph(&self) -> Option<&str> {
        self.body_paragraphs.first().map(String::as_str)
    }
}

/// Leading "Month Day, Year (CITY)" annotation; each part independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dateline {
    pub month: Option<String>,
    pub day: Option<u32>,
    pub year: Option<i32>,
    pub city: Option<String>,
}

impl Dateline {
    pub fn is_empty(&self) -> bool {
        self.month.is_none() && self.day.is_none() && self.year.is_none() && self.city.is_none()
    }
}

/// Per-source values stamped onto every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefaults {
    /// Country code, e.g. `SD` or `AFG`.
    pub country: String,
    /// Human-readable outlet name.
    pub source_name: String,
}

/// A canonical article, keyed by `title`.
///
/// This is also the canonical JSON shape of batch artifacts:
/// `{title, body, url, country, source_name, city, published_on}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Unique key of the corpus.
    pub title: String,
    /// Newline-joined body paragraphs.
    pub body: String,
    /// Absolute URL the article was fetched from.
    pub url: String,
    pub country: String,
    pub source_name: String,
    /// Dateline city, if one was parsed.
    pub city: Option<String>,
    /// Dateline date, if one was parsed.
    pub published_on: Option<NaiveDate>,
}

/// Any article shape found in batch files, canonical or legacy.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredArticle {
    Canonical(ArticleRecord),
    Newspaper(NewspaperArticle),
    MonthDayYear(MonthDayYearArticle),
}

/// Legacy shape `{title, article_text, url, country, newspaper, publication_date, city}`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewspaperArticle {
    pub title: String,
    pub article_text: String,
    pub url: String,
    pub country: String,
    pub newspaper: String,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Legacy shape `{title, text, url, country, source, month, day, year, city}`.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthDayYearArticle {
    pub title: String,
    pub text: String,
    pub url: String,
    pub country: String,
    pub source: String,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub day: Option<NumberOrText>,
    #[serde(default)]
    pub year: Option<NumberOrText>,
    #[serde(default)]
    pub city: Option<String>,
}

/// Day and year were written as regex capture strings by some crawlers and
/// as integers by others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    fn as_i64(&self) -> Option<i64> {
        match self {
            NumberOrText::Number(n) => Some(*n),
            NumberOrText::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl TryFrom<StoredArticle> for ArticleRecord {
    type Error = ParseError;

    fn try_from(stored: StoredArticle) -> Result<Self, Self::Error> {
        match stored {
            StoredArticle::Canonical(record) => Ok(record),
            StoredArticle::Newspaper(a) => Ok(ArticleRecord {
                title: a.title,
                body: a.article_text,
                url: a.url,
                country: a.country,
                source_name: a.newspaper,
                city: a.city,
                published_on: a.publication_date,
            }),
            StoredArticle::MonthDayYear(a) => {
                let published_on = match (&a.month, &a.day, &a.year) {
                    (Some(month), Some(day), Some(year)) => {
                        let month = month_number(month)?;
                        let day = day.as_i64().unwrap_or_default();
                        let year = year.as_i64().unwrap_or_default();
                        let date = u32::try_from(day)
                            .ok()
                            .zip(i32::try_from(year).ok())
                            .and_then(|(d, y)| NaiveDate::from_ymd_opt(y, month, d));
                        Some(date.ok_or(ParseError::InvalidDate {
                            year: year as i32,
                            month,
                            day: day as u32,
                        })?)
                    }
                    _ => None,
                };
                Ok(ArticleRecord {
                    title: a.title,
                    body: a.text,
                    url: a.url,
                    country: a.country,
                    source_name: a.source,
                    city: a.city,
                    published_on,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ArticleRecord {
        ArticleRecord {
            title: "Talks resume in Juba".to_string(),
            body: "First paragraph.\nSecond paragraph.".to_string(),
            url: "https://www.sudantribune.com/spip.php?article70001".to_string(),
            country: "SD".to_string(),
            source_name: "Sudan Tribune".to_string(),
            city: Some("JUBA".to_string()),
            published_on: NaiveDate::from_ymd_opt(2021, 1, 5),
        }
    }

    #[test]
    fn test_canonical_serialization_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        let obj = json.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["body", "city", "country", "published_on", "source_name", "title", "url"]
        );
        assert_eq!(obj["published_on"], "2021-01-05");
    }

    #[test]
    fn test_canonical_shape_is_read_back() {
        let json = serde_json::to_string(&record()).unwrap();
        let stored: StoredArticle = serde_json::from_str(&json).unwrap();
        assert!(matches!(stored, StoredArticle::Canonical(_)));
        assert_eq!(ArticleRecord::try_from(stored).unwrap(), record());
    }

    #[test]
    fn test_newspaper_shape_maps_to_canonical() {
        let json = r#"{
            "title": "Talks resume in Juba",
            "article_text": "First paragraph.\nSecond paragraph.",
            "url": "https://www.sudantribune.com/spip.php?article70001",
            "country": "SD",
            "newspaper": "Sudan Tribune",
            "publication_date": "2021-01-05",
            "city": "JUBA"
        }"#;
        let stored: StoredArticle = serde_json::from_str(json).unwrap();
        assert!(matches!(stored, StoredArticle::Newspaper(_)));
        assert_eq!(ArticleRecord::try_from(stored).unwrap(), record());
    }

    #[test]
    fn test_month_day_year_shape_maps_to_canonical() {
        let json = r#"{
            "title": "Talks resume in Juba",
            "text": "First paragraph.\nSecond paragraph.",
            "url": "https://www.sudantribune.com/spip.php?article70001",
            "country": "SD",
            "source": "Sudan Tribune",
            "month": "January",
            "day": "5",
            "year": 2021,
            "city": "JUBA"
        }"#;
        let stored: StoredArticle = serde_json::from_str(json).unwrap();
        assert!(matches!(stored, StoredArticle::MonthDayYear(_)));
        assert_eq!(ArticleRecord::try_from(stored).unwrap(), record());
    }

    #[test]
    fn test_month_day_year_shape_without_dateline() {
        let json = r#"{
            "title": "Kabul traffic plan",
            "text": "Body ",
            "url": "http://www.afghanistantimes.af/kabul-traffic-plan/",
            "country": "AFG",
            "source": "Afghanistan Times"
        }"#;
        let stored: StoredArticle = serde_json::from_str(json).unwrap();
        let rec = ArticleRecord::try_from(stored).unwrap();
        assert_eq!(rec.published_on, None);
        assert_eq!(rec.city, None);
        assert_eq!(rec.source_name, "Afghanistan Times");
    }

    #[test]
    fn test_month_day_year_shape_unknown_month() {
        let json = r#"{
            "title": "t", "text": "b", "url": "https://x.test/", "country": "SD",
            "source": "Sudan Tribune", "month": "Smarch", "day": 1, "year": 2021
        }"#;
        let stored: StoredArticle = serde_json::from_str(json).unwrap();
        assert_eq!(
            ArticleRecord::try_from(stored),
            Err(ParseError::UnknownMonth("Smarch".to_string()))
        );
    }

    #[test]
    fn test_first_paragraph() {
        let raw = RawFields {
            title: "t".into(),
            body_paragraphs: vec!["one".into(), "two".into()],
        };
        assert_eq!(raw.first_paragraph(), Some("one"));
        let empty = RawFields {
            title: "t".into(),
            body_paragraphs: vec![],
        };
        assert_eq!(empty.first_paragraph(), None);
    }
}
