//! Record assembly: raw fields + dateline + source defaults → [`ArticleRecord`].

use crate::dateline::month_number;
use crate::error::ParseError;
use crate::models::{ArticleRecord, Dateline, RawFields, SourceDefaults};
use chrono::NaiveDate;

/// Pure text-cleaning routine applied to every body paragraph.
///
/// Lemmatization and stop-word removal belong to the analysis side of the
/// corpus; the crawler only needs something with this shape.
pub type CleanFn = fn(&str) -> String;

/// Default cleaner: collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the canonical record for one article.
///
/// Paragraphs are joined with a single `\n`. A dateline with an unknown
/// month name or an impossible date is an error; callers decide whether to
/// retry with an empty dateline.
pub fn assemble(
    raw: &RawFields,
    dateline: &Dateline,
    defaults: &SourceDefaults,
    url: &str,
) -> Result<ArticleRecord, ParseError> {
    Ok(ArticleRecord {
        title: normalize_whitespace(&raw.title),
        body: raw.body_paragraphs.join("\n"),
        url: url.to_string(),
        country: defaults.country.clone(),
        source_name: defaults.source_name.clone(),
        city: dateline.city.clone(),
        published_on: publication_date(dateline)?,
    })
}

/// Date of a dateline, `None` unless month, day and year were all captured.
pub fn publication_date(dateline: &Dateline) -> Result<Option<NaiveDate>, ParseError> {
    let (Some(month), Some(day), Some(year)) = (&dateline.month, dateline.day, dateline.year)
    else {
        return Ok(None);
    };
    let month = month_number(month)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .map(Some)
        .ok_or(ParseError::InvalidDate { year, month, day })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dateline::{DatelinePolicy, extract_dateline};

    fn defaults() -> SourceDefaults {
        SourceDefaults {
            country: "SD".to_string(),
            source_name: "Sudan Tribune".to_string(),
        }
    }

    fn raw(paragraphs: &[&str]) -> RawFields {
        RawFields {
            title: "  Ceasefire   talks resume ".to_string(),
            body_paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_assemble_with_dateline() {
        let mut fields = raw(&["January 5, 2021 (KHARTOUM) - Text follows.", "Second."]);
        let dateline = DatelinePolicy::Strip.apply(&mut fields);
        let rec = assemble(&fields, &dateline, &defaults(), "https://x.test/a").unwrap();

        assert_eq!(rec.title, "Ceasefire talks resume");
        assert_eq!(rec.body, "Text follows.\nSecond.");
        assert_eq!(rec.country, "SD");
        assert_eq!(rec.source_name, "Sudan Tribune");
        assert_eq!(rec.city.as_deref(), Some("KHARTOUM"));
        assert_eq!(rec.published_on, NaiveDate::from_ymd_opt(2021, 1, 5));
        assert_eq!(rec.url, "https://x.test/a");
    }

    #[test]
    fn test_assemble_without_dateline_keeps_body() {
        let fields = raw(&["No dateline here, just text."]);
        let dateline = extract_dateline(fields.first_paragraph().unwrap());
        let rec = assemble(&fields, &dateline, &defaults(), "https://x.test/b").unwrap();

        assert_eq!(rec.body, "No dateline here, just text.");
        assert_eq!(rec.city, None);
        assert_eq!(rec.published_on, None);
    }

    #[test]
    fn test_unknown_month_is_a_parse_error() {
        let dateline = Dateline {
            month: Some("Smarch".into()),
            day: Some(5),
            year: Some(2021),
            city: Some("KHARTOUM".into()),
        };
        let err = assemble(&raw(&["x"]), &dateline, &defaults(), "u").unwrap_err();
        assert_eq!(err, ParseError::UnknownMonth("Smarch".into()));
    }

    #[test]
    fn test_impossible_date_is_a_parse_error() {
        let dateline = Dateline {
            month: Some("February".into()),
            day: Some(30),
            year: Some(2021),
            city: None,
        };
        assert_eq!(
            publication_date(&dateline),
            Err(ParseError::InvalidDate {
                year: 2021,
                month: 2,
                day: 30
            })
        );
    }

    #[test]
    fn test_all_twelve_months_produce_dates() {
        for (i, name) in crate::dateline::MONTHS.iter().enumerate() {
            let dateline = Dateline {
                month: Some(name.to_string()),
                day: Some(1),
                year: Some(2020),
                city: None,
            };
            let date = publication_date(&dateline).unwrap().unwrap();
            assert_eq!(date, NaiveDate::from_ymd_opt(2020, i as u32 + 1, 1).unwrap());
        }
    }

    #[test]
    fn test_partial_dateline_has_no_date() {
        let dateline = Dateline {
            month: None,
            day: None,
            year: None,
            city: Some("JUBA".into()),
        };
        let rec = assemble(&raw(&["x"]), &dateline, &defaults(), "u").unwrap();
        assert_eq!(rec.city.as_deref(), Some("JUBA"));
        assert_eq!(rec.published_on, None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace(" a \t b\n\nc "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }
}
