//! Dateline extraction from the first body paragraph.
//!
//! Wire-service style articles open with `January 5, 2021 (KHARTOUM) - ...`.
//! The pattern is anchored at the start of the paragraph; anything else is
//! treated as "no dateline", which is the common case and not an error.

use crate::error::ParseError;
use crate::models::{Dateline, RawFields};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Month names in calendar order; index + 1 is the month number.
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static DATELINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<month>[A-Za-z]+) (?P<day>[0-9]{1,2}),? (?P<year>[0-9]{4}) \((?P<city>[A-Z][A-Z .'\-]*)\)(?:\s*[-–—:]+)?\s*",
    )
    .expect("dateline pattern is valid")
});

/// Map a full month name (any case) to 1..=12.
pub fn month_number(name: &str) -> Result<u32, ParseError> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name.trim()))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| ParseError::UnknownMonth(name.to_string()))
}

/// Extract a dateline from the start of `first_paragraph`.
///
/// Returns an all-`None` [`Dateline`] when the paragraph does not open with one.
pub fn extract_dateline(first_paragraph: &str) -> Dateline {
    split_dateline(first_paragraph).0
}

/// Extract the dateline and return the paragraph text that follows it.
///
/// On a non-match the remainder is the untouched input.
pub fn split_dateline(paragraph: &str) -> (Dateline, &str) {
    let Some(caps) = DATELINE_RE.captures(paragraph) else {
        return (Dateline::default(), paragraph);
    };
    let dateline = Dateline {
        month: caps.name("month").map(|m| m.as_str().to_string()),
        day: caps.name("day").and_then(|m| m.as_str().parse().ok()),
        year: caps.name("year").and_then(|m| m.as_str().parse().ok()),
        city: caps.name("city").map(|m| m.as_str().trim().to_string()),
    };
    let end = caps.get(0).map_or(0, |m| m.end());
    (dateline, &paragraph[end..])
}

/// What happens to the matched dateline prefix in the stored body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatelinePolicy {
    /// Remove the prefix (and its separator) from the first paragraph.
    #[default]
    Strip,
    /// Leave the first paragraph exactly as extracted.
    Keep,
}

impl DatelinePolicy {
    /// Extract the dateline from `raw`'s first paragraph, rewriting the
    /// paragraph according to the policy. Later paragraphs are never scanned.
    pub fn apply(self, raw: &mut RawFields) -> Dateline {
        let Some(first) = raw.body_paragraphs.first() else {
            return Dateline::default();
        };
        if self == DatelinePolicy::Keep {
            return extract_dateline(first);
        }
        let (dateline, rest) = split_dateline(first);
        if !dateline.is_empty() {
            let rest = rest.trim().to_string();
            if rest.is_empty() {
                raw.body_paragraphs.remove(0);
            } else {
                raw.body_paragraphs[0] = rest;
            }
        }
        dateline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(paragraphs: &[&str]) -> RawFields {
        RawFields {
            title: "Title".to_string(),
            body_paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_extracts_full_dateline() {
        let d = extract_dateline("January 5, 2021 (KHARTOUM) - Text follows.");
        assert_eq!(d.month.as_deref(), Some("January"));
        assert_eq!(d.day, Some(5));
        assert_eq!(d.year, Some(2021));
        assert_eq!(d.city.as_deref(), Some("KHARTOUM"));
    }

    #[test]
    fn test_comma_and_separator_are_optional() {
        let (d, rest) = split_dateline("March 14 2020 (JUBA) Leaders met today.");
        assert_eq!(d.day, Some(14));
        assert_eq!(d.city.as_deref(), Some("JUBA"));
        assert_eq!(rest, "Leaders met today.");
    }

    #[test]
    fn test_separator_may_be_a_run() {
        for text in [
            "January 5, 2021 (KHARTOUM) -- text",
            "January 5, 2021 (KHARTOUM) —— text",
            "January 5, 2021 (KHARTOUM) -: text",
        ] {
            let mut fields = raw(&[text]);
            let d = DatelinePolicy::Strip.apply(&mut fields);
            assert_eq!(d.city.as_deref(), Some("KHARTOUM"));
            assert_eq!(fields.body_paragraphs, vec!["text"], "input {text:?}");
        }
    }

    #[test]
    fn test_multi_word_city() {
        let (d, rest) = split_dateline("May 2, 2019 (PORT SUDAN) – Ships docked.");
        assert_eq!(d.city.as_deref(), Some("PORT SUDAN"));
        assert_eq!(rest, "Ships docked.");
    }

    #[test]
    fn test_non_match_returns_empty_dateline() {
        let (d, rest) = split_dateline("No dateline here, just text.");
        assert_eq!(d, Dateline::default());
        assert!(d.is_empty());
        assert_eq!(rest, "No dateline here, just text.");
    }

    #[test]
    fn test_dateline_must_be_at_start() {
        let d = extract_dateline("Reported on January 5, 2021 (KHARTOUM) - late.");
        assert!(d.is_empty());
    }

    #[test]
    fn test_lowercase_city_is_not_a_dateline() {
        assert!(extract_dateline("January 5, 2021 (Khartoum) - x").is_empty());
    }

    #[test]
    fn test_unknown_month_word_still_matches_pattern() {
        // The pattern is lexical; month validation happens during assembly.
        let d = extract_dateline("Smarch 5, 2021 (KHARTOUM) - x");
        assert_eq!(d.month.as_deref(), Some("Smarch"));
    }

    #[test]
    fn test_month_table_is_complete() {
        for (i, name) in MONTHS.iter().enumerate() {
            assert_eq!(month_number(name), Ok(i as u32 + 1));
        }
        assert_eq!(month_number("december"), Ok(12));
        assert_eq!(month_number("SEPTEMBER"), Ok(9));
    }

    #[test]
    fn test_unknown_month_is_an_error() {
        assert_eq!(
            month_number("Smarch"),
            Err(ParseError::UnknownMonth("Smarch".to_string()))
        );
        assert!(month_number("Jan").is_err());
    }

    #[test]
    fn test_strip_policy_removes_prefix() {
        let mut fields = raw(&["January 5, 2021 (KHARTOUM) - Text follows.", "More."]);
        let d = DatelinePolicy::Strip.apply(&mut fields);
        assert_eq!(d.city.as_deref(), Some("KHARTOUM"));
        assert_eq!(fields.body_paragraphs, vec!["Text follows.", "More."]);
    }

    #[test]
    fn test_keep_policy_leaves_paragraph() {
        let mut fields = raw(&["January 5, 2021 (KHARTOUM) - Text follows.", "More."]);
        let d = DatelinePolicy::Keep.apply(&mut fields);
        assert_eq!(d.year, Some(2021));
        assert_eq!(
            fields.body_paragraphs,
            vec!["January 5, 2021 (KHARTOUM) - Text follows.", "More."]
        );
    }

    #[test]
    fn test_strip_drops_paragraph_that_was_only_a_dateline() {
        let mut fields = raw(&["June 1, 2022 (KASSALA) -", "Body."]);
        DatelinePolicy::Strip.apply(&mut fields);
        assert_eq!(fields.body_paragraphs, vec!["Body."]);
    }

    #[test]
    fn test_only_first_paragraph_is_scanned() {
        let mut fields = raw(&["Intro.", "January 5, 2021 (KHARTOUM) - Later."]);
        let d = DatelinePolicy::Strip.apply(&mut fields);
        assert!(d.is_empty());
        assert_eq!(fields.body_paragraphs[1], "January 5, 2021 (KHARTOUM) - Later.");
    }

    #[test]
    fn test_non_match_leaves_paragraph_under_either_policy() {
        for policy in [DatelinePolicy::Strip, DatelinePolicy::Keep] {
            let mut fields = raw(&["No dateline here, just text."]);
            assert!(policy.apply(&mut fields).is_empty());
            assert_eq!(fields.body_paragraphs, vec!["No dateline here, just text."]);
        }
    }

    #[test]
    fn test_policy_from_yaml() {
        let p: DatelinePolicy = serde_yaml::from_str("keep").unwrap();
        assert_eq!(p, DatelinePolicy::Keep);
        assert_eq!(DatelinePolicy::default(), DatelinePolicy::Strip);
    }
}
