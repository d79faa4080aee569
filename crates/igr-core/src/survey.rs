//! Survey (gat) number parsing.
//!
//! Raw survey numbers arrive from OCR and LLM extraction in many shapes:
//! `123`, `123/3`, `123/A`, `१२३/अ`, `123/4/अ`. Only the leading digit run
//! and a letter sub-division in the second segment distinguish a parcel on
//! the portal, so everything else is dropped.

use serde::{Deserialize, Serialize};

use crate::normalize::{fold_digits, normalize_display};
use crate::CoreError;

/// Normalized survey number: ASCII digit base plus an optional letter suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyIdentifier {
    base: String,
    suffix: Option<String>,
}

impl SurveyIdentifier {
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    #[must_use]
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl std::fmt::Display for SurveyIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}{suffix}", self.base),
            None => f.write_str(&self.base),
        }
    }
}

/// Parses a raw survey number. Returns `None` when the first segment has no
/// leading digits.
#[must_use]
pub fn parse(raw: &str) -> Option<SurveyIdentifier> {
    let cleaned = fold_digits(&normalize_display(raw));
    let mut segments = cleaned.split('/').map(str::trim).filter(|s| !s.is_empty());

    let first = segments.next()?;
    let base: String = first.chars().take_while(char::is_ascii_digit).collect();
    if base.is_empty() {
        return None;
    }

    let suffix = segments.next().and_then(|second| {
        let letters: String = second.chars().take_while(|c| is_suffix_letter(*c)).collect();
        (!letters.is_empty()).then_some(letters)
    });

    Some(SurveyIdentifier { base, suffix })
}

/// Latin letters and the Devanagari block, matras included.
fn is_suffix_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Result of parsing a batch of raw survey numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSurveys {
    /// Parsed identifiers in input order, duplicates removed.
    pub identifiers: Vec<SurveyIdentifier>,
    /// Raw inputs that could not be parsed.
    pub malformed: Vec<String>,
}

#[must_use]
pub fn parse_all<S: AsRef<str>>(raws: &[S]) -> ParsedSurveys {
    let mut parsed = ParsedSurveys::default();
    for raw in raws {
        let raw = raw.as_ref();
        match parse(raw) {
            Some(id) if !parsed.identifiers.contains(&id) => parsed.identifiers.push(id),
            Some(_) => {}
            None => parsed.malformed.push(raw.to_string()),
        }
    }
    parsed
}

/// Splits an extracted survey field into tokens.
///
/// Accepts a JSON array (`["12", "1ब"]`) or a comma-separated list. A token
/// that starts with a digit but is not purely numeric is read as a
/// sub-division of the last purely numeric token, so `12, 1ब` becomes
/// `["12", "12 1ब"]`. A single value without commas is returned as is.
///
/// # Errors
///
/// Returns [`CoreError::InvalidSurveyList`] when the value looks like a JSON
/// array but contains something other than strings and numbers.
pub fn expand_survey_list(value: &str) -> Result<Vec<String>, CoreError> {
    let text = value.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<String> = if text.starts_with('[') && text.ends_with(']') {
        match serde_json::from_str::<Vec<serde_json::Value>>(text) {
            Ok(values) => values
                .into_iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => Ok(s),
                    serde_json::Value::Number(n) => Ok(n.to_string()),
                    other => Err(CoreError::InvalidSurveyList(format!(
                        "unsupported element {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            Err(_) => split_commas(text),
        }
    } else if text.contains(',') {
        split_commas(text)
    } else {
        return Ok(vec![text.to_string()]);
    };

    Ok(carry_base_forward(
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    ))
}

fn split_commas(text: &str) -> Vec<String> {
    text.split(',').map(str::to_string).collect()
}

fn carry_base_forward(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out = Vec::new();
    let mut last_base: Option<String> = None;
    for token in items {
        if token.chars().all(is_any_digit) {
            last_base = Some(token.clone());
            out.push(token);
        } else if token.chars().next().is_some_and(is_any_digit) {
            match &last_base {
                Some(base) => out.push(format!("{base} {token}")),
                None => out.push(token),
            }
        } else {
            out.push(token);
        }
    }
    out
}

fn is_any_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{0966}'..='\u{096F}').contains(&c)
}

#[cfg(test)]
#[path = "survey_test.rs"]
mod tests;
