//! Survey parsing and document extraction commands.

use std::path::Path;

use anyhow::Context;
use igr_core::document::{extract_admin_fields, AdminFields, SourceDocument};
use igr_core::survey::{expand_survey_list, parse_all};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct SurveyReport {
    pub identifiers: Vec<String>,
    pub malformed: Vec<String>,
}

/// Expands each raw argument as a survey list and parses the result.
///
/// # Errors
///
/// Returns an error if an argument is a JSON array with non-scalar items.
pub(crate) fn survey_report(raw: &[String]) -> anyhow::Result<SurveyReport> {
    let mut tokens = Vec::new();
    for value in raw {
        tokens.extend(expand_survey_list(value)?);
    }
    let parsed = parse_all(&tokens);
    Ok(SurveyReport {
        identifiers: parsed.identifiers.iter().map(ToString::to_string).collect(),
        malformed: parsed.malformed,
    })
}

pub(crate) fn run_surveys(raw: &[String]) -> anyhow::Result<()> {
    let report = survey_report(raw)?;
    if !report.malformed.is_empty() {
        tracing::warn!(malformed = ?report.malformed, "some survey numbers could not be parsed");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Reads a document from disk: JSON when the file has a `.json` extension,
/// otherwise a plain-text export.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is invalid.
pub(crate) fn load_document(path: &Path) -> anyhow::Result<SourceDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a JSON document", path.display()))
    } else {
        Ok(SourceDocument::from_text(&text))
    }
}

/// # Errors
///
/// Returns an error if the document cannot be loaded.
pub(crate) fn extract(
    path: &Path,
    district: Option<String>,
    taluka: Option<String>,
    village: Option<String>,
) -> anyhow::Result<AdminFields> {
    let doc = load_document(path)?;
    let fields = extract_admin_fields(&doc).with_overrides(district, taluka, village);
    tracing::info!(
        district = fields.district.as_deref().unwrap_or("-"),
        taluka = fields.taluka.as_deref().unwrap_or("-"),
        village = fields.village.as_deref().unwrap_or("-"),
        surveys = fields.surveys.len(),
        "fields extracted"
    );
    Ok(fields)
}

pub(crate) fn run_extract(
    path: &Path,
    district: Option<String>,
    taluka: Option<String>,
    village: Option<String>,
) -> anyhow::Result<()> {
    let fields = extract(path, district, taluka, village)?;
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
