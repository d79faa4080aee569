//! Administrative fields and survey numbers from a source document.
//!
//! Documents arrive as plain paragraphs plus tables of cell text; reading the
//! original file format is left to the caller.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_display;
use crate::survey;

pub const LABEL_DISTRICT: &str = "जिल्हा";
pub const LABEL_TALUKA: &str = "तालुका";
pub const LABEL_VILLAGE: &str = "मौजे";
pub const SURVEY_COLUMN_HEADER: &str = "भूमापन क्रमांक / गट क्रमांक";

const ALL_LABELS: &[&str] = &[LABEL_VILLAGE, LABEL_TALUKA, LABEL_DISTRICT];

/// Paragraph and table text of a document. Each table is a list of rows and
/// the first row is its header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub tables: Vec<Vec<Vec<String>>>,
}

impl SourceDocument {
    /// Reads a plain-text export. Lines containing `|` are table rows split
    /// on `|`; consecutive rows form one table. Other non-blank lines are
    /// paragraphs.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut doc = Self::default();
        let mut current: Vec<Vec<String>> = Vec::new();

        for line in text.lines() {
            if line.contains('|') {
                let cells = line
                    .trim()
                    .trim_matches('|')
                    .split('|')
                    .map(normalize_display)
                    .collect();
                current.push(cells);
                continue;
            }
            if !current.is_empty() {
                doc.tables.push(std::mem::take(&mut current));
            }
            if !line.trim().is_empty() {
                doc.paragraphs.push(line.to_string());
            }
        }
        if !current.is_empty() {
            doc.tables.push(current);
        }
        doc
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminFields {
    pub district: Option<String>,
    pub taluka: Option<String>,
    pub village: Option<String>,
    /// Survey numbers from the survey column, parsed and rendered.
    pub surveys: Vec<String>,
}

impl AdminFields {
    /// Replaces extracted values with caller-supplied ones where given.
    #[must_use]
    pub fn with_overrides(
        mut self,
        district: Option<String>,
        taluka: Option<String>,
        village: Option<String>,
    ) -> Self {
        if district.is_some() {
            self.district = district;
        }
        if taluka.is_some() {
            self.taluka = taluka;
        }
        if village.is_some() {
            self.village = village;
        }
        self
    }
}

#[must_use]
pub fn extract_admin_fields(doc: &SourceDocument) -> AdminFields {
    AdminFields {
        district: extract_field(&doc.paragraphs, LABEL_DISTRICT),
        taluka: extract_field(&doc.paragraphs, LABEL_TALUKA),
        village: extract_field(&doc.paragraphs, LABEL_VILLAGE),
        surveys: extract_surveys(&doc.tables),
    }
}

/// Value following `label` in the first paragraph that mentions it.
#[must_use]
pub fn extract_field(paragraphs: &[String], label: &str) -> Option<String> {
    for paragraph in paragraphs {
        let text = normalize_display(paragraph);
        let Some(label_at) = text.find(label) else {
            continue;
        };

        if let Some((head, tail)) = text.split_once([':', '：']) {
            if head.contains(label) {
                return non_empty(truncate_at_next_label(tail));
            }
        }

        let remainder = text[label_at + label.len()..]
            .trim_start_matches([':', '：'])
            .trim();
        return non_empty(truncate_at_next_label(remainder));
    }
    None
}

fn truncate_at_next_label(text: &str) -> String {
    let text = text.trim();
    let cut = ALL_LABELS
        .iter()
        .filter_map(|label| text.find(label))
        .filter(|&idx| idx > 0)
        .min();
    match cut {
        Some(idx) => normalize_display(&text[..idx]),
        None => normalize_display(text),
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Parsed survey numbers from the first table whose header carries the
/// survey column.
#[must_use]
pub fn extract_surveys(tables: &[Vec<Vec<String>>]) -> Vec<String> {
    let header = normalize_display(SURVEY_COLUMN_HEADER);
    for table in tables {
        let Some(header_row) = table.first() else {
            continue;
        };
        let Some(col) = header_row
            .iter()
            .position(|cell| normalize_display(cell).contains(&header))
        else {
            continue;
        };

        return table
            .iter()
            .skip(1)
            .filter_map(|row| row.get(col))
            .filter_map(|cell| survey::parse(cell))
            .map(|id| id.to_string())
            .collect();
    }
    Vec::new()
}
