use serde::{Deserialize, Serialize};

use crate::normalize::normalize_display;
use crate::CoreError;

/// District, taluka and village as they should appear in the portal's
/// dropdowns. Matching against live option text is case-insensitive
/// substring, so values may be partial names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministrativeLocator {
    pub district: String,
    pub taluka: String,
    pub village: String,
}

impl AdministrativeLocator {
    /// Builds a locator from raw values, display-normalizing each one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLocator`] naming the first field that is
    /// empty after normalization.
    pub fn new(district: &str, taluka: &str, village: &str) -> Result<Self, CoreError> {
        let district = non_empty("district", district)?;
        let taluka = non_empty("taluka", taluka)?;
        let village = non_empty("village", village)?;
        Ok(Self {
            district,
            taluka,
            village,
        })
    }
}

fn non_empty(field: &'static str, raw: &str) -> Result<String, CoreError> {
    let value = normalize_display(raw);
    if value.is_empty() {
        return Err(CoreError::InvalidLocator { field });
    }
    Ok(value)
}

/// One rate lookup: where to navigate and which survey numbers to verify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub district: String,
    pub year: String,
    pub taluka: String,
    pub village: String,
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl ScrapeRequest {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLocator`] if any administrative field is empty.
    pub fn locator(&self) -> Result<AdministrativeLocator, CoreError> {
        AdministrativeLocator::new(&self.district, &self.taluka, &self.village)
    }
}

/// How candidate grid rows are chosen before detail verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Search the portal by survey number first and match rows against the
    /// labels it returns.
    Lookup,
    /// Match rows directly against the parsed survey identifiers.
    #[default]
    Identifiers,
    /// Treat every row with a detail link as a candidate.
    ScanAll,
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::Lookup => write!(f, "lookup"),
            MatchMode::Identifiers => write!(f, "identifiers"),
            MatchMode::ScanAll => write!(f, "scan-all"),
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lookup" => Ok(MatchMode::Lookup),
            "identifiers" => Ok(MatchMode::Identifiers),
            "scan-all" | "scan_all" | "scanall" => Ok(MatchMode::ScanAll),
            other => Err(format!(
                "unknown match mode \"{other}\" (expected lookup, identifiers or scan-all)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Error,
}

/// Outcome of one scraping session. Constructed once through
/// [`ScrapeResult::success`] or [`ScrapeResult::error`] and read through
/// accessors afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    status: ScrapeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    matched_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    raw_detail_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl ScrapeResult {
    #[must_use]
    pub fn success(
        matched_label: impl Into<String>,
        rate_value: impl Into<String>,
        raw_detail_text: impl Into<String>,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            status: ScrapeStatus::Success,
            matched_label: Some(matched_label.into()),
            rate_value: Some(rate_value.into()),
            raw_detail_text: Some(raw_detail_text.into()),
            message: None,
            warnings,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            status: ScrapeStatus::Error,
            matched_label: None,
            rate_value: None,
            raw_detail_text: None,
            message: Some(message.into()),
            warnings,
        }
    }

    #[must_use]
    pub fn status(&self) -> ScrapeStatus {
        self.status
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ScrapeStatus::Success
    }

    #[must_use]
    pub fn matched_label(&self) -> Option<&str> {
        self.matched_label.as_deref()
    }

    #[must_use]
    pub fn rate_value(&self) -> Option<&str> {
        self.rate_value.as_deref()
    }

    #[must_use]
    pub fn raw_detail_text(&self) -> Option<&str> {
        self.raw_detail_text.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
