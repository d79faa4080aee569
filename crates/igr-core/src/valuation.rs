//! Derived land-rate statistics from registered transactions (Index-II
//! records) and area-band lookups against rural rate tables.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::fold_digits;
use crate::survey::expand_survey_list;
use crate::CoreError;

pub const SQM_PER_HECTARE: f64 = 10_000.0;
pub const SQM_PER_SQFT: f64 = 0.092_903;
/// Rate-per-guntha convention used by the valuation reports.
pub const SQM_PER_GUNTHA: f64 = 100.0;

/// Land type of non-agricultural plots in Index-II records.
pub const NON_AGRICULTURAL: &str = "बिनशेती जमिन";

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("valid number regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    SquareMeter,
    SquareFoot,
    Hectare,
}

impl AreaUnit {
    /// Recognizes Marathi and English unit labels such as `चौ.मीटर`,
    /// `चौ. फूट`, `हेक्टर`, `sq m`, `sqft` or `ha`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "चौमीटर" | "चौमी" | "sqm" | "sqmeter" | "sqmt" | "m2" => Some(Self::SquareMeter),
            "चौफुट" | "चौफूट" | "sqft" | "sqfeet" | "ft2" => Some(Self::SquareFoot),
            "हेक्टर" | "हे" | "ha" | "hectare" | "hectares" => Some(Self::Hectare),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_square_meters(self, value: f64) -> f64 {
        match self {
            Self::SquareMeter => value,
            Self::SquareFoot => value * SQM_PER_SQFT,
            Self::Hectare => value * SQM_PER_HECTARE,
        }
    }
}

/// Pulls the first number out of loosely formatted text (`"₹ 1,20,000/-"`,
/// `"२५०.५ चौ.मी."`). Grouping commas are ignored.
#[must_use]
pub fn clean_number(raw: &str) -> Option<f64> {
    let text = fold_digits(raw).replace(',', "");
    NUMBER_RE.find(&text)?.as_str().parse::<f64>().ok()
}

/// One Index-II record as produced by document extraction. Fields are
/// accepted as strings, numbers or (for survey numbers) arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexRecord {
    #[serde(default, deserialize_with = "loose_text")]
    pub dast_kramank_year: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub sub_registrar_number: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub dast_kramank_full: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub registration_date: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub survey_number: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub area_sq_meter: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub stamp_duty: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub prakar: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub amount: Option<String>,
}

fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationRecord {
    pub serial: usize,
    pub dast_kramank_year: Option<String>,
    pub sub_registrar_number: Option<String>,
    pub dast_kramank_full: Option<String>,
    pub registration_date: Option<String>,
    pub document_type: Option<String>,
    pub survey_numbers: Vec<String>,
    pub area_sq_meter: f64,
    pub area_hectares: f64,
    pub stamp_duty: f64,
    pub amount: f64,
    pub rate_per_sqm: f64,
    pub rate_per_guntha: f64,
    pub rate_per_ha: f64,
    pub prakar: Option<String>,
}

/// Computes area and stamp-duty rates for one record. Rates are zero when
/// the area is zero or missing.
#[must_use]
pub fn derive_record(serial: usize, raw: &IndexRecord) -> ValuationRecord {
    let number = |v: &Option<String>| v.as_deref().and_then(clean_number).unwrap_or(0.0);

    let area_sq_meter = number(&raw.area_sq_meter);
    let stamp_duty = number(&raw.stamp_duty);
    let amount = number(&raw.amount);

    let (area_hectares, rate_per_sqm) = if area_sq_meter > 0.0 {
        (area_sq_meter / SQM_PER_HECTARE, stamp_duty / area_sq_meter)
    } else {
        (0.0, 0.0)
    };

    let survey_numbers = raw
        .survey_number
        .as_deref()
        .map(|s| expand_survey_list(s).unwrap_or_else(|_| vec![s.trim().to_string()]))
        .unwrap_or_default();

    ValuationRecord {
        serial,
        dast_kramank_year: raw.dast_kramank_year.clone(),
        sub_registrar_number: raw.sub_registrar_number.clone(),
        dast_kramank_full: raw.dast_kramank_full.clone(),
        registration_date: raw.registration_date.clone(),
        document_type: raw.document_type.clone(),
        survey_numbers,
        area_sq_meter,
        area_hectares,
        stamp_duty,
        amount,
        rate_per_sqm,
        rate_per_guntha: rate_per_sqm * SQM_PER_GUNTHA,
        rate_per_ha: rate_per_sqm * SQM_PER_HECTARE,
        prakar: raw.prakar.clone(),
    }
}

/// Derives every record, numbering them from 1 in input order.
#[must_use]
pub fn derive_records(raw: &[IndexRecord]) -> Vec<ValuationRecord> {
    raw.iter()
        .enumerate()
        .map(|(i, r)| derive_record(i + 1, r))
        .collect()
}

/// Which records take part in the market-rate summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketFilter {
    /// Only records of this land type; `None` keeps every type.
    #[serde(default = "default_prakar")]
    pub prakar: Option<String>,
    /// Inclusive registration date window. Records whose date cannot be read
    /// are dropped when either bound is set.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_prakar() -> Option<String> {
    Some(NON_AGRICULTURAL.to_string())
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            prakar: default_prakar(),
            from: None,
            to: None,
        }
    }
}

impl MarketFilter {
    fn accepts(&self, record: &ValuationRecord) -> bool {
        if let Some(prakar) = &self.prakar {
            if record.prakar.as_deref().map(str::trim) != Some(prakar.as_str()) {
                return false;
            }
        }
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        let Some(date) = record
            .registration_date
            .as_deref()
            .and_then(parse_registration_date)
        else {
            return false;
        };
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Registration dates are written `dd/mm/yyyy`.
#[must_use]
pub fn parse_registration_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(fold_digits(raw).trim(), "%d/%m/%Y").ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRow {
    pub serial: usize,
    pub survey_numbers: Vec<String>,
    pub area_sq_meter: f64,
    pub registration_date: Option<String>,
    pub amount: f64,
    /// Consideration paid per square metre.
    pub market_rate_per_sqm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRateSummary {
    /// Records that passed the filter.
    pub considered: usize,
    /// Upper half of the considered records by market rate, highest first.
    pub top_half: Vec<MarketRow>,
    pub average_rate_per_sqm: f64,
}

/// Filters records, ranks them by consideration per square metre and
/// averages the upper half (rounded up).
#[must_use]
pub fn summarize_market(records: &[ValuationRecord], filter: &MarketFilter) -> MarketRateSummary {
    let mut rows: Vec<MarketRow> = records
        .iter()
        .filter(|r| filter.accepts(r))
        .map(|r| MarketRow {
            serial: r.serial,
            survey_numbers: r.survey_numbers.clone(),
            area_sq_meter: r.area_sq_meter,
            registration_date: r.registration_date.clone(),
            amount: r.amount,
            market_rate_per_sqm: if r.area_sq_meter > 0.0 {
                r.amount / r.area_sq_meter
            } else {
                0.0
            },
        })
        .collect();

    let considered = rows.len();
    rows.sort_by(|a, b| b.market_rate_per_sqm.total_cmp(&a.market_rate_per_sqm));
    rows.truncate(considered.div_ceil(2));

    let average_rate_per_sqm = if rows.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = rows.len() as f64;
        rows.iter().map(|r| r.market_rate_per_sqm).sum::<f64>() / n
    };

    MarketRateSummary {
        considered,
        top_half: rows,
        average_rate_per_sqm,
    }
}

/// Spread of stamp-duty rate per square metre over records with a known area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

/// Returns `None` when no record has a positive area.
#[must_use]
pub fn rate_statistics(records: &[ValuationRecord]) -> Option<RateStatistics> {
    let mut rates: Vec<f64> = records
        .iter()
        .filter(|r| r.area_sq_meter > 0.0)
        .map(|r| r.rate_per_sqm)
        .collect();
    if rates.is_empty() {
        return None;
    }
    rates.sort_by(f64::total_cmp);

    let count = rates.len();
    #[allow(clippy::cast_precision_loss)]
    let mean = rates.iter().sum::<f64>() / count as f64;
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (rates[mid - 1] + rates[mid]) / 2.0
    } else {
        rates[mid]
    };

    Some(RateStatistics {
        count,
        min: rates[0],
        max: rates[count - 1],
        mean,
        median,
    })
}

/// Area band of a rural rate table, in hectares: `0-1.25`, `1.26-2.50`, or
/// an open band such as `12.51-च्या पुढे` ("and above").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBand {
    pub lower: f64,
    pub upper: Option<f64>,
}

impl AreaBand {
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        let label = fold_digits(label);
        if label.contains("पुढे") || label.to_lowercase().contains("above") {
            let lower = NUMBER_RE.find(&label)?.as_str().parse().ok()?;
            return Some(Self { lower, upper: None });
        }

        let (lower, upper) = label.split_once('-')?;
        if upper.contains('-') {
            return None;
        }
        Some(Self {
            lower: lower.trim().parse().ok()?,
            upper: Some(upper.trim().parse().ok()?),
        })
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && self.upper.is_none_or(|upper| value <= upper)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandRate {
    pub band: String,
    pub area: f64,
    pub rate_per_hectare: f64,
    pub rate_per_sqm: f64,
}

/// Finds the first `(band label, rate per hectare)` row whose band contains
/// `area`.
///
/// # Errors
///
/// - [`CoreError::InvalidRate`] when the matching row's rate is not numeric.
/// - [`CoreError::NoAreaBand`] when no band contains the area.
pub fn find_band_rate(rows: &[(String, String)], area: f64) -> Result<BandRate, CoreError> {
    for (band, rate) in rows {
        let Some(parsed) = AreaBand::parse(band) else {
            continue;
        };
        if !parsed.contains(area) {
            continue;
        }
        let rate_per_hectare = fold_digits(rate)
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidRate {
                band: band.clone(),
                raw: rate.clone(),
            })?;
        return Ok(BandRate {
            band: band.clone(),
            area,
            rate_per_hectare,
            rate_per_sqm: rate_per_hectare / SQM_PER_HECTARE,
        });
    }
    Err(CoreError::NoAreaBand { area })
}

#[cfg(test)]
#[path = "valuation_test.rs"]
mod tests;
