//! Valuation statistics over Index-II records and rural band lookups.

use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use igr_core::valuation::{
    derive_records, find_band_rate, rate_statistics, summarize_market, BandRate, IndexRecord,
    MarketFilter, MarketRateSummary, RateStatistics, ValuationRecord,
};
use igr_scraper::grid::parse_rate_table;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ValuationReport {
    pub records: Vec<ValuationRecord>,
    pub statistics: Option<RateStatistics>,
    pub market: MarketRateSummary,
}

/// Builds the summary filter. `any_type` drops the land-type filter;
/// otherwise `prakar` replaces the default type when given.
pub(crate) fn market_filter(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    prakar: Option<String>,
    any_type: bool,
) -> MarketFilter {
    let defaults = MarketFilter::default();
    MarketFilter {
        prakar: if any_type {
            None
        } else {
            prakar.or(defaults.prakar)
        },
        from,
        to,
    }
}

/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// records.
pub(crate) fn valuation_report(path: &Path, filter: &MarketFilter) -> anyhow::Result<ValuationReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Vec<IndexRecord> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of records", path.display()))?;
    let records = derive_records(&raw);
    let statistics = rate_statistics(&records);
    let market = summarize_market(&records, filter);
    tracing::info!(
        records = records.len(),
        considered = market.considered,
        average = market.average_rate_per_sqm,
        "valuation summarized"
    );
    Ok(ValuationReport {
        records,
        statistics,
        market,
    })
}

pub(crate) fn run_valuation(
    path: &Path,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    prakar: Option<String>,
    any_type: bool,
) -> anyhow::Result<()> {
    let filter = market_filter(from, to, prakar, any_type);
    let report = valuation_report(path, &filter)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the file cannot be read, has no band rows, or no
/// band contains `area`.
pub(crate) fn area_rate(path: &Path, area: f64) -> anyhow::Result<BandRate> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = parse_rate_table(&html);
    if rows.is_empty() {
        anyhow::bail!("{} has no rate rows", path.display());
    }
    Ok(find_band_rate(&rows, area)?)
}

pub(crate) fn run_area_rate(path: &Path, area: f64) -> anyhow::Result<()> {
    let rate = area_rate(path, area)?;
    println!("{}", serde_json::to_string_pretty(&rate)?);
    Ok(())
}
