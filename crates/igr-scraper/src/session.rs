//! One scrape from form entry to a verified rate.

use std::sync::atomic::{AtomicUsize, Ordering};

use igr_core::survey::parse_all;
use igr_core::{AdministrativeLocator, AppConfig, MatchMode, ScrapeRequest, ScrapeResult, SurveyIdentifier};

use crate::browser_pool::{BrowserPool, LaunchSettings};
use crate::dom::{locate, BrowserPage};
use crate::error::ScrapeError;
use crate::form::FormDriver;
use crate::grid::{lookup_labels, parse_grid_rows};
use crate::matcher::{scan_all_candidates, RowMatcher};
use crate::pagination::GridPaginator;
use crate::progress::{Progress, Stage};
use crate::site::ScraperSettings;
use crate::translate::Translator;
use crate::verify::Verifier;

/// A request that passed validation, ready to drive the portal.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub locator: AdministrativeLocator,
    pub year: String,
    pub identifiers: Vec<SurveyIdentifier>,
    pub warnings: Vec<String>,
}

/// Validates the locator and parses the survey numbers. Unparseable numbers
/// become warnings; the request fails only when none are usable.
///
/// # Errors
///
/// [`ScrapeError::InvalidRequest`] for an empty locator field or year,
/// [`ScrapeError::NoUsableIdentifiers`] when no survey number parses.
pub fn prepare(request: &ScrapeRequest) -> Result<PreparedRequest, ScrapeError> {
    let locator = request.locator()?;
    let year = request.year.trim();
    if year.is_empty() {
        return Err(igr_core::CoreError::InvalidLocator { field: "year" }.into());
    }
    let parsed = parse_all(&request.identifiers);
    let warnings: Vec<String> = parsed
        .malformed
        .iter()
        .map(|raw| ScrapeError::MalformedIdentifier { raw: raw.clone() }.to_string())
        .collect();
    if parsed.identifiers.is_empty() {
        return Err(ScrapeError::NoUsableIdentifiers);
    }
    Ok(PreparedRequest {
        locator,
        year: year.to_owned(),
        identifiers: parsed.identifiers,
        warnings,
    })
}

#[derive(Debug)]
struct Found {
    label: String,
    rate: String,
    detail: String,
}

/// Drives one page through the form, the grid and verification.
pub struct Session<'a> {
    page: &'a dyn BrowserPage,
    settings: &'a ScraperSettings,
    translator: &'a Translator,
    progress: Progress,
}

impl<'a> Session<'a> {
    pub fn new(
        page: &'a dyn BrowserPage,
        settings: &'a ScraperSettings,
        translator: &'a Translator,
        progress: Progress,
    ) -> Self {
        Self {
            page,
            settings,
            translator,
            progress,
        }
    }

    /// Runs the whole scrape. Every failure is folded into the result.
    pub async fn run(&self, request: &ScrapeRequest) -> ScrapeResult {
        match prepare(request) {
            Ok(prepared) => self.run_prepared(prepared).await,
            Err(e) => ScrapeResult::error(e.to_string(), Vec::new()),
        }
    }

    pub async fn run_prepared(&self, prepared: PreparedRequest) -> ScrapeResult {
        let PreparedRequest {
            locator,
            year,
            identifiers,
            mut warnings,
        } = prepared;

        let outcome = self
            .drive(&locator, &year, &identifiers, &mut warnings)
            .await;
        self.progress.stage(Stage::Done);

        match outcome {
            Ok(found) => {
                tracing::info!(label = %found.label, rate = %found.rate, "rate found");
                ScrapeResult::success(found.label, found.rate, found.detail, warnings)
            }
            Err(e) => {
                tracing::warn!(error = %e, "scrape failed");
                ScrapeResult::error(e.to_string(), warnings)
            }
        }
    }

    async fn drive(
        &self,
        locator: &AdministrativeLocator,
        year: &str,
        identifiers: &[SurveyIdentifier],
        warnings: &mut Vec<String>,
    ) -> Result<Found, ScrapeError> {
        let mut form = FormDriver::new(self.page, self.settings, Some(self.translator));

        self.progress
            .report(Stage::SelectingDistrict, Some(locator.district.clone()));
        form.set_district(&locator.district).await?;
        self.progress
            .report(Stage::SelectingYear, Some(year.to_owned()));
        form.set_year(year).await?;
        self.progress
            .report(Stage::SelectingTaluka, Some(locator.taluka.clone()));
        form.set_taluka(&locator.taluka).await?;
        self.progress
            .report(Stage::SelectingVillage, Some(locator.village.clone()));
        form.set_village(&locator.village).await?;

        let identifier_keys: Vec<String> = identifiers.iter().map(ToString::to_string).collect();
        let keys = match self.settings.match_mode {
            MatchMode::Lookup => {
                self.progress.stage(Stage::LookingUpSurveys);
                let labels = self.survey_lookup(&form, identifiers).await?;
                if labels.is_empty() {
                    warnings.push(
                        "survey lookup returned no sub-zones; matching on survey numbers".to_owned(),
                    );
                    identifier_keys
                } else {
                    labels
                }
            }
            MatchMode::Identifiers => identifier_keys,
            MatchMode::ScanAll => Vec::new(),
        };

        form.choose_radio(&self.settings.site.subzone_radio).await?;
        form.mark_ready()?;

        self.progress.stage(Stage::Matching);
        self.search_grid(&keys, identifiers).await
    }

    /// Runs the portal's survey-number search for the first identifier and
    /// returns the sub-zone labels it lists.
    async fn survey_lookup(
        &self,
        form: &FormDriver<'_>,
        identifiers: &[SurveyIdentifier],
    ) -> Result<Vec<String>, ScrapeError> {
        let site = &self.settings.site;
        let Some(first) = identifiers.first() else {
            return Ok(Vec::new());
        };

        form.choose_radio(&site.survey_radio).await?;
        form.fill_survey_search(first.base()).await?;
        form.click_search().await?;

        let Ok(frame) = locate(
            self.page,
            &site.survey_results_grid,
            self.settings.element_timeout,
            self.settings.poll_interval,
        )
        .await
        else {
            tracing::info!(survey = first.base(), "survey lookup produced no results grid");
            return Ok(Vec::new());
        };
        let html = self
            .page
            .inner_html(frame, &site.survey_results_grid)
            .await?
            .unwrap_or_default();
        let rows = parse_grid_rows(&html, &site.detail_link_text);
        let labels = lookup_labels(&rows, site.lookup_key_column);
        tracing::info!(survey = first.base(), labels = labels.len(), "survey lookup done");
        Ok(labels)
    }

    async fn search_grid(
        &self,
        keys: &[String],
        identifiers: &[SurveyIdentifier],
    ) -> Result<Found, ScrapeError> {
        let site = &self.settings.site;
        let frame = locate(
            self.page,
            &site.subzone_grid,
            self.settings.element_timeout,
            self.settings.poll_interval,
        )
        .await
        .map_err(|_| ScrapeError::ControlNotFound {
            control: "sub-zone grid".to_owned(),
        })?;

        let scan_all = self.settings.match_mode == MatchMode::ScanAll;
        let matcher = RowMatcher::new(keys, site.label_column);
        let verifier = Verifier::new(self.page, self.settings);
        let mut pages = GridPaginator::new(self.page, frame, self.settings);

        while let Some(grid) = pages.next_page().await? {
            let candidates = if scan_all {
                scan_all_candidates(&grid.rows)
            } else {
                matcher.rank_candidates(&grid.rows)
            };
            tracing::debug!(page = grid.number, candidates = candidates.len(), "grid page scanned");

            for candidate in candidates {
                let label = candidate
                    .row
                    .column(site.label_column)
                    .unwrap_or_default()
                    .to_owned();
                self.progress.report(Stage::Verifying, Some(label.clone()));
                match verifier.verify(frame, &candidate.row, identifiers).await {
                    Ok(detail) => {
                        let rate = candidate
                            .row
                            .column(site.rate_column)
                            .unwrap_or_default()
                            .to_owned();
                        if rate.is_empty() {
                            tracing::warn!(label = %label, "verified row has no rate");
                            continue;
                        }
                        tracing::info!(
                            page = grid.number,
                            confidence = ?candidate.confidence,
                            key = %candidate.matched_key,
                            "candidate verified"
                        );
                        return Ok(Found { label, rate, detail });
                    }
                    Err(e) if e.is_recoverable() => {
                        tracing::debug!(error = %e, "candidate rejected");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Err(ScrapeError::NoMatchFound {
            pages: pages.pages_seen(),
        })
    }
}

/// Pooled scraper shared by the CLI and the HTTP service.
pub struct RateScraper {
    pool: BrowserPool,
    settings: ScraperSettings,
    translator: Translator,
    next_worker: AtomicUsize,
}

impl RateScraper {
    #[must_use]
    pub fn new(pool: BrowserPool, settings: ScraperSettings, translator: Translator) -> Self {
        Self {
            pool,
            settings,
            translator,
            next_worker: AtomicUsize::new(0),
        }
    }

    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the translation client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        let settings = ScraperSettings::from_config(config);
        let pool = BrowserPool::new(
            config.browser_pool_size,
            LaunchSettings {
                headless: config.headless,
                chrome_path: config.chrome_path.clone(),
                navigation_timeout: settings.navigation_timeout,
            },
        );
        let translator = Translator::from_config(config)?;
        Ok(Self::new(pool, settings, translator))
    }

    #[must_use]
    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Validates, leases a page and scrapes. Invalid requests are answered
    /// without launching a browser.
    pub async fn run(&self, request: &ScrapeRequest, progress: Progress) -> ScrapeResult {
        let prepared = match prepare(request) {
            Ok(prepared) => prepared,
            Err(e) => return ScrapeResult::error(e.to_string(), Vec::new()),
        };

        progress.stage(Stage::Connecting);
        let worker = self.next_worker.fetch_add(1, Ordering::Relaxed);
        let lease = match self.pool.lease(worker).await {
            Ok(lease) => lease,
            Err(e) => return ScrapeResult::error(e.to_string(), prepared.warnings),
        };

        let result = Session::new(lease.page(), &self.settings, &self.translator, progress)
            .run_prepared(prepared)
            .await;
        lease.close().await;
        result
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
