//! Confirmation of a candidate row through its detail view.

use igr_core::{fold_digits, SurveyIdentifier};

use crate::dom::{find_frame, BrowserPage, FrameRef};
use crate::error::ScrapeError;
use crate::grid::GridRow;
use crate::site::ScraperSettings;

fn compact(s: &str) -> String {
    fold_digits(s)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Whether every identifier occurs in the detail text, ignoring whitespace
/// and case. An empty identifier list confirms nothing.
#[must_use]
pub fn identifiers_present(detail: &str, identifiers: &[SurveyIdentifier]) -> bool {
    if identifiers.is_empty() {
        return false;
    }
    let haystack = compact(detail);
    identifiers
        .iter()
        .all(|id| haystack.contains(&compact(&id.to_string())))
}

/// Opens candidate rows and reads the detail field they populate.
pub struct Verifier<'a> {
    page: &'a dyn BrowserPage,
    settings: &'a ScraperSettings,
}

impl<'a> Verifier<'a> {
    pub fn new(page: &'a dyn BrowserPage, settings: &'a ScraperSettings) -> Self {
        Self { page, settings }
    }

    async fn read_detail(&self) -> Result<Option<String>, ScrapeError> {
        let selector = &self.settings.site.detail_field;
        match find_frame(self.page, selector).await {
            Some(frame) => self.page.value_of(frame, selector).await,
            None => Ok(None),
        }
    }

    /// Clicks the row's detail link in the grid at `frame`, waits for the
    /// detail text to appear or change and checks it names every identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::VerificationFailed`] when the link is missing,
    /// the detail never updates, or an identifier is absent. Browser errors
    /// are passed through.
    pub async fn verify(
        &self,
        frame: FrameRef,
        row: &GridRow,
        identifiers: &[SurveyIdentifier],
    ) -> Result<String, ScrapeError> {
        let label = row
            .column(self.settings.site.label_column)
            .unwrap_or_default()
            .to_owned();
        let failed = |reason: &str| ScrapeError::VerificationFailed {
            label: label.clone(),
            reason: reason.to_owned(),
        };

        let previous = self.read_detail().await.unwrap_or(None).unwrap_or_default();
        let clicked = self
            .page
            .click_row_link(frame, &self.settings.site.subzone_grid, row.index)
            .await?;
        if !clicked {
            return Err(failed("row has no detail link"));
        }

        let mut detail = None;
        for _ in 0..self.settings.detail_poll_attempts {
            tokio::time::sleep(self.settings.poll_interval).await;
            match self.read_detail().await {
                Ok(Some(text)) if !text.trim().is_empty() && text != previous => {
                    detail = Some(text);
                    break;
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "detail read failed, polling again"),
            }
        }

        let Some(detail) = detail else {
            return Err(failed("detail text never appeared"));
        };
        if identifiers_present(&detail, identifiers) {
            tracing::debug!(label = %label, "candidate verified");
            Ok(detail)
        } else {
            Err(failed("survey numbers missing from detail text"))
        }
    }
}
