//! Rate lookup and translation commands.
//!
//! Both drive the scraper crate directly. Progress goes to stderr so stdout
//! carries only the JSON result.

use igr_core::survey::expand_survey_list;
use igr_core::{AppConfig, ScrapeRequest};
use igr_scraper::{Progress, RateScraper, Translator};

/// Builds a request, splitting comma-separated or JSON-array survey flags.
///
/// # Errors
///
/// Returns an error if a survey flag is a JSON array with non-scalar items.
pub(crate) fn build_request(
    district: String,
    year: String,
    taluka: String,
    village: String,
    surveys: &[String],
) -> anyhow::Result<ScrapeRequest> {
    let mut identifiers = Vec::new();
    for raw in surveys {
        identifiers.extend(expand_survey_list(raw)?);
    }
    Ok(ScrapeRequest {
        district,
        year,
        taluka,
        village,
        identifiers,
    })
}

/// Runs one scrape and prints the result as JSON.
///
/// # Errors
///
/// Returns an error when the scraper cannot be built, or after printing the
/// result when the scrape did not find a rate.
pub(crate) async fn run_rate(config: &AppConfig, request: &ScrapeRequest) -> anyhow::Result<()> {
    let scraper = RateScraper::from_config(config)?;
    let (progress, mut events) = Progress::channel();

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.detail {
                Some(detail) => eprintln!("[{}] {detail}", event.stage),
                None => eprintln!("[{}]", event.stage),
            }
        }
    });

    let result = scraper.run(request, progress).await;
    scraper.shutdown().await;
    // The sender was dropped with the session, so the printer drains and ends.
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "progress printer ended abnormally");
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.is_success() {
        anyhow::bail!(
            "no rate found: {}",
            result.message().unwrap_or("unknown error")
        );
    }
    Ok(())
}

/// Translates each argument and prints `original<TAB>english` lines.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub(crate) async fn run_translate(config: &AppConfig, texts: &[String]) -> anyhow::Result<()> {
    let translator = Translator::from_config(config)?;
    for text in texts {
        let english = translator.translate(text).await;
        println!("{text}\t{english}");
    }
    Ok(())
}
