use async_trait::async_trait;
use axum::{extract::State, Extension, Json};
use igr_core::{ScrapeRequest, ScrapeResult};
use igr_scraper::{prepare, Progress, RateScraper};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Anything that can answer a scrape request.
#[async_trait]
pub trait RateService: Send + Sync {
    async fn lookup(&self, request: &ScrapeRequest) -> ScrapeResult;
}

#[async_trait]
impl RateService for RateScraper {
    async fn lookup(&self, request: &ScrapeRequest) -> ScrapeResult {
        self.run(request, Progress::silent()).await
    }
}

/// Runs one scrape. Invalid requests are rejected with `validation_error`
/// before a browser is touched; a scrape that ran is always returned as
/// data, whether or not it found a rate.
pub(super) async fn lookup_rate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ApiResponse<ScrapeResult>>, ApiError> {
    if let Err(e) = prepare(&request) {
        tracing::info!(request_id = %req_id.0, error = %e, "rejected scrape request");
        return Err(ApiError::new(req_id.0, "validation_error", e.to_string()));
    }

    tracing::info!(
        request_id = %req_id.0,
        district = %request.district,
        taluka = %request.taluka,
        village = %request.village,
        surveys = request.identifiers.len(),
        "scrape requested"
    );
    let result = state.rates.lookup(&request).await;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
