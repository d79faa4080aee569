use axum::{Extension, Json};
use igr_core::valuation::{
    derive_records, rate_statistics, summarize_market, IndexRecord, MarketFilter,
    MarketRateSummary, RateStatistics, ValuationRecord,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ValuationBody {
    pub records: Vec<IndexRecord>,
    #[serde(default)]
    pub filter: Option<MarketFilter>,
}

#[derive(Debug, Serialize)]
pub(super) struct ValuationItem {
    records: Vec<ValuationRecord>,
    statistics: Option<RateStatistics>,
    market: MarketRateSummary,
}

pub(super) async fn summarize(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ValuationBody>,
) -> Result<Json<ApiResponse<ValuationItem>>, ApiError> {
    if body.records.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "records must not be empty",
        ));
    }
    let filter = body.filter.unwrap_or_default();
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                "filter.from is after filter.to",
            ));
        }
    }

    let records = derive_records(&body.records);
    let statistics = rate_statistics(&records);
    let market = summarize_market(&records, &filter);

    Ok(Json(ApiResponse {
        data: ValuationItem {
            records,
            statistics,
            market,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
