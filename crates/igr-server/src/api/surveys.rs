use axum::{Extension, Json};
use igr_core::survey::{expand_survey_list, parse_all};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ParseSurveysBody {
    pub identifiers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ParsedSurveysItem {
    identifiers: Vec<String>,
    malformed: Vec<String>,
}

/// Each input may itself be a comma list or JSON array as written in
/// extracted documents.
pub(super) async fn parse_surveys(
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ParseSurveysBody>,
) -> Result<Json<ApiResponse<ParsedSurveysItem>>, ApiError> {
    let mut tokens = Vec::new();
    for raw in &body.identifiers {
        let expanded = expand_survey_list(raw)
            .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
        tokens.extend(expanded);
    }
    let parsed = parse_all(&tokens);

    Ok(Json(ApiResponse {
        data: ParsedSurveysItem {
            identifiers: parsed.identifiers.iter().map(ToString::to_string).collect(),
            malformed: parsed.malformed,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
