use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request ID echoed back.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlates log lines of one API call. Scrapes run for tens of seconds,
/// so clients may pass their own ID to match logs against their side.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Takes the caller's `x-request-id` when it is printable ASCII of a
    /// sane length, otherwise mints a `UUIDv4`.
    fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_REQUEST_ID_LEN
                    && id.chars().all(|c| c.is_ascii_graphic())
            });
        Self(supplied.map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned))
    }
}

/// Attaches a [`RequestId`] to the request, echoes it on the response and
/// logs how long the call took.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    req.extensions_mut().insert(id.clone());

    let mut res = next.run(req).await;
    tracing::info!(
        request_id = %id.0,
        %method,
        path,
        status = res.status().as_u16(),
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "request handled"
    );

    if let Ok(value) = HeaderValue::from_str(&id.0) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
