use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not operate the {control} control: every strategy failed")]
    ControlNotFound { control: String },

    #[error("element {selector} not found in any frame within {timeout_ms}ms")]
    ElementNotFound { selector: String, timeout_ms: u64 },

    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    NavigationTimeout { what: String, timeout_ms: u64 },

    #[error("no matching sub-zone found after exhausting {pages} result page(s)")]
    NoMatchFound { pages: usize },

    #[error("detail view for {label} did not confirm the survey numbers: {reason}")]
    VerificationFailed { label: String, reason: String },

    #[error("survey number \"{raw}\" could not be parsed")]
    MalformedIdentifier { raw: String },

    #[error("none of the supplied survey numbers could be parsed")]
    NoUsableIdentifiers,

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] igr_core::CoreError),

    #[error("form step {step} attempted while form is {state}")]
    FormOrder { step: &'static str, state: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("script error during {context}: {reason}")]
    Script { context: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {service} (retry after {retry_after_secs}s)")]
    RateLimited {
        service: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ScrapeError {
    /// Errors the session absorbs and answers by trying the next candidate.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScrapeError::VerificationFailed { .. })
    }
}
