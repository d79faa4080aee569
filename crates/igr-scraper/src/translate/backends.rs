use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::ScrapeError;
use crate::retry::retry_with_backoff;

const USER_AGENT: &str = concat!("igr-rates/", env!("CARGO_PKG_VERSION"));
const BACKOFF_BASE_MILLIS: u64 = 500;

/// A remote Marathi to English translation service.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when the service answered without a usable translation.
    async fn translate(&self, text: &str) -> Result<Option<String>, ScrapeError>;
}

/// Builds the HTTP client shared by the backends.
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be constructed.
pub fn http_client(timeout: Duration) -> Result<Client, ScrapeError> {
    Ok(Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()?)
}

async fn get_json(
    client: &Client,
    service: &'static str,
    url: &str,
    query: Vec<(&str, &str)>,
) -> Result<serde_json::Value, ScrapeError> {
    let response = client.get(url).query(&query).send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(ScrapeError::RateLimited {
            service: service.to_owned(),
            retry_after_secs,
        });
    }
    if !status.is_success() {
        return Err(ScrapeError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| ScrapeError::Deserialize {
        context: format!("{service} response"),
        source,
    })
}

/// The keyless `translate_a/single` endpoint (`client=gtx`).
pub struct GoogleGtx {
    client: Client,
    url: String,
    max_retries: u32,
}

impl GoogleGtx {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            url: url.into(),
            max_retries,
        }
    }
}

/// Concatenates the translated segments of a gtx response:
/// `[[["seg1", "src1", ...], ["seg2", ...]], ...]`.
fn gtx_text(value: &serde_json::Value) -> Option<String> {
    let segments = value.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(serde_json::Value::as_str))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[async_trait]
impl TranslationBackend for GoogleGtx {
    fn name(&self) -> &'static str {
        "google-gtx"
    }

    async fn translate(&self, text: &str) -> Result<Option<String>, ScrapeError> {
        let value = retry_with_backoff(self.max_retries, BACKOFF_BASE_MILLIS, || {
            get_json(
                &self.client,
                self.name(),
                &self.url,
                vec![
                    ("client", "gtx"),
                    ("sl", "mr"),
                    ("tl", "en"),
                    ("dt", "t"),
                    ("q", text),
                ],
            )
        })
        .await?;
        Ok(gtx_text(&value))
    }
}

/// The MyMemory public translation API.
pub struct MyMemory {
    client: Client,
    url: String,
    max_retries: u32,
}

impl MyMemory {
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>, max_retries: u32) -> Self {
        Self {
            client,
            url: url.into(),
            max_retries,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    response_data: Option<MyMemoryData>,
    #[serde(rename = "responseStatus", default)]
    response_status: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
}

/// The API reports its status as a number or a numeric string.
fn status_ok(status: &serde_json::Value) -> bool {
    match status {
        serde_json::Value::Number(n) => n.as_u64() == Some(200),
        serde_json::Value::String(s) => s.trim() == "200",
        serde_json::Value::Null => true,
        _ => false,
    }
}

#[async_trait]
impl TranslationBackend for MyMemory {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    async fn translate(&self, text: &str) -> Result<Option<String>, ScrapeError> {
        let value = retry_with_backoff(self.max_retries, BACKOFF_BASE_MILLIS, || {
            get_json(
                &self.client,
                self.name(),
                &self.url,
                vec![("q", text), ("langpair", "mr|en")],
            )
        })
        .await?;
        let parsed: MyMemoryResponse =
            serde_json::from_value(value).map_err(|source| ScrapeError::Deserialize {
                context: "mymemory response".to_owned(),
                source,
            })?;
        if !status_ok(&parsed.response_status) {
            return Ok(None);
        }
        Ok(parsed
            .response_data
            .and_then(|d| d.translated_text)
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty()))
    }
}
