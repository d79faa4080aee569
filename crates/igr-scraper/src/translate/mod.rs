//! Marathi to English rendering of administrative names.
//!
//! [`Translator::translate`] never fails. It tries each configured backend
//! in order, falls back to ASCII transliteration, and finally returns the
//! input unchanged. Results are memoized in a process-wide cache.

mod backends;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};
use std::time::Duration;

use igr_core::AppConfig;

use crate::error::ScrapeError;

pub use backends::{http_client, GoogleGtx, MyMemory, TranslationBackend};

/// Memo of source text to rendered text. Safe for concurrent use.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: RwLock<HashMap<String, String>>,
}

impl TranslationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.entries.read() {
            Ok(map) => map.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }

    pub fn insert(&self, key: String, value: String) {
        match self.entries.write() {
            Ok(mut map) => {
                map.insert(key, value);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, value);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL_CACHE: LazyLock<Arc<TranslationCache>> =
    LazyLock::new(|| Arc::new(TranslationCache::new()));

/// The cache shared by every translator built with [`Translator::new`].
#[must_use]
pub fn global_cache() -> Arc<TranslationCache> {
    Arc::clone(&GLOBAL_CACHE)
}

/// ASCII rendering of `text`, or `None` when nothing printable remains.
#[must_use]
pub fn transliterate(text: &str) -> Option<String> {
    let ascii = deunicode::deunicode(text);
    let collapsed = ascii.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

pub struct Translator {
    backends: Vec<Box<dyn TranslationBackend>>,
    cache: Arc<TranslationCache>,
}

impl Translator {
    /// A translator over `backends` that shares the process-wide cache.
    #[must_use]
    pub fn new(backends: Vec<Box<dyn TranslationBackend>>) -> Self {
        Self::with_cache(backends, global_cache())
    }

    #[must_use]
    pub fn with_cache(
        backends: Vec<Box<dyn TranslationBackend>>,
        cache: Arc<TranslationCache>,
    ) -> Self {
        Self { backends, cache }
    }

    /// No network backends; only transliteration.
    #[must_use]
    pub fn transliteration_only() -> Self {
        Self::new(Vec::new())
    }

    /// Backends configured by `IGR_TRANSLATE_*`: the gtx endpoint first, then
    /// MyMemory. A backend whose URL is unset is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScrapeError> {
        let client = http_client(Duration::from_secs(config.translate_timeout_secs))?;
        let mut backends: Vec<Box<dyn TranslationBackend>> = Vec::new();
        if let Some(url) = &config.translate_primary_url {
            backends.push(Box::new(GoogleGtx::new(
                client.clone(),
                url.clone(),
                config.translate_max_retries,
            )));
        }
        if let Some(url) = &config.translate_secondary_url {
            backends.push(Box::new(MyMemory::new(
                client,
                url.clone(),
                config.translate_max_retries,
            )));
        }
        Ok(Self::new(backends))
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Renders `text` in English. Empty input is returned as given; ASCII
    /// input is returned trimmed without contacting any backend.
    pub async fn translate(&self, text: &str) -> String {
        let key = text.trim();
        if key.is_empty() {
            return text.to_owned();
        }
        if let Some(hit) = self.cache.get(key) {
            return hit;
        }

        let rendered = if key.is_ascii() {
            key.to_owned()
        } else {
            self.render(key).await
        };
        self.cache.insert(key.to_owned(), rendered.clone());
        rendered
    }

    async fn render(&self, key: &str) -> String {
        for backend in &self.backends {
            match backend.translate(key).await {
                Ok(Some(out)) => {
                    tracing::debug!(backend = backend.name(), source = key, "translated");
                    return out;
                }
                Ok(None) => {
                    tracing::debug!(backend = backend.name(), source = key, "no translation returned");
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = %e, "translation backend failed");
                }
            }
        }
        transliterate(key).unwrap_or_else(|| key.to_owned())
    }
}
