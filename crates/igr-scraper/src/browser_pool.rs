//! A fixed set of lazily launched Chrome instances.
//!
//! Each scrape leases a fresh page in one of the browsers, so concurrent
//! scrapes never share form state. The number of simultaneous leases is
//! bounded by the pool size.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::dom::{BrowserPage, ChromePage};
use crate::error::ScrapeError;

#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

struct BrowserSlot {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSlot {
    async fn launch(settings: &LaunchSettings) -> Result<Self, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1366, 900)
            .request_timeout(settings.navigation_timeout)
            .args([
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--no-first-run",
                "--disable-default-apps",
                "--disable-features=TranslateUI",
                "--lang=en-IN",
            ]);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let Err(e) = event else { continue };
                let message = e.to_string();
                // chromiumoxide does not model every CDP event Chrome emits.
                if message.contains("did not match any variant") {
                    continue;
                }
                if message.contains("connection closed")
                    || message.contains("websocket closed")
                    || message.contains("io error")
                {
                    tracing::warn!(error = %e, "browser connection lost");
                    break;
                }
                tracing::debug!(error = %e, "CDP handler error");
            }
            tracing::debug!("CDP handler finished");
        });

        tracing::info!(headless = settings.headless, "browser launched");
        Ok(Self { browser, handler })
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!(error = %e, "browser close failed");
        }
        self.handler.abort();
    }
}

pub struct BrowserPool {
    slots: Vec<Mutex<Option<BrowserSlot>>>,
    permits: Arc<Semaphore>,
    launch: LaunchSettings,
}

impl BrowserPool {
    /// A pool of `size` browsers (at least one). Nothing is launched until
    /// the first lease.
    #[must_use]
    pub fn new(size: usize, launch: LaunchSettings) -> Self {
        let size = size.max(1);
        Self {
            slots: (0..size).map(|_| Mutex::new(None)).collect(),
            permits: Arc::new(Semaphore::new(size)),
            launch,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Opens a blank page in the browser assigned to `worker`, launching it
    /// if needed. Waits while every slot is leased.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Browser`] if the browser cannot be launched or
    /// the page cannot be opened. A browser that fails to open a page is shut
    /// down so the next lease relaunches it.
    pub async fn lease(&self, worker: usize) -> Result<PageLease, ScrapeError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| ScrapeError::Browser("browser pool is shut down".to_owned()))?;

        let index = worker % self.slots.len();
        let Some(slot) = self.slots.get(index) else {
            return Err(ScrapeError::Browser(format!("no browser slot {index}")));
        };
        let mut guard = slot.lock().await;
        let instance = match guard.take() {
            Some(instance) => instance,
            None => BrowserSlot::launch(&self.launch).await?,
        };

        match instance.browser.new_page("about:blank").await {
            Ok(page) => {
                *guard = Some(instance);
                tracing::debug!(slot = index, "page leased");
                Ok(PageLease {
                    page: ChromePage::new(page, self.launch.navigation_timeout),
                    closed: false,
                    _permit: permit,
                })
            }
            Err(e) => {
                instance.shutdown().await;
                Err(ScrapeError::Browser(format!("failed to open page: {e}")))
            }
        }
    }

    /// Closes every launched browser and refuses further leases.
    pub async fn shutdown(&self) {
        self.permits.close();
        for slot in &self.slots {
            if let Some(instance) = slot.lock().await.take() {
                instance.shutdown().await;
            }
        }
        tracing::info!("browser pool shut down");
    }
}

/// A page leased from the pool. Closing it (or dropping it) releases the
/// slot for the next scrape.
pub struct PageLease {
    page: ChromePage,
    closed: bool,
    _permit: OwnedSemaphorePermit,
}

impl PageLease {
    #[must_use]
    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    pub async fn close(mut self) {
        self.closed = true;
        if let Err(e) = self.page.close().await {
            tracing::debug!(error = %e, "page close failed");
        }
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let page = self.page.clone();
        handle.spawn(async move {
            if let Err(e) = page.close().await {
                tracing::debug!(error = %e, "page close on drop failed");
            }
        });
    }
}
