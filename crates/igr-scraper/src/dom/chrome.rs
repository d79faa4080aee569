use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;

use super::{script, BrowserPage, FrameRef, InputInfo, RadioInfo, SelectOption};
use crate::error::ScrapeError;

/// [`BrowserPage`] backed by a Chrome DevTools page.
#[derive(Clone)]
pub struct ChromePage {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromePage {
    #[must_use]
    pub fn new(page: Page, navigation_timeout: Duration) -> Self {
        Self {
            page,
            navigation_timeout,
        }
    }

    async fn eval<T: DeserializeOwned>(&self, context: &str, js: String) -> Result<T, ScrapeError> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| ScrapeError::Script {
                context: context.to_owned(),
                reason: e.to_string(),
            })?;
        result.into_value::<T>().map_err(|e| ScrapeError::Script {
            context: context.to_owned(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        let timeout_ms = u64::try_from(self.navigation_timeout.as_millis()).unwrap_or(u64::MAX);
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Browser(format!("navigation to {url} failed: {e}"))),
            Err(_) => Err(ScrapeError::NavigationTimeout {
                what: url.to_owned(),
                timeout_ms,
            }),
        }
    }

    async fn frames(&self) -> Result<Vec<FrameRef>, ScrapeError> {
        let count: usize = self.eval("frame enumeration", script::frame_count()).await?;
        Ok((0..count.max(1)).map(FrameRef).collect())
    }

    async fn exists(&self, frame: FrameRef, selector: &str) -> Result<bool, ScrapeError> {
        self.eval("element lookup", script::exists(frame, selector))
            .await
    }

    async fn inner_html(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Option<String>, ScrapeError> {
        self.eval("inner html", script::inner_html(frame, selector))
            .await
    }

    async fn select_options(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Vec<SelectOption>, ScrapeError> {
        self.eval("select options", script::select_options(frame, selector))
            .await
    }

    async fn select_value(
        &self,
        frame: FrameRef,
        selector: &str,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        self.eval("select value", script::select_value(frame, selector, value))
            .await
    }

    async fn all_selects(&self, frame: FrameRef) -> Result<Vec<Vec<SelectOption>>, ScrapeError> {
        self.eval("select scan", script::all_selects(frame)).await
    }

    async fn select_nth(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        self.eval("select by position", script::select_nth(frame, index, value))
            .await
    }

    async fn click_text(
        &self,
        frame: FrameRef,
        text: &str,
        exact: bool,
    ) -> Result<bool, ScrapeError> {
        self.eval("click by text", script::click_text(frame, text, exact))
            .await
    }

    async fn click_matching(
        &self,
        frame: FrameRef,
        selector: &str,
        text: &str,
        last: bool,
    ) -> Result<bool, ScrapeError> {
        self.eval("click link", script::click_matching(frame, selector, text, last))
            .await
    }

    async fn check_radio_near_text(
        &self,
        frame: FrameRef,
        text: &str,
    ) -> Result<bool, ScrapeError> {
        self.eval("radio by label", script::check_radio_near_text(frame, text))
            .await
    }

    async fn radios(&self, frame: FrameRef) -> Result<Vec<RadioInfo>, ScrapeError> {
        self.eval("radio scan", script::radios(frame)).await
    }

    async fn check_radio(&self, frame: FrameRef, index: usize) -> Result<bool, ScrapeError> {
        self.eval("radio check", script::check_radio(frame, index))
            .await
    }

    async fn text_inputs(&self, frame: FrameRef) -> Result<Vec<InputInfo>, ScrapeError> {
        self.eval("input scan", script::text_inputs(frame)).await
    }

    async fn fill_input(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        self.eval("input fill", script::fill_input(frame, index, value))
            .await
    }

    async fn click_row_link(
        &self,
        frame: FrameRef,
        table_selector: &str,
        row_index: usize,
    ) -> Result<bool, ScrapeError> {
        self.eval(
            "row link",
            script::click_row_link(frame, table_selector, row_index),
        )
        .await
    }

    async fn value_of(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Option<String>, ScrapeError> {
        self.eval("field value", script::value_of(frame, selector))
            .await
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| ScrapeError::Browser(format!("closing page failed: {e}")))
    }
}
