//! Page-by-page traversal of the sub-zone grid.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::dom::{BrowserPage, FrameRef};
use crate::error::ScrapeError;
use crate::grid::{parse_grid_rows, GridRow};
use crate::site::ScraperSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPage {
    /// 1-based page number.
    pub number: usize,
    pub rows: Vec<GridRow>,
}

fn signature(html: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    hasher.finish()
}

/// Yields grid pages lazily, advancing through the pager only when asked.
///
/// Traversal ends when no next-page control exists, when the grid does not
/// change within the retry budget after a click, when a page repeats, or
/// when the page cap is reached.
pub struct GridPaginator<'a> {
    page: &'a dyn BrowserPage,
    frame: FrameRef,
    settings: &'a ScraperSettings,
    current: usize,
    seen: HashSet<u64>,
    finished: bool,
}

impl<'a> GridPaginator<'a> {
    pub fn new(page: &'a dyn BrowserPage, frame: FrameRef, settings: &'a ScraperSettings) -> Self {
        Self {
            page,
            frame,
            settings,
            current: 0,
            seen: HashSet::new(),
            finished: false,
        }
    }

    /// Pages yielded so far.
    #[must_use]
    pub fn pages_seen(&self) -> usize {
        self.current
    }

    async fn grid_html(&self) -> Result<Option<String>, ScrapeError> {
        self.page
            .inner_html(self.frame, &self.settings.site.subzone_grid)
            .await
    }

    fn emit(&mut self, html: &str) -> Option<GridPage> {
        if !self.seen.insert(signature(html)) {
            tracing::debug!(page = self.current + 1, "grid page repeated, stopping");
            self.finished = true;
            return None;
        }
        self.current += 1;
        Some(GridPage {
            number: self.current,
            rows: parse_grid_rows(html, &self.settings.site.detail_link_text),
        })
    }

    /// Tries the numbered link, then any grid link with that caption, then
    /// the trailing ellipsis that opens the next block of pages.
    async fn click_next(&self, next: usize) -> Result<bool, ScrapeError> {
        let site = &self.settings.site;
        let caption = next.to_string();
        if self
            .page
            .click_matching(self.frame, &site.pager_links, &caption, false)
            .await?
        {
            return Ok(true);
        }
        if self
            .page
            .click_matching(self.frame, &site.grid_links(), &caption, false)
            .await?
        {
            return Ok(true);
        }
        self.page
            .click_matching(self.frame, &site.pager_links, "...", true)
            .await
    }

    /// The next page of the grid, or `None` once traversal is over.
    ///
    /// # Errors
    ///
    /// Browser errors while reading the grid or clicking the pager.
    pub async fn next_page(&mut self) -> Result<Option<GridPage>, ScrapeError> {
        if self.finished {
            return Ok(None);
        }

        if self.current == 0 {
            let Some(html) = self.grid_html().await? else {
                self.finished = true;
                return Ok(None);
            };
            return Ok(self.emit(&html));
        }

        if self.current >= self.settings.max_pages {
            tracing::warn!(max_pages = self.settings.max_pages, "page cap reached");
            self.finished = true;
            return Ok(None);
        }

        let Some(before) = self.grid_html().await? else {
            self.finished = true;
            return Ok(None);
        };
        let next = self.current + 1;
        if !self.click_next(next).await? {
            tracing::debug!(page = next, "no pager link, grid exhausted");
            self.finished = true;
            return Ok(None);
        }

        for _ in 0..self.settings.page_change_retries {
            tokio::time::sleep(self.settings.poll_interval).await;
            match self.grid_html().await {
                Ok(Some(html)) if html != before => return Ok(self.emit(&html)),
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "grid read failed during page change"),
            }
        }

        tracing::warn!(page = next, "grid did not change after pager click");
        self.finished = true;
        Ok(None)
    }
}
