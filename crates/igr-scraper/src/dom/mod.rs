//! Frame-addressed browser primitives.
//!
//! The portal renders its form inside nested frames and rebuilds them on
//! every postback, so nothing here holds element handles. Each call names a
//! frame by position and a selector or text, and the implementation resolves
//! it fresh against the live document.

pub mod chrome;
pub mod locator;
mod script;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

pub use chrome::ChromePage;
pub use locator::{find_frame, find_in_any, locate};

/// A document within a page. `FrameRef::MAIN` is the top-level document;
/// embedded frames follow in depth-first document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef(pub usize);

impl FrameRef {
    pub const MAIN: FrameRef = FrameRef(0);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// A radio button together with the text around it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RadioInfo {
    pub index: usize,
    pub id: String,
    /// Text of the `label[for]` pointing at the radio.
    pub label_for: String,
    /// Text of the next sibling label, if any.
    pub next_label: String,
    /// Text of the enclosing cell or row.
    pub container: String,
}

impl RadioInfo {
    pub fn context(&self) -> impl Iterator<Item = &str> {
        [
            self.label_for.as_str(),
            self.next_label.as_str(),
            self.container.as_str(),
        ]
        .into_iter()
    }
}

/// A visible text input and the attributes used to identify it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputInfo {
    pub index: usize,
    pub id: String,
    pub name: String,
    pub aria_label: String,
    pub placeholder: String,
    /// Text of the nearest preceding label.
    pub label: String,
    /// Caption of the first button after the input.
    pub next_button: String,
}

#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError>;

    /// Frames currently reachable, main document first.
    async fn frames(&self) -> Result<Vec<FrameRef>, ScrapeError>;

    async fn exists(&self, frame: FrameRef, selector: &str) -> Result<bool, ScrapeError>;

    async fn inner_html(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Option<String>, ScrapeError>;

    /// Options of the first `<select>` matching `selector`; empty when absent.
    async fn select_options(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Vec<SelectOption>, ScrapeError>;

    /// Selects `value` and fires the change events. Returns `false` when the
    /// select or the option is missing.
    async fn select_value(
        &self,
        frame: FrameRef,
        selector: &str,
        value: &str,
    ) -> Result<bool, ScrapeError>;

    /// Options of every `<select>` in the frame, in document order.
    async fn all_selects(&self, frame: FrameRef) -> Result<Vec<Vec<SelectOption>>, ScrapeError>;

    async fn select_nth(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError>;

    /// Clicks the innermost element whose visible text equals (or, when
    /// `exact` is false, contains) `text`, ignoring case.
    async fn click_text(&self, frame: FrameRef, text: &str, exact: bool)
        -> Result<bool, ScrapeError>;

    /// Clicks an element matching `selector` whose text equals `text`: the
    /// first in document order, or the last when `last` is set.
    async fn click_matching(
        &self,
        frame: FrameRef,
        selector: &str,
        text: &str,
        last: bool,
    ) -> Result<bool, ScrapeError>;

    /// Checks the radio associated with a label or cell containing `text`.
    async fn check_radio_near_text(&self, frame: FrameRef, text: &str)
        -> Result<bool, ScrapeError>;

    async fn radios(&self, frame: FrameRef) -> Result<Vec<RadioInfo>, ScrapeError>;

    async fn check_radio(&self, frame: FrameRef, index: usize) -> Result<bool, ScrapeError>;

    async fn text_inputs(&self, frame: FrameRef) -> Result<Vec<InputInfo>, ScrapeError>;

    async fn fill_input(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError>;

    /// Clicks the first link inside row `row_index` of the table matching
    /// `table_selector`. Rows are counted over every `<tr>` in the table.
    async fn click_row_link(
        &self,
        frame: FrameRef,
        table_selector: &str,
        row_index: usize,
    ) -> Result<bool, ScrapeError>;

    /// Current `value` of a form field such as a textarea.
    async fn value_of(&self, frame: FrameRef, selector: &str)
        -> Result<Option<String>, ScrapeError>;

    async fn close(&self) -> Result<(), ScrapeError>;
}
