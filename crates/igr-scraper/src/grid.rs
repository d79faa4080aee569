//! Parsing of the portal's result tables.

use std::sync::LazyLock;

use igr_core::normalize_display;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));

/// One `<tr>` of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridRow {
    /// Position among every `<tr>` of the table, nested pager rows included,
    /// so it can address the same row in the live page.
    pub index: usize,
    pub columns: Vec<String>,
    /// First cell carries the link that opens the row's detail view.
    pub has_detail_link: bool,
}

impl GridRow {
    #[must_use]
    pub fn column(&self, i: usize) -> Option<&str> {
        self.columns.get(i).map(String::as_str)
    }
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_display(&cell.text().collect::<String>())
}

fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
        .collect()
}

/// Parses the inner HTML of a table into rows that have at least one cell.
///
/// A row counts as selectable when its first cell holds a link whose caption
/// contains `detail_link_text` (ignoring case).
#[must_use]
pub fn parse_grid_rows(inner_html: &str, detail_link_text: &str) -> Vec<GridRow> {
    let html = Html::parse_fragment(&format!("<table>{inner_html}</table>"));
    let wanted = detail_link_text.to_lowercase();

    html.select(&ROW)
        .enumerate()
        .filter_map(|(index, tr)| {
            let cells = direct_cells(tr);
            let first = *cells.first()?;
            let has_detail_link = first
                .select(&LINK)
                .any(|a| cell_text(a).to_lowercase().contains(&wanted));
            Some(GridRow {
                index,
                columns: cells.into_iter().map(cell_text).collect(),
                has_detail_link,
            })
        })
        .collect()
}

/// Sub-zone labels listed by the survey lookup grid, header row excluded.
#[must_use]
pub fn lookup_labels(rows: &[GridRow], column: usize) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for row in rows.iter().filter(|r| r.index > 0) {
        if let Some(label) = row.column(column).filter(|l| !l.is_empty()) {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_owned());
            }
        }
    }
    labels
}

/// Area band and rate pairs of the rural land-rate grid.
///
/// Rows with fewer than three cells are skipped, as is the header row.
#[must_use]
pub fn parse_rate_table(inner_html: &str) -> Vec<(String, String)> {
    parse_grid_rows(inner_html, "")
        .into_iter()
        .filter(|row| row.index > 0 && row.columns.len() >= 3)
        .map(|mut row| {
            let rate = std::mem::take(&mut row.columns[2]);
            let band = std::mem::take(&mut row.columns[1]);
            (band, rate)
        })
        .collect()
}
