//! In-memory stand-in for the valuation portal.
//!
//! `FakePortal` implements `BrowserPage` over a small state machine that
//! behaves like the live site: the form sits in an inner frame, every
//! dropdown only fills once the previous one is chosen, the sub-zone grid
//! pages through a numbered pager and the detail textarea lives in the outer
//! document.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use igr_core::MatchMode;
use igr_scraper::dom::{InputInfo, RadioInfo, SelectOption};
use igr_scraper::{BrowserPage, FrameRef, ScrapeError, ScraperSettings, SiteProfile};

pub const FORM: FrameRef = FrameRef(1);

const YEARS: [&str; 2] = ["2023-2024", "2024-2025"];
const DISTRICTS: [&str; 3] = ["Pune", "Thane", "Thane Rural"];
const TALUKAS: [&str; 2] = ["Ambarnath", "Bhiwandi"];
const VILLAGES: [&str; 2] = ["Ambhe", "Kalyan"];

/// One row of the sub-zone grid.
#[derive(Debug, Clone)]
pub struct SubZone {
    pub label: String,
    pub rate: String,
    pub detail: String,
}

pub fn zone(label: &str, rate: &str, detail: &str) -> SubZone {
    SubZone {
        label: label.to_owned(),
        rate: rate.to_owned(),
        detail: detail.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Survey,
    SubZone,
}

#[derive(Debug, Default)]
struct State {
    gotos: usize,
    last_url: String,
    closed: bool,
    fallback: bool,
    district: Option<String>,
    year: Option<String>,
    taluka: Option<String>,
    village: Option<String>,
    mode: Option<Mode>,
    survey_input: String,
    searched: bool,
    page: usize,
    detail: String,
}

/// Behaviour switches and content of the fake portal.
pub struct FakePortal {
    site: SiteProfile,
    /// Whether the district query string opens the form directly.
    pub district_query_works: bool,
    /// Whether the pager ignores clicks.
    pub stuck_pager: bool,
    /// Whether the bare entry page shows a language dropdown ahead of the
    /// district one.
    pub language_select: bool,
    /// Whether checking a radio by its caption fails after a click.
    pub failing_radio_check: bool,
    /// Queries addressed to the first `<select>` of a frame.
    generic_select_queries: AtomicUsize,
    pages: Vec<Vec<SubZone>>,
    /// Survey base number to the sub-zone labels the lookup lists.
    lookup: Vec<(String, Vec<String>)>,
    state: Mutex<State>,
}

impl FakePortal {
    pub fn new(pages: Vec<Vec<SubZone>>) -> Self {
        Self {
            site: SiteProfile::igr(),
            district_query_works: true,
            stuck_pager: false,
            language_select: false,
            failing_radio_check: false,
            generic_select_queries: AtomicUsize::new(0),
            pages,
            lookup: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// The Ambhe village used by most scenarios: the target sub-zone is on
    /// page two of two.
    pub fn ambhe() -> Self {
        Self::new(vec![
            vec![
                zone("Ambhe 10/1", "15000", "Survey No 10/1 : Ambhe"),
                zone("Ambhe 77", "16000", "Survey No 77, 78 : Ambhe"),
            ],
            vec![
                zone("Ambhe 123 part", "18500", "Survey No 123 A, 45 : Ambhe"),
                zone("Ambhe 200", "12000", "Survey No 200 : Ambhe"),
            ],
        ])
        .with_lookup("123", &["Ambhe 123 part"])
    }

    pub fn with_lookup(mut self, base: &str, labels: &[&str]) -> Self {
        self.lookup.push((
            base.to_owned(),
            labels.iter().map(|l| (*l).to_owned()).collect(),
        ));
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("fake portal state poisoned")
    }

    pub fn goto_count(&self) -> usize {
        self.lock().gotos
    }

    pub fn last_url(&self) -> String {
        self.lock().last_url.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn generic_select_queries(&self) -> usize {
        self.generic_select_queries.load(Ordering::SeqCst)
    }

    pub fn current_page(&self) -> usize {
        self.lock().page + 1
    }

    /// Jumps straight to a filled-in form showing the sub-zone grid.
    pub fn open_grid(&self) {
        let mut s = self.lock();
        s.district = Some("Thane".to_owned());
        s.year = Some(YEARS[1].to_owned());
        s.taluka = Some(TALUKAS[0].to_owned());
        s.village = Some(VILLAGES[0].to_owned());
        s.mode = Some(Mode::SubZone);
    }

    fn lookup_labels(&self, survey: &str) -> Option<&[String]> {
        self.lookup
            .iter()
            .find(|(base, _)| base == survey.trim())
            .map(|(_, labels)| labels.as_slice())
    }

    fn grid_visible(&self, s: &State) -> bool {
        s.village.is_some() && s.mode == Some(Mode::SubZone)
    }

    fn results_visible(&self, s: &State) -> bool {
        s.searched
            && s.mode == Some(Mode::Survey)
            && self.lookup_labels(&s.survey_input).is_some()
    }

    fn options(values: &[&str]) -> Vec<SelectOption> {
        let mut out = vec![SelectOption {
            value: String::new(),
            text: "--Select--".to_owned(),
        }];
        out.extend(values.iter().map(|v| SelectOption {
            value: (*v).to_owned(),
            text: (*v).to_owned(),
        }));
        out
    }

    fn selects(&self, s: &State) -> Vec<(String, Vec<SelectOption>)> {
        let mut out = Vec::new();
        if s.fallback && s.district.is_none() {
            if self.language_select {
                out.push(("#ddlLanguage".to_owned(), Self::options(&["English", "Marathi"])));
            }
            out.push(("#ddlDistrict".to_owned(), Self::options(&DISTRICTS)));
        }
        if s.district.is_some() {
            out.push((self.site.year_select.clone(), Self::options(&YEARS)));
            let talukas: &[&str] = if s.year.is_some() { &TALUKAS } else { &[] };
            out.push((self.site.taluka_select.clone(), Self::options(talukas)));
            let villages: &[&str] = if s.taluka.is_some() { &VILLAGES } else { &[] };
            out.push((self.site.village_select.clone(), Self::options(villages)));
        }
        out
    }

    fn find_select(&self, s: &State, selector: &str) -> Option<(String, Vec<SelectOption>)> {
        let selects = self.selects(s);
        if selector == "select" {
            self.generic_select_queries.fetch_add(1, Ordering::SeqCst);
            return selects.into_iter().next();
        }
        selects.into_iter().find(|(id, _)| id == selector)
    }

    fn apply_select(&self, s: &mut State, id: &str, value: &str) -> bool {
        let Some((_, options)) = self.find_select(s, id) else {
            return false;
        };
        if value.is_empty() || !options.iter().any(|o| o.value == value) {
            return false;
        }
        let value = Some(value.to_owned());
        if id == self.site.year_select {
            s.year = value;
        } else if id == self.site.taluka_select {
            s.taluka = value;
            s.village = None;
        } else if id == self.site.village_select {
            s.village = value;
        } else {
            s.district = value;
        }
        true
    }

    fn grid_html(&self, page: usize) -> String {
        let mut html =
            String::from("<tbody><tr><th>SurveyNo</th><th>SubZone</th><th>Rate</th></tr>");
        for z in self.pages.get(page).into_iter().flatten() {
            html.push_str(&format!(
                "<tr><td><a href=\"#\">SurveyNo</a></td><td>{}</td><td>{}</td></tr>",
                z.label, z.rate
            ));
        }
        if self.pages.len() > 1 {
            html.push_str("<tr class=\"cssPager\"><td colspan=\"3\"><table><tr>");
            for n in 1..=self.pages.len() {
                if n == page + 1 {
                    html.push_str(&format!("<td><span>{n}</span></td>"));
                } else {
                    html.push_str(&format!("<td><a href=\"#\">{n}</a></td>"));
                }
            }
            html.push_str("</tr></table></td></tr>");
        }
        html.push_str("</tbody>");
        html
    }

    fn results_html(&self, labels: &[String]) -> String {
        let mut html = String::from("<tbody><tr><th>SubZone</th></tr>");
        for label in labels {
            html.push_str(&format!("<tr><td>{label}</td></tr>"));
        }
        html.push_str("</tbody>");
        html
    }

    fn press(&self, s: &mut State, text: &str, exact: bool) -> bool {
        let matches = |caption: &str| {
            let (caption, text) = (caption.to_lowercase(), text.to_lowercase());
            if exact {
                caption == text
            } else {
                caption.contains(&text)
            }
        };
        if s.village.is_none() {
            return false;
        }
        if matches(&self.site.subzone_radio.caption) {
            s.mode = Some(Mode::SubZone);
            s.searched = false;
            s.page = 0;
            true
        } else if matches(&self.site.survey_radio.caption) {
            s.mode = Some(Mode::Survey);
            true
        } else if matches(&self.site.search_caption) {
            s.searched = s.mode == Some(Mode::Survey) && !s.survey_input.is_empty();
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl BrowserPage for FakePortal {
    async fn goto(&self, url: &str) -> Result<(), ScrapeError> {
        let mut s = self.lock();
        let gotos = s.gotos + 1;
        *s = State {
            gotos,
            last_url: url.to_owned(),
            ..State::default()
        };
        if url.ends_with(&format!("{}=", self.site.district_param)) {
            s.fallback = true;
        } else if self.district_query_works {
            s.district = Some("Thane".to_owned());
        }
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<FrameRef>, ScrapeError> {
        Ok(vec![FrameRef::MAIN, FORM])
    }

    async fn exists(&self, frame: FrameRef, selector: &str) -> Result<bool, ScrapeError> {
        let s = self.lock();
        if frame == FrameRef::MAIN {
            return Ok(selector == self.site.detail_field && !s.last_url.is_empty());
        }
        if selector == self.site.subzone_grid {
            return Ok(self.grid_visible(&s));
        }
        if selector == self.site.survey_results_grid {
            return Ok(self.results_visible(&s));
        }
        Ok(self.find_select(&s, selector).is_some())
    }

    async fn inner_html(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Option<String>, ScrapeError> {
        let s = self.lock();
        if frame != FORM {
            return Ok(None);
        }
        if selector == self.site.subzone_grid && self.grid_visible(&s) {
            return Ok(Some(self.grid_html(s.page)));
        }
        if selector == self.site.survey_results_grid && self.results_visible(&s) {
            let labels = self.lookup_labels(&s.survey_input).unwrap_or_default();
            return Ok(Some(self.results_html(labels)));
        }
        Ok(None)
    }

    async fn select_options(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Vec<SelectOption>, ScrapeError> {
        if frame != FORM {
            return Ok(Vec::new());
        }
        let s = self.lock();
        Ok(self
            .find_select(&s, selector)
            .map(|(_, options)| options)
            .unwrap_or_default())
    }

    async fn select_value(
        &self,
        frame: FrameRef,
        selector: &str,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        if frame != FORM {
            return Ok(false);
        }
        let mut s = self.lock();
        let Some((id, _)) = self.find_select(&s, selector) else {
            return Ok(false);
        };
        Ok(self.apply_select(&mut s, &id, value))
    }

    async fn all_selects(&self, frame: FrameRef) -> Result<Vec<Vec<SelectOption>>, ScrapeError> {
        if frame != FORM {
            return Ok(Vec::new());
        }
        let s = self.lock();
        Ok(self.selects(&s).into_iter().map(|(_, o)| o).collect())
    }

    async fn select_nth(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        if frame != FORM {
            return Ok(false);
        }
        let mut s = self.lock();
        let Some((id, _)) = self.selects(&s).into_iter().nth(index) else {
            return Ok(false);
        };
        Ok(self.apply_select(&mut s, &id, value))
    }

    async fn click_text(
        &self,
        frame: FrameRef,
        text: &str,
        exact: bool,
    ) -> Result<bool, ScrapeError> {
        if frame != FORM {
            return Ok(false);
        }
        let mut s = self.lock();
        Ok(self.press(&mut s, text, exact))
    }

    async fn click_matching(
        &self,
        frame: FrameRef,
        selector: &str,
        text: &str,
        _last: bool,
    ) -> Result<bool, ScrapeError> {
        let mut s = self.lock();
        if frame != FORM || selector != self.site.pager_links || !self.grid_visible(&s) {
            return Ok(false);
        }
        let Ok(n) = text.parse::<usize>() else {
            return Ok(false);
        };
        if n == 0 || n > self.pages.len() || n == s.page + 1 {
            return Ok(false);
        }
        if !self.stuck_pager {
            s.page = n - 1;
        }
        Ok(true)
    }

    async fn check_radio_near_text(
        &self,
        frame: FrameRef,
        text: &str,
    ) -> Result<bool, ScrapeError> {
        if frame != FORM {
            return Ok(false);
        }
        if self.failing_radio_check {
            return Err(ScrapeError::Script {
                context: "check radio near text".to_owned(),
                reason: "no radio next to the caption".to_owned(),
            });
        }
        let mut s = self.lock();
        Ok(self.press(&mut s, text, false))
    }

    async fn radios(&self, frame: FrameRef) -> Result<Vec<RadioInfo>, ScrapeError> {
        if frame != FORM {
            return Ok(Vec::new());
        }
        Ok(vec![
            RadioInfo {
                index: 0,
                id: "rbSurvey".to_owned(),
                label_for: self.site.survey_radio.caption.clone(),
                ..RadioInfo::default()
            },
            RadioInfo {
                index: 1,
                id: "rbSubZone".to_owned(),
                label_for: self.site.subzone_radio.caption.clone(),
                ..RadioInfo::default()
            },
        ])
    }

    async fn check_radio(&self, frame: FrameRef, index: usize) -> Result<bool, ScrapeError> {
        let caption = match index {
            0 => self.site.survey_radio.caption.clone(),
            1 => self.site.subzone_radio.caption.clone(),
            _ => return Ok(false),
        };
        self.click_text(frame, &caption, true).await
    }

    async fn text_inputs(&self, frame: FrameRef) -> Result<Vec<InputInfo>, ScrapeError> {
        if frame != FORM || self.lock().village.is_none() {
            return Ok(Vec::new());
        }
        Ok(vec![InputInfo {
            index: 0,
            id: self.site.survey_input_id.clone(),
            next_button: self.site.search_caption.clone(),
            ..InputInfo::default()
        }])
    }

    async fn fill_input(
        &self,
        frame: FrameRef,
        index: usize,
        value: &str,
    ) -> Result<bool, ScrapeError> {
        if frame != FORM || index != 0 {
            return Ok(false);
        }
        self.lock().survey_input = value.to_owned();
        Ok(true)
    }

    async fn click_row_link(
        &self,
        frame: FrameRef,
        table_selector: &str,
        row_index: usize,
    ) -> Result<bool, ScrapeError> {
        let mut s = self.lock();
        if frame != FORM || table_selector != self.site.subzone_grid || !self.grid_visible(&s) {
            return Ok(false);
        }
        // Row 0 is the header.
        let Some(zone) = row_index
            .checked_sub(1)
            .and_then(|i| self.pages.get(s.page).and_then(|rows| rows.get(i)))
        else {
            return Ok(false);
        };
        s.detail = zone.detail.clone();
        Ok(true)
    }

    async fn value_of(
        &self,
        frame: FrameRef,
        selector: &str,
    ) -> Result<Option<String>, ScrapeError> {
        if frame != FrameRef::MAIN || selector != self.site.detail_field {
            return Ok(None);
        }
        Ok(Some(self.lock().detail.clone()))
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.lock().closed = true;
        Ok(())
    }
}

/// Settings tuned for the fake: no postback pauses and short waits.
pub fn fast_settings(mode: MatchMode) -> ScraperSettings {
    ScraperSettings {
        base_url: "https://portal.test/eASRCommon.aspx".to_owned(),
        element_timeout: Duration::from_millis(200),
        poll_interval: Duration::from_millis(5),
        postback_settle: Duration::ZERO,
        page_change_retries: 10,
        detail_poll_attempts: 10,
        match_mode: mode,
        translate_admin: false,
        ..ScraperSettings::default()
    }
}
