//! Driving the portal's cascading search form.
//!
//! The form only moves forward: district, year, taluka, village, then the
//! search mode. Each dropdown change posts the page back and repopulates the
//! next dropdown, so every step re-resolves its control from scratch.

use std::fmt;

use igr_core::normalize_display;
use tokio::time::Instant;

use crate::dom::{find_frame, locate, BrowserPage, InputInfo, RadioInfo, SelectOption};
use crate::error::ScrapeError;
use crate::site::{RadioTarget, ScraperSettings};
use crate::strategy::FallbackChain;
use crate::translate::Translator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormState {
    Idle,
    DistrictSet,
    YearSet,
    TalukaSet,
    VillageSet,
    ReadyToSearch,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormState::Idle => "idle",
            FormState::DistrictSet => "district set",
            FormState::YearSet => "year set",
            FormState::TalukaSet => "taluka set",
            FormState::VillageSet => "village set",
            FormState::ReadyToSearch => "ready to search",
        };
        f.write_str(s)
    }
}

/// Picks the option whose caption equals `label` (ignoring case), else the
/// first whose caption contains it. Placeholder options without a value are
/// never picked.
#[must_use]
pub fn pick_option<'o>(options: &'o [SelectOption], label: &str) -> Option<&'o SelectOption> {
    let want = normalize_display(label).to_lowercase();
    if want.is_empty() {
        return None;
    }
    let usable = || options.iter().filter(|o| !o.value.trim().is_empty());
    let caption = |o: &SelectOption| normalize_display(&o.text).to_lowercase();
    usable()
        .find(|o| caption(o) == want)
        .or_else(|| usable().find(|o| caption(o).contains(&want)))
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    let hay = haystack.to_lowercase();
    needles.iter().any(|n| hay.contains(&n.to_lowercase()))
}

/// Index of the radio whose surrounding text mentions one of `keywords`.
#[must_use]
pub fn radio_by_keywords(radios: &[RadioInfo], keywords: &[String]) -> Option<usize> {
    radios
        .iter()
        .find(|r| r.context().any(|text| contains_any(text, keywords)))
        .map(|r| r.index)
}

type InputPick = fn(&[InputInfo], &ScraperSettings) -> Option<usize>;

fn input_by_id(inputs: &[InputInfo], settings: &ScraperSettings) -> Option<usize> {
    inputs
        .iter()
        .find(|i| i.id == settings.site.survey_input_id)
        .map(|i| i.index)
}

fn input_by_label(inputs: &[InputInfo], settings: &ScraperSettings) -> Option<usize> {
    let keywords = &settings.site.survey_radio.keywords;
    inputs
        .iter()
        .find(|i| contains_any(&i.label, keywords))
        .map(|i| i.index)
}

fn input_by_hint(inputs: &[InputInfo], settings: &ScraperSettings) -> Option<usize> {
    let keywords = &settings.site.survey_radio.keywords;
    inputs
        .iter()
        .find(|i| contains_any(&i.aria_label, keywords) || contains_any(&i.placeholder, keywords))
        .map(|i| i.index)
}

fn input_by_fragment(inputs: &[InputInfo], settings: &ScraperSettings) -> Option<usize> {
    let fragments = &settings.site.survey_input_fragments;
    inputs
        .iter()
        .find(|i| contains_any(&i.id, fragments) || contains_any(&i.name, fragments))
        .map(|i| i.index)
}

fn input_before_search(inputs: &[InputInfo], settings: &ScraperSettings) -> Option<usize> {
    let caption = settings.site.search_caption.to_lowercase();
    inputs
        .iter()
        .find(|i| i.next_button.to_lowercase().contains(&caption))
        .map(|i| i.index)
}

fn input_last(inputs: &[InputInfo], _settings: &ScraperSettings) -> Option<usize> {
    inputs.last().map(|i| i.index)
}

/// Selects the first option matching one of `captions` in any dropdown of
/// any frame.
async fn scan_dropdowns(
    page: &dyn BrowserPage,
    captions: &[String],
) -> Result<Option<String>, ScrapeError> {
    for frame in page.frames().await? {
        for (index, options) in page.all_selects(frame).await?.iter().enumerate() {
            if let Some(option) = captions.iter().find_map(|c| pick_option(options, c)) {
                if page.select_nth(frame, index, &option.value).await? {
                    return Ok(Some(option.text.clone()));
                }
            }
        }
    }
    Ok(None)
}

pub struct FormDriver<'a> {
    page: &'a dyn BrowserPage,
    settings: &'a ScraperSettings,
    translator: Option<&'a Translator>,
    state: FormState,
}

impl<'a> FormDriver<'a> {
    pub fn new(
        page: &'a dyn BrowserPage,
        settings: &'a ScraperSettings,
        translator: Option<&'a Translator>,
    ) -> Self {
        Self {
            page,
            settings,
            translator,
            state: FormState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> FormState {
        self.state
    }

    fn require_state(&self, step: &'static str, required: FormState) -> Result<(), ScrapeError> {
        if self.state == required {
            Ok(())
        } else {
            Err(ScrapeError::FormOrder {
                step,
                state: self.state.to_string(),
            })
        }
    }

    /// Captions to try for an administrative name: the English rendering
    /// when translation is enabled and differs, then the name as given.
    async fn captions(&self, name: &str) -> Vec<String> {
        let name = normalize_display(name);
        let mut out = Vec::with_capacity(2);
        if self.settings.translate_admin {
            if let Some(translator) = self.translator {
                let english = translator.translate(&name).await;
                if !english.is_empty() && english != name {
                    out.push(english);
                }
            }
        }
        out.push(name);
        out
    }

    async fn settle(&self) {
        tokio::time::sleep(self.settings.postback_settle).await;
    }

    /// Selects one of `captions` in the dropdown at `selector`, waiting for
    /// the option to appear; then scans every dropdown in every frame.
    async fn choose(
        &self,
        control: &str,
        selector: &str,
        captions: &[String],
    ) -> Result<String, ScrapeError> {
        let page = self.page;
        let timeout = self.settings.element_timeout;
        let poll = self.settings.poll_interval;

        let (chosen, _) = FallbackChain::new(control)
            .then("known id", move || async move {
                let deadline = Instant::now() + timeout;
                loop {
                    if let Some(frame) = find_frame(page, selector).await {
                        let options = page.select_options(frame, selector).await.unwrap_or_default();
                        let picked = captions.iter().find_map(|c| pick_option(&options, c));
                        if let Some(option) = picked {
                            if page.select_value(frame, selector, &option.value).await? {
                                return Ok(Some(option.text.clone()));
                            }
                        }
                    }
                    if Instant::now() >= deadline {
                        return Ok(None);
                    }
                    tokio::time::sleep(poll).await;
                }
            })
            .then("any dropdown", move || scan_dropdowns(page, captions))
            .run()
            .await?;

        tracing::info!(control, option = %chosen, "option selected");
        self.settle().await;
        Ok(chosen)
    }

    /// Polls every dropdown in every frame for one of `captions` until the
    /// element timeout, for pages where the control has no known id.
    async fn choose_anywhere(
        &self,
        control: &str,
        captions: &[String],
    ) -> Result<String, ScrapeError> {
        let deadline = Instant::now() + self.settings.element_timeout;
        loop {
            if let Some(chosen) = scan_dropdowns(self.page, captions).await? {
                tracing::info!(control, option = %chosen, "option selected from dropdown scan");
                self.settle().await;
                return Ok(chosen);
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::ControlNotFound {
                    control: control.to_owned(),
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn wait_for(&self, control: &str, selector: &str) -> Result<(), ScrapeError> {
        locate(
            self.page,
            selector,
            self.settings.element_timeout,
            self.settings.poll_interval,
        )
        .await
        .map(|_| ())
        .map_err(|_| ScrapeError::ControlNotFound {
            control: control.to_owned(),
        })
    }

    /// Opens the portal for `district`. When the district query does not
    /// bring up the year dropdown, reloads the bare entry page and picks the
    /// district from whatever dropdown lists it.
    pub async fn set_district(&mut self, district: &str) -> Result<String, ScrapeError> {
        self.require_state("district", FormState::Idle)?;
        let captions = self.captions(district).await;
        let site = &self.settings.site;
        let primary = captions.first().map_or(district, String::as_str);

        self.page
            .goto(&site.district_url(&self.settings.base_url, primary))
            .await?;

        let found = locate(
            self.page,
            &site.year_select,
            self.settings.element_timeout,
            self.settings.poll_interval,
        )
        .await;

        let chosen = if found.is_ok() {
            primary.to_owned()
        } else {
            tracing::warn!(district, "district query did not open the form, selecting manually");
            self.page
                .goto(&site.fallback_url(&self.settings.base_url))
                .await?;
            let chosen = self.choose_anywhere("district dropdown", &captions).await?;
            self.wait_for("year dropdown", &site.year_select).await?;
            chosen
        };

        self.state = FormState::DistrictSet;
        Ok(chosen)
    }

    pub async fn set_year(&mut self, year: &str) -> Result<String, ScrapeError> {
        self.require_state("year", FormState::DistrictSet)?;
        let captions = vec![normalize_display(year)];
        let chosen = self
            .choose("year dropdown", &self.settings.site.year_select, &captions)
            .await?;
        self.state = FormState::YearSet;
        Ok(chosen)
    }

    pub async fn set_taluka(&mut self, taluka: &str) -> Result<String, ScrapeError> {
        self.require_state("taluka", FormState::YearSet)?;
        let captions = self.captions(taluka).await;
        let chosen = self
            .choose("taluka dropdown", &self.settings.site.taluka_select, &captions)
            .await?;
        self.state = FormState::TalukaSet;
        Ok(chosen)
    }

    /// Waits for the village dropdown to be populated (more than the
    /// placeholder option) before choosing.
    pub async fn set_village(&mut self, village: &str) -> Result<String, ScrapeError> {
        self.require_state("village", FormState::TalukaSet)?;
        let selector = &self.settings.site.village_select;
        let deadline = Instant::now() + self.settings.element_timeout;
        loop {
            if let Some(frame) = find_frame(self.page, selector).await {
                let options = self
                    .page
                    .select_options(frame, selector)
                    .await
                    .unwrap_or_default();
                if options.len() > 1 {
                    break;
                }
            }
            if Instant::now() >= deadline {
                return Err(ScrapeError::ControlNotFound {
                    control: "village dropdown".to_owned(),
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }

        let captions = self.captions(village).await;
        let chosen = self
            .choose("village dropdown", selector, &captions)
            .await?;
        self.state = FormState::VillageSet;
        Ok(chosen)
    }

    /// Selects a search-mode radio. Allowed once the village is set.
    pub async fn choose_radio(&self, target: &RadioTarget) -> Result<(), ScrapeError> {
        if self.state < FormState::VillageSet {
            return Err(ScrapeError::FormOrder {
                step: "search mode",
                state: self.state.to_string(),
            });
        }
        let page = self.page;
        let caption = target.caption.as_str();
        let keywords = target.keywords.as_slice();

        let frames = page.frames().await?;
        let frames = frames.as_slice();
        let click_then_check = move |exact: bool| async move {
            for &frame in frames {
                if page.click_text(frame, caption, exact).await? {
                    match page.check_radio_near_text(frame, caption).await {
                        Ok(checked) => tracing::debug!(caption, checked, "forced radio check"),
                        Err(e) => tracing::debug!(caption, error = %e, "forced radio check failed"),
                    }
                    return Ok(Some(()));
                }
            }
            Ok::<_, ScrapeError>(None)
        };

        FallbackChain::new(format!("{caption} radio"))
            .then("exact caption", move || click_then_check(true))
            .then("caption substring", move || click_then_check(false))
            .then("label proximity", move || async move {
                for &frame in frames {
                    if page.check_radio_near_text(frame, caption).await? {
                        return Ok(Some(()));
                    }
                }
                Ok(None)
            })
            .then("keyword scan", move || async move {
                for &frame in frames {
                    let radios = page.radios(frame).await?;
                    if let Some(index) = radio_by_keywords(&radios, keywords) {
                        if page.check_radio(frame, index).await? {
                            return Ok(Some(()));
                        }
                    }
                }
                Ok(None)
            })
            .run()
            .await?;

        self.settle().await;
        Ok(())
    }

    /// Types `value` into the survey-number search box.
    pub async fn fill_survey_search(&self, value: &str) -> Result<(), ScrapeError> {
        if self.state < FormState::VillageSet {
            return Err(ScrapeError::FormOrder {
                step: "survey search",
                state: self.state.to_string(),
            });
        }
        let strategies: [(&'static str, InputPick); 6] = [
            ("known id", input_by_id),
            ("label", input_by_label),
            ("aria or placeholder", input_by_hint),
            ("id fragment", input_by_fragment),
            ("before search button", input_before_search),
            ("last input", input_last),
        ];

        let mut chain = FallbackChain::new("survey number input");
        for (name, pick) in strategies {
            let page = self.page;
            let settings = self.settings;
            chain = chain.then(name, move || async move {
                for frame in page.frames().await? {
                    let inputs = page.text_inputs(frame).await?;
                    if let Some(index) = pick(&inputs, settings) {
                        if page.fill_input(frame, index, value).await? {
                            return Ok(Some(()));
                        }
                    }
                }
                Ok(None)
            });
        }
        chain.run().await?;
        Ok(())
    }

    /// Presses the search button, by exact caption first.
    pub async fn click_search(&self) -> Result<(), ScrapeError> {
        let page = self.page;
        let caption = self.settings.site.search_caption.as_str();
        let press = move |exact: bool| async move {
            for frame in page.frames().await? {
                if page.click_text(frame, caption, exact).await? {
                    return Ok(Some(()));
                }
            }
            Ok::<_, ScrapeError>(None)
        };
        FallbackChain::new("search button")
            .then("exact caption", move || press(true))
            .then("caption substring", move || press(false))
            .run()
            .await?;
        self.settle().await;
        Ok(())
    }

    /// Marks the form complete once the result mode has been chosen.
    pub fn mark_ready(&mut self) -> Result<(), ScrapeError> {
        self.require_state("ready", FormState::VillageSet)?;
        self.state = FormState::ReadyToSearch;
        Ok(())
    }
}
