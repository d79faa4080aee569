//! Selectors and captions of the eASR valuation portal.

use std::time::Duration;

use igr_core::{AppConfig, MatchMode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// A radio button identified by its caption, with looser keywords used when
/// the caption cannot be found verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioTarget {
    pub caption: String,
    pub keywords: Vec<String>,
}

impl RadioTarget {
    fn new(caption: &str, keywords: &[&str]) -> Self {
        Self {
            caption: caption.to_owned(),
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub district_param: String,
    pub year_select: String,
    pub taluka_select: String,
    pub village_select: String,
    pub subzone_grid: String,
    pub survey_results_grid: String,
    pub rural_grid: String,
    pub survey_input_id: String,
    pub survey_input_fragments: Vec<String>,
    pub pager_links: String,
    pub detail_field: String,
    /// Caption of the link in the first cell of a selectable grid row.
    pub detail_link_text: String,
    pub search_caption: String,
    pub subzone_radio: RadioTarget,
    pub survey_radio: RadioTarget,
    /// Column holding the sub-zone label in the sub-zone grid.
    pub label_column: usize,
    /// Column holding the rate in the sub-zone grid.
    pub rate_column: usize,
    /// Column of the survey lookup grid holding sub-zone labels.
    pub lookup_key_column: usize,
}

impl SiteProfile {
    #[must_use]
    pub fn igr() -> Self {
        Self {
            district_param: "hDistName".to_owned(),
            year_select: "#ctl00_ContentPlaceHolder5_ddlYear".to_owned(),
            taluka_select: "#ctl00_ContentPlaceHolder5_ddlTaluka".to_owned(),
            village_select: "#ctl00_ContentPlaceHolder5_ddlVillage".to_owned(),
            subzone_grid: "#ctl00_ContentPlaceHolder5_dg_Valuation2_0".to_owned(),
            survey_results_grid: "#ctl00_ContentPlaceHolder5_grdUrbanRate".to_owned(),
            rural_grid: "#ctl00_ContentPlaceHolder5_ruralDataGrid".to_owned(),
            survey_input_id: "ctl00_ContentPlaceHolder5_txtCommonSurvey".to_owned(),
            survey_input_fragments: ["survey", "surv", "sno", "gat"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            pager_links: ".cssPager a".to_owned(),
            detail_field: "textarea".to_owned(),
            detail_link_text: "SurveyNo".to_owned(),
            search_caption: "Search".to_owned(),
            subzone_radio: RadioTarget::new(
                "SubZones",
                &["subzone", "sub zone", "sub-zone", "उपविभाग"],
            ),
            survey_radio: RadioTarget::new(
                "Survey No.",
                &["survey", "s.no", "सर्व्हे", "भूमापन", "gat"],
            ),
            label_column: 1,
            rate_column: 2,
            lookup_key_column: 0,
        }
    }

    /// Entry URL with the district preselected through the query string.
    #[must_use]
    pub fn district_url(&self, base_url: &str, district: &str) -> String {
        format!(
            "{}{}{}={}",
            base_url,
            query_joiner(base_url),
            self.district_param,
            utf8_percent_encode(district, NON_ALPHANUMERIC)
        )
    }

    /// Entry URL with an empty district, which shows the district dropdown.
    #[must_use]
    pub fn fallback_url(&self, base_url: &str) -> String {
        format!("{}{}{}=", base_url, query_joiner(base_url), self.district_param)
    }

    /// Selector of the links inside the sub-zone grid, used when the pager
    /// has no style class.
    #[must_use]
    pub fn grid_links(&self) -> String {
        format!("{} a", self.subzone_grid)
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::igr()
    }
}

fn query_joiner(base_url: &str) -> char {
    if base_url.contains('?') {
        '&'
    } else {
        '?'
    }
}

/// Runtime knobs of a scrape session, derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ScraperSettings {
    pub base_url: String,
    pub site: SiteProfile,
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
    pub poll_interval: Duration,
    pub postback_settle: Duration,
    pub page_change_retries: u32,
    pub detail_poll_attempts: u32,
    pub max_pages: usize,
    pub match_mode: MatchMode,
    pub translate_admin: bool,
}

impl ScraperSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            site: SiteProfile::igr(),
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            postback_settle: Duration::from_millis(config.postback_settle_ms),
            page_change_retries: config.page_change_retries,
            detail_poll_attempts: config.detail_poll_attempts,
            max_pages: config.max_pages,
            match_mode: config.match_mode,
            translate_admin: config.translate_admin,
        }
    }
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            base_url: igr_core::config::DEFAULT_BASE_URL.to_owned(),
            site: SiteProfile::igr(),
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(200),
            postback_settle: Duration::from_secs(2),
            page_change_retries: 60,
            detail_poll_attempts: 60,
            max_pages: 50,
            match_mode: MatchMode::default(),
            translate_admin: true,
        }
    }
}
