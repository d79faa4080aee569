//! End-to-end scrape sessions against an in-memory portal.
//!
//! Scenarios covered:
//!   1. Matching modes: the default survey-number match, lookup and scan-all
//!   2. Unknown survey numbers end with a no-match error
//!   3. Malformed survey numbers become warnings or fail before navigation
//!   4. The district dropdown fallback when the query string is ignored
//!   5. Form steps out of order are refused
//!   6. Verification requires every survey number in the detail text
//!   7. Grid pagination: page count, stuck pager and page cap

mod support;

use igr_core::{MatchMode, ScrapeRequest};
use igr_scraper::form::{FormDriver, FormState};
use igr_scraper::pagination::GridPaginator;
use igr_scraper::{Progress, ScrapeError, Session, Stage, Translator};

use support::{fast_settings, zone, FakePortal, FORM};

fn request(identifiers: &[&str]) -> ScrapeRequest {
    ScrapeRequest {
        district: "Thane".to_owned(),
        year: "2024-2025".to_owned(),
        taluka: "Ambarnath".to_owned(),
        village: "Ambhe".to_owned(),
        identifiers: identifiers.iter().map(|s| (*s).to_owned()).collect(),
    }
}

// ---------------------------------------------------------------------------
// Test 1 – matching modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn default_mode_finds_plain_survey_number() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::default());
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["123A"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.matched_label(), Some("Ambhe 123 part"));
    assert_eq!(result.rate_value(), Some("18500"));
    assert!(result.warnings().is_empty());
}

#[tokio::test]
async fn default_mode_ignores_unrelated_lookup_labels() {
    let portal = FakePortal::new(vec![vec![
        zone("Ambhe 10/1", "15000", "Survey No 10/1 : Ambhe"),
        zone("Ambhe 45", "17250", "Survey No 45 : Ambhe"),
    ]])
    .with_lookup("45", &["Ambhe Gaothan"]);
    let translator = Translator::transliteration_only();

    let by_default = fast_settings(MatchMode::default());
    let result = Session::new(&portal, &by_default, &translator, Progress::silent())
        .run(&request(&["45"]))
        .await;
    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.rate_value(), Some("17250"));

    let lookup = FakePortal::new(vec![vec![zone("Ambhe 45", "17250", "Survey No 45 : Ambhe")]])
        .with_lookup("45", &["Ambhe Gaothan"]);
    let settings = fast_settings(MatchMode::Lookup);
    let result = Session::new(&lookup, &settings, &translator, Progress::silent())
        .run(&request(&["45"]))
        .await;
    assert!(!result.is_success());
}

#[tokio::test]
async fn lookup_mode_finds_rate_on_second_page() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();
    let (progress, mut events) = Progress::channel();

    let result = Session::new(&portal, &settings, &translator, progress)
        .run(&request(&["123/A"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.matched_label(), Some("Ambhe 123 part"));
    assert_eq!(result.rate_value(), Some("18500"));
    assert!(result
        .raw_detail_text()
        .is_some_and(|d| d.contains("123 A")));
    assert!(result.warnings().is_empty());
    assert_eq!(portal.current_page(), 2);

    let mut stages = Vec::new();
    while let Ok(event) = events.try_recv() {
        stages.push(event.stage);
    }
    assert_eq!(stages.first(), Some(&Stage::SelectingDistrict));
    assert!(stages.contains(&Stage::LookingUpSurveys));
    assert!(stages.contains(&Stage::Verifying));
    assert_eq!(stages.last(), Some(&Stage::Done));
}

#[tokio::test]
async fn identifiers_mode_matches_rows_on_survey_number() {
    let portal = FakePortal::new(vec![vec![
        zone("Ambhe 10/1", "15000", "Survey No 10/1 : Ambhe"),
        zone("Ambhe 45", "17250", "Survey No 45 : Ambhe"),
    ]]);
    let settings = fast_settings(MatchMode::Identifiers);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["45"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.rate_value(), Some("17250"));
}

#[tokio::test]
async fn scan_all_mode_verifies_every_row_until_one_confirms() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::ScanAll);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["123/A", "45"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.matched_label(), Some("Ambhe 123 part"));
}

// ---------------------------------------------------------------------------
// Test 2 – no match
// ---------------------------------------------------------------------------

#[tokio::test]
async fn absent_survey_number_exhausts_every_page() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::default());
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["999999Z"]))
        .await;

    assert!(!result.is_success());
    assert_eq!(
        result.message(),
        Some("no matching sub-zone found after exhausting 2 result page(s)")
    );
    assert_eq!(portal.current_page(), 2);
}

#[tokio::test]
async fn unknown_survey_number_reports_no_match() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["999999/Z"]))
        .await;

    assert!(!result.is_success());
    let message = result.message().unwrap_or_default();
    assert!(
        message.contains("no matching sub-zone"),
        "unexpected message: {message}"
    );
    assert!(message.contains("2 result page"));
    assert!(result
        .warnings()
        .iter()
        .any(|w| w.contains("matching on survey numbers")));
}

// ---------------------------------------------------------------------------
// Test 3 – malformed survey numbers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_survey_numbers_are_reported_as_warnings() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["abc", "123/A"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0].contains("\"abc\""));
}

#[tokio::test]
async fn only_malformed_survey_numbers_fail_without_navigating() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["abc", "/"]))
        .await;

    assert!(!result.is_success());
    assert_eq!(
        result.message(),
        Some(ScrapeError::NoUsableIdentifiers.to_string().as_str())
    );
    assert_eq!(portal.goto_count(), 0);
}

#[tokio::test]
async fn blank_village_fails_without_navigating() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();
    let mut req = request(&["123/A"]);
    req.village = "  ".to_owned();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&req)
        .await;

    assert!(!result.is_success());
    assert!(result.message().unwrap_or_default().contains("village"));
    assert_eq!(portal.goto_count(), 0);
}

// ---------------------------------------------------------------------------
// Test 4 – district dropdown fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn district_is_chosen_from_dropdown_when_query_is_ignored() {
    let mut portal = FakePortal::ambhe();
    portal.district_query_works = false;
    let settings = fast_settings(MatchMode::Lookup);

    let mut form = FormDriver::new(&portal, &settings, None);
    let district = form.set_district("thane").await.expect("district set");

    assert_eq!(district, "Thane");
    assert_eq!(form.state(), FormState::DistrictSet);
    assert_eq!(portal.goto_count(), 2);
    assert!(portal.last_url().ends_with("hDistName="));

    form.set_year("2024-2025").await.expect("year set");
    form.set_taluka("Ambarnath").await.expect("taluka set");
    let village = form.set_village("ambhe").await.expect("village set");
    assert_eq!(village, "Ambhe");
    assert_eq!(form.state(), FormState::VillageSet);
}

#[tokio::test]
async fn district_fallback_scans_every_dropdown() {
    let mut portal = FakePortal::ambhe();
    portal.district_query_works = false;
    portal.language_select = true;
    let settings = fast_settings(MatchMode::default());

    let mut form = FormDriver::new(&portal, &settings, None);
    let district = form.set_district("Thane").await.expect("district set");

    assert_eq!(district, "Thane");
    assert_eq!(form.state(), FormState::DistrictSet);
    assert_eq!(portal.generic_select_queries(), 0);
}

#[tokio::test]
async fn district_fallback_without_match_names_the_control() {
    let mut portal = FakePortal::ambhe();
    portal.district_query_works = false;
    let settings = fast_settings(MatchMode::default());

    let mut form = FormDriver::new(&portal, &settings, None);
    let err = form.set_district("Nagpur").await.unwrap_err();

    assert!(
        matches!(err, ScrapeError::ControlNotFound { ref control } if control == "district dropdown"),
        "unexpected error: {err:?}"
    );
    assert_eq!(form.state(), FormState::Idle);
}

// ---------------------------------------------------------------------------
// Test 5 – form order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn year_before_district_is_refused() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let mut form = FormDriver::new(&portal, &settings, None);

    let err = form.set_year("2024-2025").await.unwrap_err();
    assert!(
        matches!(err, ScrapeError::FormOrder { step: "year", .. }),
        "unexpected error: {err:?}"
    );
    assert_eq!(form.state(), FormState::Idle);
    assert_eq!(portal.goto_count(), 0);
}

#[tokio::test]
async fn search_mode_before_village_is_refused() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let mut form = FormDriver::new(&portal, &settings, None);
    form.set_district("Thane").await.expect("district set");
    form.set_year("2024-2025").await.expect("year set");

    let err = form
        .choose_radio(&settings.site.subzone_radio)
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::FormOrder { .. }));

    let err = form.mark_ready().unwrap_err();
    assert!(matches!(err, ScrapeError::FormOrder { step: "ready", .. }));
}

#[tokio::test]
async fn radio_click_stands_when_forced_check_fails() {
    let mut portal = FakePortal::ambhe();
    portal.failing_radio_check = true;
    let settings = fast_settings(MatchMode::default());
    let mut form = FormDriver::new(&portal, &settings, None);
    form.set_district("Thane").await.expect("district set");
    form.set_year("2024-2025").await.expect("year set");
    form.set_taluka("Ambarnath").await.expect("taluka set");
    form.set_village("Ambhe").await.expect("village set");

    form.choose_radio(&settings.site.subzone_radio)
        .await
        .expect("caption click selects the radio");
    form.mark_ready().expect("ready");
    assert_eq!(form.state(), FormState::ReadyToSearch);
}

#[tokio::test]
async fn unknown_taluka_names_the_control() {
    let portal = FakePortal::ambhe();
    let settings = fast_settings(MatchMode::Lookup);
    let mut form = FormDriver::new(&portal, &settings, None);
    form.set_district("Thane").await.expect("district set");
    form.set_year("2024-2025").await.expect("year set");

    let err = form.set_taluka("Nowhere").await.unwrap_err();
    assert!(err.to_string().contains("taluka"), "unexpected error: {err}");
    assert_eq!(form.state(), FormState::YearSet);
}

// ---------------------------------------------------------------------------
// Test 6 – verification gating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_survey_number_must_appear_in_detail() {
    let settings = fast_settings(MatchMode::Lookup);
    let translator = Translator::transliteration_only();

    let both = FakePortal::ambhe();
    let ok = Session::new(&both, &settings, &translator, Progress::silent())
        .run(&request(&["123/A", "45"]))
        .await;
    assert!(ok.is_success(), "expected success, got: {ok:?}");

    let one_missing = FakePortal::ambhe();
    let rejected = Session::new(&one_missing, &settings, &translator, Progress::silent())
        .run(&request(&["123/A", "46"]))
        .await;
    assert!(!rejected.is_success());
    assert!(rejected
        .message()
        .unwrap_or_default()
        .contains("no matching sub-zone"));
}

#[tokio::test]
async fn verified_row_without_rate_is_skipped() {
    let portal = FakePortal::new(vec![vec![
        zone("Ambhe 45", "", "Survey No 45"),
        zone("Ambhe 45 extension", "9900", "Survey No 45 extension"),
    ]]);
    let settings = fast_settings(MatchMode::Identifiers);
    let translator = Translator::transliteration_only();

    let result = Session::new(&portal, &settings, &translator, Progress::silent())
        .run(&request(&["45"]))
        .await;

    assert!(result.is_success(), "expected success, got: {result:?}");
    assert_eq!(result.rate_value(), Some("9900"));
}

// ---------------------------------------------------------------------------
// Test 7 – pagination
// ---------------------------------------------------------------------------

fn three_pages() -> FakePortal {
    FakePortal::new(vec![
        vec![zone("A 1", "100", "1")],
        vec![zone("B 2", "200", "2")],
        vec![zone("C 3", "300", "3")],
    ])
}

async fn count_pages(portal: &FakePortal, settings: &igr_scraper::ScraperSettings) -> usize {
    let mut pages = GridPaginator::new(portal, FORM, settings);
    let mut numbers = Vec::new();
    while let Some(page) = pages.next_page().await.expect("page read") {
        numbers.push(page.number);
    }
    assert_eq!(numbers, (1..=numbers.len()).collect::<Vec<_>>());
    pages.pages_seen()
}

#[tokio::test]
async fn paginator_walks_every_page() {
    let portal = three_pages();
    portal.open_grid();
    let settings = fast_settings(MatchMode::ScanAll);

    assert_eq!(count_pages(&portal, &settings).await, 3);
    assert_eq!(portal.current_page(), 3);
}

#[tokio::test]
async fn paginator_stops_when_pager_does_not_respond() {
    let mut portal = three_pages();
    portal.stuck_pager = true;
    portal.open_grid();
    let settings = fast_settings(MatchMode::ScanAll);

    assert_eq!(count_pages(&portal, &settings).await, 1);
}

#[tokio::test]
async fn paginator_honours_page_cap() {
    let portal = three_pages();
    portal.open_grid();
    let mut settings = fast_settings(MatchMode::ScanAll);
    settings.max_pages = 2;

    assert_eq!(count_pages(&portal, &settings).await, 2);
}

#[tokio::test]
async fn first_page_rows_are_parsed() {
    let portal = FakePortal::ambhe();
    portal.open_grid();
    let settings = fast_settings(MatchMode::ScanAll);

    let mut pages = GridPaginator::new(&portal, FORM, &settings);
    let first = pages
        .next_page()
        .await
        .expect("page read")
        .expect("first page");
    let labelled: Vec<_> = first
        .rows
        .iter()
        .filter(|r| r.has_detail_link)
        .filter_map(|r| r.column(1))
        .collect();
    assert_eq!(labelled, vec!["Ambhe 10/1", "Ambhe 77"]);
}
