//! Integration tests for `Translator` over the HTTP backends.
//!
//! Each test stands up local `wiremock` servers in place of the public
//! translation endpoints and uses a private cache so tests do not see each
//! other's results.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use igr_scraper::translate::{
    http_client, GoogleGtx, MyMemory, TranslationBackend, TranslationCache, Translator,
};

fn client() -> reqwest::Client {
    http_client(Duration::from_secs(5)).expect("failed to build test client")
}

fn gtx(server: &MockServer) -> Box<dyn TranslationBackend> {
    Box::new(GoogleGtx::new(client(), format!("{}/translate_a/single", server.uri()), 0))
}

fn mymemory(server: &MockServer) -> Box<dyn TranslationBackend> {
    Box::new(MyMemory::new(client(), format!("{}/get", server.uri()), 0))
}

fn translator(backends: Vec<Box<dyn TranslationBackend>>) -> Translator {
    Translator::with_cache(backends, Arc::new(TranslationCache::new()))
}

// ---------------------------------------------------------------------------
// Primary backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn primary_backend_translation_is_used() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_a/single"))
        .and(query_param("client", "gtx"))
        .and(query_param("sl", "mr"))
        .and(query_param("tl", "en"))
        .and(query_param("q", "ठाणे"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[["Thane", "ठाणे", null]], null, "mr"])),
        )
        .expect(1)
        .mount(&primary)
        .await;

    let t = translator(vec![gtx(&primary)]);
    assert_eq!(t.translate("ठाणे").await, "Thane");
}

// ---------------------------------------------------------------------------
// Fallback order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn secondary_backend_used_when_primary_fails() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&primary)
        .await;

    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get"))
        .and(query_param("langpair", "mr|en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseData": {"translatedText": "Ambarnath"},
            "responseStatus": 200
        })))
        .expect(1)
        .mount(&secondary)
        .await;

    let t = translator(vec![gtx(&primary), mymemory(&secondary)]);
    assert_eq!(t.translate("अंबरनाथ").await, "Ambarnath");
}

#[tokio::test]
async fn secondary_quota_error_status_counts_as_no_translation() {
    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responseData": {"translatedText": "MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS"},
            "responseStatus": "429"
        })))
        .mount(&secondary)
        .await;

    let t = translator(vec![mymemory(&secondary)]);
    let out = t.translate("अंबे").await;
    assert!(out.is_ascii(), "expected transliteration, got {out}");
    assert!(!out.contains("MYMEMORY"));
}

#[tokio::test]
async fn transliteration_when_every_backend_fails() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .mount(&primary)
        .await;
    let secondary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&secondary)
        .await;

    let t = translator(vec![gtx(&primary), mymemory(&secondary)]);
    let out = t.translate("ठाणे").await;
    assert!(!out.is_empty());
    assert!(out.is_ascii(), "expected ASCII transliteration, got {out}");
}

// ---------------------------------------------------------------------------
// Cache and short-circuits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_text_is_served_from_cache() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[["Bhiwandi", "भिवंडी", null]]])),
        )
        .expect(1)
        .mount(&primary)
        .await;

    let t = translator(vec![gtx(&primary)]);
    assert_eq!(t.translate("भिवंडी").await, "Bhiwandi");
    assert_eq!(t.translate("  भिवंडी ").await, "Bhiwandi");
    assert_eq!(t.cache().len(), 1);
}

#[tokio::test]
async fn ascii_and_blank_text_never_reach_the_network() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[["x", "y"]]])))
        .expect(0)
        .mount(&primary)
        .await;

    let t = translator(vec![gtx(&primary)]);
    assert_eq!(t.translate("Thane").await, "Thane");
    assert_eq!(t.translate("").await, "");
}

#[tokio::test]
async fn shared_cache_is_visible_across_translators() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[["Kalyan", "कल्याण"]]])))
        .expect(1)
        .mount(&primary)
        .await;

    let cache = Arc::new(TranslationCache::new());
    let first = Translator::with_cache(vec![gtx(&primary)], Arc::clone(&cache));
    let second = Translator::with_cache(vec![gtx(&primary)], Arc::clone(&cache));

    let (a, b) = tokio::join!(first.translate("कल्याण"), async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        second.translate("कल्याण").await
    });
    assert_eq!(a, "Kalyan");
    assert_eq!(b, "Kalyan");
}
