//! Translation client against a fake translation service

mod common;

use assert_json_diff::assert_json_eq;
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;

use common::{FakeService, ALWAYS_FAIL, BAD_BODY, FLAKY, TOKEN};
use translation_client::{
    TranslationClient, TranslationEndpoint, TranslationJob, TranslationResult, TranslationSettings,
};

fn job(content: &str, extension: &str) -> TranslationJob {
    TranslationJob::new(&TranslationSettings::default(), content, extension)
}

#[tokio::test]
async fn test_request_wire_format() {
    let service = FakeService::spawn(Duration::ZERO).await;
    let client = TranslationClient::new(service.client_config()).unwrap();

    let result = client.translate(job("<topic>Hello</topic>", "dita")).await;
    assert_eq!(
        result,
        TranslationResult::Translated("[ja] <topic>Hello</topic>".to_string())
    );

    let requests = service.state.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_json_eq!(
        requests[0],
        json!({
            "model": "ibm",
            "src_lang": "en",
            "tgt_lang": "ja",
            "files": { "temp.dita": "<topic>Hello</topic>" },
            "glossary_id": "glos_v1",
            "do_not_translate_id": "dnt_v1"
        })
    );

    let auth = service.state.authorization.lock().unwrap();
    assert_eq!(auth.as_slice(), [format!("Bearer {}", TOKEN)]);
}

#[tokio::test]
async fn test_retry_is_transparent() {
    let service = FakeService::spawn(Duration::ZERO).await;
    let client = TranslationClient::new(service.client_config()).unwrap();

    let content = format!("<p>{}</p>", FLAKY);
    let result = client.translate(job(&content, "html")).await;

    assert_eq!(result, TranslationResult::Translated(format!("[ja] {}", content)));
    assert_eq!(service.state.attempts_for(FLAKY), 3);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_exhausted_retries_yield_failed() {
    let service = FakeService::spawn(Duration::ZERO).await;
    let client = TranslationClient::new(service.client_config()).unwrap();

    let result = client.translate(job(ALWAYS_FAIL, "xlf")).await;

    assert_eq!(result, TranslationResult::Failed);
    assert_eq!(service.state.attempts_for(ALWAYS_FAIL), 3);
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test]
async fn test_unusable_body_is_not_retried() {
    let service = FakeService::spawn(Duration::ZERO).await;
    let client = TranslationClient::new(service.client_config()).unwrap();

    let result = client.translate(job(BAD_BODY, "svg")).await;

    assert_eq!(result, TranslationResult::Failed);
    assert_eq!(service.state.attempts_for(BAD_BODY), 1);
}

#[tokio::test]
async fn test_in_flight_calls_bounded_by_gate() {
    let service = FakeService::spawn(Duration::from_millis(40)).await;
    let client =
        TranslationClient::new(service.client_config().with_max_concurrent(3)).unwrap();

    let jobs = (0..12).map(|i| client.translate(job(&format!("doc {}", i), "html")));
    let results = join_all(jobs).await;

    assert!(results.iter().all(TranslationResult::is_translated));
    assert_eq!(service.state.total_requests(), 12);
    let peak = service.state.max_in_flight.load(std::sync::atomic::Ordering::SeqCst);
    assert_eq!(peak, 3, "12 slow calls behind a gate of 3 should saturate it");
}
