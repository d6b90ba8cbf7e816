//! Common test utilities: an in-process fake of the translation service

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use translation_client::{ClientConfig, RetryPolicy};

/// Content containing this marker is always answered with 503
pub const ALWAYS_FAIL: &str = "ALWAYS_FAIL";
/// Content containing this marker gets 500 twice, then a translation
pub const FLAKY: &str = "FLAKY";
/// Content containing this marker gets a 200 without the expected file
pub const BAD_BODY: &str = "BAD_BODY";

/// Bearer token the fake service is configured with
pub const TOKEN: &str = "test-token";

/// What the fake service has observed
#[derive(Debug, Default)]
pub struct ServiceState {
    pub delay: Duration,
    pub requests: Mutex<Vec<Value>>,
    pub authorization: Mutex<Vec<String>>,
    pub attempts: Mutex<HashMap<String, usize>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ServiceState {
    /// Number of requests seen for documents containing `marker`
    pub fn attempts_for(&self, marker: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(content, _)| content.contains(marker))
            .map(|(_, count)| *count)
            .sum()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Running fake service
pub struct FakeService {
    pub base_url: String,
    pub state: Arc<ServiceState>,
}

impl FakeService {
    /// Start the service on an ephemeral port; every request takes `delay`
    pub async fn spawn(delay: Duration) -> Self {
        let state = Arc::new(ServiceState {
            delay,
            ..Default::default()
        });

        let app = Router::new()
            .route("/translate-document", post(translate_document))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Client configuration pointing at this service with millisecond backoff
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, TOKEN).with_retry(fast_retry())
    }
}

/// Three attempts with 1-5ms backoff
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        multiplier: Duration::from_millis(1),
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

/// Creates a test file, including parent directories
pub fn create_test_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Every regular file under `root`
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn translate_document(
    State(state): State<Arc<ServiceState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let current = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    let _guard = InFlightGuard(&state.in_flight);
    state.max_in_flight.fetch_max(current, Ordering::SeqCst);

    state.requests.lock().unwrap().push(body.clone());
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.authorization.lock().unwrap().push(auth.to_string());
    }

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    let tgt_lang = body["tgt_lang"].as_str().unwrap_or_default().to_string();
    let files = body["files"].as_object().cloned().unwrap_or_default();

    let mut translated = serde_json::Map::new();
    for (name, text) in files {
        let text = text.as_str().unwrap_or_default().to_string();
        let attempt = {
            let mut attempts = state.attempts.lock().unwrap();
            let count = attempts.entry(text.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if text.contains(ALWAYS_FAIL) {
            return Err((StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string()));
        }
        if text.contains(FLAKY) && attempt <= 2 {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "try again".to_string()));
        }
        if text.contains(BAD_BODY) {
            return Ok(Json(json!({ "files": {} })));
        }

        translated.insert(name, Value::String(format!("[{}] {}", tgt_lang, text)));
    }

    Ok(Json(json!({ "files": translated })))
}
