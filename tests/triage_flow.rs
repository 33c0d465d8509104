//! End-to-end triage runs through the HTTP router and the serverless adapter.
//!
//! The classifier is either a stub or an OpenAI-compatible wiremock server;
//! the label sink records every call so side effects can be asserted exactly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use issue_triage::classifier::{Classifier, OpenAiClassifier};
use issue_triage::config::{AppConfig, ClassifierConfig};
use issue_triage::error::{ClassificationError, Result};
use issue_triage::lambda::handle_event;
use issue_triage::platform::LabelSink;
use issue_triage::server::{create_router, AppState};
use issue_triage::workflow::{Category, Classification};

/// Stub classifier returning a fixed verdict and counting calls.
struct StubClassifier {
    verdict: (Category, f64),
    calls: Mutex<Vec<(String, String)>>,
}

impl StubClassifier {
    fn new(category: Category, confidence: f64) -> Self {
        Self {
            verdict: (category, confidence),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(
        &self,
        title: &str,
        body: &str,
    ) -> std::result::Result<Classification, ClassificationError> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Classification::new(self.verdict.0, self.verdict.1)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SinkCall {
    Label(u64, String),
    Comment(u64, String),
}

#[derive(Default)]
struct SpySink {
    calls: Mutex<Vec<SinkCall>>,
}

impl SpySink {
    fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelSink for SpySink {
    async fn apply_label(&self, issue_id: u64, label: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Label(issue_id, label.to_string()));
        Ok(())
    }

    async fn post_comment(&self, issue_id: u64, body: &str) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Comment(issue_id, body.to_string()));
        Ok(())
    }
}

fn app_state(classifier: Arc<dyn Classifier>, sink: Arc<SpySink>) -> Arc<AppState> {
    app_state_with_config(AppConfig::default(), classifier, sink)
}

fn app_state_with_config(
    config: AppConfig,
    classifier: Arc<dyn Classifier>,
    sink: Arc<SpySink>,
) -> Arc<AppState> {
    Arc::new(AppState::with_collaborators(config, classifier, sink).unwrap())
}

fn issues_payload(number: u64, title: &str, body: Option<&str>) -> Value {
    json!({
        "action": "opened",
        "issue": {
            "number": number,
            "title": title,
            "body": body,
            "state": "open"
        },
        "repository": {"full_name": "octocat/hello-world"}
    })
}

async fn post_webhook(state: Arc<AppState>, event_type: &str, payload: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("x-github-event", event_type)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_high_confidence_bug_gets_single_label() {
    let classifier = Arc::new(StubClassifier::new(Category::Bug, 0.95));
    let sink = Arc::new(SpySink::default());
    let state = app_state(classifier.clone(), sink.clone());

    let (status, body) = post_webhook(
        state,
        "issues",
        &issues_payload(42, "Crash on startup", Some("App throws NPE")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sink.calls(), vec![SinkCall::Label(42, "Bug".to_string())]);
    assert_eq!(body["review_requested"], false);
    assert_eq!(body["category"], "Bug");
    assert_eq!(
        classifier.calls.lock().unwrap().as_slice(),
        &[("Crash on startup".to_string(), "App throws NPE".to_string())]
    );
}

#[tokio::test]
async fn test_low_confidence_enhancement_requests_review() {
    let classifier = Arc::new(StubClassifier::new(Category::Enhancement, 0.4));
    let sink = Arc::new(SpySink::default());
    let state = app_state(classifier.clone(), sink.clone());

    let (status, body) =
        post_webhook(state, "issues", &issues_payload(7, "Maybe add dark mode?", None)).await;

    assert_eq!(status, StatusCode::OK);
    let calls = sink.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], SinkCall::Label(7, "Enhancement".to_string()));
    assert_eq!(calls[1], SinkCall::Label(7, "needs-triage".to_string()));
    assert!(matches!(&calls[2], SinkCall::Comment(7, text) if text.contains("Enhancement")));
    assert_eq!(body["review_requested"], true);

    // A null body reaches the classifier as an empty string.
    assert_eq!(classifier.calls.lock().unwrap()[0].1, "");
}

#[tokio::test]
async fn test_classifier_timeout_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"classification\": \"Bug\", \"confidence\": 0.9}"}}]
                }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let classifier = OpenAiClassifier::new(&ClassifierConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        timeout_secs: 1,
        ..ClassifierConfig::default()
    })
    .unwrap();
    let sink = Arc::new(SpySink::default());
    let state = app_state(Arc::new(classifier), sink.clone());

    let (status, body) =
        post_webhook(state, "issues", &issues_payload(3, "Crash", Some("boom"))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["msg"], "classification failed");
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_irrelevant_events_are_acknowledged_without_side_effects() {
    let classifier = Arc::new(StubClassifier::new(Category::Bug, 0.95));
    let sink = Arc::new(SpySink::default());
    let state = app_state(classifier.clone(), sink.clone());

    let mut closed = issues_payload(1, "t", None);
    closed["issue"]["state"] = json!("closed");
    let mut labeled = issues_payload(2, "t", None);
    labeled["action"] = json!("labeled");
    let mut pull = issues_payload(3, "t", None);
    pull["issue"]["pull_request"] = json!({"url": "https://api.github.com/repos/o/r/pulls/3"});

    for payload in [&closed, &labeled, &pull] {
        let (status, body) = post_webhook(state.clone(), "issues", payload).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["msg"].as_str().unwrap().starts_with("ignored"));
    }

    let (status, _) = post_webhook(state.clone(), "push", &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_webhook(state, "ping", &json!({"zen": "Keep it simple."})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "pong");

    assert!(sink.calls().is_empty());
    assert!(classifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_issue_payload_is_bad_request() {
    let sink = Arc::new(SpySink::default());
    let state = app_state(Arc::new(StubClassifier::new(Category::Bug, 0.9)), sink.clone());

    let (status, _) = post_webhook(
        state,
        "issues",
        &json!({"action": "opened", "issue": {"title": "no number"}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_root_answers_ping_and_health() {
    let state = app_state(
        Arc::new(StubClassifier::new(Category::Bug, 0.9)),
        Arc::new(SpySink::default()),
    );

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("x-github-event", "ping")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap()["msg"], "pong");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_lambda_proxy_event_runs_workflow() {
    let sink = Arc::new(SpySink::default());
    let state = app_state(
        Arc::new(StubClassifier::new(Category::Question, 0.9)),
        sink.clone(),
    );

    let event = json!({
        "headers": {"x-github-event": "issues"},
        "body": issues_payload(101, "Sample issue title", Some("Steps to reproduce the problem...")).to_string()
    });
    let response = handle_event(&state, event).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(sink.calls(), vec![SinkCall::Label(101, "Question".to_string())]);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["msg"], "processed");
}

#[tokio::test]
async fn test_lambda_rejects_undecodable_body() {
    let sink = Arc::new(SpySink::default());
    let state = app_state(Arc::new(StubClassifier::new(Category::Bug, 0.9)), sink.clone());

    let response = handle_event(&state, json!({"body": "{broken"})).await;

    assert_eq!(response.status_code, 400);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_lambda_ignores_comment_edits_on_open_issues() {
    let mut config = AppConfig::default();
    config.routing.actions = vec!["opened".to_string(), "edited".to_string()];
    let classifier = Arc::new(StubClassifier::new(Category::Bug, 0.4));
    let sink = Arc::new(SpySink::default());
    let state = app_state_with_config(config, classifier.clone(), sink.clone());

    let payload = json!({
        "action": "edited",
        "issue": {"number": 12, "title": "Crash on save", "body": "stack trace", "state": "open"},
        "comment": {"id": 9001, "body": "Still happening on 1.2"}
    });
    let event = json!({
        "headers": {"X-GitHub-Event": "issue_comment"},
        "body": payload.to_string()
    });
    let response = handle_event(&state, event).await;

    assert_eq!(response.status_code, 200);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert!(body["msg"].as_str().unwrap().starts_with("ignored"));
    assert!(sink.calls().is_empty());
    assert!(classifier.calls.lock().unwrap().is_empty());

    // Issue edits themselves still trigger a run.
    let mut edited = issues_payload(12, "Crash on save", Some("stack trace"));
    edited["action"] = json!("edited");
    let event = json!({
        "headers": {"x-github-event": "issues"},
        "body": edited.to_string()
    });
    let response = handle_event(&state, event).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(sink.calls().len(), 3);
}

#[tokio::test]
async fn test_lambda_proxy_event_without_event_header_is_bad_request() {
    let sink = Arc::new(SpySink::default());
    let state = app_state(Arc::new(StubClassifier::new(Category::Bug, 0.9)), sink.clone());

    let event = json!({
        "headers": {"content-type": "application/json"},
        "body": issues_payload(5, "t", None).to_string()
    });
    let response = handle_event(&state, event).await;

    assert_eq!(response.status_code, 400);
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_lambda_direct_ping_answers_pong() {
    let classifier = Arc::new(StubClassifier::new(Category::Bug, 0.9));
    let sink = Arc::new(SpySink::default());
    let state = app_state(classifier.clone(), sink.clone());

    let response = handle_event(&state, json!({"zen": "Design for failure.", "hook_id": 1})).await;

    assert_eq!(response.status_code, 200);
    let body: Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body, json!({"msg": "pong"}));
    assert!(sink.calls().is_empty());
    assert!(classifier.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_webhook_without_event_header_is_bad_request() {
    let sink = Arc::new(SpySink::default());
    let state = app_state(Arc::new(StubClassifier::new(Category::Bug, 0.9)), sink.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .body(Body::from(issues_payload(8, "t", None).to_string()))
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(sink.calls().is_empty());
}
