use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::classifier::{Classifier, OpenAiClassifier};
use crate::config::AppConfig;
use crate::platform::{DryRunSink, GitHubSink, LabelSink};
use crate::workflow::{RoutingPolicy, WorkflowEngine};

pub struct AppState {
    pub config: AppConfig,
    pub engine: WorkflowEngine,
}

impl AppState {
    /// Build the production collaborators from configuration.
    ///
    /// With `dry_run` set, side effects are logged instead of sent to GitHub.
    pub fn new(config: AppConfig, dry_run: bool) -> crate::error::Result<Self> {
        let classifier = OpenAiClassifier::new(&config.classifier)?;
        tracing::info!(model = %classifier.model(), "Classifier configured");

        let sink: Arc<dyn LabelSink> = if dry_run {
            tracing::warn!("Dry run: labels and comments will only be logged");
            Arc::new(DryRunSink)
        } else {
            let sink = GitHubSink::new(&config.github)?;
            tracing::info!(repo = %sink.repo_full_name(), "GitHub sink configured");
            Arc::new(sink)
        };

        Self::with_collaborators(config, Arc::new(classifier), sink)
    }

    pub fn with_collaborators(
        config: AppConfig,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn LabelSink>,
    ) -> crate::error::Result<Self> {
        let policy = RoutingPolicy::from_config(&config.routing)?;
        let engine = WorkflowEngine::new(classifier, sink, policy);

        Ok(Self { config, engine })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(crate::webhook::handler::handle_webhook))
        .route("/", get(root).post(root))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GitHub sends a `ping` to the payload URL when a hook is created.
async fn root(headers: HeaderMap) -> Json<Value> {
    let is_ping = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        == Some("ping");

    if is_ping {
        tracing::info!("Received GitHub ping event");
        Json(json!({ "msg": "pong" }))
    } else {
        Json(json!({ "status": "ok" }))
    }
}

async fn health_check() -> &'static str {
    "ok"
}
