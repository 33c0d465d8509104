use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::json;

use crate::server::AppState;
use crate::webhook::events::{IssuesEvent, WebhookEvent};
use crate::webhook::response::TriageResponse;
use crate::workflow::IssueState;

pub async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> TriageResponse {
    let event_type = match headers.get("x-github-event").and_then(|v| v.to_str().ok()) {
        Some(et) => et.to_string(),
        None => {
            tracing::warn!("Missing X-GitHub-Event header");
            return TriageResponse::bad_request("missing X-GitHub-Event header");
        }
    };

    // Parse event
    let event = match WebhookEvent::parse(&event_type, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(error = %e, event_type = %event_type, "Failed to parse webhook event");
            return TriageResponse::bad_request("invalid issues payload");
        }
    };

    tracing::info!(event_type = %event_type, "Received webhook event");

    match event {
        WebhookEvent::Issues(issues_event) => handle_issues_event(&state, issues_event).await,
        WebhookEvent::Ping => {
            tracing::info!("Received ping event");
            TriageResponse::ok(json!({ "msg": "pong" }))
        }
        WebhookEvent::Unsupported(event_type) => {
            tracing::debug!(event_type = %event_type, "Ignoring unsupported event");
            TriageResponse::ignored("not an issue event")
        }
    }
}

/// Run one `issues` event through the triage workflow.
///
/// Shared by the HTTP and serverless adapters.
pub async fn handle_issues_event(state: &AppState, event: IssuesEvent) -> TriageResponse {
    if !state.config.routing.actions.iter().any(|a| a == &event.action) {
        tracing::debug!(action = %event.action, "Ignoring issues action");
        return TriageResponse::ignored("action not relevant");
    }

    if !event.issue.is_open() {
        tracing::debug!(issue = event.issue.number, "Ignoring closed issue");
        return TriageResponse::ignored("issue not open");
    }

    // Don't process pull requests via the issues event
    if event.issue.pull_request.is_some() {
        return TriageResponse::ignored("pull request");
    }

    tracing::info!(
        repo = ?event.repository.as_ref().map(|r| r.full_name.as_str()),
        issue = event.issue.number,
        action = %event.action,
        "Processing issue"
    );

    let issue = event.issue;
    let initial = IssueState::new(issue.number, issue.title, issue.body.unwrap_or_default());
    let outcome = state.engine.run(initial).await;

    let response = TriageResponse::from_outcome(&outcome);
    tracing::info!(
        issue = issue.number,
        status = response.status.as_u16(),
        "Triage run finished"
    );
    response
}
