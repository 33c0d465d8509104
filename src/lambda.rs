//! Serverless entry point.
//!
//! Accepts either an API Gateway / function URL proxy event, where the
//! webhook payload arrives as a JSON string under `body`, or the webhook
//! payload itself for direct invocations.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::server::AppState;
use crate::webhook::events::{IssuesEvent, WebhookEvent};
use crate::webhook::handler::handle_issues_event;
use crate::webhook::response::TriageResponse;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub body: String,
}

impl From<TriageResponse> for LambdaResponse {
    fn from(response: TriageResponse) -> Self {
        Self {
            status_code: response.status.as_u16(),
            body: response.body.to_string(),
        }
    }
}

pub async fn handle_event(state: &AppState, event: Value) -> LambdaResponse {
    let headers = proxy_headers(&event);

    let payload = match unwrap_proxy_body(event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "Unable to decode JSON body");
            return TriageResponse::bad_request("Invalid JSON").into();
        }
    };

    match headers {
        Some(headers) => dispatch_proxied(state, &headers, payload).await,
        None => dispatch_direct(state, payload).await,
    }
}

/// Proxied requests carry GitHub's headers, so dispatch on the event type
/// exactly like the HTTP handler does.
async fn dispatch_proxied(
    state: &AppState,
    headers: &Map<String, Value>,
    payload: Value,
) -> LambdaResponse {
    let Some(event_type) = header(headers, "x-github-event") else {
        tracing::warn!("Missing X-GitHub-Event header");
        return TriageResponse::bad_request("missing X-GitHub-Event header").into();
    };

    match WebhookEvent::from_value(event_type, payload) {
        Ok(WebhookEvent::Issues(event)) => handle_issues_event(state, event).await.into(),
        Ok(WebhookEvent::Ping) => {
            tracing::info!("Received ping event");
            TriageResponse::ok(json!({ "msg": "pong" })).into()
        }
        Ok(WebhookEvent::Unsupported(event_type)) => {
            tracing::debug!(event_type = %event_type, "Ignoring unsupported event");
            TriageResponse::ignored("not an issue event").into()
        }
        Err(e) => {
            tracing::error!(error = %e, event_type = %event_type, "Failed to parse webhook event");
            TriageResponse::bad_request("invalid issues payload").into()
        }
    }
}

/// Direct invocations pass the bare payload, so the event kind is inferred
/// from its shape.
async fn dispatch_direct(state: &AppState, payload: Value) -> LambdaResponse {
    if payload.get("zen").is_some() {
        tracing::info!("Received ping event");
        return TriageResponse::ok(json!({ "msg": "pong" })).into();
    }

    if payload.get("issue").is_none() || payload.get("action").is_none() {
        tracing::info!("Ignoring event without issue payload");
        return TriageResponse::ignored("not an issue event").into();
    }

    // Only `issues` payloads carry an issue without a comment, review or change set.
    if payload.get("comment").is_some() {
        tracing::info!("Ignoring issue comment event");
        return TriageResponse::ignored("not an issue event").into();
    }

    match serde_json::from_value::<IssuesEvent>(payload) {
        Ok(event) => handle_issues_event(state, event).await.into(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse issues event");
            TriageResponse::bad_request("invalid issues payload").into()
        }
    }
}

fn proxy_headers(event: &Value) -> Option<Map<String, Value>> {
    event.get("headers").and_then(Value::as_object).cloned()
}

/// Header lookup ignoring case; API Gateway forwards names as sent by the client.
fn header<'a>(headers: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str())
}

fn unwrap_proxy_body(event: Value) -> Result<Value, serde_json::Error> {
    let Value::Object(mut map) = event else {
        return Ok(event);
    };

    match map.remove("body") {
        None => Ok(Value::Object(map)),
        Some(Value::Null) => Ok(Value::Object(Default::default())),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Value::Object(Default::default())),
        Some(Value::String(raw)) => serde_json::from_str(&raw),
        Some(other) => Ok(other),
    }
}
