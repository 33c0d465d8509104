use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use crate::workflow::{IssueState, WorkflowOutcome};

/// Transport-level result of handling one inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TriageResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn ignored(reason: &str) -> Self {
        Self::ok(json!({ "msg": format!("ignored - {reason}") }))
    }

    pub fn bad_request(reason: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "msg": reason }),
        }
    }

    /// Success is 200. A classifier failure is an upstream failure (502) with
    /// nothing mutated. A partial failure is 207: some labels did land, so a
    /// blind retry could duplicate the review comment.
    pub fn from_outcome(outcome: &WorkflowOutcome) -> Self {
        match outcome {
            WorkflowOutcome::Success(state) => {
                let mut body = snapshot(state);
                body["msg"] = json!("processed");
                Self::ok(body)
            }
            WorkflowOutcome::ClassificationFailed(error) => Self {
                status: StatusCode::BAD_GATEWAY,
                body: json!({
                    "msg": "classification failed",
                    "error": error.to_string(),
                    "labels_applied": [],
                    "review_requested": false,
                }),
            },
            WorkflowOutcome::PartialFailure {
                state,
                error,
                failed_index,
            } => {
                let mut body = snapshot(state);
                body["msg"] = json!("partially processed");
                body["error"] = json!(error.source.to_string());
                body["failed_command"] = json!(error.command.to_string());
                body["failed_index"] = json!(failed_index);
                Self {
                    status: StatusCode::MULTI_STATUS,
                    body,
                }
            }
        }
    }
}

fn snapshot(state: &IssueState) -> Value {
    json!({
        "issue": state.issue_id(),
        "category": state.category(),
        "confidence": state.confidence(),
        "labels_applied": state.labels_applied(),
        "review_requested": state.review_requested(),
    })
}

impl IntoResponse for TriageResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
