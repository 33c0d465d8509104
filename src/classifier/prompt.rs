use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::error::ClassificationError;
use crate::workflow::{Category, Classification};

pub fn system_prompt() -> &'static str {
    "You are an expert software engineer helping triage GitHub issues. \
Classify each issue as one of: Bug, Enhancement, Question. \
Return a JSON object exactly with keys 'classification' and 'confidence' (0-1)."
}

pub fn user_prompt(title: &str, body: &str) -> String {
    format!("Issue title: {title}\n\nIssue body: {body}")
}

fn json_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Extract the classification from the model's reply.
///
/// The reply may wrap the JSON object in prose or a code fence; the outermost
/// `{...}` span is taken. `confidence` may be a number or a numeric string.
pub fn parse_classification(content: &str) -> Result<Classification, ClassificationError> {
    let object = json_object().find(content).ok_or_else(|| {
        ClassificationError::MalformedResponse(format!("no JSON object in reply: {content}"))
    })?;

    let data: Value = serde_json::from_str(object.as_str())
        .map_err(|e| ClassificationError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let category = data
        .get("classification")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ClassificationError::MalformedResponse(
                "missing string field `classification`".to_string(),
            )
        })?
        .parse::<Category>()?;

    let confidence = match data.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        ClassificationError::MalformedResponse("missing numeric field `confidence`".to_string())
    })?;

    Classification::new(category, confidence)
}
