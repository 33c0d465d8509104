use serde::Deserialize;

/// Top-level webhook event parsed from the payload based on X-GitHub-Event header.
#[derive(Debug)]
pub enum WebhookEvent {
    Issues(IssuesEvent),
    Ping,
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: IssuePayload,
    pub repository: Option<RepositoryPayload>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub body: Option<String>,
    pub state: Option<String>,
    pub pull_request: Option<serde_json::Value>, // Present if issue is a PR
}

#[derive(Debug, Deserialize)]
pub struct RepositoryPayload {
    pub full_name: String,
}

impl IssuePayload {
    pub fn is_open(&self) -> bool {
        self.state.as_deref().map_or(true, |s| s == "open")
    }
}

impl WebhookEvent {
    pub fn parse(event_type: &str, payload: &[u8]) -> Result<Self, serde_json::Error> {
        match event_type {
            "issues" => {
                let event: IssuesEvent = serde_json::from_slice(payload)?;
                Ok(WebhookEvent::Issues(event))
            }
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unsupported(other.to_string())),
        }
    }

    /// Same dispatch as [`WebhookEvent::parse`] for an already decoded payload.
    pub fn from_value(event_type: &str, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        match event_type {
            "issues" => Ok(WebhookEvent::Issues(serde_json::from_value(payload)?)),
            "ping" => Ok(WebhookEvent::Ping),
            other => Ok(WebhookEvent::Unsupported(other.to_string())),
        }
    }
}
