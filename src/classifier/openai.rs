use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::classifier::{prompt, Classifier};
use crate::config::ClassifierConfig;
use crate::error::{AppError, ClassificationError, Result};
use crate::workflow::Classification;

/// Classifier backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClassifier {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::Config(
                "classifier.api_key (or OPENAI_API_KEY) is required".to_string(),
            ));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Classifier(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ChatRequest) -> std::result::Result<String, ClassificationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Request(format!(
                "API returned {status}: {body}"
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassificationError::Timeout(self.timeout)
            } else {
                ClassificationError::MalformedResponse(e.to_string())
            }
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                ClassificationError::MalformedResponse("response had no message content".to_string())
            })
    }

    fn transport_error(&self, e: reqwest::Error) -> ClassificationError {
        if e.is_timeout() {
            ClassificationError::Timeout(self.timeout)
        } else {
            ClassificationError::Request(e.to_string())
        }
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn classify(
        &self,
        title: &str,
        body: &str,
    ) -> std::result::Result<Classification, ClassificationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt::system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt::user_prompt(title, body),
                },
            ],
        };

        let content = self.complete(&request).await?;
        tracing::debug!(model = %self.model, reply = %content, "Classifier reply");

        prompt::parse_classification(&content)
    }
}

// --- Request types ---

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// --- Response types ---

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
