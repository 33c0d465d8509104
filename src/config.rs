use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::workflow::RoutingPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    /// Override for GitHub Enterprise or tests.
    #[serde(default)]
    pub api_url: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Manual Debug impl to avoid leaking the API key
impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_low_confidence_label")]
    pub low_confidence_label: String,
    #[serde(default = "default_review_comment_template")]
    pub review_comment_template: String,
    /// `issues` event actions that trigger a triage run.
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            low_confidence_label: default_low_confidence_label(),
            review_comment_template: default_review_comment_template(),
            actions: default_actions(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_low_confidence_label() -> String {
    "needs-triage".to_string()
}

fn default_review_comment_template() -> String {
    "Low confidence labeling: classified as {category} (confidence {confidence}). Please review.".to_string()
}

fn default_actions() -> Vec<String> {
    vec!["opened".to_string()]
}

/// Variables honored for compatibility with existing deployments.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GH_TOKEN", "github.token"),
    ("REPO_OWNER", "github.owner"),
    ("REPO_NAME", "github.repo"),
    ("OPENAI_API_KEY", "classifier.api_key"),
    ("CONF_THRESHOLD", "routing.confidence_threshold"),
    ("PORT", "server.port"),
];

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("triage").required(false));
        }

        // Environment variable overrides with TRIAGE_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("TRIAGE")
                .separator("__")
                .try_parsing(true),
        );

        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on settings no triage run could succeed with.
    pub fn validate(&self) -> Result<()> {
        RoutingPolicy::from_config(&self.routing)?;

        if self.routing.actions.is_empty() {
            return Err(AppError::Config(
                "routing.actions must list at least one issues action".to_string(),
            ));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(AppError::Config(
                "classifier.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
