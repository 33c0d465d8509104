use async_trait::async_trait;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::LabelSink;

/// Applies labels and comments on issues of a single repository.
pub struct GitHubSink {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubSink {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let missing: Vec<&str> = [
            ("github.token (GH_TOKEN)", config.token.is_empty()),
            ("github.owner (REPO_OWNER)", config.owner.is_empty()),
            ("github.repo (REPO_NAME)", config.repo.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Missing required GitHub settings: {}",
                missing.join(", ")
            )));
        }

        let mut builder = Octocrab::builder().personal_token(config.token.clone());
        if let Some(api_url) = &config.api_url {
            builder = builder.base_uri(api_url.as_str())?;
        }
        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            client,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    pub fn repo_full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[async_trait]
impl LabelSink for GitHubSink {
    async fn apply_label(&self, issue_id: u64, label: &str) -> Result<()> {
        // POST adds to the existing label set; PUT would replace it.
        self.client
            .issues(&self.owner, &self.repo)
            .add_labels(issue_id, &[label.to_string()])
            .await?;

        Ok(())
    }

    async fn post_comment(&self, issue_id: u64, body: &str) -> Result<()> {
        self.client
            .issues(&self.owner, &self.repo)
            .create_comment(issue_id, body)
            .await?;

        Ok(())
    }
}
