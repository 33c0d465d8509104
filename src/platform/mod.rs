pub mod dry_run;
pub mod github;

use async_trait::async_trait;

use crate::error::Result;

pub use dry_run::DryRunSink;
pub use github::GitHubSink;

/// Destination for the side effects of a triage run.
///
/// Calls are issued one at a time; each returns before the next is made.
#[async_trait]
pub trait LabelSink: Send + Sync {
    /// Add a label to an issue, keeping any labels it already has.
    async fn apply_label(&self, issue_id: u64, label: &str) -> Result<()>;

    /// Post a comment on an issue.
    async fn post_comment(&self, issue_id: u64, body: &str) -> Result<()>;
}
