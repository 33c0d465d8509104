use async_trait::async_trait;

use crate::error::Result;
use crate::platform::LabelSink;

/// Sink that only logs what it would have done.
pub struct DryRunSink;

#[async_trait]
impl LabelSink for DryRunSink {
    async fn apply_label(&self, issue_id: u64, label: &str) -> Result<()> {
        tracing::info!(issue = issue_id, label = %label, "[dry-run] Would apply label");
        Ok(())
    }

    async fn post_comment(&self, issue_id: u64, body: &str) -> Result<()> {
        tracing::info!(issue = issue_id, body = %body, "[dry-run] Would post comment");
        Ok(())
    }
}
