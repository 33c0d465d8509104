use std::sync::Arc;

use crate::classifier::Classifier;
use crate::error::{ClassificationError, SinkError};
use crate::platform::LabelSink;
use crate::workflow::route::{Command, RoutingPolicy};
use crate::workflow::state::IssueState;

/// Terminal state of one triage run.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// Every routed command was executed (or already recorded as done).
    Success(IssueState),
    /// The classifier failed; no side effect was attempted.
    ClassificationFailed(ClassificationError),
    /// A side effect failed. `state` records what did succeed; commands after
    /// `failed_index` were not attempted.
    PartialFailure {
        state: IssueState,
        error: SinkError,
        failed_index: usize,
    },
}

impl WorkflowOutcome {
    pub fn state(&self) -> Option<&IssueState> {
        match self {
            WorkflowOutcome::Success(state) | WorkflowOutcome::PartialFailure { state, .. } => {
                Some(state)
            }
            WorkflowOutcome::ClassificationFailed(_) => None,
        }
    }
}

/// Runs Classify -> Route -> Execute for one issue at a time.
///
/// The engine holds no per-run data, so a single instance can serve any
/// number of concurrent runs.
pub struct WorkflowEngine {
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn LabelSink>,
    policy: RoutingPolicy,
}

impl WorkflowEngine {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn LabelSink>,
        policy: RoutingPolicy,
    ) -> Self {
        Self {
            classifier,
            sink,
            policy,
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    pub async fn run(&self, mut state: IssueState) -> WorkflowOutcome {
        let issue = state.issue_id();

        let classification = match state.classification() {
            Some(existing) => {
                tracing::info!(
                    issue,
                    category = %existing.category(),
                    "Issue already classified, skipping classifier"
                );
                existing
            }
            None => match self.classifier.classify(state.title(), state.body()).await {
                Ok(classification) => {
                    state.record_classification(classification);
                    classification
                }
                Err(e) => {
                    tracing::error!(issue, error = %e, "Classification failed, no labels applied");
                    return WorkflowOutcome::ClassificationFailed(e);
                }
            },
        };

        tracing::info!(
            issue,
            category = %classification.category(),
            confidence = classification.confidence(),
            threshold = self.policy.threshold(),
            "Issue classified"
        );

        let commands = self.policy.route(&classification);
        self.execute(state, &commands).await
    }

    /// Issue `commands` in order against the sink.
    ///
    /// Labels already in `labels_applied` are skipped, as is a review request
    /// once `review_requested` is set. State is updated only after the sink
    /// call succeeds. The first failure stops the run.
    pub async fn execute(&self, mut state: IssueState, commands: &[Command]) -> WorkflowOutcome {
        let issue = state.issue_id();

        for (index, command) in commands.iter().enumerate() {
            let result = match command {
                Command::ApplyLabel(label) => {
                    if state.has_label(label) {
                        tracing::debug!(issue, label = %label, "Label already applied, skipping");
                        continue;
                    }
                    self.sink
                        .apply_label(issue, label)
                        .await
                        .map(|()| state.record_label(label))
                }
                Command::RequestReview(summary) => {
                    if state.review_requested() {
                        tracing::debug!(issue, "Review already requested, skipping");
                        continue;
                    }
                    self.sink
                        .post_comment(issue, summary)
                        .await
                        .map(|()| state.record_review_requested())
                }
            };

            match result {
                Ok(()) => tracing::info!(issue, step = index, command = %command, "Command executed"),
                Err(source) => {
                    tracing::warn!(
                        issue,
                        step = index,
                        command = %command,
                        error = %source,
                        "Command failed, stopping run"
                    );
                    return WorkflowOutcome::PartialFailure {
                        state,
                        error: SinkError {
                            command: command.clone(),
                            source,
                        },
                        failed_index: index,
                    };
                }
            }
        }

        WorkflowOutcome::Success(state)
    }
}
