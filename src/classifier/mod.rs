pub mod openai;
pub mod prompt;

use async_trait::async_trait;

use crate::error::ClassificationError;
use crate::workflow::Classification;

pub use openai::OpenAiClassifier;

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify an issue from its title and body.
    ///
    /// Timeouts, transport failures and unusable responses all come back as
    /// `ClassificationError`; a returned `Classification` is always valid.
    async fn classify(
        &self,
        title: &str,
        body: &str,
    ) -> std::result::Result<Classification, ClassificationError>;
}
