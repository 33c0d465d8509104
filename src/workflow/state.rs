use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

/// Category assigned to an issue by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bug,
    Enhancement,
    Question,
    /// Only valid before the classify transition has run.
    Unclassified,
}

impl Category {
    /// Label name applied on the issue for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Bug => "Bug",
            Category::Enhancement => "Enhancement",
            Category::Question => "Question",
            Category::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses classifier output. Case-insensitive; never yields `Unclassified`.
impl FromStr for Category {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bug" => Ok(Category::Bug),
            "enhancement" => Ok(Category::Enhancement),
            "question" => Ok(Category::Question),
            _ => Err(ClassificationError::InvalidCategory(s.to_string())),
        }
    }
}

/// A validated classifier verdict: a concrete category and a confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClassification")]
pub struct Classification {
    category: Category,
    confidence: f64,
}

impl Classification {
    pub fn new(category: Category, confidence: f64) -> Result<Self, ClassificationError> {
        if category == Category::Unclassified {
            return Err(ClassificationError::InvalidCategory(
                category.label().to_string(),
            ));
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassificationError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            category,
            confidence,
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[derive(Deserialize)]
struct RawClassification {
    category: Category,
    confidence: f64,
}

impl TryFrom<RawClassification> for Classification {
    type Error = ClassificationError;

    fn try_from(raw: RawClassification) -> Result<Self, Self::Error> {
        Classification::new(raw.category, raw.confidence)
    }
}

/// The record threaded through one workflow run.
///
/// Identity and text are fixed at construction. The classification is
/// single-assignment, `labels_applied` only grows, and `review_requested`
/// only flips from false to true. Fields are private so these hold for every
/// caller; the type is serde-(de)serializable so a retrier can persist and
/// replay a partially executed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueState {
    issue_id: u64,
    title: String,
    body: String,
    classification: Option<Classification>,
    labels_applied: BTreeSet<String>,
    review_requested: bool,
}

impl IssueState {
    pub fn new(issue_id: u64, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            issue_id,
            title: title.into(),
            body: body.into(),
            classification: None,
            labels_applied: BTreeSet::new(),
            review_requested: false,
        }
    }

    pub fn issue_id(&self) -> u64 {
        self.issue_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    pub fn category(&self) -> Category {
        self.classification
            .map_or(Category::Unclassified, |c| c.category())
    }

    /// `None` until the classify transition has run.
    pub fn confidence(&self) -> Option<f64> {
        self.classification.map(|c| c.confidence())
    }

    pub fn labels_applied(&self) -> &BTreeSet<String> {
        &self.labels_applied
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels_applied.contains(label)
    }

    pub fn review_requested(&self) -> bool {
        self.review_requested
    }

    /// Record the classifier verdict. Returns false (and leaves the state
    /// untouched) if a verdict was already recorded.
    pub(crate) fn record_classification(&mut self, classification: Classification) -> bool {
        if self.classification.is_some() {
            return false;
        }
        self.classification = Some(classification);
        true
    }

    pub(crate) fn record_label(&mut self, label: &str) {
        self.labels_applied.insert(label.to_string());
    }

    pub(crate) fn record_review_requested(&mut self) {
        self.review_requested = true;
    }
}
