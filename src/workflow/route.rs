use std::fmt;

use crate::config::RoutingConfig;
use crate::error::{AppError, Result};
use crate::workflow::state::{Category, Classification};

/// A side effect to issue against the label sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ApplyLabel(String),
    /// Post the given comment asking maintainers to confirm the label.
    RequestReview(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::ApplyLabel(label) => write!(f, "apply label `{label}`"),
            Command::RequestReview(_) => f.write_str("request review"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Category,
    Confidence,
}

/// Review comment template with `{category}` and `{confidence}` placeholders.
///
/// `{{` and `}}` produce literal braces. Any other use of a brace is rejected
/// when the template is parsed, so rendering can never fail.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewTemplate {
    segments: Vec<Segment>,
}

impl ReviewTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(AppError::Config(format!(
                                    "Unterminated placeholder in review comment template: {template:?}"
                                )));
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let segment = match name.as_str() {
                        "category" => Segment::Category,
                        "confidence" => Segment::Confidence,
                        other => {
                            return Err(AppError::Config(format!(
                                "Unknown placeholder `{{{other}}}` in review comment template"
                            )));
                        }
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => {
                    return Err(AppError::Config(format!(
                        "Unmatched `}}` in review comment template: {template:?}"
                    )));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, category: Category, confidence: f64) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Category => out.push_str(category.label()),
                Segment::Confidence => out.push_str(&format!("{confidence:.2}")),
            }
        }
        out
    }
}

/// Threshold and labels that turn a classification into side effects.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    threshold: f64,
    low_confidence_label: String,
    review_template: ReviewTemplate,
}

impl RoutingPolicy {
    pub fn new(
        threshold: f64,
        low_confidence_label: impl Into<String>,
        review_template: ReviewTemplate,
    ) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::Config(format!(
                "confidence_threshold must be within [0, 1], got {threshold}"
            )));
        }
        let low_confidence_label = low_confidence_label.into();
        if low_confidence_label.trim().is_empty() {
            return Err(AppError::Config(
                "low_confidence_label must not be empty".to_string(),
            ));
        }

        Ok(Self {
            threshold,
            low_confidence_label,
            review_template,
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self> {
        let template = ReviewTemplate::parse(&config.review_comment_template)?;
        Self::new(
            config.confidence_threshold,
            config.low_confidence_label.clone(),
            template,
        )
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Map a classification to the ordered side effects for it.
    ///
    /// A confidence exactly at the threshold takes the high-confidence path.
    /// The category label is applied on both paths; the low-confidence label
    /// is added to it, never substituted for it.
    pub fn route(&self, classification: &Classification) -> Vec<Command> {
        let category = classification.category();
        let confidence = classification.confidence();
        let category_label = Command::ApplyLabel(category.label().to_string());

        if confidence >= self.threshold {
            return vec![category_label];
        }

        vec![
            category_label,
            Command::ApplyLabel(self.low_confidence_label.clone()),
            Command::RequestReview(self.review_template.render(category, confidence)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(threshold: f64) -> RoutingPolicy {
        RoutingPolicy::new(
            threshold,
            "needs-triage",
            ReviewTemplate::parse("Labeled {category} with confidence {confidence}, please review.")
                .unwrap(),
        )
        .unwrap()
    }

    fn classified(category: Category, confidence: f64) -> Classification {
        Classification::new(category, confidence).unwrap()
    }

    #[test]
    fn test_high_confidence_routes_single_label() {
        let policy = policy(0.8);
        for confidence in [0.8, 0.81, 0.95, 1.0] {
            let commands = policy.route(&classified(Category::Bug, confidence));
            assert_eq!(commands, vec![Command::ApplyLabel("Bug".to_string())]);
        }
    }

    #[test]
    fn test_low_confidence_routes_label_triage_and_review() {
        let policy = policy(0.8);
        for confidence in [0.0, 0.4, 0.7999] {
            let commands = policy.route(&classified(Category::Enhancement, confidence));
            assert_eq!(commands.len(), 3);
            assert_eq!(commands[0], Command::ApplyLabel("Enhancement".to_string()));
            assert_eq!(commands[1], Command::ApplyLabel("needs-triage".to_string()));
            assert!(matches!(commands[2], Command::RequestReview(_)));
        }
    }

    #[test]
    fn test_route_is_deterministic() {
        let policy = policy(0.5);
        let c = classified(Category::Question, 0.3);
        assert_eq!(policy.route(&c), policy.route(&c));
    }

    #[test]
    fn test_threshold_edges() {
        let zero = policy(0.0);
        assert_eq!(zero.route(&classified(Category::Bug, 0.0)).len(), 1);

        let one = policy(1.0);
        assert_eq!(one.route(&classified(Category::Bug, 0.99)).len(), 3);
        assert_eq!(one.route(&classified(Category::Bug, 1.0)).len(), 1);
    }

    #[test]
    fn test_review_summary_is_rendered() {
        let commands = policy(0.8).route(&classified(Category::Enhancement, 0.4));
        assert_eq!(
            commands[2],
            Command::RequestReview(
                "Labeled Enhancement with confidence 0.40, please review.".to_string()
            )
        );
    }

    #[test]
    fn test_policy_rejects_invalid_threshold() {
        let template = ReviewTemplate::parse("x").unwrap();
        for threshold in [-0.01, 1.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                RoutingPolicy::new(threshold, "needs-triage", template.clone()),
                Err(AppError::Config(_))
            ));
        }
    }

    #[test]
    fn test_policy_rejects_empty_label() {
        let template = ReviewTemplate::parse("x").unwrap();
        assert!(RoutingPolicy::new(0.8, "  ", template).is_err());
    }

    #[test]
    fn test_template_escapes_and_errors() {
        let t = ReviewTemplate::parse("{{literal}} {category}").unwrap();
        assert_eq!(t.render(Category::Bug, 0.1), "{literal} Bug");

        assert!(ReviewTemplate::parse("{category").is_err());
        assert!(ReviewTemplate::parse("category}").is_err());
        assert!(ReviewTemplate::parse("{label}").is_err());
        assert!(ReviewTemplate::parse("{{category}").is_err());
    }

    #[test]
    fn test_template_without_placeholders_renders_verbatim() {
        let t = ReviewTemplate::parse("Low confidence labeling - please review.").unwrap();
        assert_eq!(
            t.render(Category::Question, 0.2),
            "Low confidence labeling - please review."
        );
    }
}
