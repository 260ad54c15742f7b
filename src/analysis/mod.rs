// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analysis pipeline: classification followed by explanation generation
//!
//! `SpamDetector` owns the two model stages as injected service objects.
//! Stage failures are typed and converted to sentinel results at a single
//! point so the HTTP layer never sees an unhandled error.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::classifier::{truncate_chars, ClassifyError, TextClassifier, MAX_INPUT_CHARS};
use crate::explainer::{ExplainError, ExplanationGenerator};

/// Label reported when there is nothing to classify
pub const SAFE_LABEL: &str = "safe";

/// Label reported when a model stage failed
pub const ERROR_LABEL: &str = "error";

/// Sentinel explanation for empty input
const NO_TEXT_EXPLANATION: &str = "No text provided for analysis";

/// Result of analyzing a piece of extracted text
///
/// `spam_score` is the classifier's raw score scaled to [0, 100], unrounded;
/// response assembly rounds it for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub label: String,
    pub spam_score: f64,
    pub explanation: String,
}

/// A failure in one of the model stages
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Explain(#[from] ExplainError),
}

/// Runs classification and explanation generation over extracted text
pub struct SpamDetector {
    classifier: Arc<dyn TextClassifier>,
    explainer: Arc<dyn ExplanationGenerator>,
}

impl SpamDetector {
    pub fn new(
        classifier: Arc<dyn TextClassifier>,
        explainer: Arc<dyn ExplanationGenerator>,
    ) -> Self {
        Self {
            classifier,
            explainer,
        }
    }

    /// Analyze extracted text
    ///
    /// Empty or whitespace-only input short-circuits to a fixed safe result
    /// without invoking any model. Input is truncated to the 512-character
    /// budget before the stages run. Stage failures become a sentinel result
    /// carrying the failure description; they never propagate.
    pub fn analyze(&self, text: &str) -> Analysis {
        if text.trim().is_empty() {
            return Analysis {
                label: SAFE_LABEL.to_string(),
                spam_score: 0.0,
                explanation: NO_TEXT_EXPLANATION.to_string(),
            };
        }

        let truncated = truncate_chars(text, MAX_INPUT_CHARS);

        match self.run_stages(truncated) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("analysis failed: {e}");
                Analysis {
                    label: ERROR_LABEL.to_string(),
                    spam_score: 0.0,
                    explanation: format!("Error analyzing text: {e}"),
                }
            }
        }
    }

    fn run_stages(&self, text: &str) -> Result<Analysis, AnalysisError> {
        let classification = self.classifier.classify(text)?;
        debug!(
            label = %classification.label,
            score = classification.score,
            "classification result"
        );

        let explanation = self.explainer.explain(text, &classification)?;

        Ok(Analysis {
            label: classification.label,
            spam_score: f64::from(classification.score) * 100.0,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use std::sync::Mutex;

    struct FakeClassifier {
        result: Result<Classification, ()>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeClassifier {
        fn returning(label: &str, score: f32) -> Self {
            Self {
                result: Ok(Classification {
                    label: label.to_string(),
                    score,
                }),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                result: Err(()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl TextClassifier for FakeClassifier {
        fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
            self.calls.lock().unwrap().push(text.to_string());
            self.result
                .clone()
                .map_err(|_| ClassifyError::Tokenization("boom".to_string()))
        }
    }

    struct FakeExplainer {
        result: Result<String, ()>,
    }

    impl FakeExplainer {
        fn returning(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self { result: Err(()) }
        }
    }

    impl ExplanationGenerator for FakeExplainer {
        fn explain(
            &self,
            _text: &str,
            _classification: &Classification,
        ) -> Result<String, ExplainError> {
            self.result
                .clone()
                .map_err(|_| ExplainError::Generation("model exploded".to_string()))
        }
    }

    fn detector_with(
        classifier: Arc<FakeClassifier>,
        explainer: Arc<FakeExplainer>,
    ) -> SpamDetector {
        SpamDetector::new(classifier, explainer)
    }

    #[test]
    fn test_empty_input_short_circuits_to_safe() {
        let classifier = Arc::new(FakeClassifier::returning("hate", 0.9));
        let detector = detector_with(
            classifier.clone(),
            Arc::new(FakeExplainer::returning("because")),
        );

        let analysis = detector.analyze("");

        assert_eq!(analysis.label, SAFE_LABEL);
        assert_eq!(analysis.spam_score, 0.0);
        assert_eq!(analysis.explanation, "No text provided for analysis");
        assert!(classifier.calls().is_empty(), "classifier must not be invoked");
    }

    #[test]
    fn test_whitespace_only_input_short_circuits_to_safe() {
        let classifier = Arc::new(FakeClassifier::returning("hate", 0.9));
        let detector = detector_with(
            classifier.clone(),
            Arc::new(FakeExplainer::returning("because")),
        );

        let analysis = detector.analyze("  \n\t ");

        assert_eq!(analysis.label, SAFE_LABEL);
        assert!(classifier.calls().is_empty());
    }

    #[test]
    fn test_long_input_truncated_to_512_chars() {
        let classifier = Arc::new(FakeClassifier::returning("nothate", 0.6));
        let detector = detector_with(
            classifier.clone(),
            Arc::new(FakeExplainer::returning("ok")),
        );

        detector.analyze(&"x".repeat(2000));

        let calls = classifier.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].chars().count(), 512);
    }

    #[test]
    fn test_success_scales_score_to_percentage() {
        let detector = detector_with(
            Arc::new(FakeClassifier::returning("hate", 0.97)),
            Arc::new(FakeExplainer::returning("clearly a prize scam")),
        );

        let analysis = detector.analyze("You won! Claim your $1000 prize now!!!");

        assert_eq!(analysis.label, "hate");
        assert!((analysis.spam_score - 97.0).abs() < 1e-4);
        assert_eq!(analysis.explanation, "clearly a prize scam");
    }

    #[test]
    fn test_classifier_failure_yields_error_sentinel() {
        let detector = detector_with(
            Arc::new(FakeClassifier::failing()),
            Arc::new(FakeExplainer::returning("unused")),
        );

        let analysis = detector.analyze("some text");

        assert_eq!(analysis.label, ERROR_LABEL);
        assert_eq!(analysis.spam_score, 0.0);
        assert!(analysis.explanation.starts_with("Error analyzing text:"));
        assert!(analysis.explanation.contains("boom"));
    }

    #[test]
    fn test_explainer_failure_yields_error_sentinel() {
        let detector = detector_with(
            Arc::new(FakeClassifier::returning("hate", 0.8)),
            Arc::new(FakeExplainer::failing()),
        );

        let analysis = detector.analyze("some text");

        assert_eq!(analysis.label, ERROR_LABEL);
        assert_eq!(analysis.spam_score, 0.0);
        assert!(analysis.explanation.contains("model exploded"));
    }
}
