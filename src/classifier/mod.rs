// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spam/hate text classification
//!
//! Wraps a pretrained text-classification model behind the `TextClassifier`
//! trait so the analysis pipeline can be exercised with fakes in tests.

pub mod onnx_model;

use thiserror::Error;

pub use onnx_model::OnnxTextClassifier;

/// Character budget applied to classifier input before tokenization
pub const MAX_INPUT_CHARS: usize = 512;

/// A classification outcome: label plus confidence score in [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub score: f32,
}

/// Errors raised by the classification stage
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("failed to build model inputs: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
}

/// Classifies a piece of text as spam/hateful content
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Classification, ClassifyError>;
}

/// Truncate a string to at most `max_chars` characters.
///
/// Cuts on a character boundary, never mid-codepoint.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_shorter_input_unchanged() {
        assert_eq!(truncate_chars("hello", 512), "hello");
    }

    #[test]
    fn test_truncate_exact_length_unchanged() {
        let text = "a".repeat(512);
        assert_eq!(truncate_chars(&text, 512), text);
    }

    #[test]
    fn test_truncate_long_input() {
        let text = "a".repeat(600);
        assert_eq!(truncate_chars(&text, 512).chars().count(), 512);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // Multi-byte characters must not be split
        let text = "é".repeat(600);
        let truncated = truncate_chars(&text, 512);
        assert_eq!(truncated.chars().count(), 512);
        assert!(text.is_char_boundary(truncated.len()));
    }

    #[test]
    fn test_truncate_empty() {
        assert_eq!(truncate_chars("", 512), "");
    }
}
