// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Natural-language explanation generation
//!
//! Renders a fixed prompt from the classification result and obtains
//! generated text from a pretrained causal language model.

pub mod engine;
pub mod prompt;

use thiserror::Error;

use crate::classifier::Classification;

pub use engine::{GenerationParams, LlamaExplainer};
pub use prompt::render_prompt;

/// Errors raised by the explanation stage
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("failed to tokenize prompt: {0}")]
    Tokenize(String),

    #[error("generation failed: {0}")]
    Generation(String),
}

/// Generates a human-readable explanation for a classification result
pub trait ExplanationGenerator: Send + Sync {
    fn explain(&self, text: &str, classification: &Classification) -> Result<String, ExplainError>;
}
