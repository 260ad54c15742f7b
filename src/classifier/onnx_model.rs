// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX text-classification model wrapper
//!
//! Runs a pretrained sequence-classification model (RoBERTa hate-speech
//! detector by default) through ONNX Runtime on CPU:
//! - tokenization with the model's HuggingFace tokenizer (truncated to 512 tokens)
//! - single forward pass producing per-label logits
//! - softmax + argmax to a label and confidence score

use anyhow::{Context, Result};
use ndarray::{Array2, Axis};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use super::{truncate_chars, Classification, ClassifyError, TextClassifier, MAX_INPUT_CHARS};

/// Token budget for the classification model
const MAX_TOKENS: usize = 512;

/// ONNX-based text classifier
///
/// # Thread Safety
/// The session is wrapped in `Arc<Mutex>` for thread-safe shared access;
/// the tokenizer is immutable after load and shared via `Arc`.
#[derive(Clone)]
pub struct OnnxTextClassifier {
    /// ONNX Runtime session (wrapped in Arc<Mutex> for thread-safe shared access)
    session: Arc<Mutex<Session>>,

    /// HuggingFace tokenizer
    tokenizer: Arc<Tokenizer>,

    /// Ordered output labels; index i names logit i
    labels: Vec<String>,
}

impl std::fmt::Debug for OnnxTextClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextClassifier")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl OnnxTextClassifier {
    /// Load a classifier from disk paths
    ///
    /// # Arguments
    /// - `model_path`: Path to the ONNX model file
    /// - `tokenizer_path`: Path to the tokenizer JSON file
    /// - `labels`: Output label names, in logit order
    ///
    /// # Errors
    /// Returns an error if either file is missing or invalid, or if ONNX
    /// Runtime initialization fails.
    pub fn load<P: AsRef<Path>>(model_path: P, tokenizer_path: P, labels: Vec<String>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }
        if labels.is_empty() {
            anyhow::bail!("Classifier label set must not be empty");
        }

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        info!(labels = ?labels, "text classification model loaded");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels,
        })
    }
}

impl TextClassifier for OnnxTextClassifier {
    /// Classify a piece of text
    ///
    /// # Implementation
    /// 1. Truncate to the 512-character budget (defensive; callers already cap)
    /// 2. Tokenize with truncation at 512 tokens
    /// 3. Run ONNX inference over input_ids + attention_mask
    /// 4. Softmax over the logits, argmax to a label
    fn classify(&self, text: &str) -> Result<Classification, ClassifyError> {
        let text = truncate_chars(text, MAX_INPUT_CHARS);

        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifyError::Tokenization(e.to_string()))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();

        let seq_len = input_ids.len();
        let input_ids_array = Array2::from_shape_vec((1, seq_len), input_ids)
            .map_err(|e| ClassifyError::InvalidInput(e.to_string()))?;
        let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask)
            .map_err(|e| ClassifyError::InvalidInput(e.to_string()))?;

        // Run inference - lock session for thread-safe access
        let mut session_guard = self
            .session
            .lock()
            .map_err(|_| ClassifyError::UnexpectedOutput("session lock poisoned".to_string()))?;
        let outputs = session_guard.run(ort::inputs![
            "input_ids" => Value::from_array(input_ids_array)?,
            "attention_mask" => Value::from_array(attention_mask_array)?
        ])?;

        // Sequence classification models output logits of shape [batch, num_labels]
        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| ClassifyError::UnexpectedOutput(e.to_string()))?;

        let shape = output_array.shape();
        if shape.len() != 2 || shape[1] != self.labels.len() {
            return Err(ClassifyError::UnexpectedOutput(format!(
                "logits shape {:?} does not match {} labels",
                shape,
                self.labels.len()
            )));
        }

        let logits: Vec<f32> = output_array.index_axis(Axis(0), 0).iter().copied().collect();
        let probabilities = softmax(&logits);

        let (best_idx, best_score) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| ClassifyError::UnexpectedOutput("empty logits".to_string()))?;

        Ok(Classification {
            label: self.labels[best_idx].clone(),
            score: best_score,
        })
    }
}

/// Numerically stable softmax over a logit slice
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_orders_by_logit() {
        let probs = softmax(&[0.5, 2.5]);
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_uniform_logits() {
        let probs = softmax(&[4.0, 4.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!((probs[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_handles_large_logits() {
        // Stability: large logits must not overflow to NaN
        let probs = softmax(&[1000.0, 1001.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!(probs[1] > probs[0]);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let result = OnnxTextClassifier::load(
            "/nonexistent/model.onnx",
            "/nonexistent/tokenizer.json",
            vec!["nothate".to_string(), "hate".to_string()],
        );
        assert!(result.is_err());
    }
}
