// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GGUF causal-LM generation via llama.cpp

use anyhow::{anyhow, Result};
use llama_cpp_2::{
    context::params::LlamaContextParams,
    llama_backend::LlamaBackend,
    llama_batch::LlamaBatch,
    model::{params::LlamaModelParams, AddBos, LlamaModel, Special},
    sampling::LlamaSampler,
};
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

use super::{render_prompt, ExplainError, ExplanationGenerator};
use crate::classifier::Classification;

/// Batch size for prompt decoding; must exceed the largest prompt the
/// 512-character input cap can produce
const BATCH_SIZE: usize = 1024;

/// Fallback when the model produces no usable output
const NO_EXPLANATION: &str = "No explanation available";

/// Generation parameters, fixed at initialization and shared by all requests
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on newly generated tokens
    pub max_tokens: usize,
    /// Seed for the sampling distribution
    pub seed: u32,
    /// Context window size in tokens
    pub context_size: u32,
    /// Number of layers to offload to the GPU
    pub gpu_layers: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 128,
            seed: 42,
            context_size: 2048,
            gpu_layers: 0,
        }
    }
}

// Backend and model are loaded once and live for the process lifetime
struct LoadedModel {
    backend: LlamaBackend,
    model: LlamaModel,
}

/// Explanation generator backed by a GGUF model through llama.cpp
///
/// Generation runs synchronously under a mutex; a fresh context is created
/// per call so no decoding state leaks between requests.
pub struct LlamaExplainer {
    inner: Mutex<LoadedModel>,
    params: GenerationParams,
}

impl LlamaExplainer {
    /// Load a GGUF model from disk
    pub fn load(model_path: &Path, params: GenerationParams) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("GGUF model file not found: {}", model_path.display());
        }

        let backend =
            LlamaBackend::init().map_err(|e| anyhow!("Failed to initialize backend: {:?}", e))?;

        let model_params = LlamaModelParams::default().with_n_gpu_layers(params.gpu_layers);

        let model = LlamaModel::load_from_file(&backend, model_path, &model_params)
            .map_err(|e| anyhow!("Failed to load model: {:?}", e))?;

        info!(
            model = %model_path.display(),
            temperature = params.temperature,
            max_tokens = params.max_tokens,
            "explanation generator model loaded"
        );

        Ok(Self {
            inner: Mutex::new(LoadedModel { backend, model }),
            params,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String, ExplainError> {
        let start_time = Instant::now();
        let inner = self
            .inner
            .lock()
            .map_err(|_| ExplainError::Generation("model lock poisoned".to_string()))?;

        let prompt_tokens = inner
            .model
            .str_to_token(prompt, AddBos::Always)
            .map_err(|e| ExplainError::Tokenize(format!("{e:?}")))?;

        let ctx_params = LlamaContextParams::default()
            .with_n_ctx(NonZeroU32::new(self.params.context_size))
            .with_n_batch(BATCH_SIZE as u32);

        let mut context = inner
            .model
            .new_context(&inner.backend, ctx_params)
            .map_err(|e| ExplainError::Generation(format!("Failed to create context: {e:?}")))?;

        let mut batch = LlamaBatch::new(BATCH_SIZE, 1);

        // Add all prompt tokens with only the last one requesting logits
        for (i, &token) in prompt_tokens.iter().enumerate() {
            let is_last = i == prompt_tokens.len() - 1;
            batch
                .add(token, i as i32, &[0], is_last)
                .map_err(|e| ExplainError::Generation(format!("Failed to add token: {e:?}")))?;
        }

        context
            .decode(&mut batch)
            .map_err(|e| ExplainError::Generation(format!("Decode failed: {e:?}")))?;

        let eos_token = inner.model.token_eos();

        // Sampling enabled: temperature then draw from the distribution
        let mut sampler = LlamaSampler::chain_simple([
            LlamaSampler::temp(self.params.temperature),
            LlamaSampler::dist(self.params.seed),
        ]);

        let mut output = String::new();
        let mut n_cur = prompt_tokens.len();

        while n_cur < prompt_tokens.len() + self.params.max_tokens {
            let new_token_id = sampler.sample(&context, -1);

            if new_token_id == eos_token {
                break;
            }

            // Invalid UTF-8 tokens are skipped but the model state still advances
            if let Ok(token_str) = inner.model.token_to_str(new_token_id, Special::Plaintext) {
                output.push_str(&token_str);
            }

            batch.clear();
            batch
                .add(new_token_id, n_cur as i32, &[0], true)
                .map_err(|e| ExplainError::Generation(format!("Failed to add token: {e:?}")))?;
            context
                .decode(&mut batch)
                .map_err(|e| ExplainError::Generation(format!("Decode failed: {e:?}")))?;

            n_cur += 1;
        }

        debug!(
            tokens_generated = n_cur - prompt_tokens.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "generation finished"
        );

        Ok(output)
    }
}

impl ExplanationGenerator for LlamaExplainer {
    fn explain(&self, text: &str, classification: &Classification) -> Result<String, ExplainError> {
        let prompt = render_prompt(text, classification);
        let sanitized = sanitize_for_tokenizer(&prompt);

        let generated = self.generate(&sanitized)?;
        let generated = generated.trim();

        if generated.is_empty() {
            Ok(NO_EXPLANATION.to_string())
        } else {
            Ok(generated.to_string())
        }
    }
}

/// Sanitize prompt text for tokenization
///
/// Removes null bytes and C0 control characters (except tab, newline and
/// carriage return) that break C string handling in llama.cpp. OCR output
/// from noisy images can contain such bytes.
fn sanitize_for_tokenizer(prompt: &str) -> String {
    prompt
        .chars()
        .filter(|c| *c != '\0' && (*c >= ' ' || *c == '\t' || *c == '\n' || *c == '\r'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation_params() {
        let params = GenerationParams::default();
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.max_tokens, 128);
    }

    #[test]
    fn test_sanitize_removes_null_bytes() {
        let result = sanitize_for_tokenizer("Hello\0World");
        assert_eq!(result, "HelloWorld");
        assert!(!result.contains('\0'));
    }

    #[test]
    fn test_sanitize_removes_control_characters() {
        let result = sanitize_for_tokenizer("Hello\x01\x02\x03World");
        assert_eq!(result, "HelloWorld");
    }

    #[test]
    fn test_sanitize_preserves_whitespace() {
        let input = "Hello\tWorld\nNew\rLine";
        assert_eq!(sanitize_for_tokenizer(input), input);
    }

    #[test]
    fn test_sanitize_preserves_unicode() {
        let input = "You won! Prix de 1000€ 🎉";
        assert_eq!(sanitize_for_tokenizer(input), input);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let result = LlamaExplainer::load(
            Path::new("/nonexistent/model.gguf"),
            GenerationParams::default(),
        );
        assert!(result.is_err());
    }
}
