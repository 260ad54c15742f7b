// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven service configuration
//!
//! All settings come from environment variables (a `.env` file is loaded
//! before this module runs). The model hub credential is mandatory; the
//! process must not start without it.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::explainer::GenerationParams;

/// Default classification model (RoBERTa hate-speech detector)
const DEFAULT_CLASSIFIER_REPO: &str = "facebook/roberta-hate-speech-dynabench-r4-target";

/// Default explanation model repo (small causal LM)
const DEFAULT_EXPLAINER_REPO: &str = "facebook/opt-125m";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HUGGINGFACE_TOKEN not found in environment variables")]
    MissingHfToken,

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Classifier model artifact locations and label set
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Model hub repo to fetch artifacts from
    pub repo: String,
    /// ONNX model file within the repo
    pub model_file: String,
    /// Tokenizer file within the repo
    pub tokenizer_file: String,
    /// Output labels in logit order
    pub labels: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            repo: DEFAULT_CLASSIFIER_REPO.to_string(),
            model_file: "onnx/model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            labels: vec!["nothate".to_string(), "hate".to_string()],
        }
    }
}

/// Explainer model artifact locations and generation parameters
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    /// Model hub repo to fetch the GGUF file from
    pub repo: String,
    /// GGUF file within the repo
    pub model_file: String,
    /// Generation parameters, fixed for the process lifetime
    pub generation: GenerationParams,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            repo: DEFAULT_EXPLAINER_REPO.to_string(),
            model_file: "opt-125m.q8_0.gguf".to_string(),
            generation: GenerationParams::default(),
        }
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port for the HTTP API
    pub api_port: u16,
    /// Cache directory for downloaded model artifacts
    pub models_dir: PathBuf,
    /// Model hub credential token (required)
    pub hf_token: String,
    pub classifier: ClassifierConfig,
    pub explainer: ExplainerConfig,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// Fails when `HUGGINGFACE_TOKEN` is absent or a numeric variable
    /// cannot be parsed; both are startup-fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        let hf_token = env::var("HUGGINGFACE_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingHfToken)?;

        let api_port = parse_var("API_PORT", 8000)?;
        let models_dir = PathBuf::from(
            env::var("MODELS_DIR").unwrap_or_else(|_| "./models".to_string()),
        );

        let mut classifier = ClassifierConfig::default();
        if let Ok(repo) = env::var("CLASSIFIER_REPO") {
            classifier.repo = repo;
        }
        if let Ok(file) = env::var("CLASSIFIER_MODEL_FILE") {
            classifier.model_file = file;
        }
        if let Ok(file) = env::var("CLASSIFIER_TOKENIZER_FILE") {
            classifier.tokenizer_file = file;
        }
        if let Ok(labels) = env::var("CLASSIFIER_LABELS") {
            classifier.labels = labels.split(',').map(|l| l.trim().to_string()).collect();
        }

        let mut explainer = ExplainerConfig::default();
        if let Ok(repo) = env::var("EXPLAINER_REPO") {
            explainer.repo = repo;
        }
        if let Ok(file) = env::var("EXPLAINER_MODEL_FILE") {
            explainer.model_file = file;
        }
        explainer.generation.gpu_layers = parse_var("GPU_LAYERS", 0)?;
        explainer.generation.context_size = parse_var("MAX_CONTEXT_LENGTH", 2048)?;

        Ok(Self {
            api_port,
            models_dir,
            hf_token,
            classifier,
            explainer,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}
