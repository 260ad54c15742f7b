// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model artifact management
//!
//! Fetches pretrained model files from the HuggingFace hub by repo name,
//! authenticated with the required credential token and cached under the
//! configured models directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use hf_hub::api::sync::{Api, ApiBuilder};
use tracing::info;

/// Paths to the classifier artifacts on local disk
#[derive(Debug, Clone)]
pub struct ClassifierAssets {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Downloads model artifacts from the hub, reusing cached files
pub struct ModelFetcher {
    api: Api,
}

impl ModelFetcher {
    /// Create a fetcher authenticated with the hub credential token.
    pub fn new(token: &str, cache_dir: PathBuf) -> Result<Self> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir)
            .with_token(Some(token.to_string()))
            .build()
            .context("Failed to initialize model hub client")?;

        Ok(Self { api })
    }

    /// Fetch a single file from a model repo, returning its local path.
    pub fn fetch(&self, repo: &str, filename: &str) -> Result<PathBuf> {
        info!(repo, filename, "fetching model artifact");
        self.api
            .model(repo.to_string())
            .get(filename)
            .with_context(|| format!("Failed to fetch {filename} from {repo}"))
    }

    /// Fetch the classifier's ONNX model and tokenizer files.
    pub fn fetch_classifier(
        &self,
        repo: &str,
        model_file: &str,
        tokenizer_file: &str,
    ) -> Result<ClassifierAssets> {
        let model_path = self.fetch(repo, model_file)?;
        let tokenizer_path = self.fetch(repo, tokenizer_file)?;

        Ok(ClassifierAssets {
            model_path,
            tokenizer_path,
        })
    }
}
