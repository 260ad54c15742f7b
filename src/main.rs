// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use spamscan_node::{
    api::{start_server, AppState},
    analysis::SpamDetector,
    classifier::OnnxTextClassifier,
    config::AppConfig,
    explainer::LlamaExplainer,
    models::ModelFetcher,
    vision::TesseractOcr,
};
use std::{env, net::SocketAddr, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting spamscan node v{}", env!("CARGO_PKG_VERSION"));

    // Missing hub credential is startup-fatal
    let config = AppConfig::from_env().context("configuration error")?;

    let fetcher = ModelFetcher::new(&config.hf_token, config.models_dir.clone())
        .context("failed to initialize model fetcher")?;

    let assets = fetcher
        .fetch_classifier(
            &config.classifier.repo,
            &config.classifier.model_file,
            &config.classifier.tokenizer_file,
        )
        .context("failed to fetch classifier artifacts")?;

    let classifier = OnnxTextClassifier::load(
        &assets.model_path,
        &assets.tokenizer_path,
        config.classifier.labels.clone(),
    )
    .context("failed to load spam classifier model")?;
    info!("✅ Spam classifier model loaded");

    let gguf_path = fetcher
        .fetch(&config.explainer.repo, &config.explainer.model_file)
        .context("failed to fetch explainer model")?;

    let explainer = LlamaExplainer::load(&gguf_path, config.explainer.generation.clone())
        .context("failed to load explanation generator model")?;
    info!("✅ Explanation generator model loaded");

    let detector = SpamDetector::new(Arc::new(classifier), Arc::new(explainer));

    let state = AppState {
        ocr: Arc::new(TesseractOcr::new()),
        detector: Arc::new(detector),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    start_server(addr, state).await
}
