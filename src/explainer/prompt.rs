// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Prompt template for explanation generation

use crate::classifier::Classification;

/// Render the explanation prompt for a classified message.
///
/// The classifier's [0, 1] score is shown as a percentage with two
/// decimal places.
pub fn render_prompt(text: &str, classification: &Classification) -> String {
    format!(
        "\nAnalyze this message and explain why it might be spam:\nMessage: {}\nClassification: {} ({:.2}%)\n",
        text,
        classification.label,
        f64::from(classification.score) * 100.0
    )
}
