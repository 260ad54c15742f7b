// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-spam response types

use serde::{Deserialize, Serialize};

/// Successful detection report
///
/// `spam_score` is a percentage in [0, 100] rounded to two decimal places.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectSpamResponse {
    /// Text extracted from the uploaded image
    pub text: String,
    /// Classifier confidence scaled to a percentage
    pub spam_score: f64,
    /// Generated natural-language explanation
    pub explanation: String,
}

/// Body returned when the pipeline could not produce a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoTextResponse {
    pub error: String,
}

impl NoTextResponse {
    pub fn no_text_detected() -> Self {
        Self {
            error: "No text detected".to_string(),
        }
    }
}

/// Round a score to two decimal places for the wire
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization_uses_wire_keys() {
        let response = DetectSpamResponse {
            text: "hello".to_string(),
            spam_score: 87.65,
            explanation: "looks fine".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"text\":\"hello\""));
        assert!(json.contains("\"spam_score\":87.65"));
        assert!(json.contains("\"explanation\":\"looks fine\""));
    }

    #[test]
    fn test_no_text_body() {
        let json = serde_json::to_string(&NoTextResponse::no_text_detected()).unwrap();
        assert_eq!(json, r#"{"error":"No text detected"}"#);
    }

    #[test]
    fn test_round_score_two_decimals() {
        assert_eq!(round_score(87.654), 87.65);
        assert_eq!(round_score(87.656), 87.66);
        assert_eq!(round_score(0.0), 0.0);
        assert_eq!(round_score(100.0), 100.0);
    }

    #[test]
    fn test_round_score_preserves_exact_values() {
        assert_eq!(round_score(97.0), 97.0);
    }
}
