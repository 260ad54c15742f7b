// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-spam API endpoint module
//!
//! Provides POST /detect-spam for analyzing uploaded images.

pub mod handler;
pub mod response;

pub use handler::detect_spam_handler;
pub use response::{DetectSpamResponse, NoTextResponse};
