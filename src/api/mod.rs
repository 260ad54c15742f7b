// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect_spam;
pub mod errors;
pub mod http_server;

pub use detect_spam::{detect_spam_handler, DetectSpamResponse, NoTextResponse};
pub use errors::ApiError;
pub use http_server::{build_router, start_server, AppState, HealthResponse};
