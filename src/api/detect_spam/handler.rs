// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detect-spam endpoint handler

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::response::{round_score, DetectSpamResponse, NoTextResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::decode_image_bytes;

/// POST /detect-spam - Analyze an uploaded image for spam content
///
/// Accepts a multipart form with an `image` file field and runs the
/// OCR -> classification -> explanation pipeline over it.
///
/// # Response
/// Always HTTP 200 for pipeline outcomes:
/// - `{text, spam_score, explanation}` when text was found and analyzed
/// - `{error: "No text detected"}` when OCR found nothing usable
///
/// Model-stage failures surface inside the report body as a sentinel
/// (score 0, explanation describing the failure), not as an HTTP error.
///
/// # Errors
/// - 400 Bad Request: malformed multipart body or missing `image` field
pub async fn detect_spam_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    debug!(%request_id, "detect-spam request received");

    let image_bytes = read_image_field(multipart).await.map_err(|e| {
        warn!(%request_id, "invalid upload: {e}");
        let status =
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, e.to_string())
    })?;

    // Each request decodes into its own in-memory buffer; nothing is shared
    let image = match decode_image_bytes(&image_bytes) {
        Ok((image, info)) => {
            debug!(
                %request_id,
                width = info.width,
                height = info.height,
                size_bytes = info.size_bytes,
                "image decoded"
            );
            image
        }
        Err(e) => {
            warn!(%request_id, "unreadable image: {e}");
            return Ok(Json(NoTextResponse::no_text_detected()).into_response());
        }
    };

    let text = match state.ocr.extract_text(&image) {
        Ok(text) => text,
        Err(e) => {
            warn!(%request_id, "OCR failed: {e}");
            return Ok(Json(NoTextResponse::no_text_detected()).into_response());
        }
    };

    if text.is_empty() {
        info!(%request_id, "no text detected in image");
        return Ok(Json(NoTextResponse::no_text_detected()).into_response());
    }

    debug!(%request_id, chars = text.len(), "text extracted");

    let analysis = state.detector.analyze(&text);
    info!(
        %request_id,
        label = %analysis.label,
        spam_score = analysis.spam_score,
        "analysis complete"
    );

    let response = DetectSpamResponse {
        text,
        spam_score: round_score(analysis.spam_score),
        explanation: analysis.explanation,
    };

    Ok(Json(response).into_response())
}

/// Pull the `image` file field out of the multipart body
async fn read_image_field(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            return field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("failed to read image field: {e}")));
        }
    }

    Err(ApiError::ValidationError {
        field: "image".to_string(),
        message: "image file field is required".to_string(),
    })
}
