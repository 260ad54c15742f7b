// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tesseract-backed text extraction

use std::collections::HashMap;

use image::DynamicImage;
use rusty_tesseract::{Args, Image as TesseractImage};
use thiserror::Error;
use tracing::debug;

use crate::vision::preprocessing::prepare_for_ocr;

/// Page segmentation mode 6: assume a single uniform block of text
const PAGE_SEG_MODE: i32 = 6;

/// OCR engine mode 3: default, based on what is available
const ENGINE_MODE: i32 = 3;

/// Source resolution hint; Tesseract works best around 300 DPI
const SOURCE_DPI: i32 = 300;

/// Errors raised by the text extraction stage
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine failure: {0}")]
    Engine(String),
}

/// Extracts text from an image
///
/// Implemented by the Tesseract engine in production and by fakes in tests.
pub trait TextExtractor: Send + Sync {
    /// Extract text from an image, trimmed of surrounding whitespace.
    ///
    /// An empty string means no text was detected; callers must not treat
    /// it as a failure.
    fn extract_text(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Text extraction via the Tesseract binary invoked as a subprocess
///
/// Images are preprocessed (grayscale + contrast enhancement) before being
/// handed to Tesseract in single-uniform-text-block mode.
pub struct TesseractOcr {
    args: Args,
}

impl TesseractOcr {
    pub fn new() -> Self {
        Self {
            args: Args {
                lang: "eng".to_string(),
                config_variables: HashMap::new(),
                dpi: Some(SOURCE_DPI),
                psm: Some(PAGE_SEG_MODE),
                oem: Some(ENGINE_MODE),
            },
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for TesseractOcr {
    fn extract_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let prepared = prepare_for_ocr(image);
        debug!(
            width = prepared.width(),
            height = prepared.height(),
            "running tesseract on preprocessed image"
        );

        let tess_image = TesseractImage::from_dynamic_image(&DynamicImage::ImageLuma8(prepared))
            .map_err(|e| OcrError::Engine(format!("{e:?}")))?;

        let text = rusty_tesseract::image_to_string(&tess_image, &self.args)
            .map_err(|e| OcrError::Engine(format!("{e:?}")))?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_block_configuration() {
        let ocr = TesseractOcr::new();
        assert_eq!(ocr.args.psm, Some(6));
        assert_eq!(ocr.args.oem, Some(3));
        assert_eq!(ocr.args.lang, "eng");
    }

    #[test]
    fn test_ocr_error_display() {
        let err = OcrError::Engine("tesseract not found".to_string());
        assert!(err.to_string().contains("tesseract not found"));
    }
}
