// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image ingestion and OCR
//!
//! Decodes uploaded image bytes in-memory, preprocesses them for OCR
//! (grayscale, contrast enhancement), and extracts text with Tesseract.

pub mod image_utils;
pub mod ocr;
pub mod preprocessing;

pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use ocr::{OcrError, TesseractOcr, TextExtractor};
