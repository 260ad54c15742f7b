// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for OCR

use image::{DynamicImage, GrayImage, Luma};

/// Contrast enhancement factor applied before text extraction
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Prepare an image for OCR
///
/// Steps:
/// 1. Convert to grayscale
/// 2. Enhance contrast with a fixed factor
pub fn prepare_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    enhance_contrast(&gray, CONTRAST_FACTOR)
}

/// Enhance contrast of a grayscale image
///
/// Pixels are spread away from the image mean:
/// `out = mean + factor * (pixel - mean)`, clamped to [0, 255].
/// A factor of 1.0 returns the image unchanged, factors above 1.0
/// increase contrast.
pub fn enhance_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let sum: u64 = image.pixels().map(|p| u64::from(p[0])).sum();
    let mean = sum as f32 / (u64::from(width) * u64::from(height)) as f32;

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = mean + factor * (f32::from(pixel[0]) - mean);
        output.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
    }

    output
}
