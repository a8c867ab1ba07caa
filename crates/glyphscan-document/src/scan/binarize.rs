// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global binarization with Otsu's method.

use glyphscan_core::Color;
use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_platform::PixelAllocator;
use tracing::{debug, info, instrument};

use crate::acquire::GrayBuffer;
use crate::page::document::Document;

/// 256-bin intensity histogram.
pub fn histogram(pixels: &[u8]) -> [u64; 256] {
    let mut histogram = [0u64; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }
    histogram
}

/// Compute the Otsu threshold for an intensity histogram.
///
/// Candidate splits put intensities `0..=t` in the lower class and the rest
/// in the upper class. The split maximising the between-class variance
/// `w_b * w_f * (mean_b - mean_f)^2` wins; on ties the first maximum is
/// kept. The returned value is the lowest intensity of the upper class, so
/// pixels `>= threshold` belong to it.
///
/// Returns `None` for an empty histogram. A histogram with a single occupied
/// bin has no valid split and yields `Some(0)`: everything is upper class.
pub fn otsu_threshold(histogram: &[u64; 256]) -> Option<u8> {
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }

    let total_intensity: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut weight_background: u64 = 0;
    let mut sum_background: f64 = 0.0;
    let mut max_variance: f64 = 0.0;
    let mut threshold: u8 = 0;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        sum_background += t as f64 * count as f64;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }

        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (total_intensity - sum_background) / weight_foreground as f64;
        let between_variance = weight_background as f64
            * weight_foreground as f64
            * (mean_background - mean_foreground).powi(2);

        if between_variance > max_variance {
            max_variance = between_variance;
            // t < 255 here: at t == 255 the upper class is empty.
            threshold = (t + 1) as u8;
        }
    }

    Some(threshold)
}

/// Binarize a grayscale page.
///
/// Pixels at or above the Otsu threshold become white, the rest black. The
/// majority color becomes the background (ties go to black). Consumes the
/// grayscale input.
#[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
pub fn binarize(gray: GrayBuffer, alloc: &dyn PixelAllocator) -> Result<Document> {
    let (width, height) = (gray.width(), gray.height());
    let threshold = otsu_threshold(&histogram(gray.pixels())).ok_or(GlyphscanError::EmptyImage)?;
    debug!(threshold, "Otsu threshold computed");

    let mut output = alloc.allocate(width * height, Color::White.value())?;
    let mut black_count = 0usize;
    for (out, &intensity) in output.iter_mut().zip(gray.pixels()) {
        if intensity < threshold {
            *out = Color::Black.value();
            black_count += 1;
        }
    }
    drop(gray);

    let white_count = width * height - black_count;
    let background = if white_count > black_count {
        Color::White
    } else {
        Color::Black
    };
    info!(threshold, black_count, white_count, ?background, "Binarization complete");

    Document::from_parts(output, width, height, background)
}
