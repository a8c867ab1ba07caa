// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Skew detection with a Hough transform restricted to near-horizontal lines,
// and correction by rotation.

use glyphscan_core::config::{DeskewConfig, RotationConfig};
use glyphscan_core::error::Result;
use glyphscan_platform::PixelAllocator;
use tracing::{debug, info, instrument};

use crate::page::document::Document;
use crate::page::rotate::rotate;

/// Hough angle of a horizontal line. Angles are those of the line normal,
/// measured with rows growing downwards.
const HORIZONTAL_DEG: f64 = 90.0;

/// Outcome of a skew search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Normal angle of the dominant line, in degrees (90 = horizontal).
    pub hough_angle_deg: f64,
    /// Votes collected by the winning (angle, distance) cell.
    pub votes: u32,
}

impl SkewEstimate {
    /// Tilt of the dominant line relative to horizontal. Positive values
    /// mean the line descends to the right.
    pub fn skew_deg(&self) -> f64 {
        self.hough_angle_deg - HORIZONTAL_DEG
    }

    /// Rotation that brings the dominant line back to horizontal.
    pub fn correction_deg(&self) -> f64 {
        HORIZONTAL_DEG - self.hough_angle_deg
    }
}

/// Find the dominant near-horizontal line orientation.
///
/// Every foreground pixel votes once per candidate angle in
/// `90 +/- max_skew_deg` (step `angle_step_deg`) for the distance bin of
/// `r = x cos(theta) + y sin(theta)`. Distance bins evenly split
/// `[-diagonal, +diagonal]`. The cell with the most votes wins; among equal
/// cells the first in angle-major, distance-minor order is kept.
///
/// A page without foreground reports a horizontal line with zero votes.
#[instrument(skip_all, fields(width = doc.width(), height = doc.height()))]
pub fn detect_skew(doc: &Document, config: &DeskewConfig) -> SkewEstimate {
    let (width, height) = (doc.width(), doc.height());
    let angle_bins = config.angle_bins();
    let distance_bins = config.distance_bins;
    let center_bin = (angle_bins / 2) as i64;

    let max_r = ((width as f64).powi(2) + (height as f64).powi(2)).sqrt().trunc();
    let r_delta = 2.0 * max_r / distance_bins as f64;
    let r_offset = (distance_bins / 2) as i64;

    let angle_of =
        |bin: usize| (bin as i64 - center_bin) as f64 * config.angle_step_deg + HORIZONTAL_DEG;
    let trig: Vec<(f64, f64)> = (0..angle_bins)
        .map(|bin| {
            let (sin, cos) = angle_of(bin).to_radians().sin_cos();
            (cos, sin)
        })
        .collect();

    // votes[angle * distance_bins + r]
    let mut votes = vec![0u32; angle_bins * distance_bins];
    let foreground = doc.foreground().value();
    let pixels = doc.pixels();

    for y in 0..height {
        for x in 0..width {
            if pixels[x + y * width] != foreground {
                continue;
            }
            let (xf, yf) = (x as f64, y as f64);
            for (angle, &(cos, sin)) in trig.iter().enumerate() {
                let r = xf * cos + yf * sin;
                let bin = ((r / r_delta).floor() as i64 + r_offset)
                    .clamp(0, distance_bins as i64 - 1) as usize;
                votes[angle * distance_bins + bin] += 1;
            }
        }
    }

    let mut best = SkewEstimate {
        hough_angle_deg: HORIZONTAL_DEG,
        votes: 0,
    };
    for (angle, row) in votes.chunks_exact(distance_bins).enumerate() {
        for &count in row {
            if count > best.votes {
                best = SkewEstimate {
                    hough_angle_deg: angle_of(angle),
                    votes: count,
                };
            }
        }
    }

    debug!(
        hough_angle_deg = best.hough_angle_deg,
        votes = best.votes,
        angle_bins,
        distance_bins,
        "Hough vote complete"
    );
    best
}

/// Detect the page skew and rotate the page to remove it.
#[instrument(skip_all, fields(width = doc.width(), height = doc.height()))]
pub fn deskew(
    doc: &mut Document,
    deskew_config: &DeskewConfig,
    rotation_config: &RotationConfig,
    alloc: &dyn PixelAllocator,
) -> Result<SkewEstimate> {
    let estimate = detect_skew(doc, deskew_config);
    info!(
        skew_deg = estimate.skew_deg(),
        correction_deg = estimate.correction_deg(),
        "Skew detected"
    );
    rotate(doc, estimate.correction_deg(), rotation_config, alloc)?;
    Ok(estimate)
}
