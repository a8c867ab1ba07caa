// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotation of binary documents about their centre.

use glyphscan_core::config::RotationConfig;
use glyphscan_core::error::Result;
use glyphscan_platform::PixelAllocator;
use tracing::{debug, instrument};

use crate::page::document::Document;

/// Rotate `doc` by `angle_deg` degrees about its centre (clockwise as
/// displayed, since rows grow downwards).
///
/// Works backwards from the destination: every destination pixel is mapped
/// through the inverse rotation to a source pixel, so the result has no holes.
/// Destination pixels whose source falls outside the page, or whose source is
/// background, keep the background fill. Only foreground is copied.
///
/// Angles with magnitude below `config.epsilon_deg` leave the document
/// untouched.
#[instrument(skip(doc, config, alloc), fields(width = doc.width(), height = doc.height()))]
pub fn rotate(
    doc: &mut Document,
    angle_deg: f64,
    config: &RotationConfig,
    alloc: &dyn PixelAllocator,
) -> Result<()> {
    if angle_deg.abs() < config.epsilon_deg {
        debug!(angle_deg, "Rotation below epsilon; skipped");
        return Ok(());
    }

    let (width, height) = (doc.width(), doc.height());
    let background = doc.background().value();
    let foreground = doc.foreground().value();

    let mut output = alloc.allocate(width * height, background)?;

    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let x_center = (width / 2) as i64;
    let y_center = (height / 2) as i64;
    let source = doc.pixels();

    for y in 0..height {
        let dy = (y as i64 - y_center) as f64;
        for x in 0..width {
            let dx = (x as i64 - x_center) as f64;

            let src_x = x_center + (dx * cos + dy * sin) as i64;
            if src_x < 0 || src_x >= width as i64 {
                continue;
            }
            let src_y = y_center + (dy * cos - dx * sin) as i64;
            if src_y < 0 || src_y >= height as i64 {
                continue;
            }

            if source[src_x as usize + src_y as usize * width] == foreground {
                output[x + y * width] = foreground;
            }
        }
    }

    doc.replace_pixels(output)?;
    debug!(angle_deg, "Rotation applied");
    Ok(())
}
