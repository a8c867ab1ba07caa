// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image acquisition — turns decoded images or raw bitmap payloads into the
// top-down grayscale buffer the binarizer consumes.

use std::path::Path;

use glyphscan_core::error::{GlyphscanError, Result};
use image::{DynamicImage, GrayImage};
use tracing::{debug, info, instrument};

/// Luminosity weights for red, green, and blue.
const LUMA_WEIGHTS: (f64, f64, f64) = (0.21, 0.72, 0.07);

/// Owned 8-bit grayscale pixels, row-major from the top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayBuffer {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
}

impl GrayBuffer {
    // -- Construction ---------------------------------------------------------

    /// Wrap raw intensities. `pixels.len()` must equal `width * height`.
    pub fn new(pixels: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(GlyphscanError::InvalidGeometry { width, height });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Load and decode an image file (PNG, BMP, JPEG, TIFF, ...).
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            GlyphscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self::from_dynamic(&img))
    }

    /// Decode an image from encoded bytes.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            GlyphscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self::from_dynamic(&img))
    }

    /// Reduce a decoded image to grayscale using luminosity weights.
    ///
    /// Single-channel images are taken as-is.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        if let DynamicImage::ImageLuma8(gray) = img {
            return Self::from_gray_image(gray.clone());
        }

        let rgb = img.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        let pixels = rgb
            .pixels()
            .map(|p| luminosity(p.0[0], p.0[1], p.0[2]))
            .collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn from_gray_image(img: GrayImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self {
            pixels: img.into_raw(),
            width,
            height,
        }
    }

    /// Convert a raw 24-bit BGR bitmap payload stored bottom row first, with
    /// each row padded to a multiple of four bytes.
    pub fn from_bgr_bottom_up(raw: &[u8], width: usize, height: usize) -> Result<Self> {
        let row_bytes = (width * 3).div_ceil(4) * 4;
        if width == 0 || height == 0 || raw.len() < row_bytes * height {
            return Err(GlyphscanError::InvalidGeometry { width, height });
        }

        let mut pixels = vec![0u8; width * height];
        for (src_row, row) in raw.chunks_exact(row_bytes).take(height).enumerate() {
            let dest_row = height - src_row - 1;
            for x in 0..width {
                let b = row[x * 3];
                let g = row[x * 3 + 1];
                let r = row[x * 3 + 2];
                pixels[x + dest_row * width] = luminosity(r, g, b);
            }
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

fn luminosity(r: u8, g: u8, b: u8) -> u8 {
    let (wr, wg, wb) = LUMA_WEIGHTS;
    (wr * r as f64 + wg * g as f64 + wb * b as f64).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(GrayBuffer::new(vec![0; 3], 2, 2).is_err());
        assert!(GrayBuffer::new(Vec::new(), 0, 0).is_ok());
    }

    #[test]
    fn luminosity_weights_channels() {
        assert_eq!(luminosity(255, 255, 255), 255);
        assert_eq!(luminosity(0, 0, 0), 0);
        assert_eq!(luminosity(100, 0, 0), 21);
        assert_eq!(luminosity(0, 100, 0), 72);
    }

    #[test]
    fn from_dynamic_rgb() {
        let img = RgbImage::from_fn(3, 2, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let gray = GrayBuffer::from_dynamic(&DynamicImage::ImageRgb8(img));
        assert_eq!((gray.width(), gray.height()), (3, 2));
        assert_eq!(gray.pixels(), &[0, 255, 255, 0, 255, 255]);
    }

    #[test]
    fn bottom_up_rows_are_flipped() {
        // 1 pixel wide, 2 rows, each row padded from 3 to 4 bytes.
        // Stored bottom row (black) first, then top row (white).
        let raw = [0, 0, 0, 0, 255, 255, 255, 0];
        let gray = GrayBuffer::from_bgr_bottom_up(&raw, 1, 2).expect("convert");
        assert_eq!(gray.pixels(), &[255, 0]);
    }

    #[test]
    fn bottom_up_rejects_short_payload() {
        assert!(GrayBuffer::from_bgr_bottom_up(&[0; 7], 1, 2).is_err());
    }

    #[test]
    fn from_bytes_rejects_garbage() {
        let err = GrayBuffer::from_bytes(b"not an image").expect_err("must fail");
        assert!(matches!(err, GlyphscanError::ImageError(_)));
    }
}
