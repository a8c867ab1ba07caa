// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary document — one byte per pixel, row-major from the top-left, every
// pixel either `Color::Black` or `Color::White`.

use std::io::Write;

use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_core::{BoundingBox, Color};
use glyphscan_platform::PixelBuffer;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Value written into the boundary mask for box outlines.
pub const BOUNDARY_MARK: u8 = 1;

/// A binarized page.
///
/// The document uniquely owns its pixel buffer and (once segmentation has
/// run) its boundary mask. Rotation replaces the pixel buffer wholesale; the
/// previous buffer is released on replacement.
#[derive(Debug)]
pub struct Document {
    pixels: PixelBuffer,
    boundaries: Option<PixelBuffer>,
    width: usize,
    height: usize,
    background: Color,
}

impl Document {
    // -- Construction ---------------------------------------------------------

    /// Assemble a document from an already-binarized buffer.
    pub fn from_parts(
        pixels: PixelBuffer,
        width: usize,
        height: usize,
        background: Color,
    ) -> Result<Self> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(GlyphscanError::InvalidGeometry { width, height });
        }
        Ok(Self {
            pixels,
            boundaries: None,
            width,
            height,
            background,
        })
    }

    /// Build a document by evaluating `color_at(x, y)` for every pixel.
    ///
    /// The buffer is not drawn from any allocator; intended for synthetic
    /// pages.
    pub fn from_fn(
        width: usize,
        height: usize,
        background: Color,
        mut color_at: impl FnMut(usize, usize) -> Color,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(color_at(x, y).value());
            }
        }
        Self::from_parts(PixelBuffer::detached(data), width, height, background)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Majority color after binarization.
    pub fn background(&self) -> Color {
        self.background
    }

    /// Ink color; always the complement of the background.
    pub fn foreground(&self) -> Color {
        self.background.complement()
    }

    /// Row-major pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[x + y * self.width]
    }

    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.pixel(x, y) == self.foreground().value()
    }

    pub fn foreground_count(&self) -> usize {
        let fg = self.foreground().value();
        self.pixels.iter().filter(|&&p| p == fg).count()
    }

    /// Boundary mask written by segmentation, if it has run.
    pub fn boundaries(&self) -> Option<&[u8]> {
        self.boundaries.as_deref()
    }

    // -- Mutation -------------------------------------------------------------

    /// Swap in a new pixel buffer of identical dimensions. The old buffer is
    /// released.
    pub fn replace_pixels(&mut self, pixels: PixelBuffer) -> Result<()> {
        if pixels.len() != self.width * self.height {
            return Err(GlyphscanError::InvalidGeometry {
                width: self.width,
                height: self.height,
            });
        }
        let old = std::mem::replace(&mut self.pixels, pixels);
        old.release();
        Ok(())
    }

    pub(crate) fn set_boundaries(&mut self, mask: PixelBuffer) {
        self.boundaries = Some(mask);
    }

    // -- Debug output ---------------------------------------------------------

    /// Write every pixel value on its own line, row-major.
    pub fn write_pixel_dump(&self, out: &mut impl Write) -> Result<()> {
        write_values(&self.pixels, out)
    }

    /// Write the boundary mask in the same format as
    /// [`write_pixel_dump`](Self::write_pixel_dump). Writes nothing if the
    /// document has not been segmented.
    pub fn write_boundary_dump(&self, out: &mut impl Write) -> Result<()> {
        match &self.boundaries {
            Some(mask) => write_values(mask, out),
            None => Ok(()),
        }
    }

    /// Render as an 8-bit grayscale image (black 0, white 255).
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let value = self.pixel(x as usize, y as usize);
            Luma([if Color::from_value(value) == Color::White { 255 } else { 0 }])
        })
    }

    /// Render the page with segmentation boxes drawn in mid-gray.
    pub fn overlay_image(&self) -> GrayImage {
        let mut img = self.to_gray_image();
        if let Some(mask) = &self.boundaries {
            for (pixel, &mark) in img.pixels_mut().zip(mask.iter()) {
                if mark == BOUNDARY_MARK {
                    *pixel = Luma([128]);
                }
            }
        }
        img
    }
}

/// Draw the outline of `bbox` into a row-major mask of `width` x `height`.
pub(crate) fn draw_boundary(mask: &mut [u8], width: usize, height: usize, bbox: &BoundingBox) {
    let Some(mut canvas) =
        ImageBuffer::<Luma<u8>, &mut [u8]>::from_raw(width as u32, height as u32, mask)
    else {
        return;
    };
    let rect = Rect::at(bbox.min_x as i32, bbox.min_y as i32)
        .of_size(bbox.width() as u32, bbox.height() as u32);
    draw_hollow_rect_mut(&mut canvas, rect, Luma([BOUNDARY_MARK]));
}

fn write_values(values: &[u8], out: &mut impl Write) -> Result<()> {
    for value in values {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: usize, height: usize) -> Document {
        Document::from_fn(width, height, Color::White, |x, y| {
            if (x + y) % 2 == 0 { Color::Black } else { Color::White }
        })
        .expect("document")
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let result = Document::from_parts(PixelBuffer::detached(vec![0; 5]), 2, 3, Color::White);
        assert!(matches!(
            result,
            Err(GlyphscanError::InvalidGeometry { width: 2, height: 3 })
        ));
    }

    #[test]
    fn rejects_zero_sized_document() {
        let result = Document::from_parts(PixelBuffer::detached(Vec::new()), 0, 0, Color::White);
        assert!(result.is_err());
    }

    #[test]
    fn foreground_is_complement_of_background() {
        let doc = checker(4, 4);
        assert_eq!(doc.foreground(), Color::Black);
        assert_eq!(doc.foreground_count(), 8);
        assert!(doc.is_foreground(0, 0));
        assert!(!doc.is_foreground(1, 0));
    }

    #[test]
    fn pixel_dump_is_one_value_per_line() {
        let doc = checker(2, 2);
        let mut out = Vec::new();
        doc.write_pixel_dump(&mut out).expect("dump");
        assert_eq!(String::from_utf8(out).expect("utf8"), "0\n1\n1\n0\n");
    }

    #[test]
    fn boundary_dump_is_empty_before_segmentation() {
        let doc = checker(2, 2);
        let mut out = Vec::new();
        doc.write_boundary_dump(&mut out).expect("dump");
        assert!(out.is_empty());
    }

    #[test]
    fn draw_boundary_outlines_box() {
        let mut mask = vec![0u8; 6 * 5];
        let bbox = BoundingBox {
            min_x: 1,
            min_y: 1,
            max_x: 4,
            max_y: 3,
        };
        draw_boundary(&mut mask, 6, 5, &bbox);

        // Corners and edges are marked, the interior is not.
        assert_eq!(mask[1 + 6], BOUNDARY_MARK);
        assert_eq!(mask[4 + 3 * 6], BOUNDARY_MARK);
        assert_eq!(mask[2 + 2 * 6], 0);
        assert_eq!(mask[0], 0);
    }

    #[test]
    fn gray_rendering_maps_colors() {
        let img = checker(2, 1).to_gray_image();
        assert_eq!(img.get_pixel(0, 0).0[0], 0);
        assert_eq!(img.get_pixel(1, 0).0[0], 255);
    }
}
