// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyph normalization and zonal feature extraction.

use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_core::{
    BoundingBox, CANONICAL_GLYPH_DIM, FEATURE_VECTOR_LEN, FeatureVector, ZONES_PER_SIDE,
};
use glyphscan_platform::{PixelAllocator, PixelBuffer};

use crate::page::document::Document;

/// Side length of one zone in the canonical glyph.
const ZONE_DIM: usize = CANONICAL_GLYPH_DIM / ZONES_PER_SIDE;

/// Resample a glyph region to the canonical square using nearest-pixel
/// sampling.
///
/// `pixels` starts at the region's top-left; consecutive rows are `stride`
/// bytes apart. Returns a `CANONICAL_GLYPH_DIM` x `CANONICAL_GLYPH_DIM`
/// buffer of source pixel values.
pub fn resize_glyph(
    pixels: &[u8],
    height: usize,
    width: usize,
    stride: usize,
    alloc: &dyn PixelAllocator,
) -> Result<PixelBuffer> {
    check_region(pixels, height, width, stride)?;

    let dim = CANONICAL_GLYPH_DIM;
    let mut canonical = alloc.allocate(dim * dim, 0)?;
    for y in 0..dim {
        let src_y = source_index(y, dim, height);
        let row = &pixels[src_y * stride..];
        for x in 0..dim {
            canonical[x + y * dim] = row[source_index(x, dim, width)];
        }
    }
    Ok(canonical)
}

/// Compute the zonal ink densities of a glyph region.
///
/// The region is resized to the canonical square, split into a
/// `ZONES_PER_SIDE` x `ZONES_PER_SIDE` grid, and each zone reports the
/// fraction of its pixels equal to `ink`.
pub fn extract_features(
    pixels: &[u8],
    height: usize,
    width: usize,
    stride: usize,
    ink: u8,
    alloc: &dyn PixelAllocator,
) -> Result<FeatureVector> {
    let canonical = resize_glyph(pixels, height, width, stride, alloc)?;

    let zone_area = (ZONE_DIM * ZONE_DIM) as f64;
    let mut values = [0.0; FEATURE_VECTOR_LEN];
    for (zone, value) in values.iter_mut().enumerate() {
        let (zone_x, zone_y) = (zone % ZONES_PER_SIDE, zone / ZONES_PER_SIDE);
        let mut ink_count = 0usize;
        for y in zone_y * ZONE_DIM..(zone_y + 1) * ZONE_DIM {
            let row = &canonical[y * CANONICAL_GLYPH_DIM..(y + 1) * CANONICAL_GLYPH_DIM];
            ink_count += row[zone_x * ZONE_DIM..(zone_x + 1) * ZONE_DIM]
                .iter()
                .filter(|&&p| p == ink)
                .count();
        }
        *value = ink_count as f64 / zone_area;
    }
    Ok(FeatureVector::new(values))
}

/// Features of the glyph inside `bbox`, with the document's foreground as ink.
pub fn glyph_features(
    doc: &Document,
    bbox: &BoundingBox,
    alloc: &dyn PixelAllocator,
) -> Result<FeatureVector> {
    let offset = bbox.min_x + bbox.min_y * doc.width();
    let pixels = doc.pixels().get(offset..).ok_or(GlyphscanError::InvalidGeometry {
        width: bbox.width(),
        height: bbox.height(),
    })?;
    extract_features(
        pixels,
        bbox.height(),
        bbox.width(),
        doc.width(),
        doc.foreground().value(),
        alloc,
    )
}

fn check_region(pixels: &[u8], height: usize, width: usize, stride: usize) -> Result<()> {
    let invalid = GlyphscanError::InvalidGeometry { width, height };
    if height == 0 || width == 0 || stride < width {
        return Err(invalid);
    }
    if pixels.len() < (height - 1) * stride + width {
        return Err(invalid);
    }
    Ok(())
}

fn source_index(dest: usize, dest_len: usize, src_len: usize) -> usize {
    let scaled = (dest as f64 / dest_len as f64 * src_len as f64).round() as usize;
    scaled.min(src_len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphscan_core::Color;
    use glyphscan_platform::HeapAllocator;

    const INK: u8 = 0;

    #[test]
    fn solid_glyph_is_fully_inked() {
        let alloc = HeapAllocator::new();
        let pixels = vec![INK; 10 * 20];
        let features = extract_features(&pixels, 20, 10, 10, INK, &alloc).expect("features");
        assert!(features.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn left_half_ink_fills_left_zones() {
        let alloc = HeapAllocator::new();
        // 8 x 8 glyph, columns 0..4 inked.
        let pixels: Vec<u8> = (0..64).map(|i| if i % 8 < 4 { INK } else { 1 }).collect();
        let features = extract_features(&pixels, 8, 8, 8, INK, &alloc).expect("features");
        for row in features.as_slice().chunks(ZONES_PER_SIDE) {
            assert_eq!(row[0], 1.0);
            assert_eq!(row[3], 0.0);
        }
        assert!(features.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn honours_row_stride() {
        let alloc = HeapAllocator::new();
        // 2 x 2 inked region inside a 5-wide buffer whose other columns are blank.
        let pixels = [INK, INK, 1, 1, 1, INK, INK];
        let features = extract_features(&pixels, 2, 2, 5, INK, &alloc).expect("features");
        assert_eq!(features.total_density(), FEATURE_VECTOR_LEN as f64);
    }

    #[test]
    fn thin_diagonal_can_miss_every_sample() {
        let alloc = HeapAllocator::new();
        // 200 x 200 one-pixel anti-diagonal: samples land on multiples of 5,
        // which never sum to 199.
        let dim = 200;
        let pixels: Vec<u8> = (0..dim * dim)
            .map(|i| if i % dim + i / dim == dim - 1 { INK } else { 1 })
            .collect();
        let features = extract_features(&pixels, dim, dim, dim, INK, &alloc).expect("features");
        assert_eq!(features, FeatureVector::PUNCTUATION);
    }

    #[test]
    fn degenerate_regions_fail_fast() {
        let alloc = HeapAllocator::new();
        let pixels = [INK; 16];
        for (height, width, stride) in [(0, 4, 4), (4, 0, 4), (4, 4, 3), (5, 4, 4)] {
            let err = extract_features(&pixels, height, width, stride, INK, &alloc)
                .expect_err("must fail");
            assert!(matches!(err, GlyphscanError::InvalidGeometry { .. }));
        }
    }

    #[test]
    fn canonical_buffer_is_released() {
        let alloc = HeapAllocator::new();
        extract_features(&[INK; 9], 3, 3, 3, INK, &alloc).expect("features");
        assert_eq!(alloc.bytes_in_use(), 0);
    }

    #[test]
    fn glyph_features_use_document_foreground() {
        let alloc = HeapAllocator::new();
        let doc = Document::from_fn(12, 12, Color::Black, |x, y| {
            if (2..6).contains(&x) && (3..9).contains(&y) {
                Color::White
            } else {
                Color::Black
            }
        })
        .expect("document");
        let bbox = BoundingBox {
            min_x: 2,
            min_y: 3,
            max_x: 5,
            max_y: 8,
        };
        let features = glyph_features(&doc, &bbox, &alloc).expect("features");
        assert!(features.as_slice().iter().all(|&v| v == 1.0));
    }
}
