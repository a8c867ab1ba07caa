// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line and glyph segmentation from row and column projection profiles.
//
// A row pass finds text bands; a column pass inside each band finds glyph
// regions. Glyphs are turned into labeled examples (with zonal features),
// interleaved with space and newline markers, and their outlines are drawn
// into the document's boundary mask.

use glyphscan_core::config::SegmentationConfig;
use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_core::{BoundingBox, ExampleCollection, FeatureVector, Label, LabeledExample};
use glyphscan_platform::{PixelAllocator, PixelBuffer};
use tracing::{debug, info, instrument};

use crate::page::document::{Document, draw_boundary};
use crate::recognize::features::glyph_features;
use crate::recognize::store::ReferenceStore;

// ---------------------------------------------------------------------------
// Width tracker
// ---------------------------------------------------------------------------

/// Running average of glyph widths, used to decide when a gap is a space.
///
/// Passed into each segmentation run and handed back with the result, so
/// independent runs never share state unless the caller threads it through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharWidthTracker {
    total_width: usize,
    measured: usize,
}

impl CharWidthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, width: usize) {
        self.total_width += width;
        self.measured += 1;
    }

    /// Mean width of the glyphs recorded so far.
    pub fn average(&self) -> Option<f64> {
        (self.measured > 0).then(|| self.total_width as f64 / self.measured as f64)
    }

    pub fn measured(&self) -> usize {
        self.measured
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Result of segmenting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Glyphs in reading order, with space and newline markers.
    pub examples: ExampleCollection,
    /// Tight bounding box of each glyph, parallel to the glyph examples.
    pub glyph_boxes: Vec<BoundingBox>,
    /// Number of text bands found.
    pub line_count: usize,
    /// Width tracker after this run.
    pub widths: CharWidthTracker,
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

pub struct Segmenter<'a> {
    config: &'a SegmentationConfig,
    alloc: &'a dyn PixelAllocator,
}

/// Per-run mutable state.
struct Run<'l> {
    labels: &'l [u8],
    examples: ExampleCollection,
    glyph_boxes: Vec<BoundingBox>,
    widths: CharWidthTracker,
    mask: PixelBuffer,
}

impl<'a> Segmenter<'a> {
    pub fn new(config: &'a SegmentationConfig, alloc: &'a dyn PixelAllocator) -> Self {
        Self { config, alloc }
    }

    /// Segment `doc` into labeled examples and populate its boundary mask.
    ///
    /// Glyph `i` (counting every glyph region, punctuation included) takes
    /// `labels[i]` when present and is left unlabeled otherwise. Label bytes
    /// that collide with the unlabeled, space or newline encodings are
    /// rejected before any work is done.
    #[instrument(
        skip_all,
        fields(width = doc.width(), height = doc.height(), labels = labels.len())
    )]
    pub fn segment(
        &self,
        doc: &mut Document,
        labels: &[u8],
        widths: CharWidthTracker,
    ) -> Result<Segmentation> {
        if let Some(&bad) = labels.iter().find(|&&b| !Label::from_byte(b).is_glyph()) {
            return Err(GlyphscanError::InvalidLabel(format!(
                "label byte {bad:#04x} is reserved for markers"
            )));
        }

        let (width, height) = (doc.width(), doc.height());
        let mut run = Run {
            labels,
            examples: ExampleCollection::new(),
            glyph_boxes: Vec::new(),
            widths,
            mask: self.alloc.allocate(width * height, 0)?,
        };

        let fg = doc.foreground().value();
        let row_profile: Vec<usize> = doc
            .pixels()
            .chunks_exact(width)
            .map(|row| row.iter().filter(|&&p| p == fg).count())
            .collect();

        let is_text = |y: usize| row_profile[y] as f64 / width as f64 > self.config.row_threshold;
        let buffer = self.config.pixel_buffer;
        let mut band_start: Option<usize> = None;
        let mut line_count = 0usize;
        for y in 0..height {
            match band_start {
                None if is_text(y) => band_start = Some(y.saturating_sub(buffer)),
                Some(top) if !is_text(y) => {
                    // The expansion stops short of the next band's first text row.
                    let bottom = (y..=(y + buffer).min(height - 1))
                        .take_while(|&row| !is_text(row))
                        .last()
                        .unwrap_or(y);
                    self.segment_band(doc, top, bottom, &mut run)?;
                    line_count += 1;
                    band_start = None;
                }
                _ => {}
            }
        }
        // Text running into the bottom edge.
        if let Some(top) = band_start {
            self.segment_band(doc, top, height - 1, &mut run)?;
            line_count += 1;
        }

        let Run {
            examples,
            glyph_boxes,
            widths,
            mask,
            ..
        } = run;
        doc.set_boundaries(mask);

        info!(
            lines = line_count,
            glyphs = glyph_boxes.len(),
            examples = examples.len(),
            "Segmentation complete"
        );
        Ok(Segmentation {
            examples,
            glyph_boxes,
            line_count,
            widths,
        })
    }

    /// Column pass over rows `top..=bottom`.
    fn segment_band(
        &self,
        doc: &Document,
        top: usize,
        bottom: usize,
        run: &mut Run<'_>,
    ) -> Result<()> {
        let width = doc.width();
        let line_height = bottom - top + 1;
        let fg = doc.foreground().value();
        let pixels = doc.pixels();

        let mut column_profile = vec![0usize; width];
        for row in pixels[top * width..(bottom + 1) * width].chunks_exact(width) {
            for (count, &p) in column_profile.iter_mut().zip(row) {
                if p == fg {
                    *count += 1;
                }
            }
        }

        let band_glyphs = run.glyph_boxes.len();
        let mut glyph_start: Option<usize> = None;
        let mut prev_max_x: Option<usize> = None;
        // One step past the right edge closes a glyph touching it.
        for x in 0..=width {
            let is_ink = x < width
                && column_profile[x] as f64 / line_height as f64 > self.config.column_threshold;
            match glyph_start {
                None if is_ink => glyph_start = Some(x),
                Some(start) if !is_ink => {
                    glyph_start = None;
                    let Some(bbox) = tighten(doc, start, x - 1, top, bottom) else {
                        continue;
                    };
                    self.emit_glyph(doc, bbox, top, bottom, prev_max_x, run)?;
                    prev_max_x = Some(bbox.max_x);
                }
                _ => {}
            }
        }

        let band = BoundingBox {
            min_x: 0,
            min_y: top,
            max_x: width - 1,
            max_y: bottom,
        };
        draw_boundary(&mut run.mask, width, doc.height(), &band);
        run.examples.push(LabeledExample::newline());

        debug!(top, bottom, glyphs = run.glyph_boxes.len() - band_glyphs, "Band segmented");
        Ok(())
    }

    fn emit_glyph(
        &self,
        doc: &Document,
        bbox: BoundingBox,
        top: usize,
        bottom: usize,
        prev_max_x: Option<usize>,
        run: &mut Run<'_>,
    ) -> Result<()> {
        if let (Some(prev), Some(average)) = (prev_max_x, run.widths.average()) {
            let gap = bbox.min_x - prev - 1;
            if gap as f64 >= self.config.space_fraction * average {
                run.examples.push(LabeledExample::space());
            }
        }

        let line_height = bottom - top + 1;
        let midpoint = (top + bottom) / 2;
        let straddles_midpoint = bbox.min_y <= midpoint && bbox.max_y >= midpoint;
        let is_punctuation = (bbox.height() as f64 / line_height as f64)
            < self.config.punctuation_ratio
            && !straddles_midpoint;

        let features = if is_punctuation {
            FeatureVector::PUNCTUATION
        } else {
            let features = glyph_features(doc, &bbox, self.alloc)?;
            run.widths.record(bbox.width());
            features
        };

        let label = run
            .labels
            .get(run.glyph_boxes.len())
            .map_or(Label::Unlabeled, |&b| Label::Char(b));
        run.examples.push(LabeledExample::glyph(label, features));
        run.glyph_boxes.push(bbox);

        let buffer = self.config.pixel_buffer;
        let outline = BoundingBox {
            min_x: bbox.min_x.saturating_sub(buffer),
            min_y: bbox.min_y.saturating_sub(buffer),
            max_x: (bbox.max_x + buffer).min(doc.width() - 1),
            max_y: (bbox.max_y + buffer).min(doc.height() - 1),
        };
        draw_boundary(&mut run.mask, doc.width(), doc.height(), &outline);
        Ok(())
    }
}

/// Tightest box around the foreground in columns `min_x..=max_x` and rows
/// `top..=bottom`.
fn tighten(
    doc: &Document,
    min_x: usize,
    max_x: usize,
    top: usize,
    bottom: usize,
) -> Option<BoundingBox> {
    let has_ink = |y: usize| (min_x..=max_x).any(|x| doc.is_foreground(x, y));
    let min_y = (top..=bottom).find(|&y| has_ink(y))?;
    let max_y = (min_y..=bottom).rev().find(|&y| has_ink(y))?;
    Some(BoundingBox {
        min_x,
        min_y,
        max_x,
        max_y,
    })
}

/// Segment `doc` with a fresh width tracker and add every labeled glyph to
/// `store`.
///
/// Returns the full example sequence, markers and unlabeled glyphs included.
pub fn segment_text(
    store: &mut ReferenceStore,
    doc: &mut Document,
    labels: &[u8],
    config: &SegmentationConfig,
    alloc: &dyn PixelAllocator,
) -> Result<ExampleCollection> {
    let segmentation = Segmenter::new(config, alloc).segment(doc, labels, CharWidthTracker::new())?;
    let added = store.absorb(&segmentation.examples);
    if added > 0 {
        debug!(added, total = store.len(), "Labeled glyphs added to reference store");
    }
    Ok(segmentation.examples)
}
