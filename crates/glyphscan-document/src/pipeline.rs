// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline facade — binds a configuration and an allocator to the individual
// stages so callers drive recognition without threading both through every
// call.

use glyphscan_core::error::Result;
use glyphscan_core::{ExampleCollection, OcrConfig};
use glyphscan_platform::{PixelAllocator, platform_allocator};
use tracing::{info, instrument};

use crate::acquire::GrayBuffer;
use crate::page::document::Document;
use crate::recognize::classifier;
use crate::recognize::store::ReferenceStore;
use crate::scan::deskew::{self, SkewEstimate};
use crate::scan::segment::{self, CharWidthTracker, Segmenter};
use crate::{page, scan};

/// Text recognized from one page, plus the processed page for inspection.
#[derive(Debug)]
pub struct Recognition {
    pub text: String,
    /// The binarized, deskewed page with its boundary mask populated.
    pub document: Document,
    pub skew: SkewEstimate,
}

pub struct Pipeline {
    config: OcrConfig,
    allocator: Box<dyn PixelAllocator>,
}

impl Pipeline {
    /// Build a pipeline after validating `config`.
    pub fn new(config: OcrConfig, allocator: Box<dyn PixelAllocator>) -> Result<Self> {
        config.validate()?;
        info!(allocator = allocator.name(), "Pipeline ready");
        Ok(Self { config, allocator })
    }

    /// Default configuration on the platform's allocator.
    pub fn with_defaults() -> Self {
        Self {
            config: OcrConfig::default(),
            allocator: platform_allocator(),
        }
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    pub fn allocator(&self) -> &dyn PixelAllocator {
        self.allocator.as_ref()
    }

    // -- Stages ---------------------------------------------------------------

    pub fn binarize(&self, gray: GrayBuffer) -> Result<Document> {
        scan::binarize::binarize(gray, self.allocator())
    }

    pub fn rotate(&self, doc: &mut Document, angle_deg: f64) -> Result<()> {
        page::rotate::rotate(doc, angle_deg, &self.config.rotation, self.allocator())
    }

    pub fn deskew(&self, doc: &mut Document) -> Result<SkewEstimate> {
        deskew::deskew(doc, &self.config.deskew, &self.config.rotation, self.allocator())
    }

    pub fn segment_text(
        &self,
        store: &mut ReferenceStore,
        doc: &mut Document,
        labels: &[u8],
    ) -> Result<ExampleCollection> {
        segment::segment_text(store, doc, labels, &self.config.segmentation, self.allocator())
    }

    pub fn classify_all(&self, store: &ReferenceStore, set: &ExampleCollection) -> Result<String> {
        classifier::classify_all(store, set, self.config.classifier.k)
    }

    // -- End to end -----------------------------------------------------------

    /// Binarize and deskew a labeled sample page, then add its labeled glyphs
    /// to `store`. Returns how many examples were added.
    #[instrument(
        skip_all,
        fields(width = gray.width(), height = gray.height(), labels = labels.len())
    )]
    pub fn train(
        &self,
        store: &mut ReferenceStore,
        gray: GrayBuffer,
        labels: &[u8],
    ) -> Result<usize> {
        let mut doc = self.binarize(gray)?;
        self.deskew(&mut doc)?;
        let added = store.train(&mut doc, labels, &self.config.segmentation, self.allocator())?;
        info!(added, total = store.len(), "Training page absorbed");
        Ok(added)
    }

    /// Binarize, deskew, segment and classify one page.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn recognize(&self, store: &ReferenceStore, gray: GrayBuffer) -> Result<Recognition> {
        let mut document = self.binarize(gray)?;
        let skew = self.deskew(&mut document)?;
        let segmentation = Segmenter::new(&self.config.segmentation, self.allocator()).segment(
            &mut document,
            &[],
            CharWidthTracker::new(),
        )?;
        let text = self.classify_all(store, &segmentation.examples)?;
        info!(
            chars = text.len(),
            lines = segmentation.line_count,
            "Page recognized"
        );
        Ok(Recognition {
            text,
            document,
            skew,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphscan_core::config::ClassifierConfig;
    use glyphscan_core::{GlyphscanError, Label};
    use glyphscan_platform::{HeapAllocator, PoolAllocator};

    /// 100 x 40 white page with two 10 x 20 black rectangles. The second is
    /// hollow when `hollow_second` is set.
    fn two_blocks(hollow_second: bool) -> GrayBuffer {
        let (width, height) = (100, 40);
        let mut pixels = vec![255u8; width * height];
        for y in 10..30 {
            for x in 20..30 {
                pixels[x + y * width] = 0;
            }
            for x in 60..70 {
                let edge = x < 62 || x >= 68 || y < 12 || y >= 28;
                if !hollow_second || edge {
                    pixels[x + y * width] = 0;
                }
            }
        }
        GrayBuffer::new(pixels, width, height).expect("gray")
    }

    fn pipeline_with_k(k: usize) -> Pipeline {
        let config = OcrConfig {
            classifier: ClassifierConfig { k },
            ..OcrConfig::default()
        };
        Pipeline::new(config, Box::new(HeapAllocator::new())).expect("pipeline")
    }

    #[test]
    fn two_blocks_make_two_regions_on_one_line() {
        let pipeline = pipeline_with_k(1);
        let mut store = ReferenceStore::new();
        let mut doc = pipeline.binarize(two_blocks(false)).expect("binarize");
        let skew = pipeline.deskew(&mut doc).expect("deskew");
        assert_eq!(skew.correction_deg(), 0.0);

        let examples = pipeline.segment_text(&mut store, &mut doc, &[]).expect("segment");
        assert_eq!(examples.glyph_count(), 2);
        let newlines = examples
            .iter()
            .filter(|e| e.label == Label::Newline)
            .count();
        assert_eq!(newlines, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn train_then_recognize_identical_blocks() {
        let pipeline = pipeline_with_k(1);
        let mut store = ReferenceStore::new();

        let added = pipeline.train(&mut store, two_blocks(false), b"ll").expect("train");
        assert_eq!(added, 2);

        let recognition = pipeline.recognize(&store, two_blocks(false)).expect("recognize");
        assert_eq!(recognition.text, "l l\n");
        assert!(recognition.document.boundaries().is_some());
    }

    #[test]
    fn distinct_shapes_keep_their_labels() {
        let pipeline = pipeline_with_k(1);
        let mut store = ReferenceStore::new();
        pipeline.train(&mut store, two_blocks(true), b"AB").expect("train");

        let recognition = pipeline.recognize(&store, two_blocks(true)).expect("recognize");
        assert_eq!(recognition.text, "A B\n");
    }

    #[test]
    fn recognizing_without_references_is_unclassifiable() {
        let pipeline = pipeline_with_k(1);
        let err = pipeline
            .recognize(&ReferenceStore::new(), two_blocks(false))
            .expect_err("must fail");
        assert!(matches!(err, GlyphscanError::Unclassifiable(_)));
    }

    #[test]
    fn defaults_use_the_platform_allocator() {
        let pipeline = Pipeline::with_defaults();
        assert!(pipeline.config().validate().is_ok());
        assert_eq!(pipeline.allocator().bytes_in_use(), 0);
    }

    #[test]
    fn rotate_uses_configured_epsilon() {
        let pipeline = pipeline_with_k(1);
        let mut doc = pipeline.binarize(two_blocks(false)).expect("binarize");
        let before = doc.pixels().to_vec();

        pipeline.rotate(&mut doc, 0.05).expect("rotate");
        assert_eq!(doc.pixels(), &before[..]);
        pipeline.rotate(&mut doc, 5.0).expect("rotate");
        assert_ne!(doc.pixels(), &before[..]);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Pipeline::new(
            OcrConfig {
                classifier: ClassifierConfig { k: 0 },
                ..OcrConfig::default()
            },
            Box::new(HeapAllocator::new()),
        );
        assert!(matches!(result, Err(GlyphscanError::Config(_))));
    }

    #[test]
    fn exhausted_pool_is_fatal() {
        let pipeline =
            Pipeline::new(OcrConfig::default(), Box::new(PoolAllocator::with_capacity(1024)))
                .expect("pipeline");
        let err = pipeline.binarize(two_blocks(false)).expect_err("must fail");
        assert!(matches!(err, GlyphscanError::AllocationFailed { .. }));
    }

    #[test]
    fn buffers_return_to_the_pool() {
        let pipeline =
            Pipeline::new(OcrConfig::default(), Box::new(PoolAllocator::with_capacity(64 * 1024)))
                .expect("pipeline");
        let mut store = ReferenceStore::new();
        pipeline.train(&mut store, two_blocks(false), b"ii").expect("train");
        assert_eq!(pipeline.allocator().bytes_in_use(), 0);
    }
}
