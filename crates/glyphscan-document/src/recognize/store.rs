// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference store — the growable set of labeled glyph examples the classifier
// compares against, persisted as a flat sequence of fixed-size records.
//
// Record layout: FEATURE_VECTOR_LEN native-endian f64 values followed by one
// label byte. No header, no separators; the stream ends at end of file.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use glyphscan_core::config::SegmentationConfig;
use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_core::{ExampleCollection, FEATURE_VECTOR_LEN, FeatureVector, Label, LabeledExample};
use glyphscan_platform::PixelAllocator;
use tracing::{debug, info, instrument, warn};

use crate::page::document::Document;
use crate::scan::segment::segment_text;

/// Bytes per feature value.
const VALUE_LEN: usize = std::mem::size_of::<f64>();

/// Bytes per persisted example.
pub const RECORD_LEN: usize = FEATURE_VECTOR_LEN * VALUE_LEN + 1;

/// Labeled glyph examples, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceStore {
    examples: ExampleCollection,
    /// Backing file, when the store was opened from disk.
    path: Option<PathBuf>,
}

impl ReferenceStore {
    /// Empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store backed by `path`.
    ///
    /// A missing or unreadable file yields an empty store bound to the same
    /// path, so training can start from nothing and persist later.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut store = match fs::read(path) {
            Ok(bytes) => Self::decode(&bytes),
            Err(err) => {
                warn!(error = %err, "Reference store unavailable; starting empty");
                Self::new()
            }
        };
        store.path = Some(path.to_path_buf());
        info!(examples = store.len(), "Reference store loaded");
        store
    }

    /// Parse records from raw bytes. A trailing partial record is discarded.
    pub fn decode(bytes: &[u8]) -> Self {
        let records = bytes.chunks_exact(RECORD_LEN);
        let trailing = records.remainder().len();
        if trailing > 0 {
            warn!(trailing, "Discarding incomplete trailing record");
        }

        let mut examples = ExampleCollection::with_capacity(bytes.len() / RECORD_LEN);
        for record in records {
            let (values, label_byte) = record.split_at(FEATURE_VECTOR_LEN * VALUE_LEN);
            let label = Label::from_byte(label_byte[0]);
            if !label.is_glyph() {
                warn!(label = label_byte[0], "Skipping record with a marker label");
                continue;
            }

            let mut features = [0.0; FEATURE_VECTOR_LEN];
            for (value, raw) in features.iter_mut().zip(values.chunks_exact(VALUE_LEN)) {
                let mut buf = [0u8; VALUE_LEN];
                buf.copy_from_slice(raw);
                *value = f64::from_ne_bytes(buf);
            }
            examples.push(LabeledExample::glyph(label, FeatureVector::new(features)));
        }

        Self {
            examples,
            path: None,
        }
    }

    /// Read records until end of stream.
    pub fn read_from(reader: &mut impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::decode(&bytes))
    }

    /// Serialize every example, in insertion order.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len() * RECORD_LEN);
        for example in &self.examples {
            // Only glyphs with features are ever admitted.
            let Some(features) = &example.features else {
                continue;
            };
            for value in features.as_slice() {
                bytes.extend_from_slice(&value.to_ne_bytes());
            }
            bytes.push(example.label.to_byte());
        }
        bytes
    }

    pub fn write_to(&self, writer: &mut impl Write) -> Result<()> {
        writer.write_all(&self.encode())?;
        writer.flush()?;
        Ok(())
    }

    /// Write the store back to the file it was opened from.
    pub fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Err(GlyphscanError::Config(
                "reference store has no backing file".into(),
            )),
        }
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display(), examples = self.len()))]
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.encode())?;
        info!("Reference store saved");
        Ok(())
    }

    // -- Growth ---------------------------------------------------------------

    /// Append one labeled glyph. Markers, unlabeled examples and examples
    /// without features are rejected.
    pub fn add_example(&mut self, example: LabeledExample) -> Result<()> {
        if !example.label.is_glyph() {
            return Err(GlyphscanError::InvalidLabel(format!(
                "{:?} cannot be stored as a reference example",
                example.label
            )));
        }
        if example.features.is_none() {
            return Err(GlyphscanError::InvalidLabel(
                "reference examples need a feature vector".into(),
            ));
        }
        self.examples.push(example);
        Ok(())
    }

    /// Append every labeled glyph in `examples`, skipping markers and
    /// unlabeled glyphs. Returns how many were added.
    pub fn absorb(&mut self, examples: &ExampleCollection) -> usize {
        let before = self.len();
        self.examples.extend(
            examples
                .iter()
                .filter(|e| e.label.is_glyph() && e.features.is_some())
                .cloned(),
        );
        self.len() - before
    }

    /// Segment a binarized page whose glyphs are labeled, in reading order,
    /// by `labels`, and add the labeled glyphs. Returns how many were added.
    pub fn train(
        &mut self,
        doc: &mut Document,
        labels: &[u8],
        config: &SegmentationConfig,
        alloc: &dyn PixelAllocator,
    ) -> Result<usize> {
        let before = self.len();
        let examples = segment_text(self, doc, labels, config, alloc)?;
        let added = self.len() - before;
        if added < examples.glyph_count() {
            debug!(
                added,
                glyphs = examples.glyph_count(),
                "Fewer labels than glyphs; extra glyphs left out"
            );
        }
        Ok(added)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledExample> {
        self.examples.iter()
    }

    pub fn examples(&self) -> &ExampleCollection {
        &self.examples
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Training labels from free text: whitespace is dropped so each remaining
/// byte lines up with one glyph region.
pub fn labels_from_text(text: &str) -> Vec<u8> {
    text.bytes().filter(|b| !b.is_ascii_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(seed: f64) -> FeatureVector {
        let mut values = [0.0; FEATURE_VECTOR_LEN];
        for (i, v) in values.iter_mut().enumerate() {
            *v = (seed + i as f64 * 0.01).fract();
        }
        FeatureVector::new(values)
    }

    fn sample_store() -> ReferenceStore {
        let mut store = ReferenceStore::new();
        for (seed, label) in [(0.1, b'a'), (0.5, b'b'), (0.1, b'a'), (0.9, b'Z')] {
            store
                .add_example(LabeledExample::glyph(Label::Char(label), vector(seed)))
                .expect("add");
        }
        store
    }

    #[test]
    fn file_round_trip_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("training_set.bin");

        let store = sample_store();
        store.save_to(&path).expect("save");
        assert_eq!(
            std::fs::metadata(&path).expect("metadata").len(),
            (4 * RECORD_LEN) as u64
        );

        let loaded = ReferenceStore::open(&path);
        assert_eq!(loaded.examples(), store.examples());
        assert_eq!(loaded.path(), Some(path.as_path()));
    }

    #[test]
    fn partial_trailing_record_is_discarded() {
        let mut bytes = sample_store().encode();
        bytes.extend_from_slice(&[7u8; RECORD_LEN - 3]);

        let store = ReferenceStore::read_from(&mut bytes.as_slice()).expect("read");
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn writer_emits_fixed_size_records_in_order() {
        let store = sample_store();
        let mut out = Vec::new();
        store.write_to(&mut out).expect("write");

        assert_eq!(out.len(), 4 * RECORD_LEN);
        let labels: Vec<u8> = out.chunks_exact(RECORD_LEN).map(|r| r[RECORD_LEN - 1]).collect();
        assert_eq!(labels, b"abaZ".to_vec());
        assert_eq!(&out[..8], &0.1f64.to_ne_bytes());
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.bin");

        let mut store = ReferenceStore::open(&path);
        assert!(store.is_empty());

        store
            .add_example(LabeledExample::glyph(Label::Char(b'k'), vector(0.3)))
            .expect("add");
        store.persist().expect("persist");
        assert_eq!(ReferenceStore::open(&path).len(), 1);
    }

    #[test]
    fn in_memory_store_cannot_persist() {
        assert!(matches!(
            ReferenceStore::new().persist(),
            Err(GlyphscanError::Config(_))
        ));
    }

    #[test]
    fn marker_records_are_skipped() {
        let mut bytes = sample_store().encode();
        let last = bytes.len() - 1;
        bytes[last] = b'\n';
        assert_eq!(ReferenceStore::decode(&bytes).len(), 3);
    }

    #[test]
    fn rejects_markers_and_featureless_examples() {
        let mut store = ReferenceStore::new();
        assert!(store.add_example(LabeledExample::space()).is_err());
        assert!(
            store
                .add_example(LabeledExample::glyph(Label::Unlabeled, vector(0.2)))
                .is_err()
        );
        assert!(
            store
                .add_example(LabeledExample {
                    label: Label::Char(b'x'),
                    features: None
                })
                .is_err()
        );
        assert!(store.is_empty());
    }

    #[test]
    fn absorb_keeps_only_labeled_glyphs() {
        let mut examples = ExampleCollection::new();
        examples.push(LabeledExample::glyph(Label::Char(b'h'), vector(0.4)));
        examples.push(LabeledExample::space());
        examples.push(LabeledExample::glyph(Label::Unlabeled, vector(0.6)));
        examples.push(LabeledExample::newline());

        let mut store = ReferenceStore::new();
        assert_eq!(store.absorb(&examples), 1);
        assert_eq!(store.iter().next().map(|e| e.label), Some(Label::Char(b'h')));
    }

    #[test]
    fn labels_skip_whitespace() {
        assert_eq!(labels_from_text("ab c\nd\t"), b"abcd".to_vec());
    }
}
