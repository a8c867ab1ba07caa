// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Glyphscan OCR pipeline.

use serde::{Deserialize, Serialize};

/// Side length, in pixels, of the square a glyph is resampled to before
/// feature extraction.
pub const CANONICAL_GLYPH_DIM: usize = 40;

/// Number of zones along one side of the canonical glyph.
pub const ZONES_PER_SIDE: usize = 4;

/// Number of entries in a [`FeatureVector`] (one per zone).
pub const FEATURE_VECTOR_LEN: usize = ZONES_PER_SIDE * ZONES_PER_SIDE;

/// Pixel color of a binarized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    /// Byte stored in a document pixel buffer for this color.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// The other color.
    pub fn complement(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }

    /// Interpret a pixel byte. Anything non-zero reads as white.
    pub fn from_value(value: u8) -> Self {
        if value == 0 { Self::Black } else { Self::White }
    }
}

/// Class label attached to an example.
///
/// `Space` and `Newline` are structural markers emitted by segmentation and
/// never carry a feature vector. `Unlabeled` marks a glyph awaiting
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Unlabeled,
    Space,
    Newline,
    Char(u8),
}

impl Label {
    /// Single-byte encoding used by the reference-set file format.
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Unlabeled => 0,
            Self::Space => b' ',
            Self::Newline => b'\n',
            Self::Char(c) => c,
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Unlabeled,
            b' ' => Self::Space,
            b'\n' => Self::Newline,
            c => Self::Char(c),
        }
    }

    /// Character this label renders as, if any.
    pub fn as_char(self) -> Option<char> {
        match self {
            Self::Unlabeled => None,
            Self::Space => Some(' '),
            Self::Newline => Some('\n'),
            Self::Char(c) => Some(char::from(c)),
        }
    }

    /// True for labels that name a glyph class.
    pub fn is_glyph(self) -> bool {
        matches!(self, Self::Char(_))
    }
}

/// Zonal ink densities of one canonically resized glyph.
///
/// Each entry is the fraction of ink pixels in its zone, so every entry lies
/// in `[0, 1]`. Zones are ordered row-major, top-left first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_VECTOR_LEN]);

impl FeatureVector {
    /// Placeholder assigned to small punctuation marks, which skip normal
    /// feature extraction.
    ///
    /// Extracted vectors can also be all zero: nearest-pixel sampling may step
    /// over every pixel of a glyph thinner than the sampling pitch (a one-pixel
    /// diagonal wider than the canonical square, say). Such a glyph is then
    /// indistinguishable from stored punctuation.
    pub const PUNCTUATION: Self = Self([0.0; FEATURE_VECTOR_LEN]);

    pub fn new(values: [f64; FEATURE_VECTOR_LEN]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Squared Euclidean distance to `other`.
    pub fn squared_distance(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Sum of all zone densities (at most [`FEATURE_VECTOR_LEN`]).
    pub fn total_density(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::PUNCTUATION
    }
}

/// A label plus the features it was observed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub label: Label,
    /// Absent for space and newline markers.
    pub features: Option<FeatureVector>,
}

impl LabeledExample {
    pub fn glyph(label: Label, features: FeatureVector) -> Self {
        Self {
            label,
            features: Some(features),
        }
    }

    pub fn space() -> Self {
        Self {
            label: Label::Space,
            features: None,
        }
    }

    pub fn newline() -> Self {
        Self {
            label: Label::Newline,
            features: None,
        }
    }

    /// True for structural markers (space/newline).
    pub fn is_marker(&self) -> bool {
        matches!(self.label, Label::Space | Label::Newline)
    }
}

/// Ordered, append-only sequence of examples. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleCollection {
    examples: Vec<LabeledExample>,
}

impl ExampleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            examples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, example: LabeledExample) {
        self.examples.push(example);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledExample> {
        self.examples.iter()
    }

    pub fn as_slice(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Number of examples that carry a feature vector (glyphs, not markers).
    pub fn glyph_count(&self) -> usize {
        self.examples.iter().filter(|e| e.features.is_some()).count()
    }
}

impl Extend<LabeledExample> for ExampleCollection {
    fn extend<I: IntoIterator<Item = LabeledExample>>(&mut self, iter: I) {
        self.examples.extend(iter);
    }
}

impl FromIterator<LabeledExample> for ExampleCollection {
    fn from_iter<I: IntoIterator<Item = LabeledExample>>(iter: I) -> Self {
        Self {
            examples: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ExampleCollection {
    type Item = LabeledExample;
    type IntoIter = std::vec::IntoIter<LabeledExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExampleCollection {
    type Item = &'a LabeledExample;
    type IntoIter = std::slice::Iter<'a, LabeledExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

/// Axis-aligned pixel rectangle, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl BoundingBox {
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}
