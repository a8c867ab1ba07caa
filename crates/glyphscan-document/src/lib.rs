// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// glyphscan-document — page-image recognition for Glyphscan.
//
// Provides the binary document model and rotation (`page`), the scanning
// stages (Otsu binarization, Hough deskew, projection-profile segmentation),
// and recognition (zonal features, k-nearest-neighbour classification, the
// persisted reference store). `acquire` turns decoded images into the
// grayscale input the pipeline expects.

pub mod acquire;
pub mod page;
pub mod pipeline;
pub mod recognize;
pub mod scan;

// Re-export the primary entry points so callers can use
// `glyphscan_document::binarize` etc.
pub use acquire::GrayBuffer;
pub use page::document::Document;
pub use page::rotate::rotate;
pub use pipeline::{Pipeline, Recognition};
pub use recognize::classifier::{classify, classify_all, label_all};
pub use recognize::store::{ReferenceStore, labels_from_text};
pub use scan::binarize::binarize;
pub use scan::deskew::{SkewEstimate, deskew, detect_skew};
pub use scan::segment::{CharWidthTracker, Segmentation, Segmenter, segment_text};
