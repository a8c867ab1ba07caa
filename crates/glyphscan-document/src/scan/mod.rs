// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — global binarization, skew detection and correction,
// and line/glyph segmentation.

pub mod binarize;
pub mod deskew;
pub mod segment;

pub use binarize::binarize;
pub use deskew::{deskew, detect_skew};
pub use segment::segment_text;
