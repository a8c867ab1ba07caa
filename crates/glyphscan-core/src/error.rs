// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Glyphscan.

use thiserror::Error;

/// Top-level error type for all Glyphscan operations.
#[derive(Debug, Error)]
pub enum GlyphscanError {
    // -- Geometry / precondition errors --
    #[error("invalid geometry: {width}x{height}")]
    InvalidGeometry { width: usize, height: usize },

    #[error("cannot binarize an image with no pixels")]
    EmptyImage,

    // -- Recognition errors --
    #[error("unclassifiable: {0}")]
    Unclassifiable(String),

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    // -- Resources --
    #[error("allocation of {requested} bytes failed ({available} bytes available)")]
    AllocationFailed { requested: usize, available: usize },

    // -- Acquisition --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GlyphscanError>;
