// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The allocation capability consumed by the pipeline.

use glyphscan_core::error::Result;

use crate::buffer::PixelBuffer;

/// Hands out pixel buffers. Release happens when the returned
/// [`PixelBuffer`] is dropped.
pub trait PixelAllocator: Send + Sync {
    /// Allocate `len` bytes, each set to `fill`.
    ///
    /// Fails with `GlyphscanError::AllocationFailed` when the platform cannot
    /// satisfy the request. There is no recovery path for that error.
    fn allocate(&self, len: usize, fill: u8) -> Result<PixelBuffer>;

    /// Human-readable allocator name for logs.
    fn name(&self) -> &str;

    /// Bytes currently handed out and not yet released.
    fn bytes_in_use(&self) -> usize;
}
