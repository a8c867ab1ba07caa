// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glyphscan — platform allocation capability.
//
// The pipeline never calls the global allocator for pixel data directly; it
// asks a `PixelAllocator` for buffers. Desktop builds hand out ordinary heap
// memory, the embedded build draws from a fixed-size pool.

pub mod buffer;
pub mod heap;
pub mod pool;
pub mod traits;

pub use buffer::PixelBuffer;
pub use heap::HeapAllocator;
pub use pool::PoolAllocator;
pub use traits::PixelAllocator;

/// Pool size for the embedded board build.
pub const EMBEDDED_POOL_BYTES: usize = 32 * 1024 * 1024;

/// Returns the allocator for the target this crate was built for.
pub fn platform_allocator() -> Box<dyn PixelAllocator> {
    #[cfg(feature = "embedded")]
    {
        Box::new(PoolAllocator::with_capacity(EMBEDDED_POOL_BYTES))
    }
    #[cfg(not(feature = "embedded"))]
    {
        Box::new(HeapAllocator::new())
    }
}
