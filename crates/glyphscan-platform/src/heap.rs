// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop allocator: ordinary heap memory with fallible reservation.

use std::sync::Arc;

use glyphscan_core::error::{GlyphscanError, Result};
use tracing::{debug, error};

use crate::buffer::{Ledger, PixelBuffer};
use crate::traits::PixelAllocator;

/// Heap-backed allocator used on desktop builds.
#[derive(Debug, Default, Clone)]
pub struct HeapAllocator {
    ledger: Arc<Ledger>,
}

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PixelAllocator for HeapAllocator {
    fn allocate(&self, len: usize, fill: u8) -> Result<PixelBuffer> {
        let mut data = Vec::new();
        if let Err(err) = data.try_reserve_exact(len) {
            error!(len, %err, "heap allocation failed");
            return Err(GlyphscanError::AllocationFailed {
                requested: len,
                available: 0,
            });
        }
        // Without a budget the only refusal is an overflowing byte count.
        if self.ledger.reserve(len, None).is_err() {
            error!(len, in_use = self.ledger.in_use(), "heap ledger overflow");
            return Err(GlyphscanError::AllocationFailed {
                requested: len,
                available: usize::MAX - self.ledger.in_use(),
            });
        }
        data.resize(len, fill);
        debug!(len, in_use = self.ledger.in_use(), "heap buffer allocated");
        Ok(PixelBuffer::issued(data, Arc::clone(&self.ledger)))
    }

    fn name(&self) -> &str {
        "heap"
    }

    fn bytes_in_use(&self) -> usize {
        self.ledger.in_use()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_fills_and_tracks() {
        let alloc = HeapAllocator::new();
        let buf = alloc.allocate(64, 7).expect("allocate");
        assert_eq!(buf.len(), 64);
        assert!(buf.iter().all(|&b| b == 7));
        assert_eq!(alloc.bytes_in_use(), 64);

        buf.release();
        assert_eq!(alloc.bytes_in_use(), 0);
    }

    #[test]
    fn ledger_overflow_refuses_without_accounting() {
        let alloc = HeapAllocator::new();
        let held = usize::MAX - 8;
        alloc.ledger.reserve(held, None).expect("reserve");

        let err = alloc.allocate(64, 0).expect_err("must fail");
        assert!(matches!(
            err,
            GlyphscanError::AllocationFailed {
                requested: 64,
                available: 8
            }
        ));
        assert_eq!(alloc.bytes_in_use(), held);

        alloc.ledger.credit(held);
        assert_eq!(alloc.bytes_in_use(), 0);
    }

    #[test]
    fn zero_length_allocation_is_allowed() {
        let alloc = HeapAllocator::new();
        let buf = alloc.allocate(0, 0).expect("allocate");
        assert!(buf.is_empty());
    }
}
