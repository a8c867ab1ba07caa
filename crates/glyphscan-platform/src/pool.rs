// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded allocator: a fixed byte budget standing in for the board's memory
// pool. Requests beyond the budget fail instead of growing.

use std::sync::Arc;

use glyphscan_core::error::{GlyphscanError, Result};
use tracing::{debug, error};

use crate::buffer::{Ledger, PixelBuffer};
use crate::traits::PixelAllocator;

/// Budgeted allocator for resource-constrained targets.
#[derive(Debug, Clone)]
pub struct PoolAllocator {
    capacity: usize,
    ledger: Arc<Ledger>,
}

impl PoolAllocator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ledger: Arc::new(Ledger::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes still available for new buffers.
    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.ledger.in_use())
    }
}

impl PixelAllocator for PoolAllocator {
    fn allocate(&self, len: usize, fill: u8) -> Result<PixelBuffer> {
        if let Err(available) = self.ledger.reserve(len, Some(self.capacity)) {
            error!(len, available, capacity = self.capacity, "pixel pool exhausted");
            return Err(GlyphscanError::AllocationFailed {
                requested: len,
                available,
            });
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.ledger.credit(len);
            return Err(GlyphscanError::AllocationFailed {
                requested: len,
                available: self.available(),
            });
        }
        data.resize(len, fill);

        debug!(len, available = self.available(), "pool buffer allocated");
        Ok(PixelBuffer::issued(data, Arc::clone(&self.ledger)))
    }

    fn name(&self) -> &str {
        "pool"
    }

    fn bytes_in_use(&self) -> usize {
        self.ledger.in_use()
    }
}
