// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Uniquely owned pixel storage that returns its bytes to the issuing
// allocator when dropped.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

/// Byte accounting shared between an allocator and the buffers it issued.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    in_use: AtomicUsize,
}

impl Ledger {
    pub(crate) fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    /// Record `len` bytes as handed out, refusing if that would exceed
    /// `capacity`. Returns the bytes that were available on failure.
    pub(crate) fn reserve(&self, len: usize, capacity: Option<usize>) -> Result<(), usize> {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(len)?;
                match capacity {
                    Some(cap) if next > cap => None,
                    _ => Some(next),
                }
            })
            .map(|_| ())
            .map_err(|current| capacity.map_or(0, |cap| cap.saturating_sub(current)))
    }

    pub(crate) fn credit(&self, len: usize) {
        self.in_use.fetch_sub(len, Ordering::AcqRel);
    }
}

/// A pixel buffer owned by exactly one holder.
///
/// Moving the buffer transfers ownership; there is no `Clone`. Dropping it
/// (or calling [`release`](Self::release)) returns the bytes to the allocator
/// that issued it.
pub struct PixelBuffer {
    data: Vec<u8>,
    ledger: Option<Arc<Ledger>>,
}

impl PixelBuffer {
    pub(crate) fn issued(data: Vec<u8>, ledger: Arc<Ledger>) -> Self {
        Self {
            data,
            ledger: Some(ledger),
        }
    }

    /// Wrap bytes that were not obtained from any allocator.
    pub fn detached(data: Vec<u8>) -> Self {
        Self { data, ledger: None }
    }

    /// Explicitly give the buffer back. Equivalent to dropping it.
    pub fn release(self) {
        trace!(len = self.data.len(), "pixel buffer released");
        drop(self);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Deref for PixelBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PixelBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PixelBuffer {
    fn drop(&mut self) {
        if let Some(ledger) = self.ledger.take() {
            ledger.credit(self.data.len());
        }
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("len", &self.data.len())
            .field("tracked", &self.ledger.is_some())
            .finish()
    }
}
