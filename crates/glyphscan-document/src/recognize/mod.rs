// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition — glyph normalization and zonal features, k-NN classification,
// and the persisted reference store.

pub mod classifier;
pub mod features;
pub mod store;

pub use classifier::{classify, classify_all};
pub use features::extract_features;
pub use store::ReferenceStore;
