// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page module — the binary document model and rotation.

pub mod document;
pub mod rotate;

pub use document::Document;
pub use rotate::rotate;
