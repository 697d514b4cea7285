// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — perspective rectification followed by contrast,
// sharpening, and adaptive binarization, running on a lazily initialised
// vision backend.

pub mod enhance;
pub mod vision;

pub use enhance::{ScanEnhancer, ScanOutput, destination_size};
pub use vision::VisionBackend;
