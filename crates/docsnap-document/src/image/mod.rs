// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — the raster primitives the scan pipeline is built from:
// perspective warp, linear contrast, unsharp mask, adaptive threshold, and
// PNG encoding.

pub mod processor;
pub mod threshold;

pub use processor::ImageProcessor;
