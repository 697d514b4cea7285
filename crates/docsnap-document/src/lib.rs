// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsnap-document — Geometry and image processing for DocSnap.
//
// Provides the display/native coordinate mapping and corner model used by the
// editor, the image primitives (warp, contrast, unsharp mask, adaptive
// threshold, PNG encoding), and the fixed rectification pipeline that chains
// them.

pub mod geometry;
pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `docsnap_document::ScanEnhancer` etc.
pub use geometry::corners::CornerModel;
pub use geometry::mapper::{DisplayMapping, ScaleFactor};
pub use crate::image::processor::ImageProcessor;
pub use scan::enhance::{ScanEnhancer, ScanOutput};
pub use scan::vision::VisionBackend;
