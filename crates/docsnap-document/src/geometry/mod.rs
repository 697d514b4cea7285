// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry — display/native coordinate mapping and the four-corner model.

pub mod corners;
pub mod mapper;

pub use corners::{CornerModel, default_corners, nearest_corner, set_corner};
pub use mapper::{DisplayMapping, ScaleFactor, to_display, to_image};
