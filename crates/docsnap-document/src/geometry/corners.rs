// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner model — the four user-placed document corners for one image.

use docsnap_core::{Corner, CornerSet, Point};
use tracing::debug;

/// Fraction of the smaller image dimension used to inset the default corners.
pub const DEFAULT_INSET_RATIO: f64 = 0.05;

/// Centered rectangle inset by `5%` of `min(width, height)` from every edge.
pub fn default_corners(width: u32, height: u32) -> CornerSet {
    let (w, h) = (width as f64, height as f64);
    let inset = w.min(h) * DEFAULT_INSET_RATIO;
    CornerSet::new(
        Point::new(inset, inset),
        Point::new(w - inset, inset),
        Point::new(w - inset, h - inset),
        Point::new(inset, h - inset),
    )
}

/// Replace exactly one corner. The quadrilateral is not re-sorted or checked
/// for convexity; whatever the user drew goes to the pipeline as-is.
pub fn set_corner(set: CornerSet, corner: Corner, point: Point) -> CornerSet {
    set.with_corner(corner, point)
}

/// The corner closest to `point`, if it lies within `radius`.
pub fn nearest_corner(set: &CornerSet, point: Point, radius: f64) -> Option<Corner> {
    set.iter()
        .map(|(corner, p)| (corner, p.distance(&point)))
        .filter(|&(_, d)| d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(corner, _)| corner)
}

/// Corners bound to the native size of the image they were placed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerModel {
    corners: CornerSet,
    width: u32,
    height: u32,
}

impl CornerModel {
    /// Seed with the default inset rectangle.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            corners: default_corners(width, height),
            width,
            height,
        }
    }

    pub fn corners(&self) -> CornerSet {
        self.corners
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Move one corner, clamped to `[0, width] x [0, height]`. A point with a
    /// NaN or infinite coordinate is ignored and the corner stays put.
    pub fn set(&mut self, corner: Corner, point: Point) {
        if !(point.x.is_finite() && point.y.is_finite()) {
            debug!(?corner, x = point.x, y = point.y, "Ignoring non-finite corner position");
            return;
        }
        let clamped = Point::new(
            point.x.clamp(0.0, self.width as f64),
            point.y.clamp(0.0, self.height as f64),
        );
        self.corners = set_corner(self.corners, corner, clamped);
    }

    /// Discard all edits and go back to the default rectangle.
    pub fn reset(&mut self) {
        debug!(width = self.width, height = self.height, "Corners reset to default");
        self.corners = default_corners(self.width, self.height);
    }
}
