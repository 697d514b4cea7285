// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the rendered (display) image and its native
// pixel grid.

use docsnap_core::Point;
use tracing::{debug, warn};

/// Native-dimension / displayed-dimension ratio per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactor {
    /// Identity scale (image rendered at native size).
    pub const UNIT: ScaleFactor = ScaleFactor { x: 1.0, y: 1.0 };

    /// Compute the scale for an image of `native` pixels rendered into a box
    /// of `displayed` CSS pixels. Returns `None` for a zero or non-finite
    /// displayed size (element not laid out yet).
    pub fn from_dimensions(native: (u32, u32), displayed: (f64, f64)) -> Option<Self> {
        let (dw, dh) = displayed;
        if !(dw.is_finite() && dh.is_finite()) || dw <= 0.0 || dh <= 0.0 {
            return None;
        }
        Some(Self {
            x: native.0 as f64 / dw,
            y: native.1 as f64 / dh,
        })
    }
}

/// Native point to display coordinates.
pub fn to_display(p: Point, scale: ScaleFactor) -> Point {
    Point::new(p.x / scale.x, p.y / scale.y)
}

/// Display coordinates to a native point, clamped to `[0, width] × [0, height]`
/// so pointer overshoot can never move a corner off the image.
pub fn to_image(display_x: f64, display_y: f64, scale: ScaleFactor, width: u32, height: u32) -> Point {
    Point::new(
        (display_x * scale.x).clamp(0.0, width as f64),
        (display_y * scale.y).clamp(0.0, height as f64),
    )
}

/// Tracks the current scale for one loaded image as its rendered element
/// resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    width: u32,
    height: u32,
    scale: ScaleFactor,
}

impl DisplayMapping {
    /// Start with the image shown at native size until the first resize
    /// notification arrives.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: ScaleFactor::UNIT,
        }
    }

    /// Recompute the scale for a new rendered size. A zero-size box (element
    /// hidden or mid-layout) keeps the previous scale.
    pub fn resize(&mut self, display_width: f64, display_height: f64) {
        match ScaleFactor::from_dimensions((self.width, self.height), (display_width, display_height)) {
            Some(scale) => {
                debug!(display_width, display_height, sx = scale.x, sy = scale.y, "Display scale updated");
                self.scale = scale;
            }
            None => warn!(display_width, display_height, "Ignoring empty display size"),
        }
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn native_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn to_display(&self, p: Point) -> Point {
        to_display(p, self.scale)
    }

    pub fn to_image(&self, display_x: f64, display_y: f64) -> Point {
        to_image(display_x, display_y, self.scale, self.width, self.height)
    }
}
