// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for DocSnap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position in native image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One of the four document corners, in the fixed order used everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    /// All corners in `CornerSet` order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Position of this corner inside a `CornerSet`.
    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short label for UI handles and log fields.
    pub fn label(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
        }
    }
}

/// The four user-placed corners `[top_left, top_right, bottom_right, bottom_left]`
/// in native image coordinates.
///
/// The order is significant: it decides which source edge lands on which
/// destination edge during rectification. No convexity is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerSet([Point; 4]);

impl CornerSet {
    pub const fn new(top_left: Point, top_right: Point, bottom_right: Point, bottom_left: Point) -> Self {
        Self([top_left, top_right, bottom_right, bottom_left])
    }

    pub fn get(&self, corner: Corner) -> Point {
        self.0[corner.index()]
    }

    /// Return a copy with exactly one corner replaced.
    pub fn with_corner(mut self, corner: Corner, point: Point) -> Self {
        self.0[corner.index()] = point;
        self
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }

    pub fn top_right(&self) -> Point {
        self.0[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.0[3]
    }

    /// Iterate `(corner, point)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (Corner, Point)> + '_ {
        Corner::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

impl From<[Point; 4]> for CornerSet {
    fn from(points: [Point; 4]) -> Self {
        Self(points)
    }
}

/// Adaptive binarization strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binarize {
    #[default]
    Off,
    Light,
    Medium,
    Strong,
}

impl Binarize {
    pub const ALL: [Binarize; 4] = [Self::Off, Self::Light, Self::Medium, Self::Strong];

    /// Adaptive threshold `(block_size, constant)` for this level, or `None`
    /// when binarization is disabled. Smaller blocks with a larger constant
    /// threshold more aggressively.
    pub fn threshold_params(self) -> Option<(u32, f32)> {
        match self {
            Self::Off => None,
            Self::Light => Some((31, 5.0)),
            Self::Medium => Some((21, 8.0)),
            Self::Strong => Some((11, 10.0)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label)
    }
}

pub const CONTRAST_MIN: u32 = 50;
pub const CONTRAST_MAX: u32 = 500;
pub const CONTRAST_DEFAULT: u32 = 200;
pub const SHARPNESS_MAX: u32 = 100;

/// User-controlled enhancement settings applied after rectification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilterParameters")]
pub struct FilterParameters {
    /// Contrast percentage (50–500). 100 leaves the image unchanged.
    pub contrast: u32,
    /// Unsharp-mask strength percentage (0–100). 0 disables sharpening.
    pub sharpness: u32,
    pub binarize: Binarize,
}

impl FilterParameters {
    /// Build parameters, clamping each value into its supported range.
    pub fn new(contrast: u32, sharpness: u32, binarize: Binarize) -> Self {
        Self {
            contrast: contrast.clamp(CONTRAST_MIN, CONTRAST_MAX),
            sharpness: sharpness.min(SHARPNESS_MAX),
            binarize,
        }
    }

    /// Linear contrast gain `contrast / 100`.
    pub fn contrast_alpha(&self) -> f32 {
        self.contrast as f32 / 100.0
    }

    /// Offset keeping mid-gray (128) approximately fixed: `(1 - alpha) * 128`.
    pub fn contrast_beta(&self) -> f32 {
        (1.0 - self.contrast_alpha()) * 128.0
    }

    /// Unsharp-mask weight `sharpness / 50`.
    pub fn sharpen_amount(&self) -> f32 {
        self.sharpness as f32 / 50.0
    }
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            contrast: CONTRAST_DEFAULT,
            sharpness: 0,
            binarize: Binarize::Off,
        }
    }
}

#[derive(Deserialize)]
struct RawFilterParameters {
    #[serde(default = "default_contrast")]
    contrast: u32,
    #[serde(default)]
    sharpness: u32,
    #[serde(default)]
    binarize: Binarize,
}

fn default_contrast() -> u32 {
    CONTRAST_DEFAULT
}

impl From<RawFilterParameters> for FilterParameters {
    fn from(raw: RawFilterParameters) -> Self {
        Self::new(raw.contrast, raw.sharpness, raw.binarize)
    }
}

/// Download filename for a scan produced at `at`: `docsnap-<unix-millis>.png`.
pub fn download_file_name(at: DateTime<Utc>) -> String {
    format!("docsnap-{}.png", at.timestamp_millis())
}
