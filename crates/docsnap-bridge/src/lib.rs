// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocSnap — platform bridge abstractions.
//
// Defines the traits the session uses to reach the camera, the file picker,
// and the download surface, plus the registry of temporary object URLs that
// back loaded images. The desktop implementation lives in `desktop`.

pub mod desktop;
pub mod object_url;
pub mod traits;

use std::path::PathBuf;

pub use object_url::{DataUrlRegistry, ObjectUrl, ObjectUrlStore, data_url};
pub use traits::*;

/// The bridge implementation for the current platform.
///
/// `download_dir` is where the save dialog opens; `None` lets the platform
/// choose.
pub fn platform_bridge(download_dir: Option<PathBuf>) -> Box<dyn PlatformBridge> {
    Box::new(desktop::DesktopBridge::new(download_dir))
}
