// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::path::PathBuf;

use docsnap_core::error::Result;
use image::RgbaImage;
use tokio::sync::watch;

/// Unified bridge that groups all native capabilities.
///
/// Platforms that lack a capability (e.g. no camera on a headless desktop)
/// return `DocsnapError::PlatformUnavailable` from that method.
pub trait PlatformBridge: NativeCamera + NativeFilePicker + NativeDownload {
    /// Human-readable platform name (e.g. "Desktop", "Android 14").
    fn platform_name(&self) -> &str;
}

/// Which way a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera, pointing away from the user (preferred for documents).
    Environment,
    /// Front ("selfie") camera.
    User,
}

/// Live camera access.
pub trait NativeCamera {
    /// Open a video stream from a camera facing `facing`, or from any camera
    /// when `facing` is `None`.
    ///
    /// Fails with `AcquisitionError::CameraAccessDenied`, `CameraNotFound`, or
    /// `CameraInUse` when the platform refuses the stream.
    fn open_stream(&self, facing: Option<FacingMode>) -> Result<Box<dyn VideoStream>>;
}

/// A running camera stream.
pub trait VideoStream: Send {
    /// Size of the decoded frame buffer. `(0, 0)` until the first frame has
    /// been decoded.
    fn frame_dimensions(&self) -> (u32, u32);

    /// Size negotiated for the video track, if the platform reports one.
    fn track_settings(&self) -> Option<(u32, u32)>;

    /// Flips to `true` once a frame is available for capture.
    fn frame_signal(&self) -> watch::Receiver<bool>;

    /// Snapshot the current frame at `width × height`.
    fn grab_frame(&mut self, width: u32, height: u32) -> Result<RgbaImage>;

    /// Stop every track of the stream. Safe to call more than once.
    fn stop(&mut self);
}

/// A file chosen by the user, before any decoding.
#[derive(Debug, Clone)]
pub struct PickedFile {
    /// Display name (usually the file name).
    pub name: String,
    /// MIME type reported by the platform, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Pick files from the device storage.
pub trait NativeFilePicker {
    /// Show a picker filtered to images. Returns `Ok(None)` if cancelled.
    fn pick_image(&self) -> Result<Option<PickedFile>>;
}

/// Offer generated files to the user.
pub trait NativeDownload {
    /// Save `bytes` under the suggested `file_name`. Returns where it went, or
    /// `Ok(None)` if the user cancelled.
    fn save_download(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>>;
}
