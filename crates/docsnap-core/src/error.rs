// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocSnap.

use thiserror::Error;

/// Failures while turning a picked file or camera frame into a decoded image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("unsupported file type: {0}")]
    InvalidType(String),

    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("camera access denied: {0}")]
    CameraAccessDenied(String),

    #[error("no camera found")]
    CameraNotFound,

    #[error("camera is in use by another application")]
    CameraInUse,

    #[error("camera not ready: {0}")]
    CameraNotReady(String),
}

/// Failures inside the rectification and enhancement pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("image library failed to initialise: {0}")]
    LibraryInitFailed(String),

    #[error("corner geometry is degenerate: {0}")]
    GeometryDegenerate(String),

    #[error("image operation failed: {0}")]
    LibraryOperationFailed(String),

    #[error("a processing run is already in progress")]
    AlreadyRunning,

    #[error("scan would be {width}x{height} pixels, too large to process")]
    OutputTooLarge { width: u32, height: u32 },
}

/// Top-level error type for all DocSnap operations.
#[derive(Debug, Error)]
pub enum DocsnapError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("no image loaded")]
    NoImage,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsnapError>;
