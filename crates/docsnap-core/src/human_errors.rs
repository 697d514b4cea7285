// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the UI presents it; no error ends the session.

use crate::error::{AcquisitionError, DocsnapError, ProcessingError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A hiccup; trying again may well work.
    Transient,
    /// The user must do something (grant permission, move a corner).
    ActionRequired,
    /// Retrying the same input won't help. Pick something else.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the same action may succeed if repeated.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `DocsnapError` into a `HumanError`.
pub fn humanize_error(err: &DocsnapError) -> HumanError {
    match err {
        DocsnapError::Acquisition(inner) => humanize_acquisition(inner),
        DocsnapError::Processing(inner) => humanize_processing(inner),

        DocsnapError::NoImage => HumanError {
            message: "There's no picture loaded yet.".into(),
            suggestion: "Choose a photo or take one with the camera first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocsnapError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file or folder.".into(),
                    suggestion: "Check the permissions, or try a different location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DocsnapError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocsnapError::Bridge(_) => HumanError {
            message: "A device-specific feature didn't work.".into(),
            suggestion: "Try again. Some features may not be available on all devices.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocsnapError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Choose a picture from your files instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_acquisition(err: &AcquisitionError) -> HumanError {
    match err {
        AcquisitionError::InvalidType(kind) => HumanError {
            message: "That file isn't a picture.".into(),
            suggestion: format!("Choose a photo such as a JPEG or PNG. (File type: {kind})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        AcquisitionError::DecodeError(_) => HumanError {
            message: "We couldn't open this picture.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        AcquisitionError::CameraAccessDenied(_) => HumanError {
            message: "The app isn't allowed to use the camera.".into(),
            suggestion: "Allow camera access in your device settings, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        AcquisitionError::CameraNotFound => HumanError {
            message: "No camera was found.".into(),
            suggestion: "Connect a camera, or choose a picture from your files instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        AcquisitionError::CameraInUse => HumanError {
            message: "The camera is busy.".into(),
            suggestion: "Close other apps that might be using the camera, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        AcquisitionError::CameraNotReady(_) => HumanError {
            message: "The camera is still starting.".into(),
            suggestion: "Wait a moment for the picture to appear, then capture again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

fn humanize_processing(err: &ProcessingError) -> HumanError {
    match err {
        ProcessingError::LibraryInitFailed(_) => HumanError {
            message: "The image tools couldn't start.".into(),
            suggestion: "Try again in a moment. If this keeps happening, restart the app.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ProcessingError::GeometryDegenerate(_) => HumanError {
            message: "The corners don't outline a page.".into(),
            suggestion: "Drag the four corners onto the corners of the document, keeping them in order around the page.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ProcessingError::LibraryOperationFailed(detail) => HumanError {
            message: "Processing the picture failed.".into(),
            suggestion: format!("Try again, or adjust the corners and filters. (Detail: {detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        ProcessingError::AlreadyRunning => HumanError {
            message: "Still working on the last scan.".into(),
            suggestion: "Wait for the current scan to finish.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ProcessingError::OutputTooLarge { width, height } => HumanError {
            message: "The scan would be too large.".into(),
            suggestion: format!(
                "The marked area comes out at {width}\u{00D7}{height} pixels. Use a smaller photo, or move the corners closer together."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
