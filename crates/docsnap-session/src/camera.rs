// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live camera session — opens a stream with a facing preference, gates
// capture on the first decoded frame (or a timeout), and grabs a single
// full-resolution frame.

use std::time::Duration;

use docsnap_bridge::{FacingMode, NativeCamera, VideoStream};
use docsnap_core::error::Result;
use docsnap_core::{AcquisitionError, DocsnapError};
use image::RgbaImage;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Whether a capture may be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

/// Becomes [`Readiness::Ready`] when the stream reports its first decoded
/// frame or when the timeout elapses, whichever comes first.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    frame_signal: watch::Receiver<bool>,
    deadline: Instant,
}

impl ReadinessGate {
    pub fn new(frame_signal: watch::Receiver<bool>, timeout: Duration) -> Self {
        Self {
            frame_signal,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn state(&self) -> Readiness {
        if *self.frame_signal.borrow() || Instant::now() >= self.deadline {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    pub fn can_capture(&self) -> bool {
        self.state() == Readiness::Ready
    }

    /// Resolve once the gate opens. Never returns `NotReady`.
    pub async fn wait(&mut self) -> Readiness {
        if self.can_capture() {
            return Readiness::Ready;
        }
        match tokio::time::timeout_at(self.deadline, self.frame_signal.wait_for(|ready| *ready)).await {
            Ok(Ok(_)) => debug!("First camera frame decoded"),
            Ok(Err(_)) => {
                debug!("Frame signal closed; waiting out the readiness timeout");
                tokio::time::sleep_until(self.deadline).await;
            }
            Err(_) => warn!("No frame signal before the readiness timeout; enabling capture anyway"),
        }
        Readiness::Ready
    }
}

/// An open camera stream. Dropping the session stops every track.
pub struct CameraSession {
    stream: Box<dyn VideoStream>,
    gate: ReadinessGate,
    facing: Option<FacingMode>,
}

impl CameraSession {
    /// Open a stream, trying `preferred` first and then any camera. A
    /// permission refusal is final and is not retried without constraints.
    #[instrument(skip(camera))]
    pub fn open(camera: &dyn NativeCamera, preferred: Option<FacingMode>, ready_timeout: Duration) -> Result<Self> {
        let (stream, facing) = match preferred {
            Some(facing) => match camera.open_stream(Some(facing)) {
                Ok(stream) => (stream, Some(facing)),
                Err(err @ DocsnapError::Acquisition(AcquisitionError::CameraAccessDenied(_))) => return Err(err),
                Err(err) => {
                    warn!(error = %err, ?facing, "Preferred camera unavailable; trying any camera");
                    (camera.open_stream(None)?, None)
                }
            },
            None => (camera.open_stream(None)?, None),
        };

        let gate = ReadinessGate::new(stream.frame_signal(), ready_timeout);
        info!(?facing, "Camera stream opened");
        Ok(Self { stream, gate, facing })
    }

    /// The facing mode actually granted, `None` when the fallback was used.
    pub fn facing(&self) -> Option<FacingMode> {
        self.facing
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.state()
    }

    /// A detached handle on the readiness gate, for awaiting without holding
    /// the session.
    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    /// Grab one frame at the stream's native resolution.
    #[instrument(skip(self))]
    pub fn capture(&mut self) -> Result<RgbaImage> {
        if !self.gate.can_capture() {
            return Err(AcquisitionError::CameraNotReady("waiting for the first video frame".into()).into());
        }
        let (width, height) = capture_size(self.stream.as_ref())?;
        let frame = self.stream.grab_frame(width, height)?;
        info!(width, height, "Camera frame captured");
        Ok(frame)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stream.stop();
        debug!("Camera tracks stopped");
    }
}

/// Frame size reported by the stream, falling back to the track settings when
/// the frame buffer still reads zero.
fn capture_size(stream: &dyn VideoStream) -> std::result::Result<(u32, u32), AcquisitionError> {
    let (width, height) = stream.frame_dimensions();
    if width > 0 && height > 0 {
        return Ok((width, height));
    }
    warn!(width, height, "Frame reports no size; using track settings");
    match stream.track_settings() {
        Some((w, h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(AcquisitionError::CameraNotReady("camera reported no frame size".into())),
    }
}
