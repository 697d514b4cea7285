// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docsnap-session — Image acquisition (file picker and live camera), pointer
// input for corner dragging, and the single-image editing session that ties
// them to the scan pipeline.

pub mod acquisition;
pub mod camera;
pub mod drag;
pub mod session;

#[cfg(test)]
mod testing;

pub use acquisition::{Acquirer, ImageHandle};
pub use camera::{CameraSession, Readiness, ReadinessGate};
pub use drag::{HANDLE_RADIUS, PointerInput};
pub use session::{ProcessingJob, ProcessingOutcome, Session, SessionState};
