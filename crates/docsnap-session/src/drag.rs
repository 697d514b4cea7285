// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pointer input for dragging corner handles.

use docsnap_core::Corner;

/// Grab radius around a handle, in display pixels.
pub const HANDLE_RADIUS: f64 = 24.0;

/// Pointer events in display coordinates. Implementors convert to native
/// pixels; `move_to` without a preceding `down` is ignored.
pub trait PointerInput {
    /// Start dragging `corner`.
    fn down(&mut self, corner: Corner, position: (f64, f64));

    /// Move the dragged corner to `position`.
    fn move_to(&mut self, position: (f64, f64));

    /// Release the pointer.
    fn up(&mut self);
}
