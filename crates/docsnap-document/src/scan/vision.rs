// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide vision backend.
//
// Initialised once on first use; concurrent first callers await the same
// in-flight initialisation. Lives as long as the process.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use docsnap_core::ProcessingError;
use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::Projection;
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use crate::image::processor::ImageProcessor;

static BACKEND: OnceCell<VisionBackend> = OnceCell::const_new();
static INIT_RUNS: AtomicUsize = AtomicUsize::new(0);

/// Handle to the initialised image-processing primitives.
///
/// Every primitive call goes through [`VisionBackend::run`], which turns a
/// panic inside the library into `ProcessingError::LibraryOperationFailed`.
#[derive(Debug)]
pub struct VisionBackend {
    warm_up: Duration,
}

impl VisionBackend {
    /// The shared backend, initialising it on first use.
    ///
    /// A failed initialisation is not cached; the next call tries again.
    pub async fn shared() -> Result<&'static VisionBackend, ProcessingError> {
        BACKEND
            .get_or_try_init(|| async {
                tokio::task::spawn_blocking(Self::initialise)
                    .await
                    .map_err(|err| ProcessingError::LibraryInitFailed(err.to_string()))?
            })
            .await
    }

    /// Time the warm-up pass took.
    pub fn warm_up(&self) -> Duration {
        self.warm_up
    }

    /// Run one library operation, converting a panic into an error.
    pub fn run<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> Result<T, ProcessingError>,
    ) -> Result<T, ProcessingError> {
        guarded(operation, f)
    }

    #[instrument]
    fn initialise() -> Result<Self, ProcessingError> {
        INIT_RUNS.fetch_add(1, Ordering::SeqCst);
        let started = Instant::now();

        // Push a tiny raster through every primitive so a broken build fails
        // here rather than halfway through a user's scan.
        guarded("warm-up", warm_up).map_err(|err| ProcessingError::LibraryInitFailed(err.to_string()))?;

        let warm_up = started.elapsed();
        info!(warm_up_ms = warm_up.as_millis() as u64, "Vision backend initialised");
        Ok(Self { warm_up })
    }
}

fn warm_up() -> Result<(), ProcessingError> {
    let source = RgbaImage::from_fn(8, 8, |x, y| Rgba([(x * 32) as u8, (y * 32) as u8, 128, 255]));
    let square = [(0.0, 0.0), (8.0, 0.0), (8.0, 8.0), (0.0, 8.0)];
    let projection = Projection::from_control_points(square, square)
        .ok_or_else(|| ProcessingError::LibraryOperationFailed("warm-up projection unsolvable".into()))?;
    let png = ImageProcessor::warp_perspective(&source, &projection, 8, 8)
        .scale_offset(1.5, -64.0)
        .unsharp_mask(0.5, 1.0)
        .adaptive_binarize(3, 2.0)
        .to_png_bytes()?;
    if png.is_empty() {
        return Err(ProcessingError::LibraryOperationFailed("warm-up encoded no bytes".into()));
    }
    Ok(())
}

fn guarded<T>(operation: &'static str, f: impl FnOnce() -> Result<T, ProcessingError>) -> Result<T, ProcessingError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            error!(operation, detail = %detail, "Image operation panicked");
            Err(ProcessingError::LibraryOperationFailed(format!("{operation}: {detail}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
