// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles: an in-memory camera and helpers for building picked files.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docsnap_bridge::{DataUrlRegistry, FacingMode, NativeCamera, ObjectUrlStore, PickedFile, VideoStream};
use docsnap_core::error::Result;
use docsnap_core::{AcquisitionError, DocsnapError};
use docsnap_document::ImageProcessor;
use image::{Rgba, RgbaImage};
use tokio::sync::watch;

pub fn registry_store() -> (Arc<DataUrlRegistry>, Arc<dyn ObjectUrlStore>) {
    let registry = Arc::new(DataUrlRegistry::new());
    let store: Arc<dyn ObjectUrlStore> = registry.clone();
    (registry, store)
}

pub fn png_file(name: &str, width: u32, height: u32) -> PickedFile {
    let image = RgbaImage::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]));
    let bytes = ImageProcessor::from_rgba(image).to_png_bytes().unwrap();
    PickedFile {
        name: name.into(),
        mime_type: Some("image/png".into()),
        bytes,
    }
}

/// How the fake camera answers `open_stream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraBehaviour {
    Available,
    RearMissing,
    Denied,
    Absent,
}

pub struct FakeCamera {
    behaviour: CameraBehaviour,
    frame_size: (u32, u32),
    track_size: Option<(u32, u32)>,
    fail_grab: bool,
    pub requests: Mutex<Vec<Option<FacingMode>>>,
    pub stops: Arc<AtomicUsize>,
    pub grabs: Arc<Mutex<Vec<(u32, u32)>>>,
    signals: Mutex<Vec<watch::Sender<bool>>>,
}

impl FakeCamera {
    pub fn new(behaviour: CameraBehaviour) -> Self {
        Self {
            behaviour,
            frame_size: (320, 240),
            track_size: Some((320, 240)),
            fail_grab: false,
            requests: Mutex::new(Vec::new()),
            stops: Arc::new(AtomicUsize::new(0)),
            grabs: Arc::new(Mutex::new(Vec::new())),
            signals: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sizes(mut self, frame_size: (u32, u32), track_size: Option<(u32, u32)>) -> Self {
        self.frame_size = frame_size;
        self.track_size = track_size;
        self
    }

    /// Streams from this camera report a sensor error on every grab.
    pub fn failing_grab(mut self) -> Self {
        self.fail_grab = true;
        self
    }

    /// Announce the first decoded frame on every open stream.
    pub fn deliver_frame(&self) {
        for signal in self.signals.lock().unwrap().iter() {
            signal.send_replace(true);
        }
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl NativeCamera for FakeCamera {
    fn open_stream(&self, facing: Option<FacingMode>) -> Result<Box<dyn VideoStream>> {
        self.requests.lock().unwrap().push(facing);
        match (self.behaviour, facing) {
            (CameraBehaviour::Denied, _) => {
                return Err(AcquisitionError::CameraAccessDenied("permission dismissed".into()).into());
            }
            (CameraBehaviour::Absent, _) | (CameraBehaviour::RearMissing, Some(FacingMode::Environment)) => {
                return Err(DocsnapError::from(AcquisitionError::CameraNotFound));
            }
            _ => {}
        }

        let (tx, rx) = watch::channel(false);
        self.signals.lock().unwrap().push(tx);
        Ok(Box::new(FakeStream {
            frame_size: self.frame_size,
            track_size: self.track_size,
            fail_grab: self.fail_grab,
            signal: rx,
            stops: Arc::clone(&self.stops),
            grabs: Arc::clone(&self.grabs),
        }))
    }
}

struct FakeStream {
    frame_size: (u32, u32),
    track_size: Option<(u32, u32)>,
    fail_grab: bool,
    signal: watch::Receiver<bool>,
    stops: Arc<AtomicUsize>,
    grabs: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl VideoStream for FakeStream {
    fn frame_dimensions(&self) -> (u32, u32) {
        self.frame_size
    }

    fn track_settings(&self) -> Option<(u32, u32)> {
        self.track_size
    }

    fn frame_signal(&self) -> watch::Receiver<bool> {
        self.signal.clone()
    }

    fn grab_frame(&mut self, width: u32, height: u32) -> Result<RgbaImage> {
        self.grabs.lock().unwrap().push((width, height));
        if self.fail_grab {
            return Err(DocsnapError::Bridge("sensor dropped the frame".into()));
        }
        Ok(RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255])))
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
