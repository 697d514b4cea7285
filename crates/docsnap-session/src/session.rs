// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session controller — owns the single image being edited, its corners and
// display mapping, the live camera (if any), the filter values, and the last
// scan output.
//
// Every operation that can fail records a `HumanError` for the UI and leaves
// the state it was called in untouched.

use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use docsnap_bridge::{FacingMode, NativeCamera, NativeDownload, ObjectUrlStore, PickedFile};
use docsnap_core::error::Result;
use docsnap_core::human_errors::{HumanError, humanize_error};
use docsnap_core::{AcquisitionError, AppConfig, Corner, CornerSet, DocsnapError, FilterParameters, Point, ProcessingError};
use docsnap_document::geometry::nearest_corner;
use docsnap_document::{CornerModel, DisplayMapping, ScanEnhancer, ScanOutput};
use image::RgbaImage;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::acquisition::{Acquirer, ImageHandle};
use crate::camera::{CameraSession, Readiness, ReadinessGate};
use crate::drag::{HANDLE_RADIUS, PointerInput};

/// Coarse UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image loaded.
    Empty,
    /// An image is loaded and its corners can be adjusted.
    Editing,
    /// A scan has been produced for the loaded image.
    Result,
}

struct Loaded {
    handle: ImageHandle,
    corners: CornerModel,
    mapping: DisplayMapping,
    output: Option<ScanOutput>,
}

/// Held by a job and its outcome; the session counts a run as in flight
/// while any strong reference is alive.
struct RunTicket;

/// Everything one pipeline run needs, detached from the session so the
/// session stays usable while it runs.
pub struct ProcessingJob {
    ticket: Arc<RunTicket>,
    image_key: Uuid,
    image: Arc<RgbaImage>,
    corners: CornerSet,
    enhancer: ScanEnhancer,
}

impl ProcessingJob {
    pub fn corners(&self) -> CornerSet {
        self.corners
    }

    pub fn params(&self) -> FilterParameters {
        self.enhancer.params()
    }

    pub async fn run(self) -> ProcessingOutcome {
        let result = self.enhancer.process(self.image, self.corners).await;
        ProcessingOutcome {
            _ticket: self.ticket,
            image_key: self.image_key,
            result,
        }
    }
}

/// The result of a [`ProcessingJob`], tagged with the image it was run on.
pub struct ProcessingOutcome {
    _ticket: Arc<RunTicket>,
    image_key: Uuid,
    result: std::result::Result<ScanOutput, ProcessingError>,
}

pub struct Session {
    acquirer: Acquirer,
    loaded: Option<Loaded>,
    camera: Option<CameraSession>,
    filters: FilterParameters,
    dragging: Option<Corner>,
    run: Weak<RunTicket>,
    error: Option<HumanError>,
    prefer_rear_camera: bool,
    camera_ready_timeout: Duration,
}

impl Session {
    pub fn new(urls: Arc<dyn ObjectUrlStore>, config: &AppConfig) -> Self {
        Self {
            acquirer: Acquirer::new(urls),
            loaded: None,
            camera: None,
            filters: config.default_filters,
            dragging: None,
            run: Weak::new(),
            error: None,
            prefer_rear_camera: config.prefer_rear_camera,
            camera_ready_timeout: config.camera_ready_timeout(),
        }
    }

    // -- Queries ------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        match &self.loaded {
            None => SessionState::Empty,
            Some(Loaded { output: None, .. }) => SessionState::Editing,
            Some(Loaded { output: Some(_), .. }) => SessionState::Result,
        }
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.loaded.as_ref().map(|l| &l.handle)
    }

    pub fn corners(&self) -> Option<CornerSet> {
        self.loaded.as_ref().map(|l| l.corners.corners())
    }

    pub fn mapping(&self) -> Option<&DisplayMapping> {
        self.loaded.as_ref().map(|l| &l.mapping)
    }

    /// Corners in display coordinates, for drawing the overlay.
    pub fn display_corners(&self) -> Option<[Point; 4]> {
        let loaded = self.loaded.as_ref()?;
        Some((*loaded.corners.corners().points()).map(|p| loaded.mapping.to_display(p)))
    }

    pub fn output(&self) -> Option<&ScanOutput> {
        self.loaded.as_ref().and_then(|l| l.output.as_ref())
    }

    pub fn filters(&self) -> FilterParameters {
        self.filters
    }

    /// True while a job from [`begin_processing`](Self::begin_processing),
    /// or its outcome, is still alive.
    pub fn is_processing(&self) -> bool {
        self.run.strong_count() > 0
    }

    pub fn dragging(&self) -> Option<Corner> {
        self.dragging
    }

    pub fn error(&self) -> Option<&HumanError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Record a failure that happened outside the session (a platform picker
    /// or dialog) so it is shown like any other error. State is unchanged.
    pub fn report(&mut self, err: impl Into<DocsnapError>) {
        let _ = self.fail::<()>(err);
    }

    // -- Acquisition --------------------------------------------------------

    /// Load a user-picked file, replacing any current image.
    #[instrument(skip(self, file), fields(name = %file.name))]
    pub fn load_file(&mut self, file: PickedFile) -> Result<()> {
        match self.acquirer.from_file(file) {
            Ok(handle) => {
                self.install(handle);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Open the camera preview. Any stream already open is stopped first.
    #[instrument(skip(self, camera))]
    pub fn start_camera(&mut self, camera: &dyn NativeCamera) -> Result<()> {
        self.camera = None;
        let preferred = self.prefer_rear_camera.then_some(FacingMode::Environment);
        match CameraSession::open(camera, preferred, self.camera_ready_timeout) {
            Ok(session) => {
                self.camera = Some(session);
                self.error = None;
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_some()
    }

    pub fn camera_readiness(&self) -> Option<Readiness> {
        self.camera.as_ref().map(CameraSession::readiness)
    }

    pub fn camera_gate(&self) -> Option<ReadinessGate> {
        self.camera.as_ref().map(CameraSession::gate)
    }

    /// Grab a frame, stop the camera, and load the frame as the new image.
    /// A capture refused for readiness keeps the camera running; any other
    /// failure stops it.
    #[instrument(skip(self))]
    pub fn capture(&mut self) -> Result<()> {
        let Some(camera) = self.camera.as_mut() else {
            return self.fail(AcquisitionError::CameraNotReady("camera is not running".into()));
        };
        let captured = camera.capture();
        if !matches!(captured, Err(DocsnapError::Acquisition(AcquisitionError::CameraNotReady(_)))) {
            self.camera = None;
        }
        let frame = match captured {
            Ok(frame) => frame,
            Err(err) => return self.fail(err),
        };

        match self.acquirer.from_frame(frame) {
            Ok(handle) => {
                self.install(handle);
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn cancel_camera(&mut self) {
        if self.camera.take().is_some() {
            info!("Camera cancelled");
        }
    }

    fn install(&mut self, handle: ImageHandle) {
        let (width, height) = handle.dimensions();
        let previous = self.loaded.replace(Loaded {
            handle,
            corners: CornerModel::new(width, height),
            mapping: DisplayMapping::new(width, height),
            output: None,
        });
        if let Some(previous) = previous {
            debug!(name = previous.handle.name(), "Releasing previous image");
        }
        self.dragging = None;
        self.error = None;
        info!(width, height, "Image loaded; editing");
    }

    // -- Editing ------------------------------------------------------------

    /// Place a corner at a native-pixel position, clamped to the image.
    /// Non-finite positions are ignored.
    pub fn set_corner(&mut self, corner: Corner, point: Point) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.corners.set(corner, point);
        }
    }

    pub fn reset_corners(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.corners.reset();
        }
    }

    /// The rendered image element changed size.
    pub fn on_display_resize(&mut self, display_width: f64, display_height: f64) {
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.mapping.resize(display_width, display_height);
        }
    }

    /// Start dragging whichever handle lies under `position` (display
    /// coordinates). Returns the grabbed corner.
    pub fn grab_at(&mut self, position: (f64, f64)) -> Option<Corner> {
        let loaded = self.loaded.as_ref()?;
        let shown: CornerSet = (*loaded.corners.corners().points()).map(|p| loaded.mapping.to_display(p)).into();
        let corner = nearest_corner(&shown, Point::new(position.0, position.1), HANDLE_RADIUS)?;
        self.down(corner, position);
        Some(corner)
    }

    pub fn set_filters(&mut self, filters: FilterParameters) {
        self.filters = filters;
    }

    // -- Processing ---------------------------------------------------------

    /// Snapshot the current image, corners and filters into a job and mark a
    /// run in flight.
    #[instrument(skip(self))]
    pub fn begin_processing(&mut self) -> Result<ProcessingJob> {
        if self.is_processing() {
            return self.fail(ProcessingError::AlreadyRunning);
        }
        let Some(loaded) = self.loaded.as_ref() else {
            return self.fail(DocsnapError::NoImage);
        };
        let ticket = Arc::new(RunTicket);
        self.run = Arc::downgrade(&ticket);
        let job = ProcessingJob {
            ticket,
            image_key: loaded.handle.url_key(),
            image: Arc::clone(loaded.handle.image()),
            corners: loaded.corners.corners(),
            enhancer: ScanEnhancer::new(self.filters),
        };
        self.dragging = None;
        info!(contrast = self.filters.contrast, sharpness = self.filters.sharpness, binarize = self.filters.binarize.label(), "Processing started");
        Ok(job)
    }

    /// Apply a finished run. Outcomes for an image that has since been
    /// replaced or released are dropped. The run stops counting as in flight
    /// once the outcome is consumed here.
    #[instrument(skip(self, outcome))]
    pub fn finish_processing(&mut self, outcome: ProcessingOutcome) -> Result<()> {
        let Some(loaded) = self.loaded.as_mut().filter(|l| l.handle.url_key() == outcome.image_key) else {
            debug!("Discarding output for an image that is no longer loaded");
            return Ok(());
        };
        match outcome.result {
            Ok(output) => {
                loaded.output = Some(output);
                self.error = None;
                info!("Scan ready");
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Begin, run and finish in one step.
    pub async fn process(&mut self) -> Result<()> {
        let job = self.begin_processing()?;
        let outcome = job.run().await;
        self.finish_processing(outcome)
    }

    // -- Result -------------------------------------------------------------

    /// Drop the scan and return to corner editing with the corners kept.
    pub fn back_to_editing(&mut self) {
        if let Some(loaded) = self.loaded.as_mut() {
            if loaded.output.take().is_some() {
                info!("Back to editing");
            }
        }
    }

    /// Release the image, its output and any camera, back to `Empty`. A run
    /// still in flight is forgotten; its outcome will be discarded.
    pub fn start_over(&mut self) {
        self.camera = None;
        self.loaded = None;
        self.run = Weak::new();
        self.dragging = None;
        self.error = None;
        info!("Session reset");
    }

    /// Hand the scan's PNG to the platform download surface.
    #[instrument(skip(self, sink))]
    pub fn save_result(&mut self, sink: &dyn NativeDownload) -> Result<Option<PathBuf>> {
        let Some(output) = self.output() else {
            return self.fail(DocsnapError::NoImage);
        };
        match sink.save_download(output.file_name(), output.png_bytes()) {
            Ok(path) => {
                info!(?path, "Scan saved");
                Ok(path)
            }
            Err(err) => self.fail(err),
        }
    }

    fn fail<T>(&mut self, err: impl Into<DocsnapError>) -> Result<T> {
        let err = err.into();
        warn!(error = %err, "Session operation failed");
        self.error = Some(humanize_error(&err));
        Err(err)
    }
}

impl PointerInput for Session {
    fn down(&mut self, corner: Corner, _position: (f64, f64)) {
        if self.state() == SessionState::Editing {
            self.dragging = Some(corner);
        }
    }

    fn move_to(&mut self, position: (f64, f64)) {
        let Some(corner) = self.dragging else {
            return;
        };
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        let point = loaded.mapping.to_image(position.0, position.1);
        loaded.corners.set(corner, point);
    }

    fn up(&mut self) {
        self.dragging = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CameraBehaviour, FakeCamera, png_file, registry_store};
    use docsnap_core::Binarize;
    use docsnap_document::geometry::default_corners;
    use std::sync::Mutex;

    fn session() -> (Arc<docsnap_bridge::DataUrlRegistry>, Session) {
        let (registry, store) = registry_store();
        (registry, Session::new(store, &AppConfig::default()))
    }

    struct RecordingSink {
        saved: Mutex<Vec<(String, usize)>>,
    }

    impl NativeDownload for RecordingSink {
        fn save_download(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
            self.saved.lock().unwrap().push((file_name.to_string(), bytes.len()));
            Ok(Some(PathBuf::from("/tmp").join(file_name)))
        }
    }

    #[test]
    fn load_enters_editing_with_default_corners() {
        let (_registry, mut session) = session();
        assert_eq!(session.state(), SessionState::Empty);
        session.load_file(png_file("page.png", 100, 80)).unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.corners(), Some(default_corners(100, 80)));
    }

    #[test]
    fn invalid_file_keeps_state_and_records_error() {
        let (registry, mut session) = session();
        session.load_file(png_file("page.png", 100, 80)).unwrap();
        let key = session.image().unwrap().url_key();

        let bad = PickedFile {
            name: "notes.txt".into(),
            mime_type: Some("text/plain".into()),
            bytes: b"hello".to_vec(),
        };
        assert!(session.load_file(bad).is_err());
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.image().unwrap().url_key(), key);
        assert!(session.error().is_some());
        assert_eq!(registry.issued(), 1);

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[test]
    fn replacing_image_revokes_old_url_once() {
        let (registry, mut session) = session();
        session.load_file(png_file("a.png", 40, 40)).unwrap();
        session.load_file(png_file("b.png", 60, 30)).unwrap();
        assert_eq!(registry.issued(), 2);
        assert_eq!(registry.revoked(), 1);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(session.corners(), Some(default_corners(60, 30)));

        session.start_over();
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(registry.revoked(), 2);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn drag_moves_corner_through_display_scale() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 1000, 800)).unwrap();
        session.on_display_resize(500.0, 400.0);

        // Top-left handle sits at (20, 20) on screen.
        assert_eq!(session.grab_at((22.0, 18.0)), Some(Corner::TopLeft));
        session.move_to((30.0, 35.0));
        session.up();
        assert_eq!(session.corners().unwrap().top_left(), Point::new(60.0, 70.0));

        // Released: further moves do nothing.
        session.move_to((0.0, 0.0));
        assert_eq!(session.corners().unwrap().top_left(), Point::new(60.0, 70.0));
    }

    #[test]
    fn drag_overshoot_is_clamped() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 200, 100)).unwrap();
        session.down(Corner::BottomRight, (190.0, 95.0));
        session.move_to((500.0, -40.0));
        assert_eq!(session.corners().unwrap().bottom_right(), Point::new(200.0, 0.0));
    }

    #[test]
    fn grab_misses_outside_radius() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 1000, 800)).unwrap();
        assert_eq!(session.grab_at((500.0, 400.0)), None);
        assert_eq!(session.dragging(), None);
    }

    #[test]
    fn non_finite_corner_is_ignored() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 300, 200)).unwrap();
        session.set_corner(Corner::TopLeft, Point::new(f64::NAN, 5.0));
        session.set_corner(Corner::BottomRight, Point::new(120.0, f64::INFINITY));
        assert_eq!(session.corners(), Some(default_corners(300, 200)));

        session.set_corner(Corner::TopRight, Point::new(900.0, -3.0));
        assert_eq!(session.corners().unwrap().top_right(), Point::new(300.0, 0.0));
    }

    #[test]
    fn reported_error_is_shown_without_changing_state() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 100, 80)).unwrap();
        session.report(DocsnapError::Io(std::io::Error::from(std::io::ErrorKind::NotFound)));
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.error().unwrap().message, "The file couldn't be found.");
    }

    #[test]
    fn reset_restores_defaults() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 300, 200)).unwrap();
        session.set_corner(Corner::TopRight, Point::new(10.0, 10.0));
        session.reset_corners();
        assert_eq!(session.corners(), Some(default_corners(300, 200)));
    }

    #[test]
    fn processing_without_image_fails() {
        let (_registry, mut session) = session();
        assert!(matches!(session.begin_processing(), Err(DocsnapError::NoImage)));
        assert!(!session.is_processing());
    }

    #[test]
    fn second_run_while_pending_is_refused() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 120, 90)).unwrap();
        let _job = session.begin_processing().unwrap();
        assert!(session.is_processing());
        assert!(matches!(
            session.begin_processing(),
            Err(DocsnapError::Processing(ProcessingError::AlreadyRunning))
        ));
    }

    #[tokio::test]
    async fn process_reaches_result_and_back() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 200, 160)).unwrap();
        session.set_filters(FilterParameters::new(150, 20, Binarize::Light));
        session.set_corner(Corner::TopLeft, Point::new(12.0, 9.0));

        session.process().await.unwrap();
        assert_eq!(session.state(), SessionState::Result);
        assert!(!session.is_processing());
        let output = session.output().unwrap();
        assert!(output.file_name().starts_with("docsnap-"));
        assert!(output.png_bytes().starts_with(&[0x89, b'P', b'N', b'G']));

        session.back_to_editing();
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.corners().unwrap().top_left(), Point::new(12.0, 9.0));
    }

    #[tokio::test]
    async fn degenerate_corners_keep_editing() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 200, 160)).unwrap();
        for corner in Corner::ALL {
            session.set_corner(corner, Point::new(50.0, 50.0));
        }
        let err = session.process().await.unwrap_err();
        assert!(matches!(err, DocsnapError::Processing(ProcessingError::GeometryDegenerate(_))));
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.error().is_some());
        assert!(!session.is_processing());
    }

    #[test]
    fn dropped_job_releases_the_run() {
        let (_registry, mut session) = session();
        session.load_file(png_file("page.png", 120, 90)).unwrap();
        let job = session.begin_processing().unwrap();
        drop(job);
        assert!(!session.is_processing());
        assert!(session.begin_processing().is_ok());
    }

    #[test]
    fn start_over_forgets_pending_run() {
        let (_registry, mut session) = session();
        session.load_file(png_file("first.png", 120, 90)).unwrap();
        let _pending = session.begin_processing().unwrap();

        session.start_over();
        assert!(!session.is_processing());
        session.load_file(png_file("second.png", 80, 60)).unwrap();
        assert!(session.begin_processing().is_ok());
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn outcome_after_start_over_is_discarded() {
        let (_registry, mut session) = session();
        session.load_file(png_file("first.png", 100, 100)).unwrap();
        let stale = session.begin_processing().unwrap();
        session.start_over();
        session.load_file(png_file("second.png", 80, 60)).unwrap();
        let fresh = session.begin_processing().unwrap();

        session.finish_processing(stale.run().await).unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert!(session.is_processing());

        session.finish_processing(fresh.run().await).unwrap();
        assert_eq!(session.state(), SessionState::Result);
        assert!(!session.is_processing());
    }

    #[tokio::test]
    async fn stale_outcome_is_discarded() {
        let (_registry, mut session) = session();
        session.load_file(png_file("first.png", 100, 100)).unwrap();
        let job = session.begin_processing().unwrap();
        session.load_file(png_file("second.png", 80, 60)).unwrap();

        let outcome = job.run().await;
        session.finish_processing(outcome).unwrap();
        assert_eq!(session.state(), SessionState::Editing);
        assert!(!session.is_processing());
    }

    #[tokio::test]
    async fn save_result_uses_download_sink() {
        let (_registry, mut session) = session();
        let sink = RecordingSink {
            saved: Mutex::new(Vec::new()),
        };
        assert!(matches!(session.save_result(&sink), Err(DocsnapError::NoImage)));

        session.load_file(png_file("page.png", 100, 100)).unwrap();
        session.process().await.unwrap();
        let path = session.save_result(&sink).unwrap().unwrap();
        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(path.ends_with(&saved[0].0));
    }

    #[tokio::test(start_paused = true)]
    async fn camera_capture_loads_frame_and_stops_stream() {
        let (_registry, mut session) = session();
        let camera = FakeCamera::new(CameraBehaviour::Available);
        session.start_camera(&camera).unwrap();
        assert_eq!(session.camera_readiness(), Some(Readiness::NotReady));
        assert!(session.capture().is_err());
        assert!(session.camera_active());

        camera.deliver_frame();
        session.capture().unwrap();
        assert!(!session.camera_active());
        assert_eq!(camera.stop_count(), 1);
        assert_eq!(session.state(), SessionState::Editing);
        assert_eq!(session.image().unwrap().dimensions(), (320, 240));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_grab_stops_camera() {
        let (registry, mut session) = session();
        let camera = FakeCamera::new(CameraBehaviour::Available).failing_grab();
        session.start_camera(&camera).unwrap();
        camera.deliver_frame();

        let err = session.capture().unwrap_err();
        assert!(matches!(err, DocsnapError::Bridge(_)));
        assert!(!session.camera_active());
        assert_eq!(camera.stop_count(), 1);
        assert_eq!(camera.grabs.lock().unwrap().len(), 1);
        assert!(session.error().is_some());
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(registry.issued(), 0);
    }

    #[tokio::test]
    async fn camera_denied_is_surfaced() {
        let (_registry, mut session) = session();
        let camera = FakeCamera::new(CameraBehaviour::Denied);
        assert!(session.start_camera(&camera).is_err());
        assert!(!session.camera_active());
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn start_over_stops_camera() {
        let (_registry, mut session) = session();
        let camera = FakeCamera::new(CameraBehaviour::Available);
        session.start_camera(&camera).unwrap();
        session.start_over();
        assert_eq!(camera.stop_count(), 1);
    }
}
