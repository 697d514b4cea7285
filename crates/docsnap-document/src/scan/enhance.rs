// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline — perspective rectification from four user-placed
// corners, then contrast, unsharp mask, and adaptive binarization, ending in a
// PNG ready for download.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use docsnap_core::{CornerSet, FilterParameters, ProcessingError, download_file_name};
use image::RgbaImage;
use imageproc::geometric_transformations::Projection;
use tracing::{debug, error, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::scan::vision::VisionBackend;

/// Gaussian sigma of the blurred copy used for sharpening.
pub const SHARPEN_SIGMA: f32 = 3.0;

/// Largest output the pipeline will allocate (100 megapixels).
const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// Output raster size for a corner set.
///
/// Each axis takes the longer of its two opposing edges so the whole source
/// quadrilateral fits without cropping:
/// `width = max(|TR-TL|, |BR-BL|)`, `height = max(|BL-TL|, |BR-TR|)`.
pub fn destination_size(corners: &CornerSet) -> (u32, u32) {
    let top = corners.top_left().distance(&corners.top_right());
    let bottom = corners.bottom_left().distance(&corners.bottom_right());
    let left = corners.top_left().distance(&corners.bottom_left());
    let right = corners.top_right().distance(&corners.bottom_right());
    (to_pixels(top.max(bottom)), to_pixels(left.max(right)))
}

fn to_pixels(length: f64) -> u32 {
    if length.is_finite() {
        length.round().clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    }
}

/// A finished scan: the rectified, enhanced raster and its PNG encoding.
#[derive(Debug, Clone)]
pub struct ScanOutput {
    image: RgbaImage,
    png: Vec<u8>,
    file_name: String,
}

impl ScanOutput {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// PNG-encoded bytes for display and download.
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// `docsnap-<unix-millis>.png`, fixed when the scan finished.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Runs the fixed rectify → contrast → sharpen → binarize chain for one set of
/// filter parameters.
#[derive(Debug, Clone, Copy)]
pub struct ScanEnhancer {
    params: FilterParameters,
}

impl ScanEnhancer {
    pub fn new(params: FilterParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> FilterParameters {
        self.params
    }

    /// Rectify `source` to the quadrilateral `corners` and apply the filters.
    ///
    /// Degenerate corners are not rejected up front: they reach the transform,
    /// which either fails with `GeometryDegenerate` or yields a distorted image.
    #[instrument(skip(self, backend, source, corners), fields(
        src_w = source.width(),
        src_h = source.height(),
        contrast = self.params.contrast,
        sharpness = self.params.sharpness,
        binarize = self.params.binarize.label(),
    ))]
    pub fn enhance(
        &self,
        backend: &VisionBackend,
        source: &RgbaImage,
        corners: &CornerSet,
    ) -> Result<RgbaImage, ProcessingError> {
        if corners.points().iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(ProcessingError::GeometryDegenerate("corner coordinates are not finite".into()));
        }

        // Step 1: destination size.
        let (out_w, out_h) = destination_size(corners);
        if out_w == 0 || out_h == 0 {
            return Err(ProcessingError::GeometryDegenerate(format!(
                "corners span a {out_w}x{out_h} area"
            )));
        }
        if out_w as u64 * out_h as u64 > MAX_OUTPUT_PIXELS {
            return Err(ProcessingError::OutputTooLarge {
                width: out_w,
                height: out_h,
            });
        }
        debug!(out_w, out_h, "Destination size computed");

        // Step 2: homography and warp.
        let src = (*corners.points()).map(|p| (p.x as f32, p.y as f32));
        let (w, h) = (out_w as f32, out_h as f32);
        let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let projection = backend.run("perspective transform", || {
            Projection::from_control_points(src, dst).ok_or_else(|| {
                ProcessingError::GeometryDegenerate("no perspective transform maps these corners to a rectangle".into())
            })
        })?;
        let work = backend.run("perspective warp", || {
            Ok(ImageProcessor::warp_perspective(source, &projection, out_w, out_h))
        })?;
        debug!("Warp complete");

        // Step 3: contrast around mid-gray.
        let alpha = self.params.contrast_alpha();
        let beta = self.params.contrast_beta();
        let work = backend.run("contrast", move || Ok(work.scale_offset(alpha, beta)))?;

        // Step 4: unsharp mask.
        let work = if self.params.sharpness > 0 {
            let amount = self.params.sharpen_amount();
            backend.run("sharpen", move || Ok(work.unsharp_mask(amount, SHARPEN_SIGMA)))?
        } else {
            work
        };

        // Step 5: adaptive binarization.
        let work = match self.params.binarize.threshold_params() {
            Some((block_size, c)) => {
                backend.run("adaptive threshold", move || Ok(work.adaptive_binarize(block_size, c)))?
            }
            None => work,
        };

        Ok(work.into_rgba())
    }

    /// Run the whole pipeline off the async executor and encode the result.
    ///
    /// The vision backend is initialised on first use. Each call works on its
    /// own buffers, so overlapping calls never share mutable state.
    #[instrument(skip(self, source, corners), fields(src_w = source.width(), src_h = source.height()))]
    pub async fn process(&self, source: Arc<RgbaImage>, corners: CornerSet) -> Result<ScanOutput, ProcessingError> {
        let backend = VisionBackend::shared().await?;
        let enhancer = *self;
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || -> Result<ScanOutput, ProcessingError> {
            let image = enhancer.enhance(backend, &source, &corners)?;
            let processor = ImageProcessor::from_rgba(image);
            let png = backend.run("png encode", || processor.to_png_bytes())?;
            Ok(ScanOutput {
                image: processor.into_rgba(),
                png,
                file_name: download_file_name(Utc::now()),
            })
        })
        .await
        .map_err(|err| ProcessingError::LibraryOperationFailed(format!("pipeline task failed: {err}")))?;

        match &result {
            Ok(output) => info!(
                out_w = output.width(),
                out_h = output.height(),
                png_bytes = output.png.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Scan processed"
            ),
            Err(err) => error!(error = %err, "Scan processing failed"),
        }
        result
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::corners::{default_corners, set_corner};
    use docsnap_core::{Binarize, Corner, Point};
    use image::Rgba;

    fn page(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgba([230, 225, 210, 255])
            } else {
                Rgba([40, 50, 60, 255])
            }
        })
    }

    fn rect(x: f64, y: f64, a: f64, b: f64) -> CornerSet {
        CornerSet::new(
            Point::new(x, y),
            Point::new(x + a, y),
            Point::new(x + a, y + b),
            Point::new(x, y + b),
        )
    }

    #[test]
    fn axis_aligned_rectangle_keeps_its_size() {
        assert_eq!(destination_size(&rect(10.0, 20.0, 300.0, 150.0)), (300, 150));
        assert_eq!(destination_size(&rect(0.5, 0.5, 99.6, 42.2)), (100, 42));
    }

    #[test]
    fn longer_opposing_edge_wins() {
        // Trapezoid: bottom edge longer than top, right edge longer than left.
        let corners = CornerSet::new(
            Point::new(20.0, 0.0),
            Point::new(80.0, 0.0),
            Point::new(100.0, 120.0),
            Point::new(0.0, 100.0),
        );
        let (w, h) = destination_size(&corners);
        assert_eq!(w, corners.bottom_left().distance(&corners.bottom_right()).round() as u32);
        assert_eq!(h, corners.top_right().distance(&corners.bottom_right()).round() as u32);
    }

    #[tokio::test]
    async fn default_corners_on_1000x800() {
        let enhancer = ScanEnhancer::new(FilterParameters::new(200, 0, Binarize::Off));
        let output = enhancer
            .process(Arc::new(page(1000, 800)), default_corners(1000, 800))
            .await
            .unwrap();
        assert_eq!((output.width(), output.height()), (920, 720));
        assert!(output.file_name().starts_with("docsnap-"));
        assert!(output.file_name().ends_with(".png"));

        // Not binarized: mid-tones survive the contrast stretch.
        let decoded = image::load_from_memory(output.png_bytes()).unwrap().into_rgba8();
        assert_eq!(decoded.dimensions(), (920, 720));
        assert!(decoded.pixels().any(|p| p.0[0] != 0 && p.0[0] != 255));
    }

    #[tokio::test]
    async fn binarize_off_leaves_earlier_stages_untouched() {
        let backend = VisionBackend::shared().await.unwrap();
        let source = page(120, 90);
        let corners = rect(6.0, 4.0, 100.0, 80.0);
        let params = FilterParameters::new(150, 0, Binarize::Off);

        let out = ScanEnhancer::new(params).enhance(backend, &source, &corners).unwrap();

        let src = (*corners.points()).map(|p| (p.x as f32, p.y as f32));
        let dst = [(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)];
        let projection = Projection::from_control_points(src, dst).unwrap();
        let expected = ImageProcessor::warp_perspective(&source, &projection, 100, 80)
            .scale_offset(params.contrast_alpha(), params.contrast_beta())
            .into_rgba();
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn sharpness_applies_unsharp_mask_after_contrast() {
        let backend = VisionBackend::shared().await.unwrap();
        let source = page(120, 90);
        let corners = rect(6.0, 4.0, 100.0, 80.0);
        let params = FilterParameters::new(130, 40, Binarize::Off);

        let out = ScanEnhancer::new(params).enhance(backend, &source, &corners).unwrap();

        let src = (*corners.points()).map(|p| (p.x as f32, p.y as f32));
        let dst = [(0.0, 0.0), (100.0, 0.0), (100.0, 80.0), (0.0, 80.0)];
        let projection = Projection::from_control_points(src, dst).unwrap();
        let contrasted = || {
            ImageProcessor::warp_perspective(&source, &projection, 100, 80)
                .scale_offset(params.contrast_alpha(), params.contrast_beta())
        };
        let unsharpened = contrasted().into_rgba();
        // 40% sharpness: weight 0.8, Gaussian sigma 3.
        let expected = contrasted().unsharp_mask(0.8, 3.0).into_rgba();
        assert_eq!(out, expected);
        assert_ne!(out, unsharpened);
    }

    #[tokio::test]
    async fn oversized_output_is_refused() {
        let corners = rect(0.0, 0.0, 20_000.0, 12_000.0);
        let err = ScanEnhancer::new(FilterParameters::default())
            .process(Arc::new(page(32, 32)), corners)
            .await
            .unwrap_err();
        assert_eq!(err, ProcessingError::OutputTooLarge { width: 20_000, height: 12_000 });
    }

    #[tokio::test]
    async fn binarize_on_yields_black_and_white() {
        let backend = VisionBackend::shared().await.unwrap();
        let params = FilterParameters::new(100, 30, Binarize::Medium);
        let out = ScanEnhancer::new(params)
            .enhance(backend, &page(80, 60), &default_corners(80, 60))
            .unwrap();
        assert!(out.pixels().all(|p| (p.0[0] == 0 || p.0[0] == 255) && p.0[3] == 255));
    }

    #[tokio::test]
    async fn self_intersecting_corners_never_panic() {
        let corners = set_corner(default_corners(200, 160), Corner::BottomRight, Point::new(50.0, 50.0));
        let result = ScanEnhancer::new(FilterParameters::default())
            .process(Arc::new(page(200, 160)), corners)
            .await;
        match result {
            Ok(output) => assert!(output.width() > 0 && output.height() > 0),
            Err(err) => assert!(matches!(err, ProcessingError::GeometryDegenerate(_)), "unexpected error {err:?}"),
        }
    }

    #[tokio::test]
    async fn collapsed_corners_are_degenerate() {
        let p = Point::new(30.0, 30.0);
        let corners = CornerSet::new(p, p, p, p);
        let err = ScanEnhancer::new(FilterParameters::default())
            .process(Arc::new(page(64, 64)), corners)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::GeometryDegenerate(_)));
    }

    #[tokio::test]
    async fn non_finite_corners_are_degenerate() {
        let corners = rect(0.0, 0.0, 10.0, 10.0).with_corner(Corner::TopLeft, Point::new(f64::NAN, 0.0));
        let err = ScanEnhancer::new(FilterParameters::default())
            .process(Arc::new(page(16, 16)), corners)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessingError::GeometryDegenerate(_)));
    }
}
