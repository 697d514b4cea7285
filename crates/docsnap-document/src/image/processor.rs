// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — perspective warp, linear contrast, unsharp mask, adaptive
// binarization, and PNG encoding. Operates on in-memory RGBA images using the
// `image` and `imageproc` crates.

use docsnap_core::{AcquisitionError, ProcessingError};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument};

use super::threshold::adaptive_threshold;

/// Image processing chain operating on a single in-memory RGBA image.
///
/// Every transformation after the warp consumes `self` and returns the
/// `ImageProcessor` wrapping the result, so no stage can keep a reference to
/// a buffer the next stage has replaced.
///
/// ```ignore
/// let png = ImageProcessor::warp_perspective(&source, &projection, 900, 720)
///     .scale_offset(2.0, -128.0)
///     .unsharp_mask(0.5, 3.0)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: RgbaImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode raw encoded bytes (JPEG, PNG, WebP, ...) into RGBA.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, AcquisitionError> {
        let img = image::load_from_memory(data)
            .map_err(|err| AcquisitionError::DecodeError(err.to_string()))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img.into_rgba8() })
    }

    /// Wrap an already-decoded RGBA image.
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Resample `source` through `projection` into a fresh `width × height`
    /// image using bilinear interpolation. Pixels that map outside the source
    /// are white.
    #[instrument(skip(source, projection), fields(width, height))]
    pub fn warp_perspective(source: &RgbaImage, projection: &Projection, width: u32, height: u32) -> Self {
        let mut output = RgbaImage::new(width, height);
        let default_pixel = Rgba([255u8, 255, 255, 255]);
        warp_into(source, projection, Interpolation::Bilinear, default_pixel, &mut output);
        debug!("Perspective warp applied");
        Self { image: output }
    }

    // The remaining transformations consume self and return the new buffer.

    /// Per color channel `out = in * alpha + beta`, rounded and saturated.
    /// Alpha is left untouched.
    #[instrument(skip(self), fields(alpha, beta))]
    pub fn scale_offset(mut self, alpha: f32, beta: f32) -> Self {
        if alpha == 1.0 && beta == 0.0 {
            return self;
        }
        for pixel in self.image.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = saturate(*channel as f32 * alpha + beta);
            }
        }
        self
    }

    /// Unsharp mask: `out = work * (1 + amount) - blurred * amount`, where
    /// `blurred` is a Gaussian blur with the given `sigma`. `amount <= 0` is a
    /// no-op.
    #[instrument(skip(self), fields(amount, sigma))]
    pub fn unsharp_mask(mut self, amount: f32, sigma: f32) -> Self {
        if amount <= 0.0 {
            return self;
        }
        let blurred = gaussian_blur_f32(&self.image, sigma);
        for (pixel, soft) in self.image.pixels_mut().zip(blurred.pixels()) {
            for i in 0..3 {
                let sharp = pixel.0[i] as f32 * (1.0 + amount) + soft.0[i] as f32 * -amount;
                pixel.0[i] = saturate(sharp);
            }
        }
        self
    }

    /// Grayscale, adaptive mean threshold, then back to opaque RGBA.
    #[instrument(skip(self), fields(block_size, c))]
    pub fn adaptive_binarize(self, block_size: u32, c: f32) -> Self {
        let gray = DynamicImage::ImageRgba8(self.image).into_luma8();
        let binary = adaptive_threshold(&gray, block_size, c);
        let rgba = DynamicImage::ImageLuma8(binary).into_rgba8();
        Self { image: rgba }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| ProcessingError::LibraryOperationFailed(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

fn saturate(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
