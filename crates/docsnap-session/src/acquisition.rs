// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image acquisition — turn a picked file or a captured camera frame into a
// decoded RGBA raster plus a displayable object URL.

use std::sync::Arc;

use docsnap_bridge::{ObjectUrl, ObjectUrlStore, PickedFile};
use docsnap_core::AcquisitionError;
use docsnap_document::ImageProcessor;
use image::RgbaImage;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// File name given to frames captured from the camera.
const CAPTURE_FILE_NAME: &str = "camera-capture.png";

/// A decoded source image together with the object URL the UI renders it
/// from. Dropping the handle revokes the URL.
#[derive(Debug)]
pub struct ImageHandle {
    name: String,
    image: Arc<RgbaImage>,
    url: ObjectUrl,
}

impl ImageHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared pixel buffer. Processing runs clone the `Arc`, never the pixels.
    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn url(&self) -> &str {
        self.url.href()
    }

    /// Identity of this load; a new image always gets a new key.
    pub fn url_key(&self) -> Uuid {
        self.url.key()
    }
}

/// Decodes acquired bytes and issues their object URLs.
#[derive(Clone)]
pub struct Acquirer {
    urls: Arc<dyn ObjectUrlStore>,
}

impl Acquirer {
    pub fn new(urls: Arc<dyn ObjectUrlStore>) -> Self {
        Self { urls }
    }

    /// Validate, register and decode a user-picked file.
    ///
    /// The MIME type is taken from the picker when present and sniffed from
    /// the content otherwise. Anything outside `image/*` is rejected before an
    /// object URL is issued. A URL issued for a file that then fails to decode
    /// is revoked before returning.
    #[instrument(skip(self, file), fields(name = %file.name, bytes = file.bytes.len()))]
    pub fn from_file(&self, file: PickedFile) -> Result<ImageHandle, AcquisitionError> {
        let mime_type = resolve_mime_type(&file)?;
        let url = ObjectUrl::issue(&self.urls, &mime_type, &file.bytes);

        let image = ImageProcessor::from_bytes(&file.bytes)
            .inspect_err(|err| warn!(error = %err, "Picked file did not decode"))?
            .into_rgba();
        if image.width() == 0 || image.height() == 0 {
            return Err(AcquisitionError::DecodeError("image has no pixels".into()));
        }

        info!(width = image.width(), height = image.height(), %mime_type, "Image acquired");
        Ok(ImageHandle {
            name: file.name,
            image: Arc::new(image),
            url,
        })
    }

    /// Register a raw camera frame. The frame is PNG-encoded so it travels the
    /// same path as a picked file.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub fn from_frame(&self, frame: RgbaImage) -> Result<ImageHandle, AcquisitionError> {
        let png = ImageProcessor::from_rgba(frame)
            .to_png_bytes()
            .map_err(|err| AcquisitionError::DecodeError(err.to_string()))?;
        debug!(png_bytes = png.len(), "Camera frame encoded");
        self.from_file(PickedFile {
            name: CAPTURE_FILE_NAME.into(),
            mime_type: Some("image/png".into()),
            bytes: png,
        })
    }
}

fn resolve_mime_type(file: &PickedFile) -> Result<String, AcquisitionError> {
    let declared = file
        .mime_type
        .as_deref()
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .map(str::to_ascii_lowercase);

    let mime_type = match declared {
        Some(mime) => mime,
        None => infer::get(&file.bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into()),
    };

    if mime_type.starts_with("image/") {
        Ok(mime_type)
    } else {
        warn!(%mime_type, "Rejected non-image file");
        Err(AcquisitionError::InvalidType(mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png_file, registry_store};

    #[test]
    fn png_file_is_acquired() {
        let (registry, store) = registry_store();
        let acquirer = Acquirer::new(store);

        let handle = acquirer.from_file(png_file("page.png", 30, 20)).unwrap();
        assert_eq!(handle.dimensions(), (30, 20));
        assert_eq!(handle.name(), "page.png");
        assert!(handle.url().starts_with("data:image/png;base64,"));
        assert_eq!(registry.live_count(), 1);

        drop(handle);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn non_image_is_rejected_without_issuing_url() {
        let (registry, store) = registry_store();
        let acquirer = Acquirer::new(store);

        let file = PickedFile {
            name: "notes.pdf".into(),
            mime_type: Some("application/pdf".into()),
            bytes: b"%PDF-1.7".to_vec(),
        };
        let err = acquirer.from_file(file).unwrap_err();
        assert_eq!(err, AcquisitionError::InvalidType("application/pdf".into()));
        assert_eq!(registry.issued(), 0);
    }

    #[test]
    fn missing_mime_is_sniffed() {
        let (_registry, store) = registry_store();
        let acquirer = Acquirer::new(store);

        let mut file = png_file("upload", 8, 8);
        file.mime_type = None;
        assert!(acquirer.from_file(file).is_ok());

        let text = PickedFile {
            name: "readme".into(),
            mime_type: None,
            bytes: b"just some words".to_vec(),
        };
        assert!(matches!(acquirer.from_file(text), Err(AcquisitionError::InvalidType(_))));
    }

    #[test]
    fn undecodable_image_revokes_its_url() {
        let (registry, store) = registry_store();
        let acquirer = Acquirer::new(store);

        let file = PickedFile {
            name: "broken.jpg".into(),
            mime_type: Some("image/jpeg".into()),
            bytes: vec![0xFF, 0xD8, 0xFF, 0x00, 0x01],
        };
        assert!(matches!(acquirer.from_file(file), Err(AcquisitionError::DecodeError(_))));
        assert_eq!(registry.issued(), 1);
        assert_eq!(registry.revoked(), 1);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn camera_frame_round_trips_through_png() {
        let (_registry, store) = registry_store();
        let acquirer = Acquirer::new(store);

        let frame = RgbaImage::from_pixel(64, 48, image::Rgba([10, 20, 30, 255]));
        let handle = acquirer.from_frame(frame).unwrap();
        assert_eq!(handle.dimensions(), (64, 48));
        assert_eq!(handle.name(), CAPTURE_FILE_NAME);
        assert_eq!(handle.image().get_pixel(5, 5).0, [10, 20, 30, 255]);
    }
}
