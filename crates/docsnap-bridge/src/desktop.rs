// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge — native file dialogs via `rfd`. There is no live camera
// support on desktop; camera requests return `PlatformUnavailable`.

use std::path::PathBuf;

use docsnap_core::error::{DocsnapError, Result};
use image::ImageFormat;
use tracing::{info, warn};

use crate::traits::*;

/// Extensions offered in the image picker.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];

/// Bridge used on desktop builds.
pub struct DesktopBridge {
    download_dir: Option<PathBuf>,
}

impl DesktopBridge {
    pub fn new(download_dir: Option<PathBuf>) -> Self {
        Self { download_dir }
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        "Desktop"
    }
}

impl NativeCamera for DesktopBridge {
    fn open_stream(&self, _facing: Option<FacingMode>) -> Result<Box<dyn VideoStream>> {
        warn!("NativeCamera::open_stream called on desktop bridge");
        Err(DocsnapError::PlatformUnavailable)
    }
}

impl NativeFilePicker for DesktopBridge {
    fn pick_image(&self) -> Result<Option<PickedFile>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return Ok(None);
        };

        let bytes = std::fs::read(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".into());
        let mime_type = ImageFormat::from_path(&path)
            .ok()
            .map(|format| format.to_mime_type().to_string());
        info!(path = %path.display(), bytes = bytes.len(), ?mime_type, "Image picked");

        Ok(Some(PickedFile { name, mime_type, bytes }))
    }
}

impl NativeDownload for DesktopBridge {
    fn save_download(&self, file_name: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
        let mut dialog = rfd::FileDialog::new()
            .set_file_name(file_name)
            .add_filter("PNG image", &["png"]);
        if let Some(dir) = &self.download_dir {
            dialog = dialog.set_directory(dir);
        }

        let Some(path) = dialog.save_file() else {
            return Ok(None);
        };
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "Scan saved");
        Ok(Some(path))
    }
}
