// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::FilterParameters;

const CONFIG_FILE: &str = "config.json";

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Filter values pre-selected when a new image is loaded.
    pub default_filters: FilterParameters,
    /// Ask for the rear ("environment") camera first.
    pub prefer_rear_camera: bool,
    /// How long to wait for the first camera frame before capture is allowed
    /// anyway.
    pub camera_ready_timeout_ms: u64,
    /// Where finished scans are offered for saving. `None` lets the platform
    /// pick.
    pub download_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_filters: FilterParameters::default(),
            prefer_rear_camera: true,
            camera_ready_timeout_ms: 3000,
            download_dir: None,
        }
    }
}

impl AppConfig {
    pub fn camera_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.camera_ready_timeout_ms)
    }

    /// Load `config.json` from `dir`. Returns `None` when the file is missing
    /// or unreadable so callers can fall back to defaults.
    pub fn load(dir: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Write `config.json` into `dir`.
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}
