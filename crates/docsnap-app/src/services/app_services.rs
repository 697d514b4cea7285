// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads configuration, picks the platform bridge, and
// owns the object URL registry every session issues its URLs from.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use docsnap_bridge::{DataUrlRegistry, ObjectUrlStore, PlatformBridge, platform_bridge};
use docsnap_core::error::Result;
use docsnap_core::{AppConfig, FilterParameters};
use docsnap_session::Session;
use tracing::{info, warn};

use super::data_dir;

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
///
/// All fields are Arc-wrapped so the struct clones cheaply into event
/// handlers and async blocks.
#[derive(Clone)]
pub struct AppServices {
    bridge: Arc<dyn PlatformBridge>,
    urls: Arc<DataUrlRegistry>,
    data_dir: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Initialise all services. Call once at app startup.
    pub fn init() -> Self {
        Self::with_data_dir(data_dir::data_dir())
    }

    fn with_data_dir(dir: PathBuf) -> Self {
        info!(path = %dir.display(), "initialising app services");

        // Missing or unreadable config falls back to defaults
        let config = match AppConfig::load(&dir) {
            Some(config) => config,
            None => {
                info!("no saved config; using defaults");
                AppConfig::default()
            }
        };

        let bridge: Arc<dyn PlatformBridge> = Arc::from(platform_bridge(config.download_dir.clone()));
        info!(platform = bridge.platform_name(), "platform bridge ready");

        Self {
            bridge,
            urls: Arc::new(DataUrlRegistry::new()),
            data_dir: dir,
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn bridge(&self) -> &dyn PlatformBridge {
        self.bridge.as_ref()
    }

    /// A fresh session wired to the shared URL registry and current config.
    pub fn new_session(&self) -> Session {
        let urls: Arc<dyn ObjectUrlStore> = self.urls.clone();
        Session::new(urls, &self.config())
    }

    /// Number of object URLs currently held by sessions.
    pub fn live_urls(&self) -> usize {
        self.urls.live_count()
    }

    // -- Config ---------------------------------------------------------------

    pub fn config(&self) -> AppConfig {
        self.config.lock().expect("config lock poisoned").clone()
    }

    /// Update and persist the config.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        *self.config.lock().expect("config lock poisoned") = config.clone();
        config.persist(&self.data_dir)
    }

    /// Remember the filter values the user just chose as the defaults for
    /// the next launch. Failure to write is logged, not surfaced.
    pub fn remember_filters(&self, filters: FilterParameters) {
        let mut config = self.config();
        if config.default_filters == filters {
            return;
        }
        config.default_filters = filters;
        if let Err(err) = self.save_config(&config) {
            warn!(error = %err, "could not persist filter defaults");
        }
    }
}
