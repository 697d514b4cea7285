// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporary object URLs for loaded images.
//
// Each loaded image is shown through a URL issued by an `ObjectUrlStore`. The
// `ObjectUrl` lease revokes it exactly once when dropped, so replacing or
// releasing an image can never leave a URL registered.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};
use uuid::Uuid;

/// Issues and revokes temporary URLs for in-memory content.
pub trait ObjectUrlStore: Send + Sync {
    /// Register `bytes` and return the key and URL under which they can be
    /// displayed.
    fn create(&self, mime_type: &str, bytes: &[u8]) -> (Uuid, String);

    /// Forget a URL. Returns `false` if `key` was not live.
    fn revoke(&self, key: Uuid) -> bool;

    /// Number of URLs issued and not yet revoked.
    fn live_count(&self) -> usize;
}

/// `data:` URL for `bytes`, usable directly as an `<img src>`.
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Store that hands out self-contained `data:` URLs and tracks which are live.
#[derive(Debug, Default)]
pub struct DataUrlRegistry {
    live: Mutex<HashSet<Uuid>>,
    issued: AtomicUsize,
    revoked: AtomicUsize,
}

impl DataUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total URLs ever issued.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Total successful revocations.
    pub fn revoked(&self) -> usize {
        self.revoked.load(Ordering::SeqCst)
    }
}

impl ObjectUrlStore for DataUrlRegistry {
    fn create(&self, mime_type: &str, bytes: &[u8]) -> (Uuid, String) {
        let key = Uuid::new_v4();
        self.live.lock().expect("url registry lock poisoned").insert(key);
        self.issued.fetch_add(1, Ordering::SeqCst);
        debug!(%key, mime_type, bytes = bytes.len(), "Object URL issued");
        (key, data_url(mime_type, bytes))
    }

    fn revoke(&self, key: Uuid) -> bool {
        let removed = self.live.lock().expect("url registry lock poisoned").remove(&key);
        if removed {
            self.revoked.fetch_add(1, Ordering::SeqCst);
            debug!(%key, "Object URL revoked");
        } else {
            warn!(%key, "Revoking an object URL that is not live");
        }
        removed
    }

    fn live_count(&self) -> usize {
        self.live.lock().expect("url registry lock poisoned").len()
    }
}

/// Lease on one issued URL. Revokes it when dropped.
pub struct ObjectUrl {
    key: Uuid,
    href: String,
    store: Arc<dyn ObjectUrlStore>,
}

impl ObjectUrl {
    pub fn issue(store: &Arc<dyn ObjectUrlStore>, mime_type: &str, bytes: &[u8]) -> Self {
        let (key, href) = store.create(mime_type, bytes);
        Self {
            key,
            href,
            store: Arc::clone(store),
        }
    }

    pub fn key(&self) -> Uuid {
        self.key
    }

    pub fn href(&self) -> &str {
        &self.href
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.store.revoke(self.key);
    }
}

impl fmt::Debug for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrl")
            .field("key", &self.key)
            .field("href_len", &self.href.len())
            .finish()
    }
}
