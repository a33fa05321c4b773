//! Playable URL registry
//!
//! The rendering surfaces play from opaque source URLs rather than from
//! the in-memory buffers. `UrlStore` is the in-process registry backing
//! those URLs: every successful decode allocates exactly one handle over
//! the source bytes, and the session revokes a handle exactly once when
//! the value it backs is replaced or cleared.

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Handle to an allocated playable URL.
///
/// Equality is by identity: two handles over identical bytes are still
/// distinct resources with independent lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableUrl {
    id: Uuid,
    url: String,
}

impl PlayableUrl {
    /// The URL string handed to playback surfaces.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

/// In-memory registry of playable byte resources.
#[derive(Debug, Default)]
pub struct UrlStore {
    entries: HashMap<Uuid, Arc<Vec<u8>>>,
}

impl UrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new playable URL over the given bytes.
    pub fn alloc(&mut self, bytes: Vec<u8>) -> PlayableUrl {
        let id = Uuid::new_v4();
        self.entries.insert(id, Arc::new(bytes));
        PlayableUrl {
            id,
            url: format!("mem://{}", id),
        }
    }

    /// Resolve a URL to its backing bytes, if still live.
    pub fn resolve(&self, url: &PlayableUrl) -> Option<Arc<Vec<u8>>> {
        self.entries.get(&url.id).cloned()
    }

    /// Revoke a URL, releasing its backing bytes.
    ///
    /// Returns true if the resource was live (first revocation), false if
    /// it had already been released.
    pub fn revoke(&mut self, url: &PlayableUrl) -> bool {
        self.entries.remove(&url.id).is_some()
    }

    /// Number of live resources (for leak checks in tests).
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}
