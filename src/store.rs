//! In-memory registry for downloaded media.
//!
//! A [`MediaHandle`] is a `blob:` style URL that a display layer can hand
//! back to the store to get the bytes. Entries live until they are revoked.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:genstarter/";

/// Reference to media held in a [`MediaStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle {
    url: String,
    mime_type: String,
    size: usize,
}

impl MediaHandle {
    /// The `blob:genstarter/<uuid>` URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// MIME type of the stored bytes.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the stored bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Debug)]
struct StoredMedia {
    mime_type: String,
    bytes: Arc<[u8]>,
}

/// Shared, thread-safe media store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    entries: Arc<DashMap<String, StoredMedia>>,
}

impl MediaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `bytes` and returns a fresh handle.
    pub fn insert(&self, bytes: Vec<u8>, mime_type: impl Into<String>) -> MediaHandle {
        let url = format!("{URL_PREFIX}{}", Uuid::new_v4());
        let mime_type = mime_type.into();
        let handle = MediaHandle {
            url: url.clone(),
            mime_type: mime_type.clone(),
            size: bytes.len(),
        };
        self.entries.insert(
            url,
            StoredMedia {
                mime_type,
                bytes: bytes.into(),
            },
        );
        handle
    }

    /// Looks up the bytes behind a URL.
    pub fn get(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entries.get(url).map(|entry| Arc::clone(&entry.bytes))
    }

    /// MIME type of a stored entry.
    pub fn mime_type(&self, url: &str) -> Option<String> {
        self.entries.get(url).map(|entry| entry.mime_type.clone())
    }

    /// Releases the entry behind `handle`. Returns false if it was already gone.
    pub fn revoke(&self, handle: &MediaHandle) -> bool {
        self.entries.remove(&handle.url).is_some()
    }

    /// Releases every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
