//! Per-install identity
//!
//! The identity is an opaque lowercase UUID, generated the first time it is
//! needed and persisted through an [`IdentityStorage`] backend. The collector
//! caches it in an [`Identity`] for its lifetime.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::snapshot::atomic_write;

/// Backend persisting the identity string
pub trait IdentityStorage: Send + Sync {
    fn set(&self, value: &str);
    fn get(&self) -> Option<String>;
    fn reset(&self);
}

/// Volatile storage, scoped to whoever owns the instance
#[derive(Debug, Default)]
pub struct InMemoryIdentityStorage {
    value: Mutex<Option<String>>,
}

impl InMemoryIdentityStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityStorage for InMemoryIdentityStorage {
    fn set(&self, value: &str) {
        *self.slot() = Some(value.to_string());
    }

    fn get(&self) -> Option<String> {
        self.slot().clone()
    }

    fn reset(&self) {
        *self.slot() = None;
    }
}

/// Durable storage in a single text file
///
/// I/O failures are logged; `get` then behaves as if nothing was stored.
#[derive(Debug, Clone)]
pub struct FileIdentityStorage {
    path: PathBuf,
}

impl FileIdentityStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl IdentityStorage for FileIdentityStorage {
    fn set(&self, value: &str) {
        if let Err(e) = atomic_write(&self.path, value.as_bytes()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to store identity");
        }
    }

    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let value = content.trim();
                (!value.is_empty()).then(|| value.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read identity");
                None
            }
        }
    }

    fn reset(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to reset identity");
            }
        }
    }
}

/// Lazily resolved identity cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Identity {
    #[default]
    Unset,
    Cached(String),
}

impl Identity {
    /// Return the cached identity, loading or generating it on first use
    ///
    /// A freshly generated identity is written back to `storage`. A stored
    /// value that cannot be sent as a header is replaced the same way.
    pub fn resolve(&mut self, storage: &dyn IdentityStorage) -> &str {
        match self {
            Identity::Cached(value) => value.as_str(),
            Identity::Unset => {
                *self = Identity::Cached(load_or_generate(storage));
                self.resolve(storage)
            }
        }
    }

    pub fn cached(&self) -> Option<&str> {
        match self {
            Identity::Cached(value) => Some(value),
            Identity::Unset => None,
        }
    }
}

fn load_or_generate(storage: &dyn IdentityStorage) -> String {
    match storage.get() {
        Some(stored) if is_valid(&stored) => return stored,
        Some(stored) => {
            tracing::warn!(
                identity = ?stored,
                "Stored identity is not a valid header value, replacing it"
            );
        }
        None => {}
    }

    let generated = generate();
    storage.set(&generated);
    tracing::info!(identity = %generated, "Generated new tracking identity");
    generated
}

/// Whether `value` can travel in the identity header unchanged
pub fn is_valid(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_graphic())
}

/// New random 128-bit identifier, lowercase hyphenated
pub fn generate() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string()
}
