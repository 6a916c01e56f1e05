//! Object locators, metadata and the storage lookup seam

use chrono::{DateTime, Utc};

/// Locator for an object, local or remote. Opaque to this crate; the storage
/// client decides what the string means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Point-in-time description of a stored object.
///
/// Fetched on demand through [`ObjectStore::stat`] and discarded after the
/// decision that needed it; never cached.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub url: ObjectUrl,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

/// Metadata lookup against a storage backend.
///
/// `Ok(None)` is the unambiguous "object not found" signal; `Err` means the
/// lookup itself failed (transport, permissions). The conflict policy depends
/// on that distinction: conflating the two would corrupt its proceed/fail
/// decision for absent destinations.
pub trait ObjectStore {
    fn stat(
        &self,
        url: &ObjectUrl,
    ) -> impl Future<Output = anyhow::Result<Option<ObjectMetadata>>> + Send;
}
