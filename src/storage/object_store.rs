//! Local mirror of the waveform object store.
//!
//! Uploads are copied under a cache directory keyed by object key; the
//! returned URI is what downstream consumers resolve against the real
//! bucket.

use std::path::{Path, PathBuf};

use super::waveform_files::StorageError;
use crate::config::ObjectStoreSettings;

/// Lightweight object storage client used to push waveform artifacts.
pub struct ObjectStorageClient {
    bucket: String,
    base_path: PathBuf,
    endpoint: Option<String>,
    scheme: String,
}

impl ObjectStorageClient {
    pub fn new(settings: &ObjectStoreSettings) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&settings.cache_dir)?;
        Ok(Self {
            bucket: settings.bucket.clone(),
            base_path: settings.cache_dir.clone(),
            endpoint: settings.endpoint.clone(),
            scheme: settings.scheme.clone(),
        })
    }

    /// Mirror `local_path` under `object_key` and return the archive URI.
    pub fn put_file(&self, local_path: &Path, object_key: &str) -> Result<String, StorageError> {
        let destination = self.base_path.join(object_key);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local_path, &destination)?;
        Ok(self.object_uri(object_key))
    }

    /// URI for an object key, honoring a custom endpoint when configured.
    pub fn object_uri(&self, object_key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!(
                "{}://{}/{}?endpoint={}",
                self.scheme, self.bucket, object_key, endpoint
            ),
            None => format!("{}://{}/{}", self.scheme, self.bucket, object_key),
        }
    }

    /// Local cache path backing an object key.
    pub fn resolve_local_path(&self, object_key: &str) -> PathBuf {
        self.base_path.join(object_key)
    }
}
