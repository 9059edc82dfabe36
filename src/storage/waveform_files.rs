//! Waveform file writer — date-partitioned staging with checksums.
//!
//! Persists each ingested sample buffer to
//! `<root>/<station>/<YYYY>/<MM>/<DD>/<STATION>_<HHMMSS>.bin` as raw
//! little-endian f32, mirrors the file into the object store, and fills
//! the payload's storage placement fields. The real miniSEED encoder sits
//! behind this seam; the pipeline only depends on the placement contract.

use chrono::{DateTime, Datelike, Timelike, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use super::object_store::ObjectStorageClient;
use crate::pipeline::WaveformPayload;

/// Storage errors from the waveform writer and object-store mirror.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("waveform io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable record handed back to the ingestion caller.
#[derive(Debug, Clone)]
pub struct WaveformFile {
    pub id: Uuid,
    pub file_path: PathBuf,
    pub checksum: String,
    pub object_uri: Option<String>,
}

/// Writes waveform payloads to disk and mirrors them to object storage.
pub struct WaveformStorage {
    root: PathBuf,
    object_store: ObjectStorageClient,
}

impl WaveformStorage {
    pub fn new(root: impl Into<PathBuf>, object_store: ObjectStorageClient) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, object_store })
    }

    /// Persist the payload's samples, assigning `file_path`, `storage_key`
    /// and `object_uri` on the payload as a side effect.
    ///
    /// Synchronous by design — callers on the ingestion path invoke it
    /// inline before queueing the context.
    pub fn store_waveform(
        &self,
        payload: &mut WaveformPayload,
    ) -> Result<WaveformFile, StorageError> {
        let relative = Self::relative_path(&payload.station_code, payload.start_time);
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let bytes = sample_bytes(&payload.samples);
        std::fs::write(&path, &bytes)?;
        let checksum = hex_digest(&bytes);

        let object_key = relative.to_string_lossy().replace('\\', "/");
        let object_uri = self.object_store.put_file(&path, &object_key)?;

        payload.file_path = Some(path.clone());
        payload.storage_key = Some(object_key);
        payload.object_uri = Some(object_uri.clone());

        debug!(
            station = %payload.station_code,
            path = %path.display(),
            bytes = bytes.len(),
            "Waveform staged"
        );

        Ok(WaveformFile {
            id: Uuid::new_v4(),
            file_path: path,
            checksum,
            object_uri: Some(object_uri),
        })
    }

    /// Recompute the checksum of a staged file.
    pub fn compute_checksum(path: &Path) -> Result<String, StorageError> {
        let bytes = std::fs::read(path)?;
        Ok(hex_digest(&bytes))
    }

    fn relative_path(station_code: &str, start_time: DateTime<Utc>) -> PathBuf {
        PathBuf::from(station_code)
            .join(format!("{:04}", start_time.year()))
            .join(format!("{:02}", start_time.month()))
            .join(format!("{:02}", start_time.day()))
            .join(format!(
                "{}_{:02}{:02}{:02}.bin",
                station_code,
                start_time.hour(),
                start_time.minute(),
                start_time.second()
            ))
    }
}

fn sample_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectStoreSettings;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn test_storage(tmp: &Path) -> WaveformStorage {
        let settings = ObjectStoreSettings {
            bucket: "seismic-waveforms".to_string(),
            cache_dir: tmp.join("cache"),
            endpoint: None,
            scheme: "s3".to_string(),
        };
        let object_store = ObjectStorageClient::new(&settings).unwrap();
        WaveformStorage::new(tmp.join("data"), object_store).unwrap()
    }

    fn test_payload() -> WaveformPayload {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        WaveformPayload::new(
            "TEST",
            Some("NC".to_string()),
            start,
            start + chrono::Duration::seconds(1),
            vec![0.25, -0.5, 1.0],
            100.0,
            HashMap::new(),
        )
    }

    #[test]
    fn store_fills_placement_and_checksum_matches() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());
        let mut payload = test_payload();

        let stored = storage.store_waveform(&mut payload).unwrap();

        // All three placement fields assigned.
        let file_path = payload.file_path.as_ref().unwrap();
        assert!(file_path.ends_with("TEST/2024/01/01/TEST_000000.bin"));
        assert_eq!(
            payload.storage_key.as_deref(),
            Some("TEST/2024/01/01/TEST_000000.bin")
        );
        assert_eq!(
            payload.object_uri.as_deref(),
            Some("s3://seismic-waveforms/TEST/2024/01/01/TEST_000000.bin")
        );

        // Checksum of the staged bytes matches the stored record.
        assert_eq!(
            WaveformStorage::compute_checksum(file_path).unwrap(),
            stored.checksum
        );
        // Three f32 samples, little-endian.
        assert_eq!(std::fs::read(file_path).unwrap().len(), 12);
    }

    #[test]
    fn distinct_waveforms_get_distinct_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = test_storage(tmp.path());
        let first = storage.store_waveform(&mut test_payload()).unwrap();
        let second = storage.store_waveform(&mut test_payload()).unwrap();
        assert_ne!(first.id, second.id);
    }
}
