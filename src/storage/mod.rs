//! Waveform storage collaborators.
//!
//! Thin wrappers consumed by the ingestion path: a date-partitioned
//! waveform file writer with checksumming, and a local object-store
//! mirror that renders archive URIs. Both are synchronous and safe to
//! call from the ingest handler.

pub mod object_store;
pub mod waveform_files;

pub use object_store::ObjectStorageClient;
pub use waveform_files::{StorageError, WaveformFile, WaveformStorage};
