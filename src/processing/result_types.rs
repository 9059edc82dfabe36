//! Value objects produced by the estimator stages.
//!
//! Plain, side-effect-free data carried on the processing context and
//! serialized into stream records and catalog rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single phase arrival picked from a waveform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDetection {
    pub station_code: String,
    /// Phase label, e.g. "P" or "S"
    pub phase_type: String,
    pub pick_time: DateTime<Utc>,
    /// Picker confidence in [0, 1]
    pub probability: f64,
    /// First-motion polarity ("U"/"D") when the picker reports one
    #[serde(default)]
    pub polarity: Option<String>,
    /// Picker-specific extras (SNR, channel, model version, ...)
    #[serde(default)]
    pub extra: Option<HashMap<String, serde_json::Value>>,
}

/// A candidate event produced by the associator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationCandidate {
    pub origin_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub depth_km: Option<f64>,
    /// Association quality score
    pub score: f64,
    /// Name of the algorithm that produced the candidate
    pub method: String,
}

/// Hypocenter estimate for a candidate event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationEstimate {
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
    pub uncertainty_km: f64,
    #[serde(default)]
    pub diagnostics: HashMap<String, serde_json::Value>,
}

/// Magnitude estimate for a candidate event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagnitudeEstimate {
    pub magnitude: f64,
    /// Magnitude scale, e.g. "ML" or "Mw"
    pub magnitude_type: String,
    #[serde(default)]
    pub diagnostics: HashMap<String, serde_json::Value>,
}

/// Focal mechanism estimate for a candidate event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanismEstimate {
    pub strike: f64,
    pub dip: f64,
    pub rake: f64,
    /// Name of the inversion method
    pub method: String,
    #[serde(default)]
    pub diagnostics: HashMap<String, serde_json::Value>,
}
