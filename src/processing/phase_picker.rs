//! Neural-network phase picking seam.

use super::result_types::PhaseDetection;
use super::EstimatorError;
use std::path::PathBuf;

/// Configuration for the phase picking model.
#[derive(Debug, Clone)]
pub struct PhasePickerConfig {
    /// Path to the trained picker weights
    pub model_path: Option<PathBuf>,
    /// Inference batch size
    pub batch_size: usize,
    /// Minimum probability for a pick to be emitted
    pub probability_threshold: f64,
}

impl Default for PhasePickerConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            batch_size: 32,
            probability_threshold: 0.5,
        }
    }
}

/// Picks phase arrivals from raw waveform samples.
///
/// Implementations must be thread-safe; calls run on a blocking worker.
pub trait PhasePicker: Send + Sync {
    fn pick_phases(&self, samples: &[f32]) -> Result<Vec<PhaseDetection>, EstimatorError>;
}

/// Interface to the neural-network based picking system.
pub struct NeuralPhasePicker {
    config: PhasePickerConfig,
}

impl NeuralPhasePicker {
    pub fn new(config: PhasePickerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhasePickerConfig {
        &self.config
    }
}

impl PhasePicker for NeuralPhasePicker {
    /// Run the picker over the sample buffer.
    ///
    /// Stub pending model integration: returns no picks but keeps the
    /// interface the rest of the system depends on.
    fn pick_phases(&self, _samples: &[f32]) -> Result<Vec<PhaseDetection>, EstimatorError> {
        // TODO: load the trained picker from `config.model_path` and run inference
        Ok(Vec::new())
    }
}
