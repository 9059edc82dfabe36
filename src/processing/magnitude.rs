//! Magnitude estimation seam.

use super::result_types::{MagnitudeEstimate, PhaseDetection};
use super::EstimatorError;

/// Configuration for magnitude estimation.
#[derive(Debug, Clone, Default)]
pub struct MagnitudeConfig {
    /// Regional attenuation model identifier
    pub reference_model: Option<String>,
}

/// Estimates event magnitude from the full pick set.
///
/// Returns `None` when no magnitude can be computed.
pub trait MagnitudeEstimator: Send + Sync {
    fn estimate(
        &self,
        picks: &[PhaseDetection],
    ) -> Result<Option<MagnitudeEstimate>, EstimatorError>;
}

/// Magnitude estimation from empirical amplitude relations.
pub struct EmpiricalMagnitudeEstimator {
    config: MagnitudeConfig,
}

impl EmpiricalMagnitudeEstimator {
    pub fn new(config: MagnitudeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MagnitudeConfig {
        &self.config
    }
}

impl MagnitudeEstimator for EmpiricalMagnitudeEstimator {
    /// Stub pending calibration: never produces an estimate.
    fn estimate(
        &self,
        _picks: &[PhaseDetection],
    ) -> Result<Option<MagnitudeEstimate>, EstimatorError> {
        // TODO: fit local magnitude against the configured attenuation model
        Ok(None)
    }
}
