//! Focal mechanism inversion seam.

use super::result_types::{MechanismEstimate, PhaseDetection};
use super::EstimatorError;
use std::collections::HashMap;

/// Configuration for mechanism inversion.
#[derive(Debug, Clone, Default)]
pub struct MechanismConfig {
    /// Free-form solver settings forwarded to the inversion backend
    pub inversion_settings: Option<HashMap<String, serde_json::Value>>,
}

/// Inverts a focal mechanism from the full pick set.
///
/// Returns `None` when polarity coverage is insufficient.
pub trait MechanismSolver: Send + Sync {
    fn invert(&self, picks: &[PhaseDetection])
        -> Result<Option<MechanismEstimate>, EstimatorError>;
}

/// Mechanism estimation from first-motion polarities.
pub struct FirstMotionMechanismSolver {
    config: MechanismConfig,
}

impl FirstMotionMechanismSolver {
    pub fn new(config: MechanismConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MechanismConfig {
        &self.config
    }
}

impl MechanismSolver for FirstMotionMechanismSolver {
    /// Stub pending solver integration: never produces a mechanism.
    fn invert(
        &self,
        _picks: &[PhaseDetection],
    ) -> Result<Option<MechanismEstimate>, EstimatorError> {
        // TODO: wire up the first-motion inversion workflow
        Ok(None)
    }
}
