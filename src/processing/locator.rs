//! Hypocenter location seam.

use super::result_types::{LocationEstimate, PhaseDetection};
use super::EstimatorError;
use std::path::PathBuf;

/// Configuration for the location solver.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Checkpoint for the physics-informed network
    pub model_checkpoint: Option<PathBuf>,
    /// Solver iteration cap
    pub maximum_iterations: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            model_checkpoint: None,
            maximum_iterations: 200,
        }
    }
}

/// Estimates a hypocenter from the full pick set.
///
/// Returns `None` when the picks do not constrain a solution.
pub trait Locator: Send + Sync {
    fn locate(&self, picks: &[PhaseDetection]) -> Result<Option<LocationEstimate>, EstimatorError>;
}

/// Interface for the PINN-based localization algorithm.
pub struct PinnLocator {
    config: LocatorConfig,
}

impl PinnLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }
}

impl Locator for PinnLocator {
    /// Stub pending model integration: never produces a solution.
    fn locate(
        &self,
        _picks: &[PhaseDetection],
    ) -> Result<Option<LocationEstimate>, EstimatorError> {
        // TODO: load the PINN checkpoint and solve for the hypocenter
        Ok(None)
    }
}
