//! Phase association seam.

use super::result_types::{AssociationCandidate, PhaseDetection};
use super::EstimatorError;

/// Configuration for the association window.
#[derive(Debug, Clone)]
pub struct AssociatorConfig {
    /// Time window over which picks are grouped
    pub window_seconds: f64,
    /// Minimum picks required to form a candidate
    pub minimum_picks: usize,
}

impl Default for AssociatorConfig {
    fn default() -> Self {
        Self {
            window_seconds: 120.0,
            minimum_picks: 4,
        }
    }
}

/// Groups phase picks into candidate events.
pub trait Associator: Send + Sync {
    fn associate(
        &self,
        picks: &[PhaseDetection],
    ) -> Result<Vec<AssociationCandidate>, EstimatorError>;
}

/// Wrapper around the REAL grid-search associator.
pub struct RealAssociator {
    config: AssociatorConfig,
}

impl RealAssociator {
    pub fn new(config: AssociatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssociatorConfig {
        &self.config
    }
}

impl Associator for RealAssociator {
    /// Stub pending REAL integration: returns no candidates.
    fn associate(
        &self,
        _picks: &[PhaseDetection],
    ) -> Result<Vec<AssociationCandidate>, EstimatorError> {
        // TODO: call into the REAL associator binary
        Ok(Vec::new())
    }
}
