//! Estimator stages for the detection pipeline.
//!
//! Five independently swappable units, one trait per seam:
//!
//! - [`PhasePicker`] — neural phase picking on raw samples
//! - [`Associator`] — grouping picks into candidate events
//! - [`Locator`] — hypocenter estimation
//! - [`MagnitudeEstimator`] — magnitude estimation
//! - [`MechanismSolver`] — focal mechanism inversion
//!
//! The shipped implementations are interface-preserving stubs: they keep
//! the contract the orchestrator depends on while the actual models are
//! integrated behind them. All estimators are synchronous and CPU-bound;
//! the orchestrator offloads each call to a blocking worker.

pub mod associator;
pub mod locator;
pub mod magnitude;
pub mod mechanism;
pub mod phase_picker;
pub mod result_types;

pub use associator::{Associator, AssociatorConfig, RealAssociator};
pub use locator::{Locator, LocatorConfig, PinnLocator};
pub use magnitude::{EmpiricalMagnitudeEstimator, MagnitudeConfig, MagnitudeEstimator};
pub use mechanism::{FirstMotionMechanismSolver, MechanismConfig, MechanismSolver};
pub use phase_picker::{NeuralPhasePicker, PhasePicker, PhasePickerConfig};
pub use result_types::{
    AssociationCandidate, LocationEstimate, MagnitudeEstimate, MechanismEstimate, PhaseDetection,
};

/// Errors raised by estimator stages.
///
/// The orchestrator records these on the processing context; they never
/// propagate past the pipeline boundary.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("stage task aborted: {0}")]
    Aborted(String),
}
