//! Pipeline Orchestrator — fixed-order stage execution with a two-tier
//! failure policy.
//!
//! Tier 1 (hard stop): phase picking, then association. A failure in
//! either records a stage error and returns the context as-is for
//! recovery tooling. Association succeeding with zero candidates also
//! stops the pipeline — downstream stages need at least one candidate —
//! but is a no-op, not an error.
//!
//! Tier 2 (best effort): location, magnitude, mechanism. All three run
//! once tier 1 passes, independently of one another; a failure in one is
//! recorded without stopping the others.
//!
//! Estimators are synchronous and CPU-bound, so every stage call is
//! offloaded to a blocking worker; concurrent pipeline runs sharing the
//! runtime are never starved by one stage. `run` never returns an error —
//! all stage failures land on the context.

use std::sync::Arc;
use tracing::{debug, error, info};

use super::context::{
    AssociationResult, PhasePickResult, PipelineStage, ProcessingContext,
};
use crate::processing::{
    Associator, AssociatorConfig, EmpiricalMagnitudeEstimator, EstimatorError,
    FirstMotionMechanismSolver, Locator, LocatorConfig, MagnitudeConfig, MagnitudeEstimator,
    MechanismConfig, MechanismSolver, NeuralPhasePicker, PhasePicker, PhasePickerConfig,
    PinnLocator, RealAssociator,
};

/// Coordinates the end-to-end processing of one ingested waveform.
pub struct ProcessingPipeline {
    phase_picker: Arc<dyn PhasePicker>,
    associator: Arc<dyn Associator>,
    locator: Arc<dyn Locator>,
    magnitude: Arc<dyn MagnitudeEstimator>,
    mechanism: Arc<dyn MechanismSolver>,
}

impl ProcessingPipeline {
    pub fn new(
        phase_picker: Arc<dyn PhasePicker>,
        associator: Arc<dyn Associator>,
        locator: Arc<dyn Locator>,
        magnitude: Arc<dyn MagnitudeEstimator>,
        mechanism: Arc<dyn MechanismSolver>,
    ) -> Self {
        Self {
            phase_picker,
            associator,
            locator,
            magnitude,
            mechanism,
        }
    }

    /// Build the pipeline with the default (stub) estimator stack.
    pub fn with_default_estimators() -> Self {
        Self::new(
            Arc::new(NeuralPhasePicker::new(PhasePickerConfig::default())),
            Arc::new(RealAssociator::new(AssociatorConfig::default())),
            Arc::new(PinnLocator::new(LocatorConfig::default())),
            Arc::new(EmpiricalMagnitudeEstimator::new(MagnitudeConfig::default())),
            Arc::new(FirstMotionMechanismSolver::new(MechanismConfig::default())),
        )
    }

    /// Run all stages against one context.
    ///
    /// Returns the same context, mutated with whatever slots were filled
    /// and whatever errors were recorded. Never fails.
    pub async fn run(&self, mut context: ProcessingContext) -> ProcessingContext {
        // Tier 1: phase picking
        let picks = {
            let picker = Arc::clone(&self.phase_picker);
            let samples = context.waveform.samples.clone();
            match offload(move || picker.pick_phases(&samples)).await {
                Ok(picks) => picks,
                Err(e) => {
                    error!(station = %context.waveform.station_code, error = %e, "Phase picking failed");
                    context.record_error(PipelineStage::PhasePicking, &e);
                    return context;
                }
            }
        };
        debug!(
            station = %context.waveform.station_code,
            picks = picks.len(),
            "Phase picking complete"
        );
        if !picks.is_empty() {
            context.phase_picks = Some(PhasePickResult {
                picks: picks.clone(),
            });
        }

        // Tier 1: association
        let candidates = {
            let associator = Arc::clone(&self.associator);
            let picks = picks.clone();
            match offload(move || associator.associate(&picks)).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!(station = %context.waveform.station_code, error = %e, "Association failed");
                    context.record_error(PipelineStage::Association, &e);
                    return context;
                }
            }
        };
        if candidates.is_empty() {
            info!(
                station = %context.waveform.station_code,
                "No association candidates produced"
            );
            return context;
        }
        debug!(candidates = candidates.len(), "Association complete");
        context.association = Some(AssociationResult {
            candidate_events: candidates,
        });

        // Tier 2: location
        {
            let locator = Arc::clone(&self.locator);
            let picks = picks.clone();
            match offload(move || locator.locate(&picks)).await {
                Ok(Some(estimate)) => context.location = Some(estimate),
                Ok(None) => debug!("Locator produced no solution"),
                Err(e) => {
                    error!(error = %e, "Location failed");
                    context.record_error(PipelineStage::Location, &e);
                }
            }
        }

        // Tier 2: magnitude
        {
            let magnitude = Arc::clone(&self.magnitude);
            let picks = picks.clone();
            match offload(move || magnitude.estimate(&picks)).await {
                Ok(Some(estimate)) => context.magnitude = Some(estimate),
                Ok(None) => debug!("No magnitude estimate available"),
                Err(e) => {
                    error!(error = %e, "Magnitude estimation failed");
                    context.record_error(PipelineStage::Magnitude, &e);
                }
            }
        }

        // Tier 2: mechanism
        {
            let mechanism = Arc::clone(&self.mechanism);
            match offload(move || mechanism.invert(&picks)).await {
                Ok(Some(estimate)) => context.mechanism = Some(estimate),
                Ok(None) => debug!("No mechanism solution available"),
                Err(e) => {
                    error!(error = %e, "Mechanism inversion failed");
                    context.record_error(PipelineStage::Mechanism, &e);
                }
            }
        }

        context
    }
}

/// Run an estimator call on the blocking pool so CPU-bound work does not
/// stall unrelated tasks on the async runtime.
async fn offload<T, F>(call: F) -> Result<T, EstimatorError>
where
    F: FnOnce() -> Result<T, EstimatorError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result,
        Err(join_error) => Err(EstimatorError::Aborted(join_error.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
