//! The boundary between the optimizer and whatever scores a weight vector.
//!
//! The swarm never looks inside an evaluation: it hands a position to a
//! [`FitnessEvaluator`] and receives a fitness (higher is better) plus the
//! number of lines the simulated games cleared. Evaluators may be noisy; the
//! swarm only assumes that `evaluate` can be called concurrently from several
//! threads for different particles.

use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
};

use serde::{Deserialize, Serialize};

/// Result of scoring one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Scalar fitness, higher is better.
    pub fitness: f64,
    /// Auxiliary metric reported alongside the fitness (lines cleared).
    pub lines_cleared: f64,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display("expected a weight vector of length {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[display("evaluator returned a NaN fitness")]
    NanFitness,
    #[display("evaluator panicked: {message}")]
    Panicked { message: String },
    #[display("simulation failed: {message}")]
    Simulation { message: String },
}

/// What the swarm does when a particle's evaluation fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationFailurePolicy {
    /// Stop the run. The failed iteration's evaluations are discarded, so the
    /// swarm is left exactly as the previous iteration finished it.
    #[default]
    Abort,
    /// Log the failure and keep the particle's previous personal best for this
    /// iteration. The particle still moves in the update phase.
    Skip,
}

/// Scores a weight vector by playing games with it.
pub trait FitnessEvaluator: fmt::Debug + Send + Sync {
    /// Length of the weight vectors this evaluator accepts, when it is fixed.
    ///
    /// The trainer checks the configured dimensionality against it before any
    /// particle is created.
    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError>;
}

impl<E> FitnessEvaluator for &E
where
    E: FitnessEvaluator + ?Sized,
{
    fn dimensions(&self) -> Option<usize> {
        (**self).dimensions()
    }

    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
        (**self).evaluate(position)
    }
}

/// Runs the evaluator, converting panics and NaN fitness into errors.
pub(crate) fn evaluate_guarded<E>(
    evaluator: &E,
    position: &[f64],
) -> Result<Evaluation, EvaluationError>
where
    E: FitnessEvaluator + ?Sized,
{
    let evaluation = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(position)))
        .map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_owned());
            EvaluationError::Panicked { message }
        })??;
    if evaluation.fitness.is_nan() {
        return Err(EvaluationError::NanFitness);
    }
    Ok(evaluation)
}
