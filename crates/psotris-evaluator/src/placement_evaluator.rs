//! Scoring a single placement.
//!
//! ```text
//! score = w₁·f₁ + w₂·f₂ + ... + w₈·f₈
//! ```
//!
//! where `fᵢ` is the normalized value of [`BoardFeature::ALL`]`[i]` and `wᵢ`
//! the matching weight. Weights are unconstrained; they are whatever the
//! swarm is currently trying.

use std::{fmt, iter};

use crate::{
    board_feature::{BoardFeature, FEATURE_COUNT},
    placement_analysis::PlacementAnalysis,
};

/// Assigns a score to a placement, higher is better.
pub trait PlacementEvaluator: fmt::Debug + Send + Sync {
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64;
}

/// Weighted sum of normalized board features.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedPlacementEvaluator {
    weights: [f64; FEATURE_COUNT],
}

impl WeightedPlacementEvaluator {
    #[must_use]
    pub fn new(weights: [f64; FEATURE_COUNT]) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &[f64; FEATURE_COUNT] {
        &self.weights
    }
}

impl PlacementEvaluator for WeightedPlacementEvaluator {
    #[inline]
    fn evaluate_placement(&self, analysis: &PlacementAnalysis) -> f64 {
        iter::zip(BoardFeature::ALL, &self.weights)
            .map(|(f, w)| f.normalized_value(analysis) * w)
            .sum()
    }
}
