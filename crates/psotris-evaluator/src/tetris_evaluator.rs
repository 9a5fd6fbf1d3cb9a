//! [`FitnessEvaluator`] that plays games with the weight vector.
//!
//! Every evaluation plays the same `games` sessions: the piece seeds are
//! drawn once from the base seed when the evaluator is created. Two particles
//! at the same position therefore always receive the same fitness, and the
//! swarm compares weight vectors on identical piece sequences.

use std::num::NonZeroUsize;

use psotris_engine::PieceSeed;
use psotris_training::evaluator::{Evaluation, EvaluationError, FitnessEvaluator};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::{
    board_feature::FEATURE_COUNT,
    placement_evaluator::WeightedPlacementEvaluator,
    session_evaluator::{SessionEvaluator, SessionResult},
    turn_evaluator::TurnEvaluator,
};

/// Game settings of a [`TetrisEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    /// Sessions played per evaluation.
    pub games: NonZeroUsize,
    /// Pieces after which a surviving session ends.
    pub piece_limit: NonZeroUsize,
    /// Base seed the per-game piece seeds are derived from.
    pub seed: u64,
}

impl EvaluatorConfig {
    pub const DEFAULT_GAMES: NonZeroUsize = NonZeroUsize::new(3).unwrap();
    pub const DEFAULT_PIECE_LIMIT: NonZeroUsize = NonZeroUsize::new(500).unwrap();
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            games: Self::DEFAULT_GAMES,
            piece_limit: Self::DEFAULT_PIECE_LIMIT,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TetrisEvaluator {
    session_evaluator: SessionEvaluator,
    piece_seeds: Vec<PieceSeed>,
}

impl TetrisEvaluator {
    #[must_use]
    pub fn new(config: &EvaluatorConfig) -> Self {
        let mut rng = Pcg64Mcg::seed_from_u64(config.seed);
        let piece_seeds = (0..config.games.get())
            .map(|_| PieceSeed(rng.random()))
            .collect();
        Self {
            session_evaluator: SessionEvaluator::new(config.piece_limit),
            piece_seeds,
        }
    }

    #[must_use]
    pub fn piece_seeds(&self) -> &[PieceSeed] {
        &self.piece_seeds
    }

    /// Plays every session with `weights` and returns the individual results.
    pub fn play_sessions(&self, weights: &[f64]) -> Result<Vec<SessionResult>, EvaluationError> {
        let weights = <[f64; FEATURE_COUNT]>::try_from(weights).map_err(|_| {
            EvaluationError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: weights.len(),
            }
        })?;
        let placement_evaluator = WeightedPlacementEvaluator::new(weights);
        let turn_evaluator = TurnEvaluator::new(&placement_evaluator);
        Ok(self
            .piece_seeds
            .iter()
            .map(|&seed| {
                self.session_evaluator
                    .play_and_evaluate_session(seed, &turn_evaluator)
            })
            .collect())
    }
}

impl FitnessEvaluator for TetrisEvaluator {
    fn dimensions(&self) -> Option<usize> {
        Some(FEATURE_COUNT)
    }

    /// Mean session fitness, with the total number of cleared lines.
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
        let results = self.play_sessions(position)?;
        let fitness = results.iter().map(|r| r.fitness).sum::<f64>() / results.len() as f64;
        let lines_cleared = results.iter().map(|r| r.cleared_lines).sum::<usize>() as f64;
        Ok(Evaluation {
            fitness,
            lines_cleared,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> TetrisEvaluator {
        TetrisEvaluator::new(&EvaluatorConfig {
            games: NonZeroUsize::new(2).unwrap(),
            piece_limit: NonZeroUsize::new(60).unwrap(),
            seed,
        })
    }

    const GOOD: [f64; FEATURE_COUNT] = [-5.0, -8.0, -1.0, -1.0, -0.5, -1.0, -1.0, 4.0];

    #[test]
    fn test_reports_feature_count() {
        assert_eq!(small(0).dimensions(), Some(FEATURE_COUNT));
    }

    #[test]
    fn test_wrong_length_is_an_error() {
        let err = small(0).evaluate(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::DimensionMismatch {
                expected: FEATURE_COUNT,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = small(5);
        assert_eq!(evaluator.evaluate(&GOOD).unwrap(), evaluator.evaluate(&GOOD).unwrap());
        assert_eq!(small(5).piece_seeds(), evaluator.piece_seeds());
        assert_ne!(small(6).piece_seeds(), evaluator.piece_seeds());
    }

    #[test]
    fn test_fitness_in_unit_range_and_lines_summed() {
        let evaluator = small(1);
        let results = evaluator.play_sessions(&GOOD).unwrap();
        assert_eq!(results.len(), 2);
        let evaluation = evaluator.evaluate(&GOOD).unwrap();
        assert!((0.0..=1.0).contains(&evaluation.fitness));
        #[expect(clippy::cast_precision_loss)]
        let lines = results.iter().map(|r| r.cleared_lines).sum::<usize>() as f64;
        assert_eq!(evaluation.lines_cleared, lines);
    }

    #[test]
    fn test_sensible_weights_beat_stacking() {
        let mut stacking = [0.0; FEATURE_COUNT];
        stacking[3] = 10.0;
        let evaluator = small(3);
        let good = evaluator.evaluate(&GOOD).unwrap();
        let bad = evaluator.evaluate(&stacking).unwrap();
        assert!(good.fitness > bad.fitness);
    }

    #[test]
    fn test_config_from_json() {
        let config: EvaluatorConfig =
            serde_json::from_str(r#"{ "games": 5, "piece_limit": 100 }"#).unwrap();
        assert_eq!(config.games.get(), 5);
        assert_eq!(config.seed, 0);
        assert!(serde_json::from_str::<EvaluatorConfig>(r#"{ "games": 0 }"#).is_err());
    }
}
