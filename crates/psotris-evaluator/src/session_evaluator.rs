//! Fitness of a whole game session.
//!
//! ```text
//! fitness = (efficiency + survival) / 2
//!
//! where:
//!   efficiency = weighted_lines / max_weighted_lines
//!   weighted_lines = Σ(line_clear_weight[i] × cleared_count[i])
//!   line_clear_weight = [0, 1, 3, 5, 8] for 0-4 line clears
//!   max_weighted_lines = 8 × (piece_limit × 4 cells) / 40 cells
//!   survival = placed_pieces / piece_limit
//! ```
//!
//! `max_weighted_lines` is what a session scoring nothing but 4-line clears
//! would reach, so both terms lie in `[0.0, 1.0]`. A game that tops out early
//! loses survival and forfeits the lines it could still have cleared.

use std::{iter, num::NonZeroUsize};

use psotris_engine::{GameField, GameStats, PieceSeed};

use crate::turn_evaluator::TurnEvaluator;

const LINE_CLEAR_WEIGHT: [u16; 5] = [0, 1, 3, 5, 8];

/// Outcome of one played session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub fitness: f64,
    pub cleared_lines: usize,
    pub placed_pieces: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEvaluator {
    piece_limit: NonZeroUsize,
}

impl SessionEvaluator {
    #[must_use]
    pub fn new(piece_limit: NonZeroUsize) -> Self {
        Self { piece_limit }
    }

    #[must_use]
    pub fn piece_limit(&self) -> NonZeroUsize {
        self.piece_limit
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn fitness(&self, stats: &GameStats) -> f64 {
        let piece_limit = self.piece_limit.get() as f64;

        let weighted_lines = iter::zip(LINE_CLEAR_WEIGHT, stats.line_cleared_counter())
            .map(|(w, c)| f64::from(w) * (*c as f64))
            .sum::<f64>();
        let max_weighted_lines = 8.0 * (piece_limit * 4.0) / 40.0;
        let efficiency = weighted_lines / max_weighted_lines;

        let survival = stats.completed_pieces() as f64 / piece_limit;

        f64::midpoint(efficiency, survival)
    }

    /// Plays one session from a fresh field and scores it.
    #[must_use]
    pub fn play_and_evaluate_session(
        &self,
        seed: PieceSeed,
        turn_evaluator: &TurnEvaluator<'_>,
    ) -> SessionResult {
        let mut field = GameField::new(seed);
        let stats = turn_evaluator.play_session(&mut field, self.piece_limit.get());
        let result = SessionResult {
            fitness: self.fitness(&stats),
            cleared_lines: stats.total_cleared_lines(),
            placed_pieces: stats.completed_pieces(),
        };
        tracing::trace!(
            seed = seed.0,
            fitness = result.fitness,
            cleared_lines = result.cleared_lines,
            placed_pieces = result.placed_pieces,
            "session finished"
        );
        result
    }
}
