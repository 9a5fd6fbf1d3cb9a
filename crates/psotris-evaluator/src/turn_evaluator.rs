//! Choosing the placement for the current turn.
//!
//! The [`TurnEvaluator`] is greedy: it scores every hard-drop placement of
//! the current piece with a [`PlacementEvaluator`] and takes the best one.
//! There is no lookahead and no hold piece. Ties go to the placement
//! enumerated first (rotation-major, then left to right).

use psotris_engine::{GameField, GameStats, Placement};

use crate::{placement_analysis::PlacementAnalysis, placement_evaluator::PlacementEvaluator};

#[derive(Debug)]
pub struct TurnEvaluator<'a> {
    placement_evaluator: &'a dyn PlacementEvaluator,
}

impl<'a> TurnEvaluator<'a> {
    #[must_use]
    pub fn new(placement_evaluator: &'a dyn PlacementEvaluator) -> Self {
        Self {
            placement_evaluator,
        }
    }

    /// Returns the highest-scoring placement, or `None` when the game is over.
    ///
    /// A NaN score loses to every other score, so a NaN placement is only
    /// chosen when all placements score NaN.
    #[must_use]
    pub fn select_best_placement(&self, field: &GameField) -> Option<(Placement, f64)> {
        let mut best: Option<(Placement, f64)> = None;
        for placement in field.placements() {
            let analysis = PlacementAnalysis::from_board(field.board(), placement);
            let score = self.placement_evaluator.evaluate_placement(&analysis);
            let replaces = best.is_none_or(|(_, best_score)| {
                score > best_score || (best_score.is_nan() && !score.is_nan())
            });
            if replaces {
                best = Some((placement, score));
            }
        }
        best
    }

    /// Plays until the field tops out or `piece_limit` pieces have been placed.
    #[must_use]
    pub fn play_session(&self, field: &mut GameField, piece_limit: usize) -> GameStats {
        for _ in 0..piece_limit {
            let Some((placement, _score)) = self.select_best_placement(field) else {
                break;
            };
            if field.complete_placement(&placement).is_err() {
                break;
            }
        }
        field.stats().clone()
    }
}
