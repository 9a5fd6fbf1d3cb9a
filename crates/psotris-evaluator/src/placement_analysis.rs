//! Board state after a candidate placement.
//!
//! Combines the number of lines the placement clears with a
//! [`BoardAnalysis`] of the board left behind, which is everything the
//! board features look at.

use psotris_engine::{BitBoard, Placement};

use crate::board_analysis::BoardAnalysis;

#[derive(Debug)]
pub struct PlacementAnalysis {
    placement: Placement,
    cleared_lines: usize,
    board_analysis: BoardAnalysis,
}

impl PlacementAnalysis {
    /// Simulates `placement` on a copy of `before_placement`.
    ///
    /// # Panics
    ///
    /// Panics if the placement overlaps occupied cells.
    #[must_use]
    pub fn from_board(before_placement: &BitBoard, placement: Placement) -> Self {
        let mut board = *before_placement;
        let cleared_lines = board.lock(&placement);
        Self {
            placement,
            cleared_lines,
            board_analysis: BoardAnalysis::from_board(&board),
        }
    }

    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    #[must_use]
    pub fn cleared_lines(&self) -> usize {
        self.cleared_lines
    }

    #[must_use]
    pub fn board_analysis(&self) -> &BoardAnalysis {
        &self.board_analysis
    }
}
