use arrayvec::ArrayVec;

use crate::{
    bit_board::{BitBoard, MAX_PLACEMENTS, Placement},
    game_stats::GameStats,
    piece::PieceKind,
    piece_buffer::{PieceBuffer, PieceSeed},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PlacementError {
    #[display("placement is for {placement:?} but the current piece is {current:?}")]
    WrongPiece {
        placement: PieceKind,
        current: PieceKind,
    },
    #[display("placement collides with the board")]
    Collision,
}

/// Single-player game state: board, current piece, upcoming pieces and stats.
///
/// The game is over once [`GameField::placements`] returns nothing.
#[derive(Debug, Clone)]
pub struct GameField {
    board: BitBoard,
    pieces: PieceBuffer,
    current: PieceKind,
    stats: GameStats,
}

impl GameField {
    #[must_use]
    pub fn new(seed: PieceSeed) -> Self {
        let mut pieces = PieceBuffer::new(seed);
        let current = pieces.pop_next();
        Self {
            board: BitBoard::EMPTY,
            pieces,
            current,
            stats: GameStats::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    #[must_use]
    pub fn current_piece(&self) -> PieceKind {
        self.current
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Hard-drop placements available for the current piece.
    #[must_use]
    pub fn placements(&self) -> ArrayVec<Placement, MAX_PLACEMENTS> {
        self.board.placements(self.current)
    }

    #[must_use]
    pub fn is_topped_out(&self) -> bool {
        self.placements().is_empty()
    }

    /// Locks the current piece at `placement` and spawns the next one.
    ///
    /// Returns the number of cleared lines.
    pub fn complete_placement(&mut self, placement: &Placement) -> Result<usize, PlacementError> {
        if placement.kind() != self.current {
            return Err(PlacementError::WrongPiece {
                placement: placement.kind(),
                current: self.current,
            });
        }
        if !self
            .board
            .fits(placement.shape(), placement.x(), placement.y())
        {
            return Err(PlacementError::Collision);
        }
        let cleared = self.board.lock(placement);
        self.stats.complete_piece_drop(cleared);
        self.current = self.pieces.pop_next();
        Ok(cleared)
    }
}
