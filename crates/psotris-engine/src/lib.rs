//! Compact falling-block game used to score weight vectors.
//!
//! The engine only models what automated play needs: a 10×20 playfield, the
//! seven tetrominoes, a seeded 7-bag generator and hard-drop placements.
//! There is no gravity timer, hold slot or rotation system; an agent picks
//! any reachable-from-above placement of the current piece.
//!
//! # Example
//!
//! ```
//! use psotris_engine::{GameField, PieceSeed};
//!
//! let mut field = GameField::new(PieceSeed(0));
//! while let Some(placement) = field.placements().last().copied() {
//!     field.complete_placement(&placement).unwrap();
//! }
//! assert!(field.stats().completed_pieces() > 0);
//! ```

pub use self::{bit_board::*, game_field::*, game_stats::*, piece::*, piece_buffer::*};

mod bit_board;
mod game_field;
mod game_stats;
mod piece;
mod piece_buffer;
