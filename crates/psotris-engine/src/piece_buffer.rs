use std::collections::VecDeque;

use rand::{SeedableRng as _, seq::SliceRandom};
use rand_pcg::Pcg32;

use crate::piece::PieceKind;

/// Seed that fully determines the piece sequence of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceSeed(pub u64);

/// Supplies pieces using the 7-bag system.
///
/// Every consecutive group of seven pieces contains each kind exactly once.
#[derive(Debug, Clone)]
pub struct PieceBuffer {
    rng: Pcg32,
    bag: VecDeque<PieceKind>,
}

impl PieceBuffer {
    #[must_use]
    pub fn new(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed.0),
            bag: VecDeque::with_capacity(PieceKind::LEN),
        }
    }

    /// Pops the next piece, refilling the bag with a fresh shuffle when empty.
    pub fn pop_next(&mut self) -> PieceKind {
        if let Some(kind) = self.bag.pop_front() {
            return kind;
        }
        let mut new_bag = PieceKind::ALL;
        new_bag.shuffle(&mut self.rng);
        let [first, rest @ ..] = new_bag;
        self.bag.extend(rest);
        first
    }
}
