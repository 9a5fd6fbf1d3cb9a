use std::{cell::OnceCell, iter};

use psotris_engine::BitBoard;

/// Board metrics, computed on first use.
#[derive(Debug)]
pub struct BoardAnalysis {
    board: BitBoard,
    column_heights: OnceCell<[u8; BitBoard::WIDTH]>,
    column_occupied_cells: OnceCell<[u8; BitBoard::WIDTH]>,
    column_well_depths: OnceCell<[u8; BitBoard::WIDTH]>,
}

impl BoardAnalysis {
    #[must_use]
    pub fn from_board(board: &BitBoard) -> Self {
        Self {
            board: *board,
            column_heights: OnceCell::new(),
            column_occupied_cells: OnceCell::new(),
            column_well_depths: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    #[must_use]
    pub fn column_heights(&self) -> &[u8; BitBoard::WIDTH] {
        self.column_heights
            .get_or_init(|| self.board.column_heights())
    }

    #[must_use]
    pub fn column_occupied_cells(&self) -> &[u8; BitBoard::WIDTH] {
        self.column_occupied_cells.get_or_init(|| {
            let mut occupied = [0; BitBoard::WIDTH];
            for (x, o) in occupied.iter_mut().enumerate() {
                for y in 0..BitBoard::HEIGHT {
                    if self.board.is_occupied(x, y) {
                        *o += 1;
                    }
                }
            }
            occupied
        })
    }

    /// Depth of the well in each column; the side walls count as infinitely high.
    #[must_use]
    pub fn column_well_depths(&self) -> &[u8; BitBoard::WIDTH] {
        self.column_well_depths.get_or_init(|| {
            let h = self.column_heights();
            let start = &[u8::MAX, h[0], h[1]][..];
            let end = &[h[h.len() - 2], h[h.len() - 1], u8::MAX][..];
            let triples = iter::once(start).chain(h.windows(3)).chain(iter::once(end));
            let mut depths = [0; BitBoard::WIDTH];
            for (w, depth) in iter::zip(triples, &mut depths) {
                if w[1] < w[0] && w[1] < w[2] {
                    *depth = u8::min(w[0], w[2]) - w[1];
                }
            }
            depths
        })
    }

    #[must_use]
    pub fn aggregate_height(&self) -> u32 {
        self.column_heights().iter().map(|&h| u32::from(h)).sum()
    }

    #[must_use]
    pub fn max_height(&self) -> u32 {
        self.column_heights()
            .iter()
            .copied()
            .max()
            .map_or(0, u32::from)
    }

    /// Empty cells with at least one block above them in the same column.
    #[must_use]
    pub fn num_holes(&self) -> u32 {
        iter::zip(self.column_heights(), self.column_occupied_cells())
            .map(|(h, occ)| u32::from(h - occ))
            .sum()
    }

    #[must_use]
    pub fn bumpiness(&self) -> u32 {
        self.column_heights()
            .windows(2)
            .map(|w| u32::from(w[0].abs_diff(w[1])))
            .sum()
    }

    #[must_use]
    pub fn well_depth_sum(&self) -> u32 {
        self.column_well_depths()
            .iter()
            .map(|&d| u32::from(d))
            .sum()
    }

    /// Occupied/empty changes between horizontally adjacent cells.
    #[must_use]
    pub fn row_transitions(&self) -> u32 {
        self.board
            .rows()
            .iter()
            .map(|&row| {
                let pairs = (row ^ (row >> 1)) & ((1 << (BitBoard::WIDTH - 1)) - 1);
                pairs.count_ones()
            })
            .sum()
    }

    /// Occupied/empty changes between vertically adjacent cells.
    #[must_use]
    pub fn column_transitions(&self) -> u32 {
        self.board
            .rows()
            .windows(2)
            .map(|w| (w[0] ^ w[1]).count_ones())
            .sum()
    }
}
