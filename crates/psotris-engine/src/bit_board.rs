use std::fmt;

use arrayvec::ArrayVec;

use crate::piece::{PieceKind, PieceShape};

/// Upper bound on the number of hard-drop placements of a single piece.
///
/// The T, J and L pieces have the most: 8 + 9 + 8 + 9 = 34.
pub const MAX_PLACEMENTS: usize = 34;

const FULL_ROW: u16 = (1 << BitBoard::WIDTH) - 1;

/// A piece locked at a specific rotation and location.
///
/// `x`/`y` address the top-left corner of the rotation's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    kind: PieceKind,
    rotation: usize,
    x: usize,
    y: usize,
}

impl Placement {
    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    #[must_use]
    pub fn x(&self) -> usize {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> usize {
        self.y
    }

    #[must_use]
    pub fn shape(&self) -> &'static PieceShape {
        &self.kind.rotations()[self.rotation]
    }
}

/// Playfield stored as one 16-bit mask per row.
///
/// Row 0 is the top of the field; bit `x` of a row is column `x`.
/// Only the low [`BitBoard::WIDTH`] bits are ever set.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct BitBoard {
    rows: [u16; BitBoard::HEIGHT],
}

impl fmt::Debug for BitBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard {{")?;
        for row in &self.rows {
            let line: String = (0..Self::WIDTH)
                .map(|x| if row & (1 << x) != 0 { '#' } else { '.' })
                .collect();
            writeln!(f, "  {line}")?;
        }
        write!(f, "}}")
    }
}

impl BitBoard {
    pub const WIDTH: usize = 10;
    pub const HEIGHT: usize = 20;

    pub const EMPTY: Self = Self {
        rows: [0; Self::HEIGHT],
    };

    /// Builds a board from text rows, `#` marking occupied cells.
    ///
    /// The rows are aligned to the bottom of the board; missing rows above are empty.
    ///
    /// # Panics
    ///
    /// Panics if more than [`BitBoard::HEIGHT`] rows or a row wider than
    /// [`BitBoard::WIDTH`] is given.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        assert!(rows.len() <= Self::HEIGHT);
        let mut board = Self::EMPTY;
        let offset = Self::HEIGHT - rows.len();
        for (i, row) in rows.iter().enumerate() {
            assert!(row.len() <= Self::WIDTH);
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    board.rows[offset + i] |= 1 << x;
                }
            }
        }
        board
    }

    #[inline]
    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.rows[y] & (1 << x) != 0
    }

    /// Row masks from top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[u16; Self::HEIGHT] {
        &self.rows
    }

    #[inline]
    #[must_use]
    pub fn fits(&self, shape: &PieceShape, x: usize, y: usize) -> bool {
        if x + shape.width() > Self::WIDTH || y + shape.height() > Self::HEIGHT {
            return false;
        }
        shape
            .rows()
            .iter()
            .enumerate()
            .all(|(dy, mask)| self.rows[y + dy] & (mask << x) == 0)
    }

    /// Lowest `y` a shape dropped straight down in column `x` comes to rest at.
    ///
    /// Returns `None` when the shape already collides at the top of the board.
    #[must_use]
    pub fn drop_y(&self, shape: &PieceShape, x: usize) -> Option<usize> {
        if !self.fits(shape, x, 0) {
            return None;
        }
        let mut y = 0;
        while self.fits(shape, x, y + 1) {
            y += 1;
        }
        Some(y)
    }

    /// Enumerates every hard-drop placement of `kind`, rotation-major then left to right.
    #[must_use]
    pub fn placements(&self, kind: PieceKind) -> ArrayVec<Placement, MAX_PLACEMENTS> {
        let mut placements = ArrayVec::new();
        for (rotation, shape) in kind.rotations().iter().enumerate() {
            for x in 0..=(Self::WIDTH - shape.width()) {
                if let Some(y) = self.drop_y(shape, x) {
                    placements.push(Placement {
                        kind,
                        rotation,
                        x,
                        y,
                    });
                }
            }
        }
        placements
    }

    /// Locks the placement into the board and clears completed rows.
    ///
    /// Returns the number of cleared rows.
    ///
    /// # Panics
    ///
    /// Panics if the placement overlaps occupied cells.
    pub fn lock(&mut self, placement: &Placement) -> usize {
        let shape = placement.shape();
        assert!(
            self.fits(shape, placement.x, placement.y),
            "placement must not overlap the board"
        );
        for (dy, mask) in shape.rows().iter().enumerate() {
            self.rows[placement.y + dy] |= mask << placement.x;
        }
        self.clear_lines()
    }

    fn clear_lines(&mut self) -> usize {
        let mut write = Self::HEIGHT;
        for read in (0..Self::HEIGHT).rev() {
            if self.rows[read] != FULL_ROW {
                write -= 1;
                self.rows[write] = self.rows[read];
            }
        }
        let cleared = write;
        self.rows[..cleared].fill(0);
        cleared
    }

    /// Height of every column, measured from the floor to its topmost block.
    #[must_use]
    pub fn column_heights(&self) -> [u8; Self::WIDTH] {
        let mut heights = [0; Self::WIDTH];
        for (x, height) in heights.iter_mut().enumerate() {
            if let Some(y) = (0..Self::HEIGHT).find(|&y| self.is_occupied(x, y)) {
                #[expect(clippy::cast_possible_truncation)]
                let h = (Self::HEIGHT - y) as u8;
                *height = h;
            }
        }
        heights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i_horizontal(x: usize, y: usize) -> Placement {
        Placement {
            kind: PieceKind::I,
            rotation: 0,
            x,
            y,
        }
    }

    #[test]
    fn test_drop_on_empty_board_lands_on_floor() {
        let board = BitBoard::EMPTY;
        let shape = &PieceKind::O.rotations()[0];
        assert_eq!(board.drop_y(shape, 0), Some(BitBoard::HEIGHT - 2));
    }

    #[test]
    fn test_drop_stops_on_stack() {
        let board = BitBoard::from_rows(&["#.........", "#........."]);
        let shape = &PieceKind::I.rotations()[1];
        assert_eq!(board.drop_y(shape, 0), Some(BitBoard::HEIGHT - 6));
        assert_eq!(board.drop_y(shape, 1), Some(BitBoard::HEIGHT - 4));
    }

    #[test]
    fn test_placement_counts_on_empty_board() {
        let board = BitBoard::EMPTY;
        assert_eq!(board.placements(PieceKind::I).len(), 7 + 10);
        assert_eq!(board.placements(PieceKind::O).len(), 9);
        assert_eq!(board.placements(PieceKind::T).len(), MAX_PLACEMENTS);
    }

    #[test]
    fn test_lock_clears_full_rows() {
        let mut board = BitBoard::from_rows(&["..........", "##..######"]);
        let cleared = board.lock(&Placement {
            kind: PieceKind::O,
            rotation: 0,
            x: 2,
            y: BitBoard::HEIGHT - 2,
        });
        assert_eq!(cleared, 1);
        assert_eq!(board, BitBoard::from_rows(&["..##......"]));
    }

    #[test]
    fn test_lock_clears_four_rows() {
        let mut board = BitBoard::from_rows(&[
            "#########.",
            "#########.",
            "#########.",
            "#########.",
        ]);
        let cleared = board.lock(&Placement {
            kind: PieceKind::I,
            rotation: 1,
            x: 9,
            y: BitBoard::HEIGHT - 4,
        });
        assert_eq!(cleared, 4);
        assert_eq!(board, BitBoard::EMPTY);
    }

    #[test]
    fn test_column_heights() {
        let board = BitBoard::from_rows(&["#.........", "#..#......", "##.#......"]);
        assert_eq!(board.column_heights(), [3, 1, 0, 2, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_no_placement_when_top_is_blocked() {
        let mut rows = ["##########"; BitBoard::HEIGHT];
        rows[BitBoard::HEIGHT - 1] = "#########.";
        let board = BitBoard::from_rows(&rows);
        assert!(board.placements(PieceKind::O).is_empty());
    }

    #[test]
    #[should_panic(expected = "placement must not overlap the board")]
    fn test_lock_rejects_overlap() {
        let mut board = BitBoard::from_rows(&["#........."]);
        board.lock(&i_horizontal(0, BitBoard::HEIGHT - 1));
    }
}
