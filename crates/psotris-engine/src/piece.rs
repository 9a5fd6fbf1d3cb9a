/// The seven tetromino kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    S,
    Z,
    J,
    L,
    T,
}

impl PieceKind {
    pub const LEN: usize = 7;
    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    /// Returns the distinct rotation states of this piece.
    ///
    /// Symmetric pieces have fewer than four states (O has one, I/S/Z have two),
    /// so placement enumeration never visits the same footprint twice.
    #[must_use]
    pub fn rotations(self) -> &'static [PieceShape] {
        match self {
            Self::I => &I_SHAPES,
            Self::O => &O_SHAPES,
            Self::S => &S_SHAPES,
            Self::Z => &Z_SHAPES,
            Self::J => &J_SHAPES,
            Self::L => &L_SHAPES,
            Self::T => &T_SHAPES,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::I => 'I',
            Self::O => 'O',
            Self::S => 'S',
            Self::Z => 'Z',
            Self::J => 'J',
            Self::L => 'L',
            Self::T => 'T',
        }
    }
}

/// Footprint of one rotation state, normalized to its bounding box.
///
/// `rows[dy]` holds the occupied columns of row `dy` (counted from the top of
/// the box) as a bitmask whose bit 0 is the leftmost column of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceShape {
    rows: [u16; 4],
    width: u8,
    height: u8,
}

impl PieceShape {
    const fn from_cells(cells: [(u8, u8); 4]) -> Self {
        let mut rows = [0; 4];
        let mut width = 0;
        let mut height = 0;
        let mut i = 0;
        while i < cells.len() {
            let (x, y) = cells[i];
            rows[y as usize] |= 1 << x;
            if x + 1 > width {
                width = x + 1;
            }
            if y + 1 > height {
                height = y + 1;
            }
            i += 1;
        }
        Self {
            rows,
            width,
            height,
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    #[must_use]
    pub fn height(&self) -> usize {
        usize::from(self.height)
    }

    /// Row masks from the top of the bounding box, `height()` entries long.
    #[must_use]
    pub fn rows(&self) -> &[u16] {
        &self.rows[..self.height()]
    }

    /// Iterates over occupied `(dx, dy)` offsets inside the bounding box.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows().iter().enumerate().flat_map(move |(dy, row)| {
            (0..self.width())
                .filter(move |dx| *row & (1_u16 << dx) != 0)
                .map(move |dx| (dx, dy))
        })
    }
}

const I_SHAPES: [PieceShape; 2] = [
    PieceShape::from_cells([(0, 0), (1, 0), (2, 0), (3, 0)]),
    PieceShape::from_cells([(0, 0), (0, 1), (0, 2), (0, 3)]),
];
const O_SHAPES: [PieceShape; 1] = [PieceShape::from_cells([(0, 0), (1, 0), (0, 1), (1, 1)])];
const S_SHAPES: [PieceShape; 2] = [
    PieceShape::from_cells([(1, 0), (2, 0), (0, 1), (1, 1)]),
    PieceShape::from_cells([(0, 0), (0, 1), (1, 1), (1, 2)]),
];
const Z_SHAPES: [PieceShape; 2] = [
    PieceShape::from_cells([(0, 0), (1, 0), (1, 1), (2, 1)]),
    PieceShape::from_cells([(1, 0), (0, 1), (1, 1), (0, 2)]),
];
const J_SHAPES: [PieceShape; 4] = [
    PieceShape::from_cells([(0, 0), (0, 1), (1, 1), (2, 1)]),
    PieceShape::from_cells([(0, 0), (1, 0), (0, 1), (0, 2)]),
    PieceShape::from_cells([(0, 0), (1, 0), (2, 0), (2, 1)]),
    PieceShape::from_cells([(1, 0), (1, 1), (0, 2), (1, 2)]),
];
const L_SHAPES: [PieceShape; 4] = [
    PieceShape::from_cells([(2, 0), (0, 1), (1, 1), (2, 1)]),
    PieceShape::from_cells([(0, 0), (0, 1), (0, 2), (1, 2)]),
    PieceShape::from_cells([(0, 0), (1, 0), (2, 0), (0, 1)]),
    PieceShape::from_cells([(0, 0), (1, 0), (1, 1), (1, 2)]),
];
const T_SHAPES: [PieceShape; 4] = [
    PieceShape::from_cells([(1, 0), (0, 1), (1, 1), (2, 1)]),
    PieceShape::from_cells([(0, 0), (0, 1), (1, 1), (0, 2)]),
    PieceShape::from_cells([(0, 0), (1, 0), (2, 0), (1, 1)]),
    PieceShape::from_cells([(1, 0), (0, 1), (1, 1), (1, 2)]),
];
