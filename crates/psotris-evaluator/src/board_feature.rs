//! Board features scored by the placement evaluator.
//!
//! Each feature extracts a raw count from a [`PlacementAnalysis`] and divides
//! it by the largest value the count can take on a 10×20 board, so that every
//! normalized value lies in `[0.0, 1.0]`. No feature is inverted: higher
//! values mean "more of this property", and it is up to the trained weight to
//! decide whether that is good (positive weight) or bad (negative weight).
//!
//! | Feature              | Raw value                                        | Maximum |
//! |----------------------|--------------------------------------------------|---------|
//! | `AggregateHeight`    | sum of column heights                            | 200     |
//! | `Holes`              | empty cells covered by a block                   | 190     |
//! | `Bumpiness`          | sum of height differences of adjacent columns    | 180     |
//! | `MaxHeight`          | tallest column                                   | 20      |
//! | `WellDepthSum`       | sum of well depths (walls count as full columns) | 100     |
//! | `RowTransitions`     | horizontal occupied/empty changes                | 180     |
//! | `ColumnTransitions`  | vertical occupied/empty changes                  | 190     |
//! | `LinesCleared`       | lines cleared by the placement                   | 4       |
//!
//! The order of [`BoardFeature::ALL`] is the order of the weight vector.

use crate::placement_analysis::PlacementAnalysis;

/// Number of features, and therefore the length of a weight vector.
pub const FEATURE_COUNT: usize = BoardFeature::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BoardFeature {
    #[display("aggregate_height")]
    AggregateHeight,
    #[display("holes")]
    Holes,
    #[display("bumpiness")]
    Bumpiness,
    #[display("max_height")]
    MaxHeight,
    #[display("well_depth_sum")]
    WellDepthSum,
    #[display("row_transitions")]
    RowTransitions,
    #[display("column_transitions")]
    ColumnTransitions,
    #[display("lines_cleared")]
    LinesCleared,
}

impl BoardFeature {
    pub const ALL: [Self; 8] = [
        Self::AggregateHeight,
        Self::Holes,
        Self::Bumpiness,
        Self::MaxHeight,
        Self::WellDepthSum,
        Self::RowTransitions,
        Self::ColumnTransitions,
        Self::LinesCleared,
    ];

    /// Largest raw value this feature can take.
    #[must_use]
    pub const fn max_value(self) -> u32 {
        match self {
            Self::AggregateHeight => 200,
            Self::Holes | Self::ColumnTransitions => 190,
            Self::Bumpiness | Self::RowTransitions => 180,
            Self::MaxHeight => 20,
            Self::WellDepthSum => 100,
            Self::LinesCleared => 4,
        }
    }

    #[must_use]
    pub fn raw_value(self, analysis: &PlacementAnalysis) -> u32 {
        let board = analysis.board_analysis();
        match self {
            Self::AggregateHeight => board.aggregate_height(),
            Self::Holes => board.num_holes(),
            Self::Bumpiness => board.bumpiness(),
            Self::MaxHeight => board.max_height(),
            Self::WellDepthSum => board.well_depth_sum(),
            Self::RowTransitions => board.row_transitions(),
            Self::ColumnTransitions => board.column_transitions(),
            Self::LinesCleared => u32::try_from(analysis.cleared_lines()).unwrap_or(u32::MAX),
        }
    }

    /// Raw value scaled into `[0.0, 1.0]`.
    #[must_use]
    pub fn normalized_value(self, analysis: &PlacementAnalysis) -> f64 {
        let raw = f64::from(self.raw_value(analysis));
        (raw / f64::from(self.max_value())).clamp(0.0, 1.0)
    }
}
