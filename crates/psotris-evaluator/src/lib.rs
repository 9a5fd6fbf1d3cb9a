//! Game-playing fitness evaluator for placement weight vectors.
//!
//! This crate turns a weight vector into a fitness score by letting a greedy
//! agent play games with it. It is the evaluator `psotris train` optimizes
//! against.
//!
//! # Architecture
//!
//! ```text
//! TetrisEvaluator (fitness for training, implements FitnessEvaluator)
//!     ↓ plays sessions with
//! SessionEvaluator (score a whole game)
//!     ↓ uses
//! TurnEvaluator (select best placement)
//!     ↓ uses
//! PlacementEvaluator (score single placement)
//!     ↓ reads
//! BoardFeature (8 normalized board features)
//! ```
//!
//! # Supporting Modules
//!
//! - [`board_analysis`] - Lazily computed board metrics (heights, holes, wells, transitions)
//! - [`placement_analysis`] - Board state after a candidate placement
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//!
//! use psotris_evaluator::tetris_evaluator::{EvaluatorConfig, TetrisEvaluator};
//! use psotris_training::evaluator::FitnessEvaluator as _;
//!
//! let evaluator = TetrisEvaluator::new(&EvaluatorConfig {
//!     games: NonZeroUsize::MIN,
//!     piece_limit: NonZeroUsize::new(20).unwrap(),
//!     seed: 42,
//! });
//! let weights = [-5.0, -8.0, -1.0, -1.0, -0.5, -1.0, -1.0, 4.0];
//! let evaluation = evaluator.evaluate(&weights).unwrap();
//! assert!((0.0..=1.0).contains(&evaluation.fitness));
//! ```

pub mod board_analysis;
pub mod board_feature;
pub mod placement_analysis;
pub mod placement_evaluator;
pub mod session_evaluator;
pub mod tetris_evaluator;
pub mod turn_evaluator;
