//! Particle swarm optimization of placement weight vectors.
//!
//! A weight vector tells a game-playing agent how much each board feature
//! matters. This crate searches for good vectors with particle swarm
//! optimization (PSO): a fixed population of particles moves through weight
//! space, each pulled toward its own best position and toward the best of its
//! neighbors.
//!
//! # How Training Works
//!
//! 1. **Initialize** - Validate the configuration, create `P` particles with
//!    components drawn from `[-1, 1]`, and write the initial-state file
//! 2. **Evaluate** - Every particle plays games with its weights (in parallel)
//!    and records its personal best
//! 3. **Update** - Every particle picks its best neighbor from the finished
//!    evaluations and moves
//! 4. **Repeat** - Iterate a fixed number of times
//! 5. **Persist** - Write final positions and the best lines-cleared count of
//!    every particle
//!
//! # Architecture
//!
//! ```text
//! Trainer (trainer)
//!     ↓ drives
//! Swarm (swarm) ── Topology (topology)
//!     ↓ owns
//! Particles (particle)
//!     ↓ scored by
//! FitnessEvaluator (evaluator), e.g. psotris-evaluator's TetrisEvaluator
//! ```
//!
//! The optimizer knows nothing about the game. Anything implementing
//! [`evaluator::FitnessEvaluator`] can be trained.
//!
//! # Reproducibility
//!
//! A run is seeded once. The swarm generator draws initial positions and one
//! seed per particle; each particle then draws its own `r1`/`r2`. With a
//! deterministic evaluator, two runs with the same configuration produce
//! identical files, independent of the number of worker threads.

pub mod config;
pub mod evaluator;
pub mod particle;
pub mod positions;
pub mod stats;
pub mod swarm;
pub mod topology;
pub mod trainer;
