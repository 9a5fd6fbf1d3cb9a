//! A single candidate weight vector and its motion through the search space.
//!
//! Each particle carries its own random number generator, derived from the
//! run seed when the swarm is created. The velocity update draws `r1`/`r2`
//! from it, so the outcome of an update never depends on which thread
//! performed it or in which order particles were visited.

use std::iter;

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::evaluator::{self, Evaluation, EvaluationError, FitnessEvaluator};

/// Coefficients of the velocity update rule
///
/// ```text
/// v[j] = w·v[j] + c1·r1·(pbest[j] - x[j]) + c2·r2·(nbest[j] - x[j])
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsoCoefficients {
    /// Inertia weight `w`.
    pub inertia: f64,
    /// Cognitive coefficient `c1` (pull toward the particle's own best).
    pub cognitive: f64,
    /// Social coefficient `c2` (pull toward the neighborhood best).
    pub social: f64,
}

impl Default for PsoCoefficients {
    /// Clerc's constriction values.
    fn default() -> Self {
        Self {
            inertia: 0.729,
            cognitive: 1.494,
            social: 1.494,
        }
    }
}

/// Bounding policy applied when a particle moves.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionBounds {
    #[default]
    Unbounded,
    /// Clamp every component to `[min, max]`.
    Clamp { min: f64, max: f64 },
}

/// Best observation a particle has made so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalBest {
    fitness: f64,
    position: Vec<f64>,
}

impl PersonalBest {
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn position(&self) -> &[f64] {
        &self.position
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    id: usize,
    position: Vec<f64>,
    velocity: Vec<f64>,
    best: Option<PersonalBest>,
    rng: Pcg64Mcg,
}

impl Particle {
    /// Creates a particle at `position` with zero velocity and no observation yet.
    #[must_use]
    pub fn new(id: usize, position: Vec<f64>, seed: u64) -> Self {
        let velocity = vec![0.0; position.len()];
        Self {
            id,
            position,
            velocity,
            best: None,
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Creates a particle with every component drawn uniformly from `[-1, 1]`.
    ///
    /// The particle's own generator is seeded from `rng` afterwards.
    pub fn random<R>(id: usize, dimensions: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let position = (0..dimensions)
            .map(|_| rng.random_range(-1.0..=1.0))
            .collect();
        Self::new(id, position, rng.random())
    }

    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    #[must_use]
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Personal best, or `None` before the first successful evaluation.
    #[must_use]
    pub fn best(&self) -> Option<&PersonalBest> {
        self.best.as_ref()
    }

    #[must_use]
    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.fitness)
    }

    /// Scores the current position. The particle itself is not modified.
    pub fn evaluate<E>(&self, evaluator: &E) -> Result<Evaluation, EvaluationError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        evaluator::evaluate_guarded(evaluator, &self.position)
    }

    /// Records a fitness observed at the current position.
    ///
    /// The personal best moves to the current position only on strict
    /// improvement. NaN is never recorded. Returns the personal-best fitness
    /// after the update, or `fitness` itself while nothing is recorded.
    pub fn update_fitness(&mut self, fitness: f64) -> f64 {
        match &mut self.best {
            Some(best) if fitness > best.fitness => {
                best.fitness = fitness;
                best.position.clone_from(&self.position);
            }
            Some(_) => {}
            None if fitness.is_nan() => {}
            None => {
                self.best = Some(PersonalBest {
                    fitness,
                    position: self.position.clone(),
                });
            }
        }
        self.best.as_ref().map_or(fitness, |b| b.fitness)
    }

    /// Recomputes the velocity toward the personal best and `attractor`.
    ///
    /// Without a personal best the cognitive term is zero. When
    /// `velocity_limit` is set every component is clamped to `[-limit, limit]`.
    ///
    /// # Panics
    ///
    /// Panics if `attractor` does not have the particle's dimensionality.
    pub fn update_velocity(
        &mut self,
        attractor: &[f64],
        coefficients: &PsoCoefficients,
        velocity_limit: Option<f64>,
    ) {
        assert_eq!(
            attractor.len(),
            self.position.len(),
            "attractor dimensionality must match the particle"
        );
        let PsoCoefficients {
            inertia,
            cognitive,
            social,
        } = *coefficients;
        let personal = self
            .best
            .as_ref()
            .map_or(self.position.as_slice(), |b| b.position.as_slice());

        for ((v, x), (p, n)) in iter::zip(
            iter::zip(&mut self.velocity, &self.position),
            iter::zip(personal, attractor),
        ) {
            let r1: f64 = self.rng.random();
            let r2: f64 = self.rng.random();
            let mut next = inertia * *v + cognitive * r1 * (p - x) + social * r2 * (n - x);
            if let Some(limit) = velocity_limit {
                next = next.clamp(-limit, limit);
            }
            *v = next;
        }
    }

    /// Moves the particle by its velocity, then applies `bounds`.
    pub fn update_position(&mut self, bounds: PositionBounds) {
        for (x, v) in iter::zip(&mut self.position, &self.velocity) {
            *x += v;
            if let PositionBounds::Clamp { min, max } = bounds {
                *x = x.clamp(min, max);
            }
        }
    }
}
