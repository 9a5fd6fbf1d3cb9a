//! Swarm state and the two-phase iteration protocol.
//!
//! One iteration is:
//!
//! 1. **Evaluate** - every particle's current position is scored, in
//!    parallel. Results land in per-particle slots and are applied only once
//!    all evaluations have finished. The outcome is a [`FitnessSnapshot`]: the
//!    personal-best fitness of every particle after this iteration.
//! 2. **Update** - for every particle the best neighbor is chosen from the
//!    snapshot, the neighbor's attractor position is captured, and only then
//!    do particles move. Nothing in this phase reads state written by it.
//!
//! The snapshot is the barrier between the two phases: [`Swarm::update_all`]
//! cannot run without one, and a snapshot only exists once every particle of
//! the iteration has been evaluated.

use std::{iter, num::NonZeroUsize, thread};

use rand::Rng;

use crate::{
    config::{NeighborAttractor, SwarmConfig},
    evaluator::{Evaluation, EvaluationError, EvaluationFailurePolicy, FitnessEvaluator},
    particle::Particle,
    topology::Topology,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SwarmError {
    #[display("evaluation of particle {particle} failed: {source}")]
    Evaluation {
        particle: usize,
        source: EvaluationError,
    },
}

/// Personal-best fitness of every particle at the end of an evaluate phase.
///
/// `None` marks a particle that has not been evaluated successfully yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessSnapshot {
    fitness: Vec<Option<f64>>,
}

impl FitnessSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.fitness.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fitness.is_empty()
    }

    #[must_use]
    pub fn get(&self, particle: usize) -> Option<f64> {
        self.fitness[particle]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.fitness
    }
}

/// Whether fitness `a` beats `b`. Unobserved fitness loses to any observation.
fn is_better(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[derive(Debug, Clone)]
pub struct Swarm {
    config: SwarmConfig,
    topology: Topology,
    particles: Vec<Particle>,
    lines_cleared: Vec<f64>,
}

impl Swarm {
    /// Creates `topology.len()` particles with positions drawn from `[-1, 1]`.
    pub fn new<R>(config: SwarmConfig, topology: Topology, dimensions: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let particles = (0..topology.len())
            .map(|id| Particle::random(id, dimensions, rng))
            .collect();
        Self::from_particles(config, topology, particles)
    }

    /// Creates a swarm from explicit starting positions.
    ///
    /// # Panics
    ///
    /// Panics if the number of positions differs from the topology size or
    /// the positions do not share one dimensionality.
    pub fn from_positions<R>(
        config: SwarmConfig,
        topology: Topology,
        positions: Vec<Vec<f64>>,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let particles = positions
            .into_iter()
            .enumerate()
            .map(|(id, position)| Particle::new(id, position, rng.random()))
            .collect();
        Self::from_particles(config, topology, particles)
    }

    fn from_particles(config: SwarmConfig, topology: Topology, particles: Vec<Particle>) -> Self {
        assert_eq!(
            particles.len(),
            topology.len(),
            "one particle per topology entry"
        );
        assert!(
            particles
                .windows(2)
                .all(|w| w[0].position().len() == w[1].position().len()),
            "particles must share one dimensionality"
        );
        let lines_cleared = vec![0.0; particles.len()];
        Self {
            config,
            topology,
            particles,
            lines_cleared,
        }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.particles.first().map_or(0, |p| p.position().len())
    }

    /// Highest lines-cleared metric each particle has reported so far.
    #[must_use]
    pub fn lines_cleared(&self) -> &[f64] {
        &self.lines_cleared
    }

    /// Current personal-best fitness of every particle.
    #[must_use]
    pub fn snapshot(&self) -> FitnessSnapshot {
        FitnessSnapshot {
            fitness: self.particles.iter().map(Particle::best_fitness).collect(),
        }
    }

    /// Index of the particle with the highest personal best, lowest index on ties.
    #[must_use]
    pub fn best_particle(&self) -> Option<usize> {
        let snapshot = self.snapshot();
        (0..self.particles.len())
            .filter(|&i| snapshot.get(i).is_some())
            .fold(None, |best, i| match best {
                Some(b) if !is_better(snapshot.get(i), snapshot.get(b)) => Some(b),
                _ => Some(i),
            })
    }

    /// Evaluate phase: scores every particle and folds the results in.
    ///
    /// With [`EvaluationFailurePolicy::Abort`] the first failure (in particle
    /// order) is returned and no particle is modified.
    pub fn evaluate_all<E>(
        &mut self,
        evaluator: &E,
        policy: EvaluationFailurePolicy,
        workers: NonZeroUsize,
    ) -> Result<FitnessSnapshot, SwarmError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        let results = evaluate_particles(&self.particles, evaluator, workers);

        let mut evaluations: Vec<Option<Evaluation>> = Vec::with_capacity(results.len());
        for (particle, result) in results.into_iter().enumerate() {
            match result {
                Ok(evaluation) => evaluations.push(Some(evaluation)),
                Err(source) => match policy {
                    EvaluationFailurePolicy::Abort => {
                        return Err(SwarmError::Evaluation { particle, source });
                    }
                    EvaluationFailurePolicy::Skip => {
                        tracing::warn!(
                            particle,
                            error = %source,
                            "evaluation failed, keeping previous personal best"
                        );
                        evaluations.push(None);
                    }
                },
            }
        }

        for ((particle, lines_cleared), evaluation) in
            iter::zip(&mut self.particles, &mut self.lines_cleared).zip(evaluations)
        {
            let Some(evaluation) = evaluation else {
                continue;
            };
            let best = particle.update_fitness(evaluation.fitness);
            *lines_cleared = lines_cleared.max(evaluation.lines_cleared);
            tracing::debug!(
                particle = particle.id(),
                fitness = evaluation.fitness,
                best,
                lines_cleared = evaluation.lines_cleared,
                "evaluated"
            );
        }

        Ok(self.snapshot())
    }

    /// Neighbor of `particle` with the highest snapshot fitness.
    ///
    /// Ties go to the first neighbor in ascending index order. Falls back to
    /// the particle itself only if the topology lists no neighbors, which a
    /// validated [`Topology`] never does.
    #[must_use]
    pub fn neighborhood_best(&self, particle: usize, snapshot: &FitnessSnapshot) -> usize {
        let mut best: Option<usize> = None;
        for &n in self.topology.neighbors(particle) {
            if best.is_none_or(|b| is_better(snapshot.get(n), snapshot.get(b))) {
                best = Some(n);
            }
        }
        best.unwrap_or(particle)
    }

    /// Update phase: moves every particle toward its neighborhood best.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot was taken from a swarm of a different size.
    pub fn update_all(&mut self, snapshot: &FitnessSnapshot) {
        assert_eq!(
            snapshot.len(),
            self.particles.len(),
            "snapshot must cover every particle"
        );
        let attractors: Vec<Vec<f64>> = (0..self.particles.len())
            .map(|i| {
                let neighbor = &self.particles[self.neighborhood_best(i, snapshot)];
                let position = match self.config.attractor {
                    NeighborAttractor::Current => neighbor.position(),
                    NeighborAttractor::Best => neighbor
                        .best()
                        .map_or(neighbor.position(), |b| b.position()),
                };
                position.to_vec()
            })
            .collect();

        let SwarmConfig {
            coefficients,
            velocity_limit,
            position_bounds,
            ..
        } = &self.config;
        for (particle, attractor) in iter::zip(&mut self.particles, &attractors) {
            particle.update_velocity(attractor, coefficients, *velocity_limit);
            particle.update_position(*position_bounds);
        }
    }

    /// Runs one full iteration: evaluate all, then update all.
    pub fn step<E>(
        &mut self,
        evaluator: &E,
        policy: EvaluationFailurePolicy,
        workers: NonZeroUsize,
    ) -> Result<FitnessSnapshot, SwarmError>
    where
        E: FitnessEvaluator + ?Sized,
    {
        let snapshot = self.evaluate_all(evaluator, policy, workers)?;
        self.update_all(&snapshot);
        Ok(snapshot)
    }
}

/// Evaluates particles on up to `workers` scoped threads, one contiguous chunk each.
///
/// Results are returned in particle order.
fn evaluate_particles<E>(
    particles: &[Particle],
    evaluator: &E,
    workers: NonZeroUsize,
) -> Vec<Result<Evaluation, EvaluationError>>
where
    E: FitnessEvaluator + ?Sized,
{
    if particles.is_empty() {
        return vec![];
    }
    let chunk_size = particles.len().div_ceil(workers.get());
    thread::scope(|s| {
        let handles: Vec<_> = particles
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|particle| particle.evaluate(evaluator))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::SeedableRng as _;
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::{
        particle::{PositionBounds, PsoCoefficients},
        topology::TopologyShape,
    };

    const ONE: NonZeroUsize = NonZeroUsize::MIN;

    /// Fitness is the negated Euclidean norm; lines cleared mirrors `-fitness`.
    #[derive(Debug)]
    struct NegNorm;

    impl FitnessEvaluator for NegNorm {
        fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
            let norm = position.iter().map(|x| x * x).sum::<f64>().sqrt();
            Ok(Evaluation {
                fitness: -norm,
                lines_cleared: 10.0 - norm,
            })
        }
    }

    /// Fails for one particle position, identified by its first component.
    #[derive(Debug)]
    struct FailsAt(f64);

    impl FitnessEvaluator for FailsAt {
        fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
            if position[0] == self.0 {
                return Err(EvaluationError::Simulation {
                    message: "crashed".to_owned(),
                });
            }
            NegNorm.evaluate(position)
        }
    }

    /// Same fitness for every position.
    #[derive(Debug)]
    struct Flat;

    impl FitnessEvaluator for Flat {
        fn evaluate(&self, _position: &[f64]) -> Result<Evaluation, EvaluationError> {
            Ok(Evaluation {
                fitness: 1.0,
                lines_cleared: 0.0,
            })
        }
    }

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl FitnessEvaluator for Counting {
        #[expect(clippy::cast_precision_loss)]
        fn evaluate(&self, _position: &[f64]) -> Result<Evaluation, EvaluationError> {
            let n = self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Evaluation {
                fitness: n as f64,
                lines_cleared: n as f64,
            })
        }
    }

    fn ring_config(population: usize) -> SwarmConfig {
        SwarmConfig {
            population,
            topology: TopologyShape::Ring { radius: 1 },
            ..SwarmConfig::default()
        }
    }

    fn swarm_at(config: SwarmConfig, positions: Vec<Vec<f64>>) -> Swarm {
        let topology = config.validate().unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        Swarm::from_positions(config, topology, positions, &mut rng)
    }

    fn random_swarm(config: SwarmConfig, dimensions: usize, seed: u64) -> Swarm {
        let topology = config.validate().unwrap();
        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        Swarm::new(config, topology, dimensions, &mut rng)
    }

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn test_first_snapshot_equals_evaluator_output() {
        let positions = vec![
            vec![0.5, 0.5],
            vec![-0.1, 0.2],
            vec![0.9, -0.9],
            vec![0.0, 0.3],
        ];
        let mut swarm = swarm_at(ring_config(4), positions.clone());
        let snapshot = swarm.evaluate_all(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();
        for (i, position) in positions.iter().enumerate() {
            assert_eq!(snapshot.get(i), Some(-norm(position)));
        }
    }

    #[test]
    fn test_ring_iteration_moves_toward_best_neighbor() {
        let positions = vec![
            vec![0.8, 0.8],
            vec![0.05, -0.05],
            vec![-0.7, 0.6],
            vec![0.4, -0.9],
        ];
        let config = SwarmConfig {
            coefficients: PsoCoefficients {
                inertia: 0.0,
                cognitive: 0.0,
                social: 1.0,
            },
            ..ring_config(4)
        };
        let mut swarm = swarm_at(config, positions.clone());
        let snapshot = swarm.evaluate_all(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();

        // particle 1 is closest to the origin and neighbors both 0 and 2
        assert_eq!(swarm.neighborhood_best(0, &snapshot), 1);
        assert_eq!(swarm.neighborhood_best(2, &snapshot), 1);

        swarm.update_all(&snapshot);
        for i in [0, 2] {
            let before = &positions[i];
            let target = &positions[1];
            let after = swarm.particles()[i].position();
            let dist = |a: &[f64]| norm(&iter::zip(a, target).map(|(x, y)| x - y).collect::<Vec<_>>());
            assert!(dist(after) <= dist(before), "particle {i} moved away");
            // never overshoots: social pull is at most one full step
            for ((b, a), t) in before.iter().zip(after).zip(target) {
                assert!((a - b).abs() <= (t - b).abs() + 1e-12);
            }
        }
    }

    #[test]
    fn test_tie_break_prefers_lowest_index() {
        let config = SwarmConfig {
            topology: TopologyShape::Global,
            ..ring_config(5)
        };
        let mut swarm = random_swarm(config, 3, 4);
        let snapshot = swarm.evaluate_all(&Flat, EvaluationFailurePolicy::Abort, ONE).unwrap();
        for i in 0..5 {
            assert_eq!(swarm.neighborhood_best(i, &snapshot), 0);
        }
    }

    #[test]
    fn test_unobserved_neighbor_loses() {
        let swarm = swarm_at(ring_config(3), vec![vec![0.0]; 3]);
        let snapshot = FitnessSnapshot {
            fitness: vec![None, Some(f64::NEG_INFINITY), None],
        };
        assert_eq!(swarm.neighborhood_best(0, &snapshot), 1);
        assert_eq!(swarm.neighborhood_best(2, &snapshot), 1);
        assert_eq!(swarm.neighborhood_best(1, &snapshot), 0);
    }

    #[test]
    fn test_personal_best_and_lines_are_monotonic() {
        let mut swarm = random_swarm(ring_config(6), 4, 21);
        let mut previous_best = vec![f64::NEG_INFINITY; 6];
        let mut previous_lines = vec![0.0; 6];
        for _ in 0..30 {
            let snapshot = swarm.step(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();
            for i in 0..6 {
                let best = snapshot.get(i).unwrap();
                assert!(best >= previous_best[i]);
                assert!(swarm.lines_cleared()[i] >= previous_lines[i]);
                previous_best[i] = best;
                previous_lines[i] = swarm.lines_cleared()[i];
            }
        }
    }

    #[test]
    fn test_same_seed_same_trajectory_regardless_of_workers() {
        let run = |workers: usize| {
            let mut swarm = random_swarm(ring_config(7), 3, 99);
            let workers = NonZeroUsize::new(workers).unwrap();
            for _ in 0..10 {
                swarm.step(&NegNorm, EvaluationFailurePolicy::Abort, workers).unwrap();
            }
            swarm
                .particles()
                .iter()
                .map(|p| p.position().to_vec())
                .collect::<Vec<_>>()
        };
        let single = run(1);
        assert_eq!(single, run(1));
        assert_eq!(single, run(3));
        assert_eq!(single, run(16));
    }

    #[test]
    fn test_single_particle_is_its_own_neighbor() {
        let mut swarm = swarm_at(ring_config(1), vec![vec![0.6, -0.4]]);
        for _ in 0..50 {
            let snapshot = swarm.step(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();
            assert_eq!(swarm.neighborhood_best(0, &snapshot), 0);
            assert!(swarm.particles()[0].position().iter().all(|x| x.is_finite()));
        }
        let particle = &swarm.particles()[0];
        let best = particle.best().unwrap();
        assert!(best.fitness() >= -norm(&[0.6, -0.4]));
        assert!(norm(particle.position()) < 10.0, "single particle diverged");
    }

    #[test]
    fn test_abort_leaves_swarm_untouched() {
        let mut swarm = swarm_at(ring_config(3), vec![vec![0.1], vec![0.2], vec![0.3]]);
        swarm.step(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();
        let before = swarm.snapshot();
        let lines_before = swarm.lines_cleared().to_vec();

        let failing = FailsAt(swarm.particles()[1].position()[0]);
        let err = swarm
            .evaluate_all(&failing, EvaluationFailurePolicy::Abort, ONE)
            .unwrap_err();
        assert!(matches!(err, SwarmError::Evaluation { particle: 1, .. }));
        assert_eq!(swarm.snapshot(), before);
        assert_eq!(swarm.lines_cleared(), lines_before.as_slice());
    }

    #[test]
    fn test_skip_keeps_failed_particle_unobserved() {
        let mut swarm = swarm_at(ring_config(3), vec![vec![0.5], vec![0.25], vec![0.125]]);
        let snapshot = swarm
            .evaluate_all(&FailsAt(0.25), EvaluationFailurePolicy::Skip, ONE)
            .unwrap();
        assert_eq!(snapshot.get(0), Some(-0.5));
        assert_eq!(snapshot.get(1), None);
        assert_eq!(snapshot.get(2), Some(-0.125));
        swarm.update_all(&snapshot);
    }

    #[test]
    fn test_results_are_applied_in_particle_order() {
        let mut swarm = random_swarm(ring_config(4), 2, 0);
        let snapshot = swarm
            .evaluate_all(&Counting::default(), EvaluationFailurePolicy::Abort, ONE)
            .unwrap();
        assert_eq!(
            snapshot.as_slice(),
            &[Some(0.0), Some(1.0), Some(2.0), Some(3.0)]
        );
        assert_eq!(swarm.best_particle(), Some(3));
    }

    #[test]
    fn test_best_attractor_uses_personal_best() {
        let config = SwarmConfig {
            attractor: NeighborAttractor::Best,
            coefficients: PsoCoefficients {
                inertia: 0.0,
                cognitive: 0.0,
                social: 1.0,
            },
            position_bounds: PositionBounds::Clamp {
                min: -1.0,
                max: 1.0,
            },
            ..ring_config(2)
        };
        let mut swarm = swarm_at(config, vec![vec![0.0], vec![0.5]]);
        let snapshot = swarm.evaluate_all(&NegNorm, EvaluationFailurePolicy::Abort, ONE).unwrap();
        swarm.update_all(&snapshot);
        // particle 1 is pulled toward particle 0's best, which is the origin
        let x = swarm.particles()[1].position()[0];
        assert!((0.0..=0.5).contains(&x));
    }

    #[test]
    fn test_best_particle_none_before_evaluation() {
        let swarm = random_swarm(ring_config(3), 2, 0);
        assert_eq!(swarm.best_particle(), None);

        let snapshot = swarm.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.as_slice(), &[None, None, None]);
    }
}
