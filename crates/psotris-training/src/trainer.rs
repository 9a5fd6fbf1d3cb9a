//! Drives a training run from configuration to result file.
//!
//! ```no_run
//! use psotris_training::{
//!     config::TrainingConfig,
//!     evaluator::{Evaluation, EvaluationError, FitnessEvaluator},
//!     trainer::Trainer,
//! };
//!
//! #[derive(Debug)]
//! struct Sphere;
//!
//! impl FitnessEvaluator for Sphere {
//!     fn dimensions(&self) -> Option<usize> {
//!         Some(2)
//!     }
//!
//!     fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
//!         let fitness = -position.iter().map(|x| x * x).sum::<f64>();
//!         Ok(Evaluation { fitness, lines_cleared: 0.0 })
//!     }
//! }
//!
//! let config = TrainingConfig::default();
//! let iterations = config.iterations;
//! let mut trainer = Trainer::initialize(config, Sphere)?;
//! trainer.run(iterations)?;
//! trainer.persist_results()?;
//! # Ok::<(), psotris_training::trainer::TrainerError>(())
//! ```

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    thread,
};

use rand::SeedableRng as _;
use rand_pcg::Pcg64Mcg;
use serde::Serialize;

use crate::{
    config::{ConfigError, PersistencePolicy, TrainingConfig},
    evaluator::FitnessEvaluator,
    positions,
    stats::DescriptiveStats,
    swarm::{FitnessSnapshot, Swarm, SwarmError},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TrainerError {
    #[display("invalid configuration")]
    Config(ConfigError),
    #[display("training aborted")]
    Swarm(SwarmError),
    #[display("failed to write {}", path.display())]
    Persist { path: PathBuf, source: io::Error },
}

/// Best particle at the time a report was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestParticle {
    pub index: usize,
    pub fitness: f64,
    pub position: Vec<f64>,
}

/// Summary of a run, suitable for serializing next to the result file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub seed: u64,
    pub population: usize,
    pub dimensions: usize,
    pub iterations: usize,
    pub best: Option<BestParticle>,
    pub lines_cleared: Vec<f64>,
}

#[derive(Debug)]
pub struct Trainer<E> {
    config: TrainingConfig,
    evaluator: E,
    swarm: Swarm,
    seed: u64,
    workers: NonZeroUsize,
    completed_iterations: usize,
}

impl<E> Trainer<E>
where
    E: FitnessEvaluator,
{
    /// Validates `config`, creates the swarm and writes the initial-state file.
    ///
    /// Nothing is written when validation fails.
    pub fn initialize(config: TrainingConfig, evaluator: E) -> Result<Self, TrainerError> {
        let (dimensions, topology) = config
            .validate(evaluator.dimensions())
            .map_err(TrainerError::Config)?;

        let seed = config.seed.unwrap_or_else(|| {
            let seed = rand::random();
            tracing::info!(seed, "no seed configured, picked one");
            seed
        });
        let workers = config.workers.unwrap_or_else(|| {
            thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
        });

        let mut rng = Pcg64Mcg::seed_from_u64(seed);
        let swarm = Swarm::new(config.swarm.clone(), topology, dimensions, &mut rng);
        tracing::info!(
            population = swarm.particles().len(),
            dimensions,
            seed,
            workers = workers.get(),
            "swarm initialized"
        );

        persist(config.persistence, &config.initial_output, |writer| {
            positions::write_positions(writer, swarm.particles().iter().map(|p| p.position()))
        })?;

        Ok(Self {
            config,
            evaluator,
            swarm,
            seed,
            workers,
            completed_iterations: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    #[must_use]
    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn completed_iterations(&self) -> usize {
        self.completed_iterations
    }

    /// Runs `iterations` iterations one after another.
    ///
    /// On an aborting evaluation failure the swarm keeps the state of the
    /// last completed iteration, so the caller may still persist it.
    pub fn run(&mut self, iterations: usize) -> Result<(), TrainerError> {
        for _ in 0..iterations {
            let snapshot = self
                .swarm
                .step(
                    &self.evaluator,
                    self.config.on_evaluation_failure,
                    self.workers,
                )
                .map_err(TrainerError::Swarm)?;
            self.completed_iterations += 1;
            self.log_iteration(&snapshot);

            if let Some(interval) = self.config.checkpoint_interval
                && self.completed_iterations % interval.get() == 0
            {
                tracing::debug!(iteration = self.completed_iterations, "checkpoint");
                self.persist_results()?;
            }
        }
        Ok(())
    }

    fn log_iteration(&self, snapshot: &FitnessSnapshot) {
        let iteration = self.completed_iterations;
        let best_lines = self
            .swarm
            .lines_cleared()
            .iter()
            .copied()
            .fold(0.0, f64::max);
        match DescriptiveStats::new(snapshot.as_slice().iter().flatten().copied()) {
            Some(stats) => tracing::info!(
                iteration,
                best = stats.max,
                mean = stats.mean,
                worst = stats.min,
                best_lines,
                "iteration finished"
            ),
            None => tracing::warn!(iteration, "no particle has been evaluated successfully"),
        }
    }

    /// Writes final positions and lines-cleared maxima in particle order.
    pub fn persist_results(&self) -> Result<(), TrainerError> {
        let particles = self.swarm.particles();
        let lines_cleared = self.swarm.lines_cleared();
        persist(self.config.persistence, &self.config.result_output, |writer| {
            positions::write_results(
                writer,
                particles
                    .iter()
                    .zip(lines_cleared)
                    .map(|(p, lines)| (p.position(), *lines)),
            )
        })
    }

    #[must_use]
    pub fn report(&self) -> TrainingReport {
        let best = self.swarm.best_particle().and_then(|index| {
            let best = self.swarm.particles()[index].best()?;
            Some(BestParticle {
                index,
                fitness: best.fitness(),
                position: best.position().to_vec(),
            })
        });
        TrainingReport {
            seed: self.seed,
            population: self.swarm.particles().len(),
            dimensions: self.swarm.dimensions(),
            iterations: self.completed_iterations,
            best,
            lines_cleared: self.swarm.lines_cleared().to_vec(),
        }
    }
}

fn persist<F>(policy: PersistencePolicy, path: &Path, write: F) -> Result<(), TrainerError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let result = File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()
    });
    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "written");
            Ok(())
        }
        Err(source) => match policy {
            PersistencePolicy::Fail => Err(TrainerError::Persist {
                path: path.to_owned(),
                source,
            }),
            PersistencePolicy::Warn => {
                tracing::warn!(path = %path.display(), error = %source, "failed to write, continuing");
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io::BufReader};

    use super::*;
    use crate::{
        config::SwarmConfig,
        evaluator::{Evaluation, EvaluationError, EvaluationFailurePolicy},
        topology::TopologyShape,
    };

    #[derive(Debug)]
    struct NegNorm;

    impl FitnessEvaluator for NegNorm {
        fn dimensions(&self) -> Option<usize> {
            Some(3)
        }

        fn evaluate(&self, position: &[f64]) -> Result<Evaluation, EvaluationError> {
            let norm = position.iter().map(|x| x * x).sum::<f64>().sqrt();
            Ok(Evaluation {
                fitness: -norm,
                lines_cleared: (10.0 - norm).floor(),
            })
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl FitnessEvaluator for Broken {
        fn evaluate(&self, _position: &[f64]) -> Result<Evaluation, EvaluationError> {
            Err(EvaluationError::Simulation {
                message: "no game".to_owned(),
            })
        }
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "psotris-trainer-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_in(dir: &Path) -> TrainingConfig {
        TrainingConfig {
            swarm: SwarmConfig {
                population: 5,
                ..SwarmConfig::default()
            },
            seed: Some(2024),
            workers: NonZeroUsize::new(2),
            initial_output: dir.join("initial.txt"),
            result_output: dir.join("result.txt"),
            ..TrainingConfig::default()
        }
    }

    fn read_file(path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_initial_file_written_before_training() {
        let dir = test_dir("initial");
        let trainer = Trainer::initialize(config_in(&dir), NegNorm).unwrap();
        assert_eq!(trainer.completed_iterations(), 0);

        let file = File::open(dir.join("initial.txt")).unwrap();
        let parsed = positions::read_positions(BufReader::new(file)).unwrap();
        assert_eq!(parsed.len(), 5);
        for (row, particle) in parsed.iter().zip(trainer.swarm().particles()) {
            assert_eq!(row.as_slice(), particle.position());
            assert!(row.iter().all(|x| (-1.0..=1.0).contains(x)));
        }
    }

    #[test]
    fn test_result_file_holds_positions_and_metric() {
        let dir = test_dir("result");
        let mut trainer = Trainer::initialize(config_in(&dir), NegNorm).unwrap();
        trainer.run(4).unwrap();
        trainer.persist_results().unwrap();

        let file = File::open(dir.join("result.txt")).unwrap();
        let rows = positions::read_results(BufReader::new(file)).unwrap();
        assert_eq!(rows.len(), 5);
        for ((row, particle), lines) in rows
            .iter()
            .zip(trainer.swarm().particles())
            .zip(trainer.swarm().lines_cleared())
        {
            assert_eq!(row.position.as_slice(), particle.position());
            assert_eq!(row.lines_cleared, *lines);
        }
    }

    #[test]
    fn test_same_seed_reproduces_files() {
        let run = |name: &str| {
            let dir = test_dir(name);
            let mut trainer = Trainer::initialize(config_in(&dir), NegNorm).unwrap();
            trainer.run(6).unwrap();
            trainer.persist_results().unwrap();
            (
                read_file(&dir.join("initial.txt")),
                read_file(&dir.join("result.txt")),
            )
        };
        assert_eq!(run("repro-a"), run("repro-b"));
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let dir = test_dir("invalid");
        let mut config = config_in(&dir);
        config.swarm.topology = TopologyShape::Ring { radius: 0 };
        let err = Trainer::initialize(config, NegNorm).unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)), "{err}");
        assert!(!dir.join("initial.txt").exists());
    }

    #[test]
    fn test_persistence_policy() {
        let dir = test_dir("persist");
        let mut config = config_in(&dir);
        config.initial_output = dir.join("missing-dir").join("initial.txt");

        let err = Trainer::initialize(config.clone(), NegNorm).unwrap_err();
        assert!(matches!(err, TrainerError::Persist { .. }), "{err}");

        config.persistence = PersistencePolicy::Warn;
        let mut trainer = Trainer::initialize(config, NegNorm).unwrap();
        trainer.run(1).unwrap();
        assert_eq!(trainer.completed_iterations(), 1);
    }

    #[test]
    fn test_abort_stops_run_without_progress() {
        let dir = test_dir("abort");
        let config = TrainingConfig {
            dimensions: Some(2),
            ..config_in(&dir)
        };
        let mut trainer = Trainer::initialize(config, Broken).unwrap();
        let err = trainer.run(3).unwrap_err();
        assert!(matches!(err, TrainerError::Swarm(_)), "{err}");
        assert_eq!(trainer.completed_iterations(), 0);
        assert!(trainer.report().best.is_none());
    }

    #[test]
    fn test_skip_keeps_running() {
        let dir = test_dir("skip");
        let config = TrainingConfig {
            dimensions: Some(2),
            on_evaluation_failure: EvaluationFailurePolicy::Skip,
            ..config_in(&dir)
        };
        let mut trainer = Trainer::initialize(config, Broken).unwrap();
        trainer.run(3).unwrap();
        assert_eq!(trainer.completed_iterations(), 3);
    }

    #[test]
    fn test_checkpoint_writes_result_during_run() {
        let dir = test_dir("checkpoint");
        let config = TrainingConfig {
            checkpoint_interval: NonZeroUsize::new(2),
            ..config_in(&dir)
        };
        let mut trainer = Trainer::initialize(config, NegNorm).unwrap();
        trainer.run(1).unwrap();
        assert!(!dir.join("result.txt").exists());
        trainer.run(1).unwrap();
        assert!(dir.join("result.txt").exists());
    }

    #[test]
    fn test_report_names_best_particle() {
        let dir = test_dir("report");
        let mut trainer = Trainer::initialize(config_in(&dir), NegNorm).unwrap();
        trainer.run(5).unwrap();
        let report = trainer.report();
        assert_eq!(report.seed, 2024);
        assert_eq!(report.iterations, 5);
        assert_eq!(report.dimensions, 3);

        let best = report.best.unwrap();
        let fitnesses = trainer.swarm().snapshot();
        for fitness in fitnesses.as_slice() {
            assert!(fitness.unwrap() <= best.fitness);
        }
        let json = serde_json::to_value(trainer.report()).unwrap();
        assert_eq!(json["best"]["index"], best.index);
    }
}
