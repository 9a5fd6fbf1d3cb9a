use std::{num::NonZeroUsize, path::PathBuf};

use anyhow::Context;
use psotris_evaluator::tetris_evaluator::TetrisEvaluator;
use psotris_training::{
    config::PersistencePolicy,
    evaluator::{EvaluationFailurePolicy, FitnessEvaluator},
    topology::TopologyShape,
    trainer::{Trainer, TrainerError},
};

use crate::{
    schema::{config::TrainConfigFile, report::TrainingReportFile},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of particles
    #[arg(long)]
    population: Option<usize>,
    /// Number of iterations
    #[arg(long)]
    iterations: Option<usize>,
    /// Inertia weight `w`
    #[arg(long)]
    inertia: Option<f64>,
    /// Cognitive coefficient `c1`
    #[arg(long)]
    cognitive: Option<f64>,
    /// Social coefficient `c2`
    #[arg(long)]
    social: Option<f64>,
    /// Use a ring topology with this radius
    #[arg(long, conflicts_with = "global")]
    ring_radius: Option<usize>,
    /// Use a global topology (every particle sees every other)
    #[arg(long)]
    global: bool,
    /// Seed of the swarm
    #[arg(long)]
    seed: Option<u64>,
    /// Games played per evaluation
    #[arg(long)]
    games: Option<NonZeroUsize>,
    /// Pieces after which a game ends
    #[arg(long)]
    piece_limit: Option<NonZeroUsize>,
    /// Seed the game piece sequences are derived from
    #[arg(long)]
    game_seed: Option<u64>,
    /// Evaluation worker threads
    #[arg(long)]
    workers: Option<NonZeroUsize>,
    /// Initial-state file path
    #[arg(long)]
    initial_output: Option<PathBuf>,
    /// Result file path
    #[arg(long)]
    result_output: Option<PathBuf>,
    /// Write a JSON training report to this path
    #[arg(long)]
    report: Option<PathBuf>,
    /// Rewrite the result file every N iterations
    #[arg(long)]
    checkpoint_interval: Option<NonZeroUsize>,
    /// What to do when a game simulation fails (abort, skip)
    #[arg(long)]
    on_evaluation_failure: Option<EvaluationFailurePolicy>,
    /// What to do when a file cannot be written (fail, warn)
    #[arg(long)]
    persistence: Option<PersistencePolicy>,
}

impl TrainArg {
    fn load_config(&self) -> anyhow::Result<TrainConfigFile> {
        let mut file = match &self.config {
            Some(path) => util::read_json_file("configuration", path)?,
            None => TrainConfigFile::default(),
        };
        let TrainConfigFile {
            training,
            evaluator,
        } = &mut file;

        if let Some(population) = self.population {
            training.swarm.population = population;
        }
        if let Some(iterations) = self.iterations {
            training.iterations = iterations;
        }
        if let Some(inertia) = self.inertia {
            training.swarm.coefficients.inertia = inertia;
        }
        if let Some(cognitive) = self.cognitive {
            training.swarm.coefficients.cognitive = cognitive;
        }
        if let Some(social) = self.social {
            training.swarm.coefficients.social = social;
        }
        if let Some(radius) = self.ring_radius {
            training.swarm.topology = TopologyShape::Ring { radius };
        }
        if self.global {
            training.swarm.topology = TopologyShape::Global;
        }
        if self.seed.is_some() {
            training.seed = self.seed;
        }
        if self.workers.is_some() {
            training.workers = self.workers;
        }
        if let Some(path) = &self.initial_output {
            training.initial_output.clone_from(path);
        }
        if let Some(path) = &self.result_output {
            training.result_output.clone_from(path);
        }
        if self.checkpoint_interval.is_some() {
            training.checkpoint_interval = self.checkpoint_interval;
        }
        if let Some(policy) = self.on_evaluation_failure {
            training.on_evaluation_failure = policy;
        }
        if let Some(policy) = self.persistence {
            training.persistence = policy;
        }

        if let Some(games) = self.games {
            evaluator.games = games;
        }
        if let Some(piece_limit) = self.piece_limit {
            evaluator.piece_limit = piece_limit;
        }
        if let Some(seed) = self.game_seed {
            evaluator.seed = seed;
        }
        Ok(file)
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainConfigFile {
        training,
        evaluator: evaluator_config,
    } = arg.load_config()?;

    let iterations = training.iterations;
    let evaluator = TetrisEvaluator::new(&evaluator_config);
    let mut trainer =
        Trainer::initialize(training, evaluator).context("Failed to initialize training")?;

    if let Err(err) = trainer.run(iterations) {
        return Err(save_after_failure(&trainer, err));
    }
    trainer.persist_results()?;

    let report = TrainingReportFile::new(trainer.report(), evaluator_config);
    if let Some(path) = &arg.report {
        util::save_json(&report, Some(path.as_path()))?;
    }

    let config = trainer.config();
    eprintln!();
    eprintln!("Training completed");
    eprintln!("  Seed: {}", report.report.seed);
    eprintln!("  Iterations: {}", report.report.iterations);
    eprintln!("  Initial state: {}", config.initial_output.display());
    eprintln!("  Result: {}", config.result_output.display());
    if let Some(path) = &arg.report {
        eprintln!("  Report: {}", path.display());
    }
    if let Some(best) = &report.report.best {
        eprintln!("  Best particle: #{} => {:.4}", best.index, best.fitness);
        for w in &report.best_weights {
            eprintln!("    {:<20} {:>9.4}", w.feature, w.weight);
        }
    }

    Ok(())
}

/// Writes the result file for the last completed iteration after `run` failed.
///
/// The training error is returned even when that write fails too.
fn save_after_failure<E>(trainer: &Trainer<E>, err: TrainerError) -> anyhow::Error
where
    E: FitnessEvaluator,
{
    tracing::error!(
        iteration = trainer.completed_iterations(),
        error = %err,
        "training stopped, saving the last completed iteration"
    );
    if let Err(persist_err) = trainer.persist_results() {
        tracing::error!(error = %persist_err, "failed to save the last completed iteration");
    }
    anyhow::Error::new(err).context("Training failed")
}
