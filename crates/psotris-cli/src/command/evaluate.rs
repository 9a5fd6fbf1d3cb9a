use std::{
    io::BufRead,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail, ensure};
use psotris_evaluator::{
    board_feature::FEATURE_COUNT,
    tetris_evaluator::{EvaluatorConfig, TetrisEvaluator},
};
use psotris_training::{positions, stats::DescriptiveStats};
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Result or initial-state file to read weights from
    #[arg(long)]
    results: PathBuf,
    /// Evaluate only this particle (row index, 0-based)
    #[arg(long)]
    particle: Option<usize>,
    /// Games played per particle
    #[arg(long, default_value_t = EvaluatorConfig::DEFAULT_GAMES)]
    games: NonZeroUsize,
    /// Pieces after which a game ends
    #[arg(long, default_value_t = EvaluatorConfig::DEFAULT_PIECE_LIMIT)]
    piece_limit: NonZeroUsize,
    /// Seed the game piece sequences are derived from
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Write the JSON summary to this path instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct ParticleEvaluation {
    particle: usize,
    weights: Vec<f64>,
    fitness: SummaryStats,
    cleared_lines: SummaryStats,
    placed_pieces: SummaryStats,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SummaryStats {
    min: f64,
    max: f64,
    mean: f64,
    median: f64,
    std_dev: f64,
}

impl From<DescriptiveStats> for SummaryStats {
    fn from(stats: DescriptiveStats) -> Self {
        let DescriptiveStats {
            min,
            max,
            mean,
            median,
            std_dev,
        } = stats;
        Self {
            min,
            max,
            mean,
            median,
            std_dev,
        }
    }
}

/// Reads weight rows, dropping the metric column of a result file.
fn read_weights<R>(reader: R, path: &Path) -> anyhow::Result<Vec<Vec<f64>>>
where
    R: BufRead,
{
    let mut rows = positions::read_positions(reader)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    let Some(width) = rows.first().map(Vec::len) else {
        bail!("{} contains no particles", path.display());
    };
    match width {
        FEATURE_COUNT => {}
        w if w == FEATURE_COUNT + 1 => {
            for row in &mut rows {
                row.pop();
            }
        }
        w => bail!(
            "{} has {w} columns, expected {FEATURE_COUNT} weights optionally followed by lines cleared",
            path.display()
        ),
    }
    Ok(rows)
}

fn select_particles(rows: usize, particle: Option<usize>) -> anyhow::Result<Vec<usize>> {
    match particle {
        Some(i) => {
            ensure!(
                i < rows,
                "particle {i} out of range, the file has {rows} particles"
            );
            Ok(vec![i])
        }
        None => Ok((0..rows).collect()),
    }
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let reader = util::open_reader("weights", &arg.results)?;
    let rows = read_weights(reader, &arg.results)?;
    let selected = select_particles(rows.len(), arg.particle)?;

    let evaluator = TetrisEvaluator::new(&EvaluatorConfig {
        games: arg.games,
        piece_limit: arg.piece_limit,
        seed: arg.seed,
    });

    let mut evaluations = vec![];
    for particle in selected {
        let weights = &rows[particle];
        let sessions = evaluator.play_sessions(weights)?;
        let stats = |values: Vec<f64>| -> anyhow::Result<SummaryStats> {
            DescriptiveStats::new(values)
                .map(SummaryStats::from)
                .context("no games were played")
        };
        let evaluation = ParticleEvaluation {
            particle,
            weights: weights.clone(),
            fitness: stats(sessions.iter().map(|s| s.fitness).collect())?,
            cleared_lines: stats(sessions.iter().map(|s| s.cleared_lines as f64).collect())?,
            placed_pieces: stats(sessions.iter().map(|s| s.placed_pieces as f64).collect())?,
        };
        eprintln!(
            "particle {particle:3}: fitness {:.4} (min {:.4}, max {:.4}), lines {:.1}, pieces {:.1}",
            evaluation.fitness.mean,
            evaluation.fitness.min,
            evaluation.fitness.max,
            evaluation.cleared_lines.mean,
            evaluation.placed_pieces.mean,
        );
        evaluations.push(evaluation);
    }

    util::save_json(&evaluations, arg.output.as_deref())?;
    Ok(())
}
