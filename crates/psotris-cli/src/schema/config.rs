use psotris_evaluator::tetris_evaluator::EvaluatorConfig;
use psotris_training::config::TrainingConfig;
use serde::{Deserialize, Serialize};

/// Contents of the `--config` file of `psotris train`.
///
/// ```json
/// {
///   "training": { "iterations": 200, "swarm": { "population": 30 } },
///   "evaluator": { "games": 5, "piece_limit": 1000 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfigFile {
    pub training: TrainingConfig,
    pub evaluator: EvaluatorConfig,
}
