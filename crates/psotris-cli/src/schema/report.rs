use std::iter;

use chrono::{DateTime, Utc};
use psotris_evaluator::{board_feature::BoardFeature, tetris_evaluator::EvaluatorConfig};
use psotris_training::trainer::TrainingReport;
use serde::Serialize;

/// JSON written by `psotris train --report`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReportFile {
    pub trained_at: DateTime<Utc>,
    pub evaluator: EvaluatorConfig,
    #[serde(flatten)]
    pub report: TrainingReport,
    /// Best personal-best position, keyed by feature name.
    pub best_weights: Vec<NamedWeight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedWeight {
    pub feature: String,
    pub weight: f64,
}

impl TrainingReportFile {
    pub fn new(report: TrainingReport, evaluator: EvaluatorConfig) -> Self {
        let best_weights = report
            .best
            .as_ref()
            .map(|best| {
                iter::zip(BoardFeature::ALL, &best.position)
                    .map(|(feature, weight)| NamedWeight {
                        feature: feature.to_string(),
                        weight: *weight,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            trained_at: Utc::now(),
            evaluator,
            report,
            best_weights,
        }
    }
}
