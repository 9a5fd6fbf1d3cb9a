//! Training configuration.
//!
//! Every field has a default, so a JSON configuration file only needs the
//! values it changes:
//!
//! ```
//! use psotris_training::config::TrainingConfig;
//!
//! let config: TrainingConfig = serde_json::from_str(
//!     r#"{ "iterations": 50, "seed": 7, "swarm": { "population": 8 } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.swarm.population, 8);
//! assert_eq!(config.iterations, 50);
//! ```
//!
//! Validation happens once, before any particle is created; see
//! [`TrainingConfig::validate`].

use std::{num::NonZeroUsize, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    evaluator::EvaluationFailurePolicy,
    particle::{PositionBounds, PsoCoefficients},
    positions,
    topology::{Topology, TopologyError, TopologyShape},
};

/// Which position of the best neighbor the social term pulls toward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum NeighborAttractor {
    /// The neighbor's current position.
    #[default]
    Current,
    /// The neighbor's personal-best position.
    Best,
}

/// What happens when writing a position or result file fails.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, derive_more::FromStr,
)]
#[serde(rename_all = "snake_case")]
pub enum PersistencePolicy {
    /// Return the I/O error to the caller.
    #[default]
    Fail,
    /// Log a warning and keep training.
    Warn,
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population must be at least 1")]
    EmptyPopulation,
    #[display("dimensionality must be at least 1")]
    ZeroDimensions,
    #[display("dimensionality is not configured and the evaluator does not report one")]
    UnknownDimensions,
    #[display("configured dimensionality {configured} does not match the evaluator's {evaluator}")]
    DimensionMismatch { configured: usize, evaluator: usize },
    #[display("coefficient `{name}` must be finite, got {value}")]
    NonFiniteCoefficient { name: &'static str, value: f64 },
    #[display("velocity limit must be positive and finite, got {limit}")]
    InvalidVelocityLimit { limit: f64 },
    #[display("position bounds must satisfy min < max, got [{min}, {max}]")]
    InvalidPositionBounds { min: f64, max: f64 },
    #[display("invalid topology: {_0}")]
    Topology(TopologyError),
}

/// Parameters of the swarm itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwarmConfig {
    /// Number of particles `P`.
    pub population: usize,
    pub coefficients: PsoCoefficients,
    pub topology: TopologyShape,
    /// Symmetric clamp applied to every velocity component.
    pub velocity_limit: Option<f64>,
    pub position_bounds: PositionBounds,
    pub attractor: NeighborAttractor,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            population: 20,
            coefficients: PsoCoefficients::default(),
            topology: TopologyShape::default(),
            velocity_limit: None,
            position_bounds: PositionBounds::default(),
            attractor: NeighborAttractor::default(),
        }
    }
}

impl SwarmConfig {
    /// Checks the swarm parameters and builds the topology they describe.
    pub fn validate(&self) -> Result<Topology, ConfigError> {
        if self.population == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        let PsoCoefficients {
            inertia,
            cognitive,
            social,
        } = self.coefficients;
        for (name, value) in [
            ("inertia", inertia),
            ("cognitive", cognitive),
            ("social", social),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteCoefficient { name, value });
            }
        }
        if let Some(limit) = self.velocity_limit
            && !(limit.is_finite() && limit > 0.0)
        {
            return Err(ConfigError::InvalidVelocityLimit { limit });
        }
        if let PositionBounds::Clamp { min, max } = self.position_bounds
            && !(min.is_finite() && max.is_finite() && min < max)
        {
            return Err(ConfigError::InvalidPositionBounds { min, max });
        }
        Topology::new(&self.topology, self.population).map_err(ConfigError::Topology)
    }
}

/// Everything a training run needs besides the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub swarm: SwarmConfig,
    /// Attribute count `D`. Taken from the evaluator when unset.
    pub dimensions: Option<usize>,
    pub iterations: usize,
    /// Run seed. A random seed is chosen (and logged) when unset.
    pub seed: Option<u64>,
    /// Evaluation worker threads. Defaults to the available parallelism.
    pub workers: Option<NonZeroUsize>,
    pub on_evaluation_failure: EvaluationFailurePolicy,
    pub persistence: PersistencePolicy,
    pub initial_output: PathBuf,
    pub result_output: PathBuf,
    /// Rewrite the result file every this many iterations.
    pub checkpoint_interval: Option<NonZeroUsize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            swarm: SwarmConfig::default(),
            dimensions: None,
            iterations: 1000,
            seed: None,
            workers: None,
            on_evaluation_failure: EvaluationFailurePolicy::default(),
            persistence: PersistencePolicy::default(),
            initial_output: PathBuf::from(positions::DEFAULT_INITIAL_FILE),
            result_output: PathBuf::from(positions::DEFAULT_RESULT_FILE),
            checkpoint_interval: None,
        }
    }
}

impl TrainingConfig {
    /// Resolves the dimensionality against the evaluator's and validates the swarm.
    ///
    /// Returns the dimensionality to use together with the validated topology.
    pub fn validate(
        &self,
        evaluator_dimensions: Option<usize>,
    ) -> Result<(usize, Topology), ConfigError> {
        let dimensions = match (self.dimensions, evaluator_dimensions) {
            (Some(configured), Some(evaluator)) if configured != evaluator => {
                return Err(ConfigError::DimensionMismatch {
                    configured,
                    evaluator,
                });
            }
            (Some(d), _) | (None, Some(d)) => d,
            (None, None) => return Err(ConfigError::UnknownDimensions),
        };
        if dimensions == 0 {
            return Err(ConfigError::ZeroDimensions);
        }
        let topology = self.swarm.validate()?;
        Ok((dimensions, topology))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let (dimensions, topology) = TrainingConfig::default().validate(Some(8)).unwrap();
        assert_eq!(dimensions, 8);
        assert_eq!(topology.len(), 20);
    }

    #[test]
    fn test_dimensions_must_be_known() {
        assert_eq!(
            TrainingConfig::default().validate(None),
            Err(ConfigError::UnknownDimensions)
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let config = TrainingConfig {
            dimensions: Some(4),
            ..TrainingConfig::default()
        };
        assert_eq!(
            config.validate(Some(8)),
            Err(ConfigError::DimensionMismatch {
                configured: 4,
                evaluator: 8
            })
        );
        assert!(config.validate(None).is_ok());
    }

    #[test]
    fn test_rejects_non_finite_coefficient() {
        let mut config = SwarmConfig::default();
        config.coefficients.social = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteCoefficient { name: "social", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_limits() {
        let config = SwarmConfig {
            velocity_limit: Some(0.0),
            ..SwarmConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVelocityLimit { .. })
        ));

        let config = SwarmConfig {
            position_bounds: PositionBounds::Clamp { min: 1.0, max: 1.0 },
            ..SwarmConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPositionBounds { .. })
        ));
    }

    #[test]
    fn test_topology_errors_surface_before_training() {
        let config = SwarmConfig {
            population: 2,
            topology: TopologyShape::Custom {
                neighbors: vec![vec![1], vec![]],
            },
            ..SwarmConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Topology(TopologyError::NoNeighbors {
                particle: 1
            }))
        );
    }

    #[test]
    fn test_json_round_trip_keeps_every_field() {
        let config = TrainingConfig {
            swarm: SwarmConfig {
                population: 6,
                topology: TopologyShape::Global,
                velocity_limit: Some(0.5),
                position_bounds: PositionBounds::Clamp {
                    min: -2.0,
                    max: 2.0,
                },
                attractor: NeighborAttractor::Best,
                ..SwarmConfig::default()
            },
            dimensions: Some(3),
            seed: Some(99),
            workers: NonZeroUsize::new(2),
            on_evaluation_failure: EvaluationFailurePolicy::Skip,
            persistence: PersistencePolicy::Warn,
            checkpoint_interval: NonZeroUsize::new(10),
            ..TrainingConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = serde_json::from_str::<TrainingConfig>(r#"{ "iteration": 5 }"#);
        assert!(result.is_err());
    }
}
