//! Static neighborhood structure of the swarm.
//!
//! A [`Topology`] is fixed when the swarm is created. Every neighbor list is
//! sorted ascending and free of duplicates, so "first encountered" and "lowest
//! index" coincide when the swarm breaks ties between equally fit neighbors.
//! Construction rejects any particle without neighbors; a validated topology
//! therefore always yields a neighborhood best.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Neighborhood shape as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopologyShape {
    /// Particles `i ± 1 ..= i ± radius`, wrapping around the ends.
    Ring { radius: usize },
    /// Every particle, including itself.
    Global,
    /// Explicit neighbor lists, one per particle.
    Custom { neighbors: Vec<Vec<usize>> },
}

impl Default for TopologyShape {
    fn default() -> Self {
        Self::Ring { radius: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TopologyError {
    #[display("topology needs at least one particle")]
    EmptyPopulation,
    #[display("ring radius must be at least 1")]
    ZeroRadius,
    #[display("topology lists {actual} neighbor sets for {expected} particles")]
    PopulationMismatch { expected: usize, actual: usize },
    #[display("particle {particle} lists neighbor {neighbor}, but there are only {population} particles")]
    NeighborOutOfRange {
        particle: usize,
        neighbor: usize,
        population: usize,
    },
    #[display("particle {particle} has no neighbors")]
    NoNeighbors { particle: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    neighbors: Vec<Vec<usize>>,
}

impl Topology {
    pub fn new(shape: &TopologyShape, population: usize) -> Result<Self, TopologyError> {
        match shape {
            TopologyShape::Ring { radius } => Self::ring(population, *radius),
            TopologyShape::Global => Self::global(population),
            TopologyShape::Custom { neighbors } => {
                if neighbors.len() != population {
                    return Err(TopologyError::PopulationMismatch {
                        expected: population,
                        actual: neighbors.len(),
                    });
                }
                Self::from_neighbors(neighbors.clone())
            }
        }
    }

    /// Ring lattice. With a single particle its only neighbor is itself.
    pub fn ring(population: usize, radius: usize) -> Result<Self, TopologyError> {
        if population == 0 {
            return Err(TopologyError::EmptyPopulation);
        }
        if radius == 0 {
            return Err(TopologyError::ZeroRadius);
        }
        let neighbors = (0..population)
            .map(|i| {
                let mut set = (1..=radius)
                    .map(|k| k % population)
                    .filter(|&k| k != 0)
                    .flat_map(|k| [(i + population - k) % population, (i + k) % population])
                    .collect::<BTreeSet<_>>();
                if set.is_empty() {
                    set.insert(i);
                }
                set.into_iter().collect()
            })
            .collect();
        Ok(Self { neighbors })
    }

    pub fn global(population: usize) -> Result<Self, TopologyError> {
        if population == 0 {
            return Err(TopologyError::EmptyPopulation);
        }
        let all: Vec<_> = (0..population).collect();
        Ok(Self {
            neighbors: vec![all; population],
        })
    }

    /// Builds a topology from explicit lists, sorting and deduplicating each one.
    pub fn from_neighbors(neighbors: Vec<Vec<usize>>) -> Result<Self, TopologyError> {
        let population = neighbors.len();
        if population == 0 {
            return Err(TopologyError::EmptyPopulation);
        }
        let neighbors = neighbors
            .into_iter()
            .enumerate()
            .map(|(particle, list)| {
                if list.is_empty() {
                    return Err(TopologyError::NoNeighbors { particle });
                }
                if let Some(&neighbor) = list.iter().find(|&&n| n >= population) {
                    return Err(TopologyError::NeighborOutOfRange {
                        particle,
                        neighbor,
                        population,
                    });
                }
                Ok(list
                    .into_iter()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect())
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { neighbors })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Neighbors of `particle` in ascending index order.
    #[must_use]
    pub fn neighbors(&self, particle: usize) -> &[usize] {
        &self.neighbors[particle]
    }
}
