//! Memoized travel costs between problem nodes.

use crate::model::{NodeId, ProblemModel};
use crate::traits::{CostFunction, DistanceMatrixProvider, DurationFunction};

/// Precomputed distance matrix (kilometres) with a fixed driving pace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TravelMatrix {
    distances: Vec<Vec<i64>>,
    minutes_per_km: i64,
}

impl TravelMatrix {
    pub const DEFAULT_MINUTES_PER_KM: i64 = 2;

    pub fn new(distances: Vec<Vec<i64>>, minutes_per_km: i64) -> Self {
        Self {
            distances,
            minutes_per_km,
        }
    }

    /// Computes all node-to-node distances once, up front.
    pub fn from_problem<M: DistanceMatrixProvider>(problem: &ProblemModel, provider: &M) -> Self {
        Self::new(
            provider.matrix_for(&problem.locations()),
            Self::DEFAULT_MINUTES_PER_KM,
        )
    }

    /// Matrix where every distinct pair of nodes is `distance` apart.
    pub fn uniform(size: usize, distance: i64, minutes_per_km: i64) -> Self {
        let distances = (0..size)
            .map(|i| (0..size).map(|j| if i == j { 0 } else { distance }).collect())
            .collect();
        Self::new(distances, minutes_per_km)
    }

    pub fn size(&self) -> usize {
        self.distances.len()
    }

    /// True when the matrix is square with `size` rows.
    pub fn is_square(&self, size: usize) -> bool {
        self.distances.len() == size && self.distances.iter().all(|row| row.len() == size)
    }

    pub fn distance(&self, from: NodeId, to: NodeId) -> i64 {
        self.distances[from][to]
    }

    pub fn minutes_per_km(&self) -> i64 {
        self.minutes_per_km
    }
}

impl CostFunction for TravelMatrix {
    fn cost(&self, from: NodeId, to: NodeId) -> i64 {
        self.distance(from, to)
    }
}

impl DurationFunction for TravelMatrix {
    fn duration(&self, from: NodeId, to: NodeId) -> i64 {
        self.distance(from, to) * self.minutes_per_km
    }
}
