//! Strategy interfaces the routing engine is composed from.
//!
//! Cost, duration and demand are plain functions over node ids. The routing
//! model composes them explicitly into its arc cost and dimensions.

use crate::model::NodeId;

/// Provides a distance matrix (kilometres) for a set of locations.
///
/// The matrix is indexed by the provided location order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<i64>>;
}

/// Cost of travelling the arc `from -> to`.
pub trait CostFunction {
    fn cost(&self, from: NodeId, to: NodeId) -> i64;
}

/// Travel duration in minutes along the arc `from -> to`.
pub trait DurationFunction {
    fn duration(&self, from: NodeId, to: NodeId) -> i64;
}

/// Signed demand of a node: pickups are negative, deliveries positive.
pub trait DemandFunction {
    fn demand(&self, node: NodeId) -> i64;
}
