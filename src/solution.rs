//! Frozen search result and lazy per-vehicle itineraries.

use serde::Serialize;

use crate::model::NodeId;

/// Why the improvement phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// No improving move remained.
    LocalOptimum,
    /// Move budget, time limit or cancellation ended the search early. The
    /// routes are still complete and feasible.
    BudgetExhausted,
}

/// One traversal index on a route with its dimension values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stop {
    pub index: usize,
    pub node: NodeId,
    pub arrival: i64,
    pub load: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleRoute {
    pub vehicle: usize,
    /// Start anchor, visits, end anchor.
    pub stops: Vec<Stop>,
    pub cost: i64,
}

impl VehicleRoute {
    /// Nodes visited between the depot anchors.
    pub fn visits(&self) -> impl Iterator<Item = &Stop> {
        let inner = self.stops.len().saturating_sub(1);
        self.stops.iter().take(inner).skip(1)
    }

    pub fn is_empty(&self) -> bool {
        self.stops.len() <= 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    routes: Vec<VehicleRoute>,
    total_cost: i64,
    termination: Termination,
    moves: usize,
}

impl Solution {
    pub fn new(routes: Vec<VehicleRoute>, termination: Termination, moves: usize) -> Self {
        let total_cost = routes.iter().map(|route| route.cost).sum();
        Self {
            routes,
            total_cost,
            termination,
            moves,
        }
    }

    pub fn routes(&self) -> &[VehicleRoute] {
        &self.routes
    }

    pub fn route(&self, vehicle: usize) -> Option<&VehicleRoute> {
        self.routes.get(vehicle)
    }

    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Improving moves applied after construction.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Vehicle serving `node`, if any route visits it.
    pub fn vehicle_of(&self, node: NodeId) -> Option<usize> {
        self.routes
            .iter()
            .find(|route| route.visits().any(|stop| stop.node == node))
            .map(|route| route.vehicle)
    }

    /// Walks the route of `vehicle` from its start anchor. Each call returns a
    /// fresh iterator.
    pub fn itinerary(&self, vehicle: usize) -> Option<Itinerary<'_>> {
        self.routes.get(vehicle).map(|route| Itinerary {
            stops: &route.stops,
            position: 0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteStep {
    Visit { node: NodeId, arrival: i64 },
    ReturnToDepot { arrival: i64 },
}

/// Lazy walk over one vehicle's route: a `Visit` for every stop up to the
/// end anchor, then a single `ReturnToDepot`.
#[derive(Debug, Clone)]
pub struct Itinerary<'s> {
    stops: &'s [Stop],
    position: usize,
}

impl Iterator for Itinerary<'_> {
    type Item = RouteStep;

    fn next(&mut self) -> Option<Self::Item> {
        let stop = self.stops.get(self.position)?;
        self.position += 1;
        if self.position == self.stops.len() {
            Some(RouteStep::ReturnToDepot {
                arrival: stop.arrival,
            })
        } else {
            Some(RouteStep::Visit {
                node: stop.node,
                arrival: stop.arrival,
            })
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.stops.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Itinerary<'_> {}
