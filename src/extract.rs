//! Maps a search outcome back to problem locations and order identifiers.

use serde::Serialize;

use crate::error::RoutingError;
use crate::model::{Location, NodeId, ProblemModel};
use crate::solution::{RouteStep, Solution, Termination};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedStop {
    pub node: NodeId,
    pub location: Location,
    /// `None` for the depot.
    pub order_id: Option<String>,
    pub arrival: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleItinerary {
    pub vehicle: usize,
    pub stops: Vec<ExtractedStop>,
    /// Arrival time back at the depot.
    pub return_arrival: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub solved: bool,
    pub termination: Option<Termination>,
    pub total_cost: i64,
    pub vehicles: Vec<VehicleItinerary>,
}

impl Extraction {
    pub fn from_solution(problem: &ProblemModel, solution: &Solution) -> Self {
        let vehicles = solution
            .routes()
            .iter()
            .map(|route| {
                let mut stops = Vec::new();
                let mut return_arrival = 0;
                for step in solution.itinerary(route.vehicle).into_iter().flatten() {
                    match step {
                        RouteStep::Visit { node, arrival } => stops.push(ExtractedStop {
                            node,
                            location: problem.node(node).location,
                            order_id: problem.order_id(node).map(str::to_string),
                            arrival,
                        }),
                        RouteStep::ReturnToDepot { arrival } => return_arrival = arrival,
                    }
                }
                VehicleItinerary {
                    vehicle: route.vehicle,
                    stops,
                    return_arrival,
                }
            })
            .collect();

        Self {
            solved: true,
            termination: Some(solution.termination()),
            total_cost: solution.total_cost(),
            vehicles,
        }
    }

    /// Empty result flagged as failed. No partial routes are surfaced.
    pub fn failed() -> Self {
        Self {
            solved: false,
            termination: None,
            total_cost: 0,
            vehicles: Vec::new(),
        }
    }

    pub fn from_outcome(problem: &ProblemModel, outcome: &Result<Solution, RoutingError>) -> Self {
        match outcome {
            Ok(solution) => Self::from_solution(problem, solution),
            Err(_) => Self::failed(),
        }
    }
}
