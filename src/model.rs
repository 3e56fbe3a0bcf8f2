//! Immutable problem description: nodes, vehicles, depot and order pairs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;
use crate::traits::DemandFunction;

/// Index of a node in the problem model.
pub type NodeId = usize;

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Inclusive arrival window in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub earliest: i64,
    pub latest: i64,
}

impl TimeWindow {
    /// Window placing no restriction beyond the planning horizon.
    pub const UNRESTRICTED: TimeWindow = TimeWindow {
        earliest: 0,
        latest: i64::MAX,
    };

    pub const fn new(earliest: i64, latest: i64) -> Self {
        Self { earliest, latest }
    }

    pub fn is_valid(&self) -> bool {
        self.earliest <= self.latest
    }

    pub fn contains(&self, time: i64) -> bool {
        time >= self.earliest && time <= self.latest
    }
}

/// A routing unit: a location with signed demand and a time window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub location: Location,
    pub demand: i64,
    pub time_window: TimeWindow,
    /// External order identifier shared by a pickup and its delivery.
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    pub id: usize,
    pub capacity: i64,
}

/// A pickup node and the delivery node it must precede on the same route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickupDelivery {
    pub pickup: NodeId,
    pub delivery: NodeId,
}

impl PickupDelivery {
    pub const fn new(pickup: NodeId, delivery: NodeId) -> Self {
        Self { pickup, delivery }
    }
}

/// Raw, unvalidated instance arrays.
///
/// `order_ids` may be left empty when nodes carry no external identifier.
#[derive(Debug, Clone, Default)]
pub struct ProblemData {
    pub locations: Vec<Location>,
    pub demands: Vec<i64>,
    pub time_windows: Vec<TimeWindow>,
    pub vehicle_capacities: Vec<i64>,
    pub depot: NodeId,
    pub order_ids: Vec<Option<String>>,
    pub pairs: Vec<PickupDelivery>,
}

/// Validated problem model. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ProblemModel {
    nodes: Vec<Node>,
    vehicles: Vec<Vehicle>,
    depot: NodeId,
    pairs: Vec<PickupDelivery>,
}

impl ProblemModel {
    pub fn new(data: ProblemData) -> Result<Self, RoutingError> {
        let n = data.locations.len();

        if data.demands.len() != n || data.time_windows.len() != n {
            return Err(RoutingError::invalid(format!(
                "{} locations but {} demands and {} time windows",
                n,
                data.demands.len(),
                data.time_windows.len()
            )));
        }
        if !data.order_ids.is_empty() && data.order_ids.len() != n {
            return Err(RoutingError::invalid(format!(
                "{} locations but {} order ids",
                n,
                data.order_ids.len()
            )));
        }
        if data.depot >= n {
            return Err(RoutingError::invalid(format!(
                "depot {} out of range for {} locations",
                data.depot, n
            )));
        }
        if let Some(node) = data.demands.iter().position(|demand| demand.checked_neg().is_none()) {
            return Err(RoutingError::invalid(format!("node {} demand is out of range", node)));
        }
        if data.demands[data.depot] != 0 {
            return Err(RoutingError::invalid("depot must have zero demand"));
        }
        if data.vehicle_capacities.is_empty() {
            return Err(RoutingError::invalid("at least one vehicle is required"));
        }
        if let Some((vehicle, capacity)) = data
            .vehicle_capacities
            .iter()
            .enumerate()
            .find(|(_, capacity)| **capacity < 0)
        {
            return Err(RoutingError::invalid(format!(
                "vehicle {} has negative capacity {}",
                vehicle, capacity
            )));
        }
        if let Some((node, window)) = data
            .time_windows
            .iter()
            .enumerate()
            .find(|(_, window)| !window.is_valid())
        {
            return Err(RoutingError::invalid(format!(
                "node {} has reversed time window [{}, {}]",
                node, window.earliest, window.latest
            )));
        }
        validate_pairs(&data.pairs, &data.demands, data.depot)?;

        let mut order_ids = data.order_ids.into_iter();
        let nodes = data
            .locations
            .into_iter()
            .zip(data.demands)
            .zip(data.time_windows)
            .map(|((location, demand), time_window)| Node {
                location,
                demand,
                time_window,
                order_id: order_ids.next().flatten(),
            })
            .collect();

        let vehicles = data
            .vehicle_capacities
            .into_iter()
            .enumerate()
            .map(|(id, capacity)| Vehicle { id, capacity })
            .collect();

        Ok(Self {
            nodes,
            vehicles,
            depot: data.depot,
            pairs: data.pairs,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, node: NodeId) -> &Node {
        &self.nodes[node]
    }

    pub fn time_window(&self, node: NodeId) -> TimeWindow {
        self.nodes[node].time_window
    }

    pub fn order_id(&self, node: NodeId) -> Option<&str> {
        self.nodes[node].order_id.as_deref()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle_capacities(&self) -> Vec<i64> {
        self.vehicles.iter().map(|vehicle| vehicle.capacity).collect()
    }

    pub fn depot(&self) -> NodeId {
        self.depot
    }

    pub fn pairs(&self) -> &[PickupDelivery] {
        &self.pairs
    }

    /// Coordinates of every node, in node order.
    pub fn locations(&self) -> Vec<(f64, f64)> {
        self.nodes.iter().map(|node| node.location.coords()).collect()
    }
}

impl DemandFunction for ProblemModel {
    fn demand(&self, node: NodeId) -> i64 {
        self.nodes[node].demand
    }
}

fn validate_pairs(
    pairs: &[PickupDelivery],
    demands: &[i64],
    depot: NodeId,
) -> Result<(), RoutingError> {
    let mut seen = HashSet::new();
    for pair in pairs {
        let PickupDelivery { pickup, delivery } = *pair;
        if pickup >= demands.len() || delivery >= demands.len() {
            return Err(RoutingError::invalid(format!(
                "pair ({}, {}) references an unknown node",
                pickup, delivery
            )));
        }
        if pickup == depot || delivery == depot || pickup == delivery {
            return Err(RoutingError::invalid(format!(
                "pair ({}, {}) must join two distinct non-depot nodes",
                pickup, delivery
            )));
        }
        if !seen.insert(pickup) || !seen.insert(delivery) {
            return Err(RoutingError::invalid(format!(
                "node of pair ({}, {}) already belongs to another pair",
                pickup, delivery
            )));
        }
        if demands[pickup] > 0 || demands[delivery].checked_neg() != Some(demands[pickup]) {
            return Err(RoutingError::invalid(format!(
                "pair ({}, {}) needs pickup demand -q and delivery demand +q, got {} and {}",
                pickup, delivery, demands[pickup], demands[delivery]
            )));
        }
    }
    Ok(())
}
