//! Traversal index <-> node mapping.
//!
//! Every non-depot node gets one visit index. Each vehicle additionally gets
//! a start and an end index, both anchored at the depot. Layout:
//! `[visits..., starts..., ends...]`.

use crate::model::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingIndexManager {
    index_to_node: Vec<NodeId>,
    node_to_index: Vec<Option<usize>>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    depot: NodeId,
}

impl RoutingIndexManager {
    pub fn new(num_nodes: usize, num_vehicles: usize, depot: NodeId) -> Self {
        let mut index_to_node = Vec::with_capacity(num_nodes + 2 * num_vehicles);
        let mut node_to_index = vec![None; num_nodes];

        for node in (0..num_nodes).filter(|node| *node != depot) {
            node_to_index[node] = Some(index_to_node.len());
            index_to_node.push(node);
        }

        let visits = index_to_node.len();
        let starts = (visits..visits + num_vehicles).collect();
        let ends = (visits + num_vehicles..visits + 2 * num_vehicles).collect();
        index_to_node.extend(std::iter::repeat_n(depot, 2 * num_vehicles));

        Self {
            index_to_node,
            node_to_index,
            starts,
            ends,
            depot,
        }
    }

    pub fn num_indices(&self) -> usize {
        self.index_to_node.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.node_to_index.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.starts.len()
    }

    pub fn depot(&self) -> NodeId {
        self.depot
    }

    pub fn index_to_node(&self, index: usize) -> NodeId {
        self.index_to_node[index]
    }

    /// Traversal index of `node`. The depot resolves to the start index of
    /// `vehicle` (vehicle 0 when none is given).
    pub fn node_to_index(&self, node: NodeId, vehicle: Option<usize>) -> Option<usize> {
        if node == self.depot {
            return self.starts.get(vehicle.unwrap_or(0)).copied();
        }
        self.node_to_index.get(node).copied().flatten()
    }

    pub fn start(&self, vehicle: usize) -> usize {
        self.starts[vehicle]
    }

    pub fn end(&self, vehicle: usize) -> usize {
        self.ends[vehicle]
    }

    pub fn is_start(&self, index: usize) -> bool {
        self.starts.first().is_some_and(|first| index >= *first && index < first + self.starts.len())
    }

    pub fn is_end(&self, index: usize) -> bool {
        self.ends.first().is_some_and(|first| index >= *first && index < first + self.ends.len())
    }

    /// Visit indices of all non-depot nodes, ascending by node id.
    pub fn visit_indices(&self) -> std::ops::Range<usize> {
        0..self.num_indices() - 2 * self.num_vehicles()
    }
}
