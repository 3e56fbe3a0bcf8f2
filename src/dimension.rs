//! Accumulated quantities tracked along routes (load, time).
//!
//! A dimension holds a feasible cumul range for every traversal index. Along
//! a route, the reachable cumul interval at each position is propagated
//! forward: `[lo + transit, hi + transit + slack]` intersected with the
//! bounds of the next index. A route is feasible for the dimension when no
//! interval becomes empty. Concrete values are then picked by a backward
//! pass over the propagated intervals.

use serde::Serialize;

use crate::index::RoutingIndexManager;
use crate::traits::{DemandFunction, DurationFunction};

/// Closed integer interval; empty when `min > max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const UNBOUNDED: Range = Range {
        min: i64::MIN,
        max: i64::MAX,
    };

    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn intersect(self, other: Range) -> Range {
        Range::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// How a dimension's cumul changes from one index to the next.
#[derive(Clone, Copy)]
pub enum Transit<'a> {
    /// Onboard load changes by what the visited node hands over. Pickups
    /// carry negative demand, so the load rises there by `-demand`.
    Load(&'a dyn DemandFunction),
    /// Travel duration between consecutive nodes.
    Travel(&'a dyn DurationFunction),
}

impl std::fmt::Debug for Transit<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transit::Load(_) => f.write_str("Load"),
            Transit::Travel(_) => f.write_str("Travel"),
        }
    }
}

/// Time dimension configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSettings {
    /// Earliest admissible cumul at any index.
    pub lower_bound: i64,
    /// Planning horizon; latest admissible cumul at any index.
    pub horizon: i64,
    /// Maximum waiting at a node. `None` allows unlimited waiting.
    pub max_wait: Option<i64>,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            lower_bound: 30,
            horizon: 480,
            max_wait: Some(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dimension<'a> {
    name: String,
    transit: Transit<'a>,
    ranges: Vec<Range>,
    vehicle_capacities: Vec<i64>,
    slack_max: i64,
}

impl<'a> Dimension<'a> {
    pub fn new(
        name: impl Into<String>,
        transit: Transit<'a>,
        manager: &RoutingIndexManager,
        global: Range,
        vehicle_capacities: Vec<i64>,
        slack_max: i64,
    ) -> Self {
        Self {
            name: name.into(),
            transit,
            ranges: vec![global; manager.num_indices()],
            vehicle_capacities,
            slack_max,
        }
    }

    /// Load dimension: starts empty, never negative, capped per vehicle.
    pub fn capacity(
        name: impl Into<String>,
        manager: &RoutingIndexManager,
        demands: &'a dyn DemandFunction,
        capacities: Vec<i64>,
    ) -> Self {
        let mut dimension = Self::new(
            name,
            Transit::Load(demands),
            manager,
            Range::new(0, i64::MAX),
            capacities,
            0,
        );
        for vehicle in 0..manager.num_vehicles() {
            dimension.set_range(manager.start(vehicle), 0, 0);
        }
        dimension
    }

    /// Time dimension bounded by `[lower_bound, horizon]` with optional waiting.
    pub fn time(
        name: impl Into<String>,
        manager: &RoutingIndexManager,
        durations: &'a dyn DurationFunction,
        settings: TimeSettings,
    ) -> Self {
        Self::new(
            name,
            Transit::Travel(durations),
            manager,
            Range::new(settings.lower_bound, settings.horizon),
            vec![i64::MAX; manager.num_vehicles()],
            settings.max_wait.unwrap_or(i64::MAX),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cumul_range(&self, index: usize) -> Range {
        self.ranges[index]
    }

    /// Narrows the admissible cumul at `index` to its intersection with
    /// `[min, max]` and returns the result, which may be empty.
    pub fn set_range(&mut self, index: usize, min: i64, max: i64) -> Range {
        let narrowed = self.ranges[index].intersect(Range::new(min, max));
        self.ranges[index] = narrowed;
        narrowed
    }

    fn bounds(&self, vehicle: usize, index: usize) -> Range {
        self.ranges[index].intersect(Range::new(i64::MIN, self.vehicle_capacities[vehicle]))
    }

    pub fn transit(&self, manager: &RoutingIndexManager, from: usize, to: usize) -> i64 {
        match self.transit {
            Transit::Load(demands) => demands.demand(manager.index_to_node(to)).saturating_neg(),
            Transit::Travel(durations) => {
                durations.duration(manager.index_to_node(from), manager.index_to_node(to))
            }
        }
    }

    /// Reachable cumul interval at `to` when `from` is reachable within `reach`.
    pub fn step(
        &self,
        manager: &RoutingIndexManager,
        vehicle: usize,
        from: usize,
        reach: Range,
        to: usize,
    ) -> Option<Range> {
        let transit = self.transit(manager, from, to);
        let next = Range::new(
            reach.min.saturating_add(transit),
            reach.max.saturating_add(transit).saturating_add(self.slack_max),
        )
        .intersect(self.bounds(vehicle, to));
        (!next.is_empty()).then_some(next)
    }

    /// Extends `reach` (valid for a prefix of `path`) to cover the whole path.
    ///
    /// Returns false as soon as some position has no feasible cumul.
    pub fn propagate(
        &self,
        manager: &RoutingIndexManager,
        vehicle: usize,
        path: &[usize],
        reach: &mut Vec<Range>,
    ) -> bool {
        reach.truncate(path.len());
        if reach.is_empty() {
            let Some(first) = path.first() else {
                return true;
            };
            let start = self.bounds(vehicle, *first);
            if start.is_empty() {
                return false;
            }
            reach.push(start);
        }

        for position in reach.len()..path.len() {
            let from = path[position - 1];
            match self.step(manager, vehicle, from, reach[position - 1], path[position]) {
                Some(next) => reach.push(next),
                None => return false,
            }
        }
        true
    }

    /// Full forward pass over `path`.
    pub fn cumulate(
        &self,
        manager: &RoutingIndexManager,
        vehicle: usize,
        path: &[usize],
    ) -> Option<Vec<Range>> {
        let mut reach = Vec::with_capacity(path.len());
        self.propagate(manager, vehicle, path, &mut reach).then_some(reach)
    }

    /// Picks one cumul value per position: the earliest value at the end of
    /// the path, then for each predecessor the earliest value that still
    /// reaches its successor within the slack limit.
    pub fn schedule(&self, manager: &RoutingIndexManager, path: &[usize], reach: &[Range]) -> Vec<i64> {
        let mut values = vec![0; reach.len()];
        let Some(last) = reach.len().checked_sub(1) else {
            return values;
        };
        values[last] = reach[last].min;
        for position in (0..last).rev() {
            let transit = self.transit(manager, path[position], path[position + 1]);
            let floor = values[position + 1]
                .saturating_sub(transit)
                .saturating_sub(self.slack_max);
            values[position] = reach[position].min.max(floor);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;

    struct Demands(Vec<i64>);

    impl DemandFunction for Demands {
        fn demand(&self, node: NodeId) -> i64 {
            self.0[node]
        }
    }

    struct Flat(i64);

    impl DurationFunction for Flat {
        fn duration(&self, from: NodeId, to: NodeId) -> i64 {
            if from == to { 0 } else { self.0 }
        }
    }

    fn path(manager: &RoutingIndexManager, vehicle: usize, nodes: &[NodeId]) -> Vec<usize> {
        let mut path = vec![manager.start(vehicle)];
        path.extend(nodes.iter().filter_map(|node| manager.node_to_index(*node, None)));
        path.push(manager.end(vehicle));
        path
    }

    #[test]
    fn test_range_intersection() {
        let r = Range::new(0, 10).intersect(Range::new(5, 20));
        assert_eq!(r, Range::new(5, 10));
        assert!(Range::new(0, 10).intersect(Range::new(11, 20)).is_empty());
        assert!(r.contains(7));
        assert!(!r.contains(11));
    }

    #[test]
    fn test_capacity_tracks_onboard_load() {
        let manager = RoutingIndexManager::new(3, 1, 0);
        let demands = Demands(vec![0, -50, 50]);
        let dimension = Dimension::capacity("Capacity", &manager, &demands, vec![100]);

        let route = path(&manager, 0, &[1, 2]);
        let reach = dimension.cumulate(&manager, 0, &route).expect("feasible");
        let loads = dimension.schedule(&manager, &route, &reach);
        assert_eq!(loads, vec![0, 50, 0, 0]);
    }

    #[test]
    fn test_capacity_rejects_overflow_and_underflow() {
        let manager = RoutingIndexManager::new(3, 1, 0);
        let demands = Demands(vec![0, -50, 50]);
        let dimension = Dimension::capacity("Capacity", &manager, &demands, vec![10]);
        assert!(dimension.cumulate(&manager, 0, &path(&manager, 0, &[1, 2])).is_none());

        let roomy = Dimension::capacity("Capacity", &manager, &demands, vec![100]);
        assert!(roomy.cumulate(&manager, 0, &path(&manager, 0, &[2, 1])).is_none());
    }

    #[test]
    fn test_extreme_demand_saturates() {
        let manager = RoutingIndexManager::new(2, 1, 0);
        let demands = Demands(vec![0, i64::MIN]);
        let dimension = Dimension::capacity("Capacity", &manager, &demands, vec![100]);
        let visit = manager.node_to_index(1, None).expect("index");
        assert_eq!(dimension.transit(&manager, manager.start(0), visit), i64::MAX);
        assert!(dimension.cumulate(&manager, 0, &path(&manager, 0, &[1])).is_none());
    }

    #[test]
    fn test_time_waits_for_window() {
        let manager = RoutingIndexManager::new(3, 1, 0);
        let durations = Flat(20);
        let settings = TimeSettings {
            max_wait: None,
            ..TimeSettings::default()
        };
        let mut dimension = Dimension::time("Time", &manager, &durations, settings);
        let pickup = manager.node_to_index(1, None).expect("index");
        let delivery = manager.node_to_index(2, None).expect("index");
        dimension.set_range(pickup, 0, 240);
        dimension.set_range(delivery, 120, 480);

        let route = path(&manager, 0, &[1, 2]);
        let reach = dimension.cumulate(&manager, 0, &route).expect("feasible");
        assert_eq!(reach[1], Range::new(50, 240));
        let times = dimension.schedule(&manager, &route, &reach);
        assert_eq!(times, vec![30, 50, 120, 140]);
    }

    #[test]
    fn test_limited_wait_shifts_departure() {
        let manager = RoutingIndexManager::new(2, 1, 0);
        let durations = Flat(10);
        let mut dimension = Dimension::time("Time", &manager, &durations, TimeSettings::default());
        let visit = manager.node_to_index(1, None).expect("index");
        dimension.set_range(visit, 200, 300);

        let route = path(&manager, 0, &[1]);
        let reach = dimension.cumulate(&manager, 0, &route).expect("feasible");
        let times = dimension.schedule(&manager, &route, &reach);
        assert_eq!(times[1], 200);
        assert!(times[1] - times[0] - 10 <= 30, "wait exceeds slack: {:?}", times);
        assert!(times[0] >= 30);
    }

    #[test]
    fn test_empty_window_intersection() {
        let manager = RoutingIndexManager::new(2, 1, 0);
        let durations = Flat(5);
        let mut dimension = Dimension::time("Time", &manager, &durations, TimeSettings::default());
        let visit = manager.node_to_index(1, None).expect("index");
        assert!(dimension.set_range(visit, 0, 10).is_empty());
        assert!(dimension.cumulate(&manager, 0, &path(&manager, 0, &[1])).is_none());
    }

    #[test]
    fn test_propagate_from_prefix() {
        let manager = RoutingIndexManager::new(3, 1, 0);
        let durations = Flat(10);
        let dimension = Dimension::time("Time", &manager, &durations, TimeSettings::default());
        let full = path(&manager, 0, &[1, 2]);
        let expected = dimension.cumulate(&manager, 0, &full).expect("feasible");

        let mut reach = expected[..2].to_vec();
        assert!(dimension.propagate(&manager, 0, &full, &mut reach));
        assert_eq!(reach, expected);
    }
}
