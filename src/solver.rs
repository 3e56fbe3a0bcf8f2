//! Routing search engine (cheapest insertion + local search).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::dimension::{Range, TimeSettings};
use crate::error::RoutingError;
use crate::model::{NodeId, ProblemModel};
use crate::routing::{CAPACITY, RoutingModel, TIME};
use crate::solution::{Solution, Stop, Termination, VehicleRoute};
use crate::travel::TravelMatrix;

/// Shared flag a caller flips to stop a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Maximum number of improving moves applied during local search.
    pub max_moves: usize,
    /// Wall-clock limit for local search.
    pub time_limit: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_moves: 1000,
            time_limit: Some(Duration::from_secs(10)),
            cancel: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Unsolved,
    Constructing,
    Improving,
    Solved,
    Infeasible,
}

/// Unit of insertion: a lone node, or a pickup routed together with its delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    Single(NodeId),
    Pair { pickup: NodeId, delivery: NodeId },
}

impl Job {
    fn anchor(&self) -> NodeId {
        match *self {
            Job::Single(node) => node,
            Job::Pair { pickup, delivery } => pickup.min(delivery),
        }
    }

    fn nodes(&self) -> Vec<NodeId> {
        match *self {
            Job::Single(node) => vec![node],
            Job::Pair { pickup, delivery } => vec![pickup, delivery],
        }
    }
}

#[derive(Debug, Clone)]
struct RouteState {
    vehicle: usize,
    /// Traversal indices from start anchor to end anchor.
    path: Vec<usize>,
    /// Reachable cumul intervals per dimension, aligned with `path`.
    reach: Vec<Vec<Range>>,
    cost: i64,
}

#[derive(Debug, Clone)]
struct Insertion {
    route: RouteState,
    delta: i64,
}

enum Pass {
    Improved,
    Stalled,
    Exhausted,
}

pub struct SearchEngine<'m, 'a> {
    model: &'m RoutingModel<'a>,
    options: SolveOptions,
    status: SearchStatus,
    jobs: Vec<Job>,
    /// Pickup partner of every delivery node.
    pickup_of: Vec<Option<NodeId>>,
    routes: Vec<RouteState>,
    moves: usize,
}

impl<'m, 'a> SearchEngine<'m, 'a> {
    pub fn new(model: &'m RoutingModel<'a>, options: SolveOptions) -> Self {
        let (jobs, pickup_of) = collect_jobs(model.problem());
        Self {
            model,
            options,
            status: SearchStatus::Unsolved,
            jobs,
            pickup_of,
            routes: Vec::new(),
            moves: 0,
        }
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    /// Builds routes for every node, then improves them within the budget.
    ///
    /// All-or-nothing: on failure no routes are kept.
    pub fn solve(&mut self) -> Result<Solution, RoutingError> {
        let problem = self.model.problem();
        info!(
            nodes = problem.num_nodes(),
            vehicles = problem.num_vehicles(),
            pairs = problem.pairs().len(),
            "solve started"
        );

        self.routes.clear();
        self.moves = 0;
        self.status = SearchStatus::Constructing;

        if let Err(err) = self.construct() {
            self.status = if err.is_infeasible() {
                SearchStatus::Infeasible
            } else {
                SearchStatus::Unsolved
            };
            self.routes.clear();
            return Err(err);
        }

        self.status = SearchStatus::Improving;
        let termination = self.improve();
        self.status = SearchStatus::Solved;

        let solution = self.freeze(termination);
        info!(
            cost = solution.total_cost(),
            moves = solution.moves(),
            termination = ?termination,
            "solve finished"
        );
        Ok(solution)
    }

    fn construct(&mut self) -> Result<(), RoutingError> {
        let manager = self.model.manager();
        for vehicle in 0..manager.num_vehicles() {
            let path = vec![manager.start(vehicle), manager.end(vehicle)];
            match self.evaluate(vehicle, path, &[], 0) {
                Some(route) => self.routes.push(route),
                None => {
                    warn!(vehicle, "depot anchors violate dimension bounds");
                    let mut unplaced: Vec<NodeId> = self.jobs.iter().flat_map(Job::nodes).collect();
                    unplaced.sort_unstable();
                    return Err(RoutingError::Infeasible { unplaced });
                }
            }
        }

        let mut pending = self.jobs.clone();
        while !pending.is_empty() {
            self.check_cancelled()?;

            let mut best: Option<(usize, Insertion)> = None;
            for (position, job) in pending.iter().enumerate() {
                for route in &self.routes {
                    let Some(candidate) = self.best_insertion(route, *job) else {
                        continue;
                    };
                    if best
                        .as_ref()
                        .is_none_or(|(_, current)| candidate.delta < current.delta)
                    {
                        best = Some((position, candidate));
                    }
                }
            }

            let Some((position, insertion)) = best else {
                break;
            };
            let job = pending.remove(position);
            let vehicle = insertion.route.vehicle;
            debug!(node = job.anchor(), vehicle, delta = insertion.delta, "inserted");
            self.routes[vehicle] = insertion.route;
        }

        if !pending.is_empty() {
            let mut unplaced: Vec<NodeId> = pending.iter().flat_map(Job::nodes).collect();
            unplaced.sort_unstable();
            warn!(unplaced = unplaced.len(), "no feasible insertion left");
            return Err(RoutingError::Infeasible { unplaced });
        }
        Ok(())
    }

    fn improve(&mut self) -> Termination {
        let started = Instant::now();
        loop {
            if self.out_of_budget(started) {
                return Termination::BudgetExhausted;
            }

            let pass = match self.two_opt(started) {
                Pass::Stalled => self.relocate(started),
                other => other,
            };

            match pass {
                Pass::Improved => self.moves += 1,
                Pass::Stalled => return Termination::LocalOptimum,
                Pass::Exhausted => return Termination::BudgetExhausted,
            }
        }
    }

    /// Recomputes dimension intervals for `path`, reusing the first `keep`
    /// positions of `prefix`.
    fn evaluate(
        &self,
        vehicle: usize,
        path: Vec<usize>,
        prefix: &[Vec<Range>],
        keep: usize,
    ) -> Option<RouteState> {
        let manager = self.model.manager();
        let mut reach = Vec::with_capacity(self.model.dimensions().len());
        for (d, dimension) in self.model.dimensions().iter().enumerate() {
            let mut values = prefix
                .get(d)
                .map(|known| known[..keep.min(known.len())].to_vec())
                .unwrap_or_default();
            if !dimension.propagate(manager, vehicle, &path, &mut values) {
                return None;
            }
            reach.push(values);
        }
        let cost = self.model.route_cost(&path);
        Some(RouteState {
            vehicle,
            path,
            reach,
            cost,
        })
    }

    /// True when `index` can follow position `position - 1` of `route` in
    /// every dimension.
    fn reaches(&self, route: &RouteState, position: usize, index: usize) -> bool {
        let manager = self.model.manager();
        self.model.dimensions().iter().enumerate().all(|(d, dimension)| {
            dimension
                .step(
                    manager,
                    route.vehicle,
                    route.path[position - 1],
                    route.reach[d][position - 1],
                    index,
                )
                .is_some()
        })
    }

    /// Cheapest feasible way to add `job` to `route`. Earlier positions win ties.
    fn best_insertion(&self, route: &RouteState, job: Job) -> Option<Insertion> {
        let manager = self.model.manager();
        let mut best: Option<Insertion> = None;

        match job {
            Job::Single(node) => {
                let index = manager.node_to_index(node, None)?;
                for position in 1..route.path.len() {
                    let mut path = route.path.clone();
                    path.insert(position, index);
                    if let Some(candidate) = self.evaluate(route.vehicle, path, &route.reach, position) {
                        keep_cheaper(&mut best, candidate, route.cost);
                    }
                }
            }
            Job::Pair { pickup, delivery } => {
                let pickup_index = manager.node_to_index(pickup, None)?;
                let delivery_index = manager.node_to_index(delivery, None)?;
                for first in 1..route.path.len() {
                    if !self.reaches(route, first, pickup_index) {
                        continue;
                    }
                    for second in first + 1..=route.path.len() {
                        let mut path = route.path.clone();
                        path.insert(first, pickup_index);
                        path.insert(second, delivery_index);
                        if let Some(candidate) = self.evaluate(route.vehicle, path, &route.reach, first) {
                            keep_cheaper(&mut best, candidate, route.cost);
                        }
                    }
                }
            }
        }

        best
    }

    fn respects_precedence(&self, path: &[usize]) -> bool {
        let manager = self.model.manager();
        let mut visited = vec![false; manager.num_nodes()];
        for index in path {
            let node = manager.index_to_node(*index);
            if let Some(pickup) = self.pickup_of[node] {
                if !visited[pickup] {
                    return false;
                }
            }
            visited[node] = true;
        }
        true
    }

    fn route_of(&self, job: Job) -> Option<usize> {
        let index = self.model.manager().node_to_index(job.anchor(), None)?;
        self.routes.iter().position(|route| route.path.contains(&index))
    }

    fn remove_job(&self, route: &RouteState, job: Job) -> Option<RouteState> {
        let manager = self.model.manager();
        let indices: Vec<usize> = job
            .nodes()
            .into_iter()
            .filter_map(|node| manager.node_to_index(node, None))
            .collect();
        let first = route.path.iter().position(|index| indices.contains(index))?;
        let path = route
            .path
            .iter()
            .copied()
            .filter(|index| !indices.contains(index))
            .collect();
        self.evaluate(route.vehicle, path, &route.reach, first)
    }

    /// 2-opt: reverse a segment within a route to reduce travel cost.
    fn two_opt(&mut self, started: Instant) -> Pass {
        for r in 0..self.routes.len() {
            let route = self.routes[r].clone();
            let end = route.path.len() - 1;
            for i in 1..end {
                if self.out_of_budget(started) {
                    return Pass::Exhausted;
                }
                for j in i + 1..end {
                    let mut path = route.path.clone();
                    path[i..=j].reverse();
                    if !self.respects_precedence(&path) {
                        continue;
                    }
                    let Some(candidate) = self.evaluate(route.vehicle, path, &route.reach, i) else {
                        continue;
                    };
                    if candidate.cost < route.cost {
                        debug!(vehicle = route.vehicle, from = route.cost, to = candidate.cost, "2-opt");
                        self.routes[r] = candidate;
                        return Pass::Improved;
                    }
                }
            }
        }
        Pass::Stalled
    }

    /// Relocate: move a job to its best position in any route (including its
    /// own) when that lowers total cost.
    fn relocate(&mut self, started: Instant) -> Pass {
        for job in self.jobs.clone() {
            if self.out_of_budget(started) {
                return Pass::Exhausted;
            }
            let Some(from) = self.route_of(job) else {
                continue;
            };
            let source = self.routes[from].clone();
            let Some(removed) = self.remove_job(&source, job) else {
                continue;
            };

            let mut best: Option<(usize, Insertion, i64)> = None;
            for target in 0..self.routes.len() {
                let base = if target == from {
                    &removed
                } else {
                    &self.routes[target]
                };
                let Some(insertion) = self.best_insertion(base, job) else {
                    continue;
                };
                let change = if target == from {
                    insertion.route.cost - source.cost
                } else {
                    removed.cost - source.cost + insertion.delta
                };
                if change < 0 && best.as_ref().is_none_or(|(_, _, current)| change < *current) {
                    best = Some((target, insertion, change));
                }
            }

            if let Some((target, insertion, change)) = best {
                debug!(node = job.anchor(), from, to = target, change, "relocate");
                if target != from {
                    self.routes[from] = removed;
                }
                self.routes[target] = insertion.route;
                return Pass::Improved;
            }
        }
        Pass::Stalled
    }

    fn out_of_budget(&self, started: Instant) -> bool {
        self.moves >= self.options.max_moves
            || self
                .options
                .time_limit
                .is_some_and(|limit| started.elapsed() >= limit)
            || self.cancelled()
    }

    fn cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }

    fn check_cancelled(&self) -> Result<(), RoutingError> {
        if self.cancelled() {
            Err(RoutingError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn freeze(&self, termination: Termination) -> Solution {
        let manager = self.model.manager();
        let values = |route: &RouteState, name: &str| -> Vec<i64> {
            match self.model.dimension_position(name) {
                Some(d) => self.model.dimensions()[d].schedule(manager, &route.path, &route.reach[d]),
                None => vec![0; route.path.len()],
            }
        };

        let routes = self
            .routes
            .iter()
            .map(|route| {
                let arrivals = values(route, TIME);
                let loads = values(route, CAPACITY);
                let stops = route
                    .path
                    .iter()
                    .zip(arrivals)
                    .zip(loads)
                    .map(|((index, arrival), load)| Stop {
                        index: *index,
                        node: manager.index_to_node(*index),
                        arrival,
                        load,
                    })
                    .collect();
                VehicleRoute {
                    vehicle: route.vehicle,
                    stops,
                    cost: route.cost,
                }
            })
            .collect();

        Solution::new(routes, termination, self.moves)
    }
}

fn keep_cheaper(best: &mut Option<Insertion>, candidate: RouteState, base_cost: i64) {
    let delta = candidate.cost - base_cost;
    if best.as_ref().is_none_or(|current| delta < current.delta) {
        *best = Some(Insertion {
            route: candidate,
            delta,
        });
    }
}

fn collect_jobs(problem: &ProblemModel) -> (Vec<Job>, Vec<Option<NodeId>>) {
    let n = problem.num_nodes();
    let mut paired = vec![false; n];
    let mut pickup_of = vec![None; n];
    let mut jobs = Vec::with_capacity(n);

    for pair in problem.pairs() {
        paired[pair.pickup] = true;
        paired[pair.delivery] = true;
        pickup_of[pair.delivery] = Some(pair.pickup);
        jobs.push(Job::Pair {
            pickup: pair.pickup,
            delivery: pair.delivery,
        });
    }
    jobs.extend(
        (0..n)
            .filter(|node| *node != problem.depot() && !paired[*node])
            .map(Job::Single),
    );
    jobs.sort_by_key(Job::anchor);

    (jobs, pickup_of)
}

/// Solves `problem` with travel distance as arc cost and the standard
/// Capacity and Time dimensions.
pub fn solve(
    problem: &ProblemModel,
    travel: &TravelMatrix,
    settings: TimeSettings,
    options: SolveOptions,
) -> Result<Solution, RoutingError> {
    let model = RoutingModel::with_standard_dimensions(problem, travel, settings)?;
    SearchEngine::new(&model, options).solve()
}
