//! Generated instances: whatever the search returns must be a valid plan.

use std::collections::HashMap;

use proptest::prelude::*;

use pdptw_planner::dimension::TimeSettings;
use pdptw_planner::error::RoutingError;
use pdptw_planner::model::{Location, PickupDelivery, ProblemData, ProblemModel, TimeWindow};
use pdptw_planner::solver::{SolveOptions, solve};
use pdptw_planner::travel::TravelMatrix;

#[derive(Debug, Clone)]
struct Instance {
    capacities: Vec<i64>,
    weights: Vec<i64>,
    distances: Vec<Vec<i64>>,
}

impl Instance {
    fn problem(&self) -> ProblemModel {
        let nodes = 1 + 2 * self.weights.len();
        let mut demands = vec![0];
        let mut time_windows = vec![TimeWindow::UNRESTRICTED];
        let mut pairs = Vec::new();
        for (i, weight) in self.weights.iter().enumerate() {
            demands.extend([-weight, *weight]);
            time_windows.extend([TimeWindow::new(0, 240), TimeWindow::new(120, 480)]);
            pairs.push(PickupDelivery::new(1 + 2 * i, 2 + 2 * i));
        }

        ProblemModel::new(ProblemData {
            locations: vec![Location::new(0.0, 0.0); nodes],
            demands,
            time_windows,
            vehicle_capacities: self.capacities.clone(),
            depot: 0,
            order_ids: Vec::new(),
            pairs,
        })
        .expect("generated problem is valid")
    }

    fn travel(&self) -> TravelMatrix {
        TravelMatrix::new(self.distances.clone(), 1)
    }
}

prop_compose! {
    fn symmetric_matrix(size: usize)
    (raw in prop::collection::vec(1i64..20, size * size)) -> Vec<Vec<i64>> {
        (0..size)
            .map(|i| {
                (0..size)
                    .map(|j| if i == j { 0 } else { raw[i.min(j) * size + i.max(j)] })
                    .collect()
            })
            .collect()
    }
}

fn instance() -> impl Strategy<Value = Instance> {
    (1usize..=3, 50i64..150, prop::collection::vec(1i64..60, 0..=4)).prop_flat_map(
        |(vehicles, capacity, weights)| {
            let size = 1 + 2 * weights.len();
            symmetric_matrix(size).prop_map(move |distances| Instance {
                capacities: vec![capacity; vehicles],
                weights: weights.clone(),
                distances,
            })
        },
    )
}

fn options() -> SolveOptions {
    SolveOptions {
        time_limit: None,
        ..SolveOptions::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn solutions_satisfy_every_constraint(instance in instance()) {
        let problem = instance.problem();
        let travel = instance.travel();
        let settings = TimeSettings::default();

        match solve(&problem, &travel, settings, options()) {
            Ok(solution) => {
                prop_assert_eq!(solution.routes().len(), problem.num_vehicles());

                let mut position = HashMap::new();
                let mut total = 0;
                for route in solution.routes() {
                    let capacity = problem.vehicles()[route.vehicle].capacity;
                    prop_assert_eq!(route.stops.first().map(|stop| stop.node), Some(0));
                    prop_assert_eq!(route.stops.last().map(|stop| stop.node), Some(0));

                    for (k, stop) in route.stops.iter().enumerate() {
                        prop_assert!(stop.load >= 0 && stop.load <= capacity);
                        prop_assert!(problem.time_window(stop.node).contains(stop.arrival));
                        prop_assert!(stop.arrival >= settings.lower_bound);
                        prop_assert!(stop.arrival <= settings.horizon);
                        if k > 0 && k + 1 < route.stops.len() {
                            prop_assert!(position.insert(stop.node, (route.vehicle, k)).is_none());
                        }
                    }
                    for step in route.stops.windows(2) {
                        let wait = step[1].arrival - step[0].arrival - travel.distance(step[0].node, step[1].node);
                        prop_assert!(wait >= 0 && wait <= 30, "wait {}", wait);
                        total += travel.distance(step[0].node, step[1].node);
                    }
                    prop_assert_eq!(route.cost, route.stops.windows(2)
                        .map(|step| travel.distance(step[0].node, step[1].node))
                        .sum::<i64>());
                }

                prop_assert_eq!(position.len(), problem.num_nodes() - 1);
                prop_assert_eq!(solution.total_cost(), total);
                for pair in problem.pairs() {
                    let (pickup_vehicle, pickup_at) = position[&pair.pickup];
                    let (delivery_vehicle, delivery_at) = position[&pair.delivery];
                    prop_assert_eq!(pickup_vehicle, delivery_vehicle);
                    prop_assert!(pickup_at < delivery_at);
                }

                let again = solve(&problem, &travel, settings, options());
                prop_assert_eq!(again.ok(), Some(solution));
            }
            Err(RoutingError::Infeasible { unplaced }) => {
                prop_assert!(!unplaced.is_empty());
                prop_assert!(unplaced.iter().all(|node| *node != problem.depot()));
            }
            Err(other) => prop_assert!(false, "unexpected error {}", other),
        }
    }

    #[test]
    fn orders_within_capacity_on_a_unit_matrix_are_always_placed(
        weights in prop::collection::vec(1i64..50, 1..=3),
    ) {
        let size = 1 + 2 * weights.len();
        let instance = Instance {
            capacities: vec![50; weights.len()],
            weights,
            distances: (0..size)
                .map(|i| (0..size).map(|j| i64::from(i != j)).collect())
                .collect(),
        };
        let problem = instance.problem();

        let solution = solve(&problem, &instance.travel(), TimeSettings::default(), options());
        prop_assert!(solution.is_ok(), "{:?}", solution.err());
    }
}
