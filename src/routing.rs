//! Routing model: a problem bound to its index layout, arc cost and dimensions.

use crate::dimension::{Dimension, TimeSettings};
use crate::error::RoutingError;
use crate::index::RoutingIndexManager;
use crate::model::ProblemModel;
use crate::traits::CostFunction;
use crate::travel::TravelMatrix;

pub const CAPACITY: &str = "Capacity";
pub const TIME: &str = "Time";

pub struct RoutingModel<'a> {
    problem: &'a ProblemModel,
    manager: RoutingIndexManager,
    arc_cost: &'a dyn CostFunction,
    dimensions: Vec<Dimension<'a>>,
}

impl<'a> RoutingModel<'a> {
    /// Model with an arc cost and no dimensions.
    pub fn new(problem: &'a ProblemModel, arc_cost: &'a dyn CostFunction) -> Self {
        let manager =
            RoutingIndexManager::new(problem.num_nodes(), problem.num_vehicles(), problem.depot());
        Self {
            problem,
            manager,
            arc_cost,
            dimensions: Vec::new(),
        }
    }

    /// Model with travel distance as arc cost, a Capacity dimension and a Time
    /// dimension narrowed to every node's time window.
    pub fn with_standard_dimensions(
        problem: &'a ProblemModel,
        travel: &'a TravelMatrix,
        settings: TimeSettings,
    ) -> Result<Self, RoutingError> {
        if !travel.is_square(problem.num_nodes()) {
            return Err(RoutingError::invalid(format!(
                "travel matrix has {} rows for {} nodes",
                travel.size(),
                problem.num_nodes()
            )));
        }
        if settings.lower_bound > settings.horizon {
            return Err(RoutingError::invalid(format!(
                "time lower bound {} exceeds horizon {}",
                settings.lower_bound, settings.horizon
            )));
        }

        let mut model = Self::new(problem, travel);
        let capacity =
            Dimension::capacity(CAPACITY, &model.manager, problem, problem.vehicle_capacities());
        let time = Dimension::time(TIME, &model.manager, travel, settings);
        model.add_dimension(capacity)?;
        model.add_dimension(time)?;
        model.apply_time_windows(TIME)?;
        Ok(model)
    }

    pub fn add_dimension(&mut self, dimension: Dimension<'a>) -> Result<(), RoutingError> {
        if self.dimension(dimension.name()).is_some() {
            return Err(RoutingError::invalid(format!(
                "dimension '{}' registered twice",
                dimension.name()
            )));
        }
        self.dimensions.push(dimension);
        Ok(())
    }

    /// Intersects the cumul range of every traversal index with the time
    /// window of its node. The depot window applies to all start and end
    /// indices.
    pub fn apply_time_windows(&mut self, name: &str) -> Result<(), RoutingError> {
        let problem = self.problem;
        let manager = &self.manager;
        let dimension = self
            .dimensions
            .iter_mut()
            .find(|dimension| dimension.name() == name)
            .ok_or_else(|| RoutingError::invalid(format!("unknown dimension '{}'", name)))?;

        for index in 0..manager.num_indices() {
            let window = problem.time_window(manager.index_to_node(index));
            dimension.set_range(index, window.earliest, window.latest);
        }
        Ok(())
    }

    pub fn problem(&self) -> &'a ProblemModel {
        self.problem
    }

    pub fn manager(&self) -> &RoutingIndexManager {
        &self.manager
    }

    pub fn dimensions(&self) -> &[Dimension<'a>] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension<'a>> {
        self.dimensions.iter().find(|dimension| dimension.name() == name)
    }

    pub fn dimension_position(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|dimension| dimension.name() == name)
    }

    pub fn arc_cost(&self, from: usize, to: usize) -> i64 {
        self.arc_cost
            .cost(self.manager.index_to_node(from), self.manager.index_to_node(to))
    }

    /// Total arc cost along a traversal path.
    pub fn route_cost(&self, path: &[usize]) -> i64 {
        path.windows(2).map(|arc| self.arc_cost(arc[0], arc[1])).sum()
    }
}
