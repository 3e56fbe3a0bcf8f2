//! pdptw-planner
//!
//! Capacitated pickup-and-delivery routing with time windows: a validated
//! problem model, capacity and time dimensions, cheapest-insertion
//! construction with local search, and shipment ingestion/reporting around it.

pub mod traits;
pub mod error;
pub mod model;
pub mod haversine;
pub mod travel;
pub mod index;
pub mod dimension;
pub mod routing;
pub mod solver;
pub mod solution;
pub mod extract;
pub mod ingest;
pub mod report;
