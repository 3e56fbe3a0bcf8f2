//! Test fixtures for pdptw-planner.
//!
//! Provides the Brazilian city coordinates used by the shipment dataset and
//! helpers for writing shipment CSV rows.

pub mod brazil_cities;

pub use brazil_cities::*;
