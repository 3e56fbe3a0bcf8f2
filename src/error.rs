//! Error type shared by the model, the search engine and ingestion.

use std::fmt;
use std::io;

use crate::model::NodeId;

#[derive(Debug)]
pub enum RoutingError {
    /// The problem description is structurally inconsistent.
    InvalidInstance(String),
    /// A city/state pair is missing from the coordinate table.
    UnresolvableLocation { city: String },
    /// No assignment of every node satisfies capacity and time bounds.
    Infeasible { unplaced: Vec<NodeId> },
    /// The caller cancelled the search before a feasible solution existed.
    Cancelled,
    Io(io::Error),
    Csv(csv::Error),
}

impl RoutingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RoutingError::InvalidInstance(message.into())
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, RoutingError::Infeasible { .. })
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::InvalidInstance(message) => write!(f, "invalid instance: {}", message),
            RoutingError::UnresolvableLocation { city } => {
                write!(f, "no coordinates known for '{}'", city)
            }
            RoutingError::Infeasible { unplaced } => {
                write!(f, "no feasible routing ({} nodes unplaced)", unplaced.len())
            }
            RoutingError::Cancelled => write!(f, "search cancelled before a solution was found"),
            RoutingError::Io(err) => write!(f, "i/o error: {}", err),
            RoutingError::Csv(err) => write!(f, "csv error: {}", err),
        }
    }
}

impl std::error::Error for RoutingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoutingError::Io(err) => Some(err),
            RoutingError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for RoutingError {
    fn from(err: io::Error) -> Self {
        RoutingError::Io(err)
    }
}

impl From<csv::Error> for RoutingError {
    fn from(err: csv::Error) -> Self {
        RoutingError::Csv(err)
    }
}
