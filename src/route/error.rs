use std::fmt::{Display, Formatter};

/// Errors raised while building or querying the road graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A node with this identifier is already registered.
    NodeExists(String),
    /// An edge with this identifier is already registered.
    EdgeExists(String),
    /// No node with this identifier is registered.
    NodeNotFound(String),
    /// No edge with this identifier is registered.
    EdgeNotFound(String),
    /// The target was not settled within the travel-cost budget. Routine
    /// for budgeted queries; the matcher scores it as an invalid
    /// transition rather than an abort.
    NodeNotReachable { source: String, target: String },
}

impl Display for RouteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteError::NodeExists(id) => write!(f, "node {id} already exists"),
            RouteError::EdgeExists(id) => write!(f, "edge {id} already exists"),
            RouteError::NodeNotFound(id) => write!(f, "node {id} not found"),
            RouteError::EdgeNotFound(id) => write!(f, "edge {id} not found"),
            RouteError::NodeNotReachable { source, target } => {
                write!(f, "node {target} not reachable from {source} within budget")
            }
        }
    }
}

impl std::error::Error for RouteError {}

/// Errors raised by the map matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// No observation in the trajectory could be matched to the network,
    /// even after gap splitting.
    NoPathFound,
}

impl Display for MatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::NoPathFound => write!(f, "no path found"),
        }
    }
}

impl std::error::Error for MatchError {}
