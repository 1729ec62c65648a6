//! Error types for cloth state setup.
//!
//! Only topology and configuration setup is fallible. Once a [`ClothState`](crate::ClothState)
//! exists, simulation-time operations do not report errors.

use std::fmt;

/// Main error type for the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Requested node count does not fit the 16-bit node id space.
    TooManyNodes { requested: usize, max: usize },
    /// A constraint or neighbour entry references a node outside `[0, N)`.
    NodeOutOfRange { node: usize, node_count: usize },
    /// Two arrays that must be aligned have different lengths.
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// A configuration value is unusable.
    InvalidConfig(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TooManyNodes { requested, max } => {
                write!(f, "Too many nodes: {requested} requested, at most {max} supported")
            }
            Self::NodeOutOfRange { node, node_count } => {
                write!(f, "Node {node} out of range for {node_count} nodes")
            }
            Self::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "Length mismatch for {what}: expected {expected}, got {actual}"),
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Convenient Result type alias for setup operations.
pub type Result<T> = std::result::Result<T, StoreError>;
