//! Core data: node ids, constraint tables, neighbour index and pinned overrides.

pub mod constraints;
pub mod neighbours;
pub mod pinned;
pub mod types;

pub use constraints::ConstraintTables;
pub use neighbours::NeighbourIndex;
pub use pinned::{GrowthPolicy, PinnedPositions};
pub use types::{BendingEdge, Edge, NodeId, MAX_NODES};
