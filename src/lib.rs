//! Cloth State – simulation state storage for cloth physics.
//!
//! This crate owns the per-node and per-constraint buffers a cloth solver
//! reads and writes, a spatial hash for self-collision broad-phase, and a
//! sparse map of pinned nodes. Working buffers belong to the solver; once per
//! step [`ClothState::publish`] copies them into mirrors that consumers read
//! through [`Snapshot`]s, so a reader never sees half of a step.

pub mod collision;
pub mod config;
pub mod core;
pub mod error;
pub mod store;
pub mod utils;

pub use glam::{IVec3, Vec3};

pub use collision::SelfCollisionRegions;
pub use config::ClothStateConfig;
pub use crate::core::{
    constraints::ConstraintTables,
    neighbours::NeighbourIndex,
    pinned::{GrowthPolicy, PinnedPositions},
    types::{BendingEdge, Edge, NodeId, MAX_NODES},
};
pub use error::{Result, StoreError};
pub use store::{
    ClothState, ClothStateBuilder, Snapshot, SnapshotReader, SolverView, TeardownReport,
};
pub use utils::{allocator::PersistentBuffer, profiling::PublishProfile};
