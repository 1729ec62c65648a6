//! Collision acceleration structures.

pub mod self_collision;

pub use self_collision::SelfCollisionRegions;
