use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::NodeId;

/// How the pinned map grows when an insert exceeds its capacity.
/// Capacity never shrinks under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrowthPolicy {
    /// Double the capacity until the new entry fits.
    #[default]
    Doubling,
    /// Grow to exactly the number of entries held.
    Exact,
}

impl GrowthPolicy {
    fn grown(self, current: usize, required: usize) -> usize {
        match self {
            Self::Doubling => {
                let mut capacity = current.max(1);
                while capacity < required {
                    capacity *= 2;
                }
                capacity
            }
            Self::Exact => required.max(current),
        }
    }
}

/// Sparse map from node to a fixed world position overriding integration.
#[derive(Debug, Clone, Default)]
pub struct PinnedPositions {
    entries: HashMap<NodeId, Vec3>,
    capacity: usize,
    growth: GrowthPolicy,
    /// Exclusive upper bound of every key ever inserted.
    key_bound: usize,
}

impl PinnedPositions {
    pub fn with_capacity(capacity: usize, growth: GrowthPolicy) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
            growth,
            key_bound: 0,
        }
    }

    /// Logical capacity. Only ever grows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn growth(&self) -> GrowthPolicy {
        self.growth
    }

    /// Grows the capacity to at least `capacity`.
    pub fn reserve_total(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        self.entries
            .reserve(capacity.saturating_sub(self.entries.len()));
        self.capacity = capacity;
    }

    /// Pins `node` at `position`, returning the previous pin if any.
    pub fn insert(&mut self, node: NodeId, position: Vec3) -> Option<Vec3> {
        if !self.entries.contains_key(&node) && self.entries.len() >= self.capacity {
            let grown = self.growth.grown(self.capacity, self.entries.len() + 1);
            log::debug!(
                "pinned map grows from {} to {} entries ({:?})",
                self.capacity,
                grown,
                self.growth
            );
            self.reserve_total(grown);
        }
        self.key_bound = self.key_bound.max(node.index() + 1);
        self.entries.insert(node, position)
    }

    pub fn remove(&mut self, node: NodeId) -> Option<Vec3> {
        self.entries.remove(&node)
    }

    pub fn get(&self, node: NodeId) -> Option<Vec3> {
        self.entries.get(&node).copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Vec3)> + '_ {
        self.entries.iter().map(|(&node, &position)| (node, position))
    }

    /// Removes every pin while keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn entries(&self) -> &HashMap<NodeId, Vec3> {
        &self.entries
    }

    pub(crate) fn key_bound(&self) -> usize {
        self.key_bound
    }

    /// Raw access for bulk copies. The caller keeps `key_bound` in sync.
    pub(crate) fn entries_mut(&mut self) -> &mut HashMap<NodeId, Vec3> {
        &mut self.entries
    }

    pub(crate) fn set_key_bound(&mut self, key_bound: usize) {
        self.key_bound = self.key_bound.max(key_bound);
    }

    /// Writes each pinned position into `positions` and stops the node by
    /// zeroing its velocity. Pins outside the slices are ignored.
    pub fn apply_overrides(&self, positions: &mut [Vec3], velocities: &mut [Vec3]) {
        for (&node, &position) in &self.entries {
            let index = node.index();
            if let Some(slot) = positions.get_mut(index) {
                *slot = position;
            }
            if let Some(slot) = velocities.get_mut(index) {
                *slot = Vec3::ZERO;
            }
        }
    }

    /// Releases the backing storage. The map stays usable but empty.
    pub(crate) fn release(&mut self) {
        self.entries = HashMap::new();
        self.key_bound = 0;
    }
}
