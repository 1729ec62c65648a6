use std::sync::Arc;

use glam::Vec3;
use parking_lot::{RwLock, RwLockReadGuard};

use crate::{
    core::{pinned::PinnedPositions, types::NodeId},
    utils::allocator::PersistentBuffer,
};

/// Reader-visible copies of the working state, refreshed only by publish.
#[derive(Debug, Default)]
pub(crate) struct MirrorSet {
    pub positions: PersistentBuffer<Vec3>,
    pub velocities: PersistentBuffer<Vec3>,
    pub inverse_masses: PersistentBuffer<f32>,
    pub pinned: Option<PinnedPositions>,
    pub publish_count: u64,
}

impl MirrorSet {
    pub fn is_prepared(&self) -> bool {
        self.positions.is_created()
            && self.velocities.is_created()
            && self.inverse_masses.is_created()
            && self.pinned.is_some()
    }

    /// Releases whichever mirrors were created. Returns how many were freed.
    pub fn release(&mut self) -> usize {
        let mut released = 0;
        for buffer in [&mut self.positions, &mut self.velocities] {
            if buffer.is_created() {
                released += usize::from(buffer.release());
            }
        }
        if self.inverse_masses.is_created() {
            released += usize::from(self.inverse_masses.release());
        }
        if let Some(mut pinned) = self.pinned.take() {
            pinned.release();
            released += 1;
        }
        released
    }
}

/// Cloneable handle for consumers on any thread.
///
/// Every [`Snapshot`] taken from it reflects exactly one completed publish.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    mirrors: Arc<RwLock<MirrorSet>>,
}

impl SnapshotReader {
    pub(crate) fn new(mirrors: Arc<RwLock<MirrorSet>>) -> Self {
        Self { mirrors }
    }

    /// Blocks while a publish is in progress, then holds the snapshot
    /// steady until the returned guard is dropped.
    pub fn read(&self) -> Snapshot<'_> {
        Snapshot {
            mirrors: self.mirrors.read(),
        }
    }
}

/// Read guard over the mirrors. Publishing waits until it is dropped.
pub struct Snapshot<'a> {
    mirrors: RwLockReadGuard<'a, MirrorSet>,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(mirrors: RwLockReadGuard<'a, MirrorSet>) -> Self {
        Self { mirrors }
    }

    /// `false` until mirrors have been allocated, and again after teardown.
    pub fn is_prepared(&self) -> bool {
        self.mirrors.is_prepared()
    }

    /// Number of publishes completed so far.
    pub fn publish_count(&self) -> u64 {
        self.mirrors.publish_count
    }

    pub fn node_count(&self) -> usize {
        self.mirrors.positions.len()
    }

    // Mirrors read as empty until prepared.

    pub fn positions(&self) -> &[Vec3] {
        self.mirrors.positions.get().unwrap_or(&[])
    }

    pub fn velocities(&self) -> &[Vec3] {
        self.mirrors.velocities.get().unwrap_or(&[])
    }

    pub fn inverse_masses(&self) -> &[f32] {
        self.mirrors.inverse_masses.get().unwrap_or(&[])
    }

    pub fn pinned(&self) -> Option<&PinnedPositions> {
        self.mirrors.pinned.as_ref()
    }

    pub fn pinned_position(&self, node: NodeId) -> Option<Vec3> {
        self.pinned().and_then(|pinned| pinned.get(node))
    }

    pub fn pinned_count(&self) -> usize {
        self.pinned().map_or(0, PinnedPositions::len)
    }
}
