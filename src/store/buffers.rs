use glam::Vec3;

use crate::utils::allocator::PersistentBuffer;

/// Writer-only per-node state, all arrays of length `N`.
#[derive(Debug)]
pub(crate) struct NodeBuffers {
    pub positions: PersistentBuffer<Vec3>,
    pub velocities: PersistentBuffer<Vec3>,
    pub accelerations: PersistentBuffer<Vec3>,
    pub temp_accelerations: PersistentBuffer<Vec3>,
    /// Reciprocal of node mass; `0.0` marks an immovable node.
    pub inverse_masses: PersistentBuffer<f32>,
}

impl NodeBuffers {
    pub fn new(positions: Vec<Vec3>, velocities: Vec<Vec3>, inverse_masses: Vec<f32>) -> Self {
        let node_count = positions.len();
        debug_assert_eq!(velocities.len(), node_count);
        debug_assert_eq!(inverse_masses.len(), node_count);
        Self {
            positions: PersistentBuffer::from_vec(positions),
            velocities: PersistentBuffer::from_vec(velocities),
            accelerations: PersistentBuffer::allocate(node_count),
            temp_accelerations: PersistentBuffer::allocate(node_count),
            inverse_masses: PersistentBuffer::from_vec(inverse_masses),
        }
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    pub fn release(&mut self) -> usize {
        [
            self.positions.release(),
            self.velocities.release(),
            self.accelerations.release(),
            self.temp_accelerations.release(),
            self.inverse_masses.release(),
        ]
        .into_iter()
        .filter(|released| *released)
        .count()
    }
}

/// Vertex and triangle normals. Filled by the normal-recomputation pass,
/// owned and released by the store.
#[derive(Debug)]
pub(crate) struct NormalBuffers {
    pub normals: PersistentBuffer<Vec3>,
    pub triangle_normals: PersistentBuffer<Vec3>,
}

impl NormalBuffers {
    pub fn new(node_count: usize, triangle_count: usize) -> Self {
        Self {
            normals: PersistentBuffer::allocate(node_count),
            triangle_normals: PersistentBuffer::allocate(triangle_count),
        }
    }

    pub fn release(&mut self) -> usize {
        usize::from(self.normals.release()) + usize::from(self.triangle_normals.release())
    }
}
