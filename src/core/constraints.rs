use glam::Vec3;

use crate::{
    core::types::{BendingEdge, Edge},
    error::{Result, StoreError},
    utils::allocator::PersistentBuffer,
};

/// Structural edges, bending edges and rest distances.
///
/// Built once from the mesh topology and read-only afterwards. Rest distances
/// are stored in a separate array aligned with `edges` by position.
#[derive(Debug, Clone)]
pub struct ConstraintTables {
    edges: PersistentBuffer<Edge>,
    bending_edges: PersistentBuffer<BendingEdge>,
    rest_distances: PersistentBuffer<f32>,
}

impl Default for ConstraintTables {
    fn default() -> Self {
        Self::empty()
    }
}

impl ConstraintTables {
    /// Empty tables, still counted as allocated so teardown releases them.
    pub fn empty() -> Self {
        Self {
            edges: PersistentBuffer::from_vec(Vec::new()),
            bending_edges: PersistentBuffer::from_vec(Vec::new()),
            rest_distances: PersistentBuffer::from_vec(Vec::new()),
        }
    }

    pub fn new(
        node_count: usize,
        edges: Vec<Edge>,
        rest_distances: Vec<f32>,
        bending_edges: Vec<BendingEdge>,
    ) -> Result<Self> {
        if edges.len() != rest_distances.len() {
            return Err(StoreError::LengthMismatch {
                what: "rest distances",
                expected: edges.len(),
                actual: rest_distances.len(),
            });
        }
        for edge in &edges {
            edge.check(node_count)?;
        }
        for bend in &bending_edges {
            bend.check(node_count)?;
        }

        Ok(Self {
            edges: PersistentBuffer::from_vec(edges),
            bending_edges: PersistentBuffer::from_vec(bending_edges),
            rest_distances: PersistentBuffer::from_vec(rest_distances),
        })
    }

    /// Builds tables whose rest distances are the edge lengths in `rest_positions`.
    pub fn from_rest_positions(
        rest_positions: &[Vec3],
        edges: Vec<Edge>,
        bending_edges: Vec<BendingEdge>,
    ) -> Result<Self> {
        let node_count = rest_positions.len();
        let rest_distances = edges
            .iter()
            .map(|edge| {
                edge.check(node_count)?;
                Ok(rest_positions[edge.a.index()].distance(rest_positions[edge.b.index()]))
            })
            .collect::<Result<Vec<f32>>>()?;
        Self::new(node_count, edges, rest_distances, bending_edges)
    }

    pub fn edges(&self) -> &[Edge] {
        self.edges.as_slice()
    }

    pub fn bending_edges(&self) -> &[BendingEdge] {
        self.bending_edges.as_slice()
    }

    pub fn rest_distances(&self) -> &[f32] {
        self.rest_distances.as_slice()
    }

    /// Edges paired with their rest distance.
    pub fn iter_edges(&self) -> impl Iterator<Item = (Edge, f32)> + '_ {
        self.edges()
            .iter()
            .copied()
            .zip(self.rest_distances().iter().copied())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn bending_edge_count(&self) -> usize {
        self.bending_edges.len()
    }

    pub fn is_created(&self) -> bool {
        self.edges.is_created()
    }

    /// Releases all three tables. Returns how many buffers were freed.
    pub(crate) fn release(&mut self) -> usize {
        [
            self.edges.release(),
            self.bending_edges.release(),
            self.rest_distances.release(),
        ]
        .into_iter()
        .filter(|released| *released)
        .count()
    }
}
