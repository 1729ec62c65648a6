use crate::{
    core::types::{Edge, NodeId},
    error::Result,
    utils::allocator::PersistentBuffer,
};

/// Multi-valued mapping from a node to its neighbouring nodes.
///
/// Stored compressed: `offsets[i]..offsets[i + 1]` is the slice of `targets`
/// holding the neighbours of node `i`. Entries are directed, so node `a`
/// listing `b` says nothing about `b` listing `a`.
#[derive(Debug, Clone)]
pub struct NeighbourIndex {
    offsets: PersistentBuffer<u32>,
    targets: PersistentBuffer<NodeId>,
}

impl Default for NeighbourIndex {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl NeighbourIndex {
    /// Index over `node_count` nodes with no neighbours at all.
    pub fn empty(node_count: usize) -> Self {
        Self {
            offsets: PersistentBuffer::from_vec(vec![0; node_count + 1]),
            targets: PersistentBuffer::from_vec(Vec::new()),
        }
    }

    /// Builds the index from directed `(source, neighbour)` pairs.
    /// Neighbours keep the order in which they were supplied.
    pub fn from_pairs<I>(node_count: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        let pairs: Vec<(NodeId, NodeId)> = pairs.into_iter().collect();

        let mut counts = vec![0_u32; node_count + 1];
        for &(source, target) in &pairs {
            source.check(node_count)?;
            target.check(node_count)?;
            counts[source.index() + 1] += 1;
        }
        for i in 1..counts.len() {
            counts[i] += counts[i - 1];
        }

        let mut cursor = counts.clone();
        let mut targets = vec![NodeId::default(); pairs.len()];
        for (source, target) in pairs {
            let slot = &mut cursor[source.index()];
            targets[*slot as usize] = target;
            *slot += 1;
        }

        Ok(Self {
            offsets: PersistentBuffer::from_vec(counts),
            targets: PersistentBuffer::from_vec(targets),
        })
    }

    /// Builds a symmetric index from structural edges, listing each edge
    /// under both of its end points. Duplicate edges produce duplicate entries.
    pub fn from_edges(node_count: usize, edges: &[Edge]) -> Result<Self> {
        Self::from_pairs(
            node_count,
            edges
                .iter()
                .flat_map(|edge| [(edge.a, edge.b), (edge.b, edge.a)]),
        )
    }

    pub fn neighbours(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbour_slice(node).iter().copied()
    }

    pub fn neighbour_count(&self, node: NodeId) -> usize {
        self.neighbour_slice(node).len()
    }

    pub fn contains(&self, node: NodeId, neighbour: NodeId) -> bool {
        self.neighbour_slice(node).contains(&neighbour)
    }

    pub fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Total number of directed entries.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_created(&self) -> bool {
        self.offsets.is_created()
    }

    fn neighbour_slice(&self, node: NodeId) -> &[NodeId] {
        let offsets = self.offsets.as_slice();
        let index = node.index();
        debug_assert!(index < self.node_count(), "neighbour lookup for {node} out of range");
        match (offsets.get(index), offsets.get(index + 1)) {
            (Some(&start), Some(&end)) => &self.targets.as_slice()[start as usize..end as usize],
            _ => &[],
        }
    }

    pub(crate) fn release(&mut self) -> usize {
        usize::from(self.offsets.release()) + usize::from(self.targets.release())
    }
}
