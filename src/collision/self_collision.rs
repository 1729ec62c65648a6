use std::collections::{HashMap, HashSet};

use glam::{IVec3, Vec3};

use crate::core::types::{NodeId, MAX_NODES};

/// Sparse spatial hash used for the self-collision broad-phase.
///
/// Maps a quantized cell to the nodes inside it. A companion set tracks the
/// cells that currently hold at least one node so scans only touch
/// populated space.
#[derive(Debug, Clone)]
pub struct SelfCollisionRegions {
    inv_cell_size: f32,
    regions: HashMap<IVec3, Vec<NodeId>>,
    utilized: HashSet<IVec3>,
}

impl SelfCollisionRegions {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = cell_size.max(1e-6);
        Self {
            inv_cell_size: 1.0 / cell_size,
            regions: HashMap::new(),
            utilized: HashSet::new(),
        }
    }

    pub fn with_capacity(cell_size: f32, cells: usize) -> Self {
        let mut regions = Self::new(cell_size);
        regions.regions.reserve(cells);
        regions.utilized.reserve(cells);
        regions
    }

    pub fn cell_size(&self) -> f32 {
        1.0 / self.inv_cell_size
    }

    /// Quantizes a world position into its cell.
    pub fn cell_of(&self, position: Vec3) -> IVec3 {
        (position * self.inv_cell_size).floor().as_ivec3()
    }

    /// Adds `node` to `cell`. Returns `false` if it was already there.
    pub fn insert(&mut self, cell: IVec3, node: NodeId) -> bool {
        let nodes = self.regions.entry(cell).or_default();
        if nodes.contains(&node) {
            return false;
        }
        nodes.push(node);
        self.utilized.insert(cell);
        true
    }

    /// Adds `node` to the cell containing `position` and returns that cell.
    pub fn insert_at(&mut self, position: Vec3, node: NodeId) -> IVec3 {
        let cell = self.cell_of(position);
        self.insert(cell, node);
        cell
    }

    /// Removes `node` from `cell`. An emptied cell leaves the utilized set.
    pub fn remove(&mut self, cell: IVec3, node: NodeId) -> bool {
        let Some(nodes) = self.regions.get_mut(&cell) else {
            return false;
        };
        let Some(slot) = nodes.iter().position(|&n| n == node) else {
            return false;
        };
        nodes.swap_remove(slot);
        if nodes.is_empty() {
            self.regions.remove(&cell);
            self.utilized.remove(&cell);
        }
        true
    }

    pub fn contains(&self, cell: IVec3, node: NodeId) -> bool {
        self.nodes_in(cell).contains(&node)
    }

    pub fn nodes_in(&self, cell: IVec3) -> &[NodeId] {
        self.regions.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_utilized(&self, cell: IVec3) -> bool {
        self.utilized.contains(&cell)
    }

    pub fn utilized_cells(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.utilized.iter().copied()
    }

    pub fn utilized_count(&self) -> usize {
        self.utilized.len()
    }

    /// Empties every cell, keeping allocations for the next rebuild.
    pub fn clear(&mut self) {
        self.regions.clear();
        self.utilized.clear();
    }

    /// Clears the hash and bins every node by its position.
    pub fn rebuild(&mut self, positions: &[Vec3]) {
        debug_assert!(
            positions.len() <= MAX_NODES,
            "{} positions exceed the 16-bit node id range",
            positions.len()
        );
        self.clear();
        for (index, &position) in positions.iter().take(MAX_NODES).enumerate() {
            let node = NodeId(index as u16);
            let cell = self.cell_of(position);
            self.regions.entry(cell).or_default().push(node);
            self.utilized.insert(cell);
        }
    }

    /// Nodes in `cell` and its 26 neighbouring cells, each reported once in id order.
    pub fn nodes_near(&self, cell: IVec3) -> impl Iterator<Item = NodeId> + '_ {
        let mut nodes: Vec<NodeId> = neighbourhood(cell)
            .filter(|c| self.utilized.contains(c))
            .flat_map(|c| self.nodes_in(c).iter().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes.into_iter()
    }

    /// Broad-phase candidate pairs from shared and adjacent cells.
    ///
    /// Walks only utilized cells. Each unordered pair is reported once with
    /// the lower id first. A node spanning several cells never pairs with itself.
    pub fn candidate_pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();

        for &cell in &self.utilized {
            let nodes = self.nodes_in(cell);

            for i in 0..nodes.len() {
                for j in (i + 1)..nodes.len() {
                    if nodes[i] != nodes[j] {
                        pairs.push(ordered(nodes[i], nodes[j]));
                    }
                }
            }

            // Only look at neighbours with a greater key so each cell pair is visited once.
            for other in neighbourhood(cell) {
                if other.to_array() <= cell.to_array() || !self.utilized.contains(&other) {
                    continue;
                }
                for &a in nodes {
                    for &b in self.nodes_in(other) {
                        if a != b {
                            pairs.push(ordered(a, b));
                        }
                    }
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub(crate) fn release(&mut self) {
        self.regions = HashMap::new();
        self.utilized = HashSet::new();
    }
}

fn neighbourhood(cell: IVec3) -> impl Iterator<Item = IVec3> {
    (-1..=1).flat_map(move |x| {
        (-1..=1).flat_map(move |y| (-1..=1).map(move |z| cell + IVec3::new(x, y, z)))
    })
}

fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilized_set_follows_cell_occupancy() {
        let mut hash = SelfCollisionRegions::new(1.0);
        let cell = IVec3::new(2, -1, 0);

        assert!(hash.insert(cell, NodeId(0)));
        assert!(hash.is_utilized(cell));

        assert!(hash.remove(cell, NodeId(0)));
        assert!(!hash.is_utilized(cell));
        assert!(hash.nodes_in(cell).is_empty());
    }

    #[test]
    fn cell_stays_utilized_until_last_node_leaves() {
        let mut hash = SelfCollisionRegions::new(1.0);
        let cell = IVec3::ZERO;
        hash.insert(cell, NodeId(0));
        hash.insert(cell, NodeId(1));

        hash.remove(cell, NodeId(0));
        assert!(hash.is_utilized(cell));
        hash.remove(cell, NodeId(1));
        assert_eq!(hash.utilized_count(), 0);
    }

    #[test]
    fn duplicate_insert_and_missing_remove_are_rejected() {
        let mut hash = SelfCollisionRegions::new(1.0);
        assert!(hash.insert(IVec3::ZERO, NodeId(4)));
        assert!(!hash.insert(IVec3::ZERO, NodeId(4)));
        assert_eq!(hash.nodes_in(IVec3::ZERO).len(), 1);
        assert!(!hash.remove(IVec3::ONE, NodeId(4)));
        assert!(!hash.remove(IVec3::ZERO, NodeId(5)));
    }

    #[test]
    fn quantization_floors_negative_coordinates() {
        let hash = SelfCollisionRegions::new(0.5);
        assert_eq!(hash.cell_of(Vec3::new(0.74, -0.1, 1.0)), IVec3::new(1, -1, 2));
    }

    #[test]
    fn rebuild_bins_every_node() {
        let mut hash = SelfCollisionRegions::new(1.0);
        hash.insert(IVec3::splat(9), NodeId(7));
        hash.rebuild(&[Vec3::ZERO, Vec3::new(0.5, 0.5, 0.5), Vec3::new(3.0, 0.0, 0.0)]);

        assert!(!hash.is_utilized(IVec3::splat(9)));
        assert_eq!(hash.nodes_in(IVec3::ZERO), &[NodeId(0), NodeId(1)]);
        assert_eq!(hash.utilized_count(), 2);
    }

    #[test]
    fn nodes_near_covers_adjacent_cells_only() {
        let mut hash = SelfCollisionRegions::new(1.0);
        hash.insert(IVec3::ZERO, NodeId(0));
        hash.insert(IVec3::new(1, 1, 1), NodeId(1));
        hash.insert(IVec3::new(2, 0, 0), NodeId(2));

        let mut near: Vec<NodeId> = hash.nodes_near(IVec3::ZERO).collect();
        near.sort();
        assert_eq!(near, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    fn candidate_pairs_are_unique_and_local() {
        let mut hash = SelfCollisionRegions::new(1.0);
        hash.insert(IVec3::ZERO, NodeId(0));
        hash.insert(IVec3::ZERO, NodeId(3));
        hash.insert(IVec3::new(0, 1, 0), NodeId(1));
        hash.insert(IVec3::new(5, 5, 5), NodeId(2));

        let pairs = hash.candidate_pairs();
        assert_eq!(
            pairs,
            vec![(NodeId(0), NodeId(1)), (NodeId(0), NodeId(3)), (NodeId(1), NodeId(3))]
        );
    }

    #[test]
    fn node_spanning_adjacent_cells_never_pairs_with_itself() {
        let mut hash = SelfCollisionRegions::new(1.0);
        hash.insert(IVec3::ZERO, NodeId(0));
        hash.insert(IVec3::X, NodeId(0));
        hash.insert(IVec3::X, NodeId(1));

        assert_eq!(hash.candidate_pairs(), vec![(NodeId(0), NodeId(1))]);
        let near: Vec<NodeId> = hash.nodes_near(IVec3::ZERO).collect();
        assert_eq!(near, vec![NodeId(0), NodeId(1)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "16-bit node id range")]
    fn rebuild_rejects_more_positions_than_node_ids() {
        let mut hash = SelfCollisionRegions::new(1.0);
        hash.rebuild(&vec![Vec3::ZERO; MAX_NODES + 1]);
    }
}
