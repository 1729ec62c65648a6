use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Largest node count a store can hold; node ids are 16 bits wide.
pub const MAX_NODES: usize = u16::MAX as usize + 1;

/// Index of a cloth node in `[0, N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u16);

impl NodeId {
    pub fn new(index: u16) -> Self {
        Self(index)
    }

    /// Converts a buffer index into a node id, failing if it does not fit.
    pub fn from_index(index: usize) -> Result<Self> {
        u16::try_from(index)
            .map(Self)
            .map_err(|_| StoreError::TooManyNodes {
                requested: index + 1,
                max: MAX_NODES,
            })
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn check(self, node_count: usize) -> Result<()> {
        if self.index() < node_count {
            Ok(())
        } else {
            Err(StoreError::NodeOutOfRange {
                node: self.index(),
                node_count,
            })
        }
    }
}

impl From<u16> for NodeId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural constraint between two nodes. Its rest distance lives in a
/// parallel array of the constraint tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    pub fn new(a: u16, b: u16) -> Self {
        Self {
            a: NodeId(a),
            b: NodeId(b),
        }
    }

    pub fn is_valid_for(&self, node_count: usize) -> bool {
        self.a.index() < node_count && self.b.index() < node_count
    }

    pub(crate) fn check(&self, node_count: usize) -> Result<()> {
        self.a.check(node_count)?;
        self.b.check(node_count)
    }
}

/// Bending constraint across the shared edge `a`-`b` of two adjacent triangles.
/// `wing_a` and `wing_b` are the vertices opposite the shared edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BendingEdge {
    pub a: NodeId,
    pub b: NodeId,
    pub wing_a: NodeId,
    pub wing_b: NodeId,
}

impl BendingEdge {
    pub fn new(a: u16, b: u16, wing_a: u16, wing_b: u16) -> Self {
        Self {
            a: NodeId(a),
            b: NodeId(b),
            wing_a: NodeId(wing_a),
            wing_b: NodeId(wing_b),
        }
    }

    pub fn nodes(&self) -> [NodeId; 4] {
        [self.a, self.b, self.wing_a, self.wing_b]
    }

    pub fn shared_edge(&self) -> Edge {
        Edge {
            a: self.a,
            b: self.b,
        }
    }

    pub fn is_valid_for(&self, node_count: usize) -> bool {
        self.nodes().iter().all(|node| node.index() < node_count)
    }

    pub(crate) fn check(&self, node_count: usize) -> Result<()> {
        self.nodes()
            .iter()
            .try_for_each(|node| node.check(node_count))
    }
}
