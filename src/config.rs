//! Configuration for a cloth state store.

use serde::{Deserialize, Serialize};

use crate::core::pinned::GrowthPolicy;
use crate::core::types::MAX_NODES;
use crate::error::{Result, StoreError};

/// Default number of pinned entries the working map can hold before growing.
pub const DEFAULT_PINNED_CAPACITY: usize = 16;

/// Default edge length of a self-collision spatial hash cell.
pub const DEFAULT_SELF_COLLISION_CELL_SIZE: f32 = 0.05;

/// Number of pinned-map slots handled by one scatter-copy batch during publish.
pub const DEFAULT_PUBLISH_BATCH_SIZE: usize = 256;

/// Construction parameters, fixed for the lifetime of a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothStateConfig {
    pub node_count: usize,
    pub pinned_capacity: usize,
    pub pinned_growth: GrowthPolicy,
    pub self_collision: bool,
    pub self_collision_cell_size: f32,
    pub publish_batch_size: usize,
    /// Publishes slower than this many milliseconds log a warning.
    pub publish_budget_ms: Option<f32>,
}

impl Default for ClothStateConfig {
    fn default() -> Self {
        Self {
            node_count: 0,
            pinned_capacity: DEFAULT_PINNED_CAPACITY,
            pinned_growth: GrowthPolicy::default(),
            self_collision: false,
            self_collision_cell_size: DEFAULT_SELF_COLLISION_CELL_SIZE,
            publish_batch_size: DEFAULT_PUBLISH_BATCH_SIZE,
            publish_budget_ms: None,
        }
    }
}

impl ClothStateConfig {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    pub fn with_pinned_capacity(mut self, capacity: usize) -> Self {
        self.pinned_capacity = capacity;
        self
    }

    pub fn with_pinned_growth(mut self, growth: GrowthPolicy) -> Self {
        self.pinned_growth = growth;
        self
    }

    pub fn with_self_collision(mut self, enabled: bool) -> Self {
        self.self_collision = enabled;
        self
    }

    pub fn with_self_collision_cell_size(mut self, cell_size: f32) -> Self {
        self.self_collision_cell_size = cell_size;
        self
    }

    pub fn with_publish_batch_size(mut self, batch_size: usize) -> Self {
        self.publish_batch_size = batch_size;
        self
    }

    pub fn with_publish_budget_ms(mut self, budget_ms: f32) -> Self {
        self.publish_budget_ms = Some(budget_ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_count > MAX_NODES {
            return Err(StoreError::TooManyNodes {
                requested: self.node_count,
                max: MAX_NODES,
            });
        }
        if self.publish_batch_size == 0 {
            return Err(StoreError::InvalidConfig(
                "publish batch size must be at least 1".to_string(),
            ));
        }
        if self.self_collision
            && !(self.self_collision_cell_size.is_finite() && self.self_collision_cell_size > 0.0)
        {
            return Err(StoreError::InvalidConfig(format!(
                "self-collision cell size must be positive and finite, got {}",
                self.self_collision_cell_size
            )));
        }
        if let Some(budget_ms) = self.publish_budget_ms {
            if !(budget_ms.is_finite() && budget_ms >= 0.0) {
                return Err(StoreError::InvalidConfig(format!(
                    "publish budget must be non-negative and finite, got {budget_ms}"
                )));
            }
        }
        Ok(())
    }
}
