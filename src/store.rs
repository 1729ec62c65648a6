//! The cloth state store: working buffers, mirrors and their lifecycle.

mod buffers;
mod mirror;
mod scatter;

pub use mirror::{Snapshot, SnapshotReader};

use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::{
    collision::self_collision::SelfCollisionRegions,
    config::ClothStateConfig,
    core::{
        constraints::ConstraintTables,
        neighbours::NeighbourIndex,
        pinned::PinnedPositions,
        types::NodeId,
    },
    error::{Result, StoreError},
    utils::{
        logging::{warn_if_publish_budget_exceeded, PhaseTimer},
        profiling::PublishProfile,
    },
};

use buffers::{NodeBuffers, NormalBuffers};
use mirror::MirrorSet;

/// Owns every buffer of one cloth simulation.
///
/// The solver mutates the working buffers through `&mut` access. Consumers
/// read the mirrors through [`ClothState::snapshot`] or a [`SnapshotReader`],
/// which only change during [`ClothState::publish`].
pub struct ClothState {
    config: ClothStateConfig,
    nodes: NodeBuffers,
    normals: NormalBuffers,
    constraints: ConstraintTables,
    neighbours: NeighbourIndex,
    pinned: PinnedPositions,
    self_collision: Option<SelfCollisionRegions>,
    mirrors: Arc<RwLock<MirrorSet>>,
    profile: PublishProfile,
    torn_down: bool,
}

/// Disjoint mutable borrows of the working state handed to the solver for one step.
pub struct SolverView<'a> {
    pub positions: &'a mut [Vec3],
    pub velocities: &'a mut [Vec3],
    pub accelerations: &'a mut [Vec3],
    pub temp_accelerations: &'a mut [Vec3],
    pub inverse_masses: &'a mut [f32],
    pub pinned: &'a mut PinnedPositions,
    pub self_collision: Option<&'a mut SelfCollisionRegions>,
    pub constraints: &'a ConstraintTables,
    pub neighbours: &'a NeighbourIndex,
}

impl<'a> SolverView<'a> {
    /// Forces every pinned node to its pinned position with zero velocity.
    pub fn apply_pinned_overrides(&mut self) {
        self.pinned
            .apply_overrides(self.positions, self.velocities);
    }

    /// Swaps the acceleration and scratch acceleration contents.
    pub fn swap_accelerations(&mut self) {
        self.accelerations.swap_with_slice(self.temp_accelerations);
    }
}

/// What [`ClothState::teardown`] released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeardownReport {
    pub buffers_released: usize,
    pub mirrors_released: usize,
    pub self_collision_released: bool,
}

impl ClothState {
    /// Store with zeroed state, unit inverse masses and no topology.
    pub fn new(config: ClothStateConfig) -> Result<Self> {
        ClothStateBuilder::new(config).build()
    }

    pub fn builder(config: ClothStateConfig) -> ClothStateBuilder {
        ClothStateBuilder::new(config)
    }

    pub fn config(&self) -> &ClothStateConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.node_count()
    }

    // Working buffers. Only the solver reads or writes these.

    pub fn positions(&self) -> &[Vec3] {
        self.nodes.positions.as_slice()
    }

    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        self.nodes.positions.as_mut_slice()
    }

    pub fn velocities(&self) -> &[Vec3] {
        self.nodes.velocities.as_slice()
    }

    pub fn velocities_mut(&mut self) -> &mut [Vec3] {
        self.nodes.velocities.as_mut_slice()
    }

    pub fn accelerations(&self) -> &[Vec3] {
        self.nodes.accelerations.as_slice()
    }

    pub fn accelerations_mut(&mut self) -> &mut [Vec3] {
        self.nodes.accelerations.as_mut_slice()
    }

    pub fn temp_accelerations(&self) -> &[Vec3] {
        self.nodes.temp_accelerations.as_slice()
    }

    pub fn temp_accelerations_mut(&mut self) -> &mut [Vec3] {
        self.nodes.temp_accelerations.as_mut_slice()
    }

    pub fn inverse_masses(&self) -> &[f32] {
        self.nodes.inverse_masses.as_slice()
    }

    pub fn inverse_masses_mut(&mut self) -> &mut [f32] {
        self.nodes.inverse_masses.as_mut_slice()
    }

    pub fn pinned(&self) -> &PinnedPositions {
        &self.pinned
    }

    pub fn pinned_mut(&mut self) -> &mut PinnedPositions {
        &mut self.pinned
    }

    /// Borrows every working buffer at once, creating the self-collision
    /// structure on first use if it is enabled.
    pub fn solver_view(&mut self) -> SolverView<'_> {
        self.ensure_self_collision();
        SolverView {
            positions: self.nodes.positions.as_mut_slice(),
            velocities: self.nodes.velocities.as_mut_slice(),
            accelerations: self.nodes.accelerations.as_mut_slice(),
            temp_accelerations: self.nodes.temp_accelerations.as_mut_slice(),
            inverse_masses: self.nodes.inverse_masses.as_mut_slice(),
            pinned: &mut self.pinned,
            self_collision: self.self_collision.as_mut(),
            constraints: &self.constraints,
            neighbours: &self.neighbours,
        }
    }

    // Self-collision structure, created lazily and only when enabled.

    pub fn self_collision_enabled(&self) -> bool {
        self.config.self_collision
    }

    pub fn self_collision_created(&self) -> bool {
        self.self_collision.is_some()
    }

    pub fn self_collision(&self) -> Option<&SelfCollisionRegions> {
        self.self_collision.as_ref()
    }

    pub fn self_collision_mut(&mut self) -> Option<&mut SelfCollisionRegions> {
        self.ensure_self_collision();
        self.self_collision.as_mut()
    }

    fn ensure_self_collision(&mut self) {
        if self.config.self_collision && self.self_collision.is_none() {
            log::debug!(
                "creating self-collision regions (cell size {})",
                self.config.self_collision_cell_size
            );
            self.self_collision = Some(SelfCollisionRegions::with_capacity(
                self.config.self_collision_cell_size,
                self.node_count(),
            ));
        }
    }

    // Read-only topology.

    pub fn constraints(&self) -> &ConstraintTables {
        &self.constraints
    }

    pub fn neighbours(&self) -> &NeighbourIndex {
        &self.neighbours
    }

    pub fn normals(&self) -> &[Vec3] {
        self.normals.normals.as_slice()
    }

    pub fn normals_mut(&mut self) -> &mut [Vec3] {
        self.normals.normals.as_mut_slice()
    }

    pub fn triangle_normals(&self) -> &[Vec3] {
        self.normals.triangle_normals.as_slice()
    }

    pub fn triangle_normals_mut(&mut self) -> &mut [Vec3] {
        self.normals.triangle_normals.as_mut_slice()
    }

    // Lifecycle.

    /// Allocates every mirror that does not exist yet. Safe to call repeatedly.
    pub fn prepare_copies(&mut self) {
        let mut mirrors = self.mirrors.write();
        let mut allocated = 0;

        allocated += usize::from(mirrors.positions.allocate_copy_of(self.nodes.positions.as_slice()));
        allocated += usize::from(
            mirrors
                .velocities
                .allocate_copy_of(self.nodes.velocities.as_slice()),
        );
        allocated += usize::from(
            mirrors
                .inverse_masses
                .allocate_copy_of(self.nodes.inverse_masses.as_slice()),
        );
        if mirrors.pinned.is_none() {
            mirrors.pinned = Some(PinnedPositions::with_capacity(
                self.pinned.capacity(),
                self.pinned.growth(),
            ));
            allocated += 1;
        }

        if allocated > 0 {
            log::debug!(
                "allocated {allocated} mirror buffers for {} nodes",
                self.node_count()
            );
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.mirrors.read().is_prepared()
    }

    /// Copies the working state into the mirrors.
    ///
    /// Fixed-size arrays are bulk copied; the pinned mirror is cleared and
    /// refilled by a batched scatter-copy. Readers are locked out for the
    /// whole copy and this call returns only after every batch is done.
    /// [`ClothState::prepare_copies`] must have run first.
    pub fn publish(&mut self) {
        let timer = PhaseTimer::start("cloth_state::publish");
        let pinned_copied = {
            let mut mirrors = self.mirrors.write();
            debug_assert!(mirrors.is_prepared(), "publish called before prepare_copies");

            mirrors.positions.copy_from(self.nodes.positions.as_slice());
            mirrors.velocities.copy_from(self.nodes.velocities.as_slice());
            mirrors
                .inverse_masses
                .copy_from(self.nodes.inverse_masses.as_slice());

            let copied = match mirrors.pinned.as_mut() {
                Some(mirror) => {
                    mirror.reserve_total(self.pinned.capacity());
                    mirror.set_key_bound(self.pinned.key_bound());
                    mirror.clear();
                    scatter::scatter_copy(
                        self.pinned.entries(),
                        mirror.entries_mut(),
                        self.pinned.key_bound(),
                        self.config.publish_batch_size,
                    )
                }
                None => 0,
            };

            mirrors.publish_count += 1;
            copied
        };
        let elapsed = timer.finish();

        self.profile.record(elapsed, pinned_copied);
        if let Some(budget_ms) = self.config.publish_budget_ms {
            if warn_if_publish_budget_exceeded(elapsed, budget_ms) {
                self.profile.budget_overruns += 1;
            }
        }
    }

    /// Consumer view of the last published state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(self.mirrors.read())
    }

    /// Handle that can read published state from other threads.
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader::new(Arc::clone(&self.mirrors))
    }

    pub fn profile(&self) -> &PublishProfile {
        &self.profile
    }

    /// Releases every buffer the store owns.
    ///
    /// Consuming `self` rules out a second teardown or any use afterwards.
    /// Outstanding [`SnapshotReader`]s see unprepared, empty mirrors.
    pub fn teardown(mut self) -> TeardownReport {
        let mut report = TeardownReport {
            buffers_released: self.nodes.release()
                + self.normals.release()
                + self.constraints.release()
                + self.neighbours.release(),
            ..TeardownReport::default()
        };

        self.pinned.release();
        report.buffers_released += 1;

        report.mirrors_released = self.mirrors.write().release();

        if let Some(mut regions) = self.self_collision.take() {
            regions.release();
            report.self_collision_released = true;
        }

        self.torn_down = true;
        log::debug!(
            "cloth state torn down: {} buffers, {} mirrors, self-collision released: {}",
            report.buffers_released,
            report.mirrors_released,
            report.self_collision_released
        );
        report
    }
}

impl Drop for ClothState {
    fn drop(&mut self) {
        if !self.torn_down {
            log::warn!(
                "cloth state with {} nodes dropped without teardown",
                self.node_count()
            );
        }
    }
}

/// Assembles a [`ClothState`] from setup data produced by the mesh binding step.
#[derive(Debug, Clone, Default)]
pub struct ClothStateBuilder {
    config: ClothStateConfig,
    positions: Option<Vec<Vec3>>,
    velocities: Option<Vec<Vec3>>,
    inverse_masses: Option<Vec<f32>>,
    constraints: Option<ConstraintTables>,
    neighbours: Option<NeighbourIndex>,
    triangle_count: usize,
    pins: Vec<(NodeId, Vec3)>,
}

impl ClothStateBuilder {
    pub fn new(config: ClothStateConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn positions(mut self, positions: Vec<Vec3>) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn velocities(mut self, velocities: Vec<Vec3>) -> Self {
        self.velocities = Some(velocities);
        self
    }

    pub fn inverse_masses(mut self, inverse_masses: Vec<f32>) -> Self {
        self.inverse_masses = Some(inverse_masses);
        self
    }

    pub fn constraints(mut self, constraints: ConstraintTables) -> Self {
        self.constraints = Some(constraints);
        self
    }

    pub fn neighbours(mut self, neighbours: NeighbourIndex) -> Self {
        self.neighbours = Some(neighbours);
        self
    }

    pub fn triangle_count(mut self, triangle_count: usize) -> Self {
        self.triangle_count = triangle_count;
        self
    }

    pub fn pin(mut self, node: NodeId, position: Vec3) -> Self {
        self.pins.push((node, position));
        self
    }

    pub fn build(self) -> Result<ClothState> {
        self.config.validate()?;
        let node_count = self.config.node_count;

        let positions = per_node(self.positions, node_count, "positions", Vec3::ZERO)?;
        let velocities = per_node(self.velocities, node_count, "velocities", Vec3::ZERO)?;
        let inverse_masses = per_node(self.inverse_masses, node_count, "inverse masses", 1.0)?;

        let constraints = self.constraints.unwrap_or_default();
        for edge in constraints.edges() {
            edge.check(node_count)?;
        }
        for bend in constraints.bending_edges() {
            bend.check(node_count)?;
        }

        let neighbours = self
            .neighbours
            .unwrap_or_else(|| NeighbourIndex::empty(node_count));
        if neighbours.node_count() != node_count {
            return Err(StoreError::LengthMismatch {
                what: "neighbour index",
                expected: node_count,
                actual: neighbours.node_count(),
            });
        }

        let mut pinned =
            PinnedPositions::with_capacity(self.config.pinned_capacity, self.config.pinned_growth);
        for (node, position) in self.pins {
            node.check(node_count)?;
            pinned.insert(node, position);
        }

        log::debug!(
            "cloth state: {} nodes, {} edges, {} bending edges, {} pins, self-collision {}",
            node_count,
            constraints.edge_count(),
            constraints.bending_edge_count(),
            pinned.len(),
            if self.config.self_collision { "enabled" } else { "disabled" }
        );

        Ok(ClothState {
            nodes: NodeBuffers::new(positions, velocities, inverse_masses),
            normals: NormalBuffers::new(node_count, self.triangle_count),
            constraints,
            neighbours,
            pinned,
            self_collision: None,
            mirrors: Arc::new(RwLock::new(MirrorSet::default())),
            profile: PublishProfile {
                node_count,
                ..PublishProfile::default()
            },
            torn_down: false,
            config: self.config,
        })
    }
}

fn per_node<T: Clone>(
    values: Option<Vec<T>>,
    node_count: usize,
    what: &'static str,
    fill: T,
) -> Result<Vec<T>> {
    match values {
        Some(values) if values.len() != node_count => Err(StoreError::LengthMismatch {
            what,
            expected: node_count,
            actual: values.len(),
        }),
        Some(values) => Ok(values),
        None => Ok(vec![fill; node_count]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Edge;

    fn line(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn builder_rejects_misaligned_positions() {
        let result = ClothState::builder(ClothStateConfig::new(3))
            .positions(line(2))
            .build();
        assert!(matches!(
            result,
            Err(StoreError::LengthMismatch { what: "positions", expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn builder_rejects_constraints_for_larger_mesh() {
        let tables = ConstraintTables::from_rest_positions(&line(5), vec![Edge::new(3, 4)], vec![])
            .unwrap();
        let result = ClothState::builder(ClothStateConfig::new(3))
            .constraints(tables)
            .build();
        assert!(matches!(result, Err(StoreError::NodeOutOfRange { node: 3, .. })));
    }

    #[test]
    fn builder_rejects_pins_outside_mesh() {
        let result = ClothState::builder(ClothStateConfig::new(2))
            .pin(NodeId(2), Vec3::ONE)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_rejects_neighbour_index_of_wrong_size() {
        let result = ClothState::builder(ClothStateConfig::new(4))
            .neighbours(NeighbourIndex::empty(3))
            .build();
        assert!(matches!(
            result,
            Err(StoreError::LengthMismatch { what: "neighbour index", .. })
        ));
    }

    #[test]
    fn default_inverse_mass_is_one() {
        let state = ClothState::new(ClothStateConfig::new(2)).unwrap();
        assert_eq!(state.inverse_masses(), &[1.0, 1.0]);
        state.teardown();
    }

    #[test]
    fn solver_view_swaps_acceleration_buffers() {
        let mut state = ClothState::new(ClothStateConfig::new(2)).unwrap();
        {
            let mut view = state.solver_view();
            view.accelerations[0] = Vec3::X;
            view.temp_accelerations[1] = Vec3::Y;
            view.swap_accelerations();
        }
        assert_eq!(state.accelerations(), &[Vec3::ZERO, Vec3::Y]);
        assert_eq!(state.temp_accelerations(), &[Vec3::X, Vec3::ZERO]);
        state.teardown();
    }

    #[test]
    fn solver_view_creates_self_collision_only_when_enabled() {
        let mut disabled = ClothState::new(ClothStateConfig::new(2)).unwrap();
        assert!(disabled.solver_view().self_collision.is_none());
        assert!(!disabled.self_collision_created());
        disabled.teardown();

        let mut enabled =
            ClothState::new(ClothStateConfig::new(2).with_self_collision(true)).unwrap();
        assert!(enabled.solver_view().self_collision.is_some());
        assert!(enabled.self_collision_created());
        enabled.teardown();
    }

    #[test]
    fn publish_records_profile() {
        let mut state = ClothState::new(ClothStateConfig::new(4)).unwrap();
        state.pinned_mut().insert(NodeId(2), Vec3::ONE);
        state.prepare_copies();
        state.publish();
        state.publish();

        assert_eq!(state.profile().publish_count, 2);
        assert_eq!(state.profile().last_pinned_copied, 1);
        assert_eq!(state.profile().node_count, 4);
        state.teardown();
    }

    #[test]
    fn publish_counts_budget_overruns_when_budget_set() {
        let mut state =
            ClothState::new(ClothStateConfig::new(4096).with_publish_budget_ms(0.0)).unwrap();
        state.prepare_copies();
        state.publish();
        state.publish();
        assert_eq!(state.profile().budget_overruns, 2);
        state.teardown();

        let mut unbudgeted = ClothState::new(ClothStateConfig::new(4096)).unwrap();
        unbudgeted.prepare_copies();
        unbudgeted.publish();
        assert_eq!(unbudgeted.profile().budget_overruns, 0);
        unbudgeted.teardown();
    }
}
