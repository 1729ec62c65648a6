use approx::assert_relative_eq;
use cloth_state::*;

/// A 2x2 quad grid: 9 nodes, 12 structural edges, 8 triangles.
fn grid() -> (Vec<Vec3>, Vec<Edge>, Vec<BendingEdge>) {
    let mut positions = Vec::new();
    for z in 0..3 {
        for x in 0..3 {
            positions.push(Vec3::new(x as f32, 0.0, z as f32));
        }
    }
    let mut edges = Vec::new();
    for z in 0..3u16 {
        for x in 0..3u16 {
            let i = z * 3 + x;
            if x < 2 {
                edges.push(Edge::new(i, i + 1));
            }
            if z < 2 {
                edges.push(Edge::new(i, i + 3));
            }
        }
    }
    let bending = vec![BendingEdge::new(1, 4, 0, 2), BendingEdge::new(3, 4, 0, 6)];
    (positions, edges, bending)
}

#[test]
fn store_exposes_topology_read_only() {
    let (positions, edges, bending) = grid();
    let tables = ConstraintTables::from_rest_positions(&positions, edges.clone(), bending)
        .expect("valid topology");
    let neighbours = NeighbourIndex::from_edges(positions.len(), &edges).expect("valid edges");

    let state = ClothState::builder(ClothStateConfig::new(positions.len()))
        .positions(positions)
        .constraints(tables)
        .neighbours(neighbours)
        .triangle_count(8)
        .build()
        .expect("valid store");

    assert_eq!(state.constraints().edge_count(), 12);
    assert_eq!(state.constraints().bending_edge_count(), 2);
    for (_, rest) in state.constraints().iter_edges() {
        assert_relative_eq!(rest, 1.0);
    }

    let mut centre: Vec<NodeId> = state.neighbours().neighbours(NodeId(4)).collect();
    centre.sort();
    assert_eq!(centre, vec![NodeId(1), NodeId(3), NodeId(5), NodeId(7)]);
    assert_eq!(state.neighbours().neighbour_count(NodeId(0)), 2);
    assert_eq!(state.triangle_normals().len(), 8);

    state.teardown();
}

#[test]
fn directed_neighbour_index_is_kept_as_built() {
    let neighbours =
        NeighbourIndex::from_pairs(3, [(NodeId(0), NodeId(2))]).expect("valid pairs");
    let state = ClothState::builder(ClothStateConfig::new(3))
        .neighbours(neighbours)
        .build()
        .unwrap();

    assert!(state.neighbours().contains(NodeId(0), NodeId(2)));
    assert!(!state.neighbours().contains(NodeId(2), NodeId(0)));
    state.teardown();
}

#[test]
fn normals_are_writable_by_the_recompute_pass() {
    let mut state = ClothState::builder(ClothStateConfig::new(2))
        .triangle_count(1)
        .build()
        .unwrap();
    state.normals_mut().fill(Vec3::Y);
    state.triangle_normals_mut()[0] = Vec3::Z;

    assert_eq!(state.normals(), &[Vec3::Y, Vec3::Y]);
    assert_eq!(state.triangle_normals(), &[Vec3::Z]);
    state.teardown();
}

#[test]
fn config_round_trips_through_serde() {
    let config = ClothStateConfig::new(300)
        .with_self_collision(true)
        .with_pinned_growth(GrowthPolicy::Exact);
    let json = serde_json::to_string(&config).expect("serializable");
    let parsed: ClothStateConfig = serde_json::from_str(&json).expect("deserializable");
    assert_eq!(parsed, config);
}
