use cloth_state::*;

fn enabled_state(n: usize) -> ClothState {
    ClothState::new(
        ClothStateConfig::new(n)
            .with_self_collision(true)
            .with_self_collision_cell_size(1.0),
    )
    .expect("valid config")
}

#[test]
fn insert_then_remove_updates_utilized_cells() {
    let mut state = enabled_state(1);
    let regions = state.self_collision_mut().expect("self-collision enabled");
    let cell = IVec3::new(3, 0, -2);

    regions.insert(cell, NodeId(0));
    assert!(regions.is_utilized(cell));
    assert!(regions.utilized_cells().any(|c| c == cell));

    regions.remove(cell, NodeId(0));
    assert!(!regions.is_utilized(cell));
    assert_eq!(regions.utilized_count(), 0);

    state.teardown();
}

#[test]
fn rebuild_from_working_positions() {
    let mut state = enabled_state(4);
    state.positions_mut().copy_from_slice(&[
        Vec3::new(0.1, 0.1, 0.1),
        Vec3::new(0.9, 0.2, 0.3),
        Vec3::new(1.5, 0.1, 0.1),
        Vec3::new(10.0, 10.0, 10.0),
    ]);

    let view = state.solver_view();
    let regions = view.self_collision.expect("self-collision enabled");
    regions.rebuild(view.positions);

    assert_eq!(regions.utilized_count(), 3);
    assert_eq!(regions.nodes_in(IVec3::ZERO), &[NodeId(0), NodeId(1)]);

    let pairs = regions.candidate_pairs();
    assert!(pairs.contains(&(NodeId(0), NodeId(1))));
    assert!(pairs.contains(&(NodeId(1), NodeId(2))));
    assert!(!pairs.iter().any(|&(a, b)| a == NodeId(3) || b == NodeId(3)));

    state.teardown();
}

#[test]
fn self_collision_structure_is_created_once() {
    let mut state = enabled_state(2);
    state
        .self_collision_mut()
        .expect("enabled")
        .insert(IVec3::ZERO, NodeId(1));

    // A later request returns the same structure with its contents intact.
    let regions = state.self_collision_mut().expect("enabled");
    assert!(regions.contains(IVec3::ZERO, NodeId(1)));
    assert!(state.self_collision_created());
    assert!(state.teardown().self_collision_released);
}

#[test]
fn neighbourhood_query_skips_far_cells() {
    let mut state = enabled_state(3);
    let regions = state.self_collision_mut().expect("enabled");
    regions.insert_at(Vec3::new(0.5, 0.5, 0.5), NodeId(0));
    regions.insert_at(Vec3::new(-0.5, 0.5, 0.5), NodeId(1));
    regions.insert_at(Vec3::new(4.5, 0.5, 0.5), NodeId(2));

    let mut near: Vec<NodeId> = regions.nodes_near(IVec3::ZERO).collect();
    near.sort();
    assert_eq!(near, vec![NodeId(0), NodeId(1)]);

    state.teardown();
}
