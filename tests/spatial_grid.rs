use live_index::prelude::*;

fn sorted(mut ids: Vec<EntityId>) -> Vec<EntityId> {
    ids.sort();
    ids
}

#[test]
fn test_broad_phase_pairs_come_from_shared_cells() {
    let mut entities = Entities::<()>::new();
    let mut grid = SpatialGrid::new(6);

    let player = entities.create();
    let near = entities.create();
    let far = entities.create();
    grid.insert(10, 10, 16, 16, player);
    grid.insert(40, 30, 16, 16, near);
    grid.insert(400, 400, 16, 16, far);

    let around_player = grid.query(0, 0, 63, 63);
    assert_eq!(sorted(around_player), sorted(vec![player, near]));
    assert_eq!(grid.query(384, 384, 63, 63), vec![far]);
}

#[test]
fn test_per_frame_updates_only_rebucket_on_cell_crossings() {
    let mut entities = Entities::<()>::new();
    let mut grid = SpatialGrid::new(6);
    let e = entities.create();
    grid.insert(0, 0, 16, 16, e);
    let home = grid.cell_range_of(e).unwrap();

    // Drift inside the home cell: the recorded range never changes.
    for step in 0..40 {
        grid.update(step, step, 16, 16, e);
    }
    assert_eq!(grid.cell_range_of(e), Some(home));

    // A larger step crosses into the next cell over.
    grid.update(70, 70, 16, 16, e);
    assert_ne!(grid.cell_range_of(e), Some(home));
    assert!(grid.query(0, 0, 40, 40).is_empty());
    assert_eq!(grid.query(64, 64, 16, 16), vec![e]);
}

#[test]
fn test_wide_entity_is_visible_from_every_covered_cell() {
    let mut entities = Entities::<()>::new();
    let mut grid = SpatialGrid::new(5);
    let wall = entities.create();

    // A wall spanning four 32-pixel cells horizontally.
    grid.insert(0, 0, 127, 10, wall);
    for cell in 0..4 {
        assert_eq!(grid.query(cell * 32, 0, 16, 16), vec![wall]);
    }
    assert!(grid.query(128, 0, 16, 16).is_empty());
}

#[test]
fn test_dense_cell_survives_interleaved_removal() {
    let mut entities = Entities::<()>::new();
    let mut grid = SpatialGrid::new(6);

    let ids: Vec<_> = (0..12).map(|_| entities.create()).collect();
    for &e in &ids {
        grid.insert(8, 8, 4, 4, e);
    }

    // Remove every other entity; the swap-and-pop patching must keep the
    // remaining ones removable and queryable.
    for &e in ids.iter().step_by(2) {
        grid.remove(e);
    }
    let survivors: Vec<_> = ids.iter().copied().skip(1).step_by(2).collect();
    assert_eq!(sorted(grid.query(0, 0, 63, 63)), sorted(survivors.clone()));

    for &e in &survivors {
        grid.remove(e);
    }
    assert!(grid.is_empty());
}

#[test]
fn test_grid_and_store_share_handles() {
    let mut entities = Entities::new();
    let mut store = EntityStore::new();
    let mut grid = SpatialGrid::new(6);

    let e = entities.create();
    store.add(&entities, e);
    store.add_attribute(&mut entities, e, "position", (12i32, 20i32));
    grid.insert(12, 20, 8, 8, e);

    let placed = store.with(&entities, &["position"]);
    for entity in store.get(placed).iter() {
        assert!(grid.contains(entity));
    }

    // Despawn flow: every structure lets go of the same handle.
    store.remove(e);
    grid.remove(e);
    entities.destroy(e).unwrap();
    assert!(store.is_empty());
    assert!(grid.is_empty());
    assert!(entities.is_empty());
}
