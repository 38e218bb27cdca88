mod support;

use common::shapes::Aabb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial::{
    Config, LinearSearch, ObjectKind, ObjectSnapshot, SearchOptions, SpatialKind, SpatialManager,
    UniformGrid,
};
use support::{v, TestWorld};

const UNIVERSE_RADIUS: f32 = 50_000.0;

fn manager(kind: SpatialKind) -> SpatialManager<TestWorld> {
    let mut manager = SpatialManager::new(kind, Config::default());
    manager.setup(UNIVERSE_RADIUS).unwrap();
    manager
}

#[test]
fn test_setup_builds_requested_backend() {
    let tree = manager(SpatialKind::QuadTree);
    assert_eq!(tree.name(), "QuadTree");
    // 1024 doubled until it covers 100_000.
    assert_eq!(tree.full_size(), 131_072.0);

    let grid = manager(SpatialKind::UniformGrid);
    assert_eq!(grid.name(), "UniformGrid");
    assert_eq!(grid.full_size(), 100_000.0);

    let mut broken = SpatialManager::<TestWorld>::new(SpatialKind::QuadTree, Config::default());
    assert!(broken.setup(-1.0).is_err());
    assert_eq!(broken.name(), "None");
}

#[test]
fn test_grid_rejects_too_many_cells() {
    assert!(UniformGrid::new(UNIVERSE_RADIUS, 1.0).is_err());
    assert_eq!(UniformGrid::new(256.0, 1.0).unwrap().cells_per_side(), 512);
    assert!(UniformGrid::new(257.0, 1.0).is_err());
    let grid = UniformGrid::new(1000.0, 300.0).unwrap();
    assert_eq!(grid.cells_per_side(), 7);
    assert_eq!(grid.full_size(), 2100.0);
}

#[test]
fn test_add_ignores_untracked_kinds() {
    let mut manager = manager(SpatialKind::QuadTree);
    let module = ObjectSnapshot::new(1, ObjectKind::SHIP_MODULE, 1, v(0.0, 0.0), 4.0);
    assert!(!manager.add(&module).unwrap());
    assert!(manager.add(&ObjectSnapshot::ship(2, 1, v(0.0, 0.0), 40.0)).unwrap());
    assert!(manager
        .add(&ObjectSnapshot::static_body(3, ObjectKind::MOON, v(900.0, 0.0), 300.0))
        .unwrap());
    assert_eq!(manager.count(), 2);

    assert!(manager.remove(2));
    assert!(!manager.remove(1));
    assert_eq!(manager.count(), 1);
}

#[test]
fn test_calls_before_setup_are_ignored() {
    let mut manager = SpatialManager::<TestWorld>::new(SpatialKind::UniformGrid, Config::default());
    let world = TestWorld::new();
    assert!(!manager.add(&ObjectSnapshot::ship(1, 1, v(0.0, 0.0), 40.0)).unwrap());
    assert_eq!(manager.count(), 0);
    assert_eq!(manager.update(&world, 1.0 / 60.0, |_| {}), 0);
    assert!(manager.find_nearby(&SearchOptions::new(v(0.0, 0.0), 100.0)).unwrap().is_empty());
}

#[test]
fn test_backends_match_linear_search() {
    let mut rng = StdRng::seed_from_u64(2024);
    let area = Aabb::centered(UNIVERSE_RADIUS - 1000.0);
    let mut world = TestWorld::new();
    for id in 1..=500 {
        let radius = rng.gen_range(5.0..800.0);
        let center = area.get_random_circle_coords_inside(radius, &mut rng);
        world.add(ObjectSnapshot::ship(id, rng.gen_range(1..5), center, radius));
    }

    let mut tree = manager(SpatialKind::QuadTree);
    let mut grid = manager(SpatialKind::UniformGrid);
    for object in world.snapshots() {
        tree.add(&object).unwrap();
        grid.add(&object).unwrap();
    }

    for round in 0..3 {
        if round > 0 {
            let limit = 48_000.0;
            for object in world.snapshots() {
                let x = (object.center.x + rng.gen_range(-5000.0..5000.0)).clamp(-limit, limit);
                let y = (object.center.y + rng.gen_range(-5000.0..5000.0)).clamp(-limit, limit);
                world.move_to(object.id, x, y);
            }
            tree.update(&world, 1.0 / 60.0, |_| {});
            grid.update(&world, 1.0 / 60.0, |_| {});
        }

        for _ in 0..60 {
            let origin = area.get_random_circle_coords_inside(0.0, &mut rng);
            let mut options = SearchOptions::new(origin, rng.gen_range(0.0..15_000.0));
            if rng.gen_bool(0.3) {
                options = options.excluding_loyalty(rng.gen_range(1..5));
            }
            let mut expected = LinearSearch::find_nearby(&options, &world.snapshots()).unwrap();
            expected.sort_unstable();
            for manager in [&tree, &grid] {
                let mut actual = manager.find_nearby(&options).unwrap();
                actual.sort_unstable();
                assert_eq!(actual, expected, "{} {:?}", manager.name(), options);
            }
        }
    }
}

#[test]
fn test_projectile_explosion_victims() {
    for kind in [SpatialKind::QuadTree, SpatialKind::UniformGrid] {
        let mut manager = manager(kind);
        let source = ObjectSnapshot::projectile(1000, 1, v(0.0, 0.0), 2.0, v(0.0, 0.0));
        manager.add(&source).unwrap();
        // Forty hostile ships at growing distances, plus friendly ones.
        for id in 0..40u32 {
            let distance = 10.0 + id as f32 * 10.0;
            manager.add(&ObjectSnapshot::ship(id, 2, v(distance, 0.0), 5.0)).unwrap();
            manager.add(&ObjectSnapshot::ship(100 + id, 1, v(-distance, 0.0), 5.0)).unwrap();
        }

        assert!(manager.projectile_explosion_victims(&source, 0.0).unwrap().is_empty());

        // A small radius is widened to the minimum splash search radius.
        let victims = manager.projectile_explosion_victims(&source, 20.0).unwrap();
        assert_eq!(victims, (0..32).collect::<Vec<_>>(), "{}", manager.name());
    }
}

#[test]
fn test_ship_explosion_victims() {
    for kind in [SpatialKind::QuadTree, SpatialKind::UniformGrid] {
        let mut manager = manager(kind);
        let ship = ObjectSnapshot::ship(1, 1, v(0.0, 0.0), 50.0);
        manager.add(&ship).unwrap();
        manager.add(&ObjectSnapshot::ship(2, 1, v(150.0, 0.0), 20.0)).unwrap();
        manager.add(&ObjectSnapshot::ship(3, 2, v(-150.0, 0.0), 20.0)).unwrap();
        manager.add(&ObjectSnapshot::ship(4, 2, v(1000.0, 0.0), 20.0)).unwrap();
        manager.add(&ObjectSnapshot::projectile(5, 2, v(10.0, 0.0), 2.0, v(0.0, 0.0))).unwrap();

        assert!(manager.ship_explosion_victims(&ship, -1.0).unwrap().is_empty());
        let mut victims = manager.ship_explosion_victims(&ship, 100.0).unwrap();
        victims.sort_unstable();
        assert_eq!(victims, vec![2, 3], "{}", manager.name());
    }
}

#[test]
fn test_find_nearby_around_excludes_self() {
    let mut manager = manager(SpatialKind::QuadTree);
    let ship = ObjectSnapshot::ship(1, 1, v(0.0, 0.0), 50.0);
    manager.add(&ship).unwrap();
    manager.add(&ObjectSnapshot::ship(2, 1, v(100.0, 0.0), 20.0)).unwrap();
    manager.add(&ObjectSnapshot::ship(3, 2, v(0.0, 100.0), 20.0)).unwrap();

    let mut all = manager
        .find_nearby_around(&ship, ObjectKind::SHIP, 200.0, 10, None, None)
        .unwrap();
    all.sort_unstable();
    assert_eq!(all, vec![2, 3]);

    let enemies = manager
        .find_nearby_around(&ship, ObjectKind::SHIP, 200.0, 10, Some(1), None)
        .unwrap();
    assert_eq!(enemies, vec![3]);
    let friends = manager
        .find_nearby_around(&ship, ObjectKind::SHIP, 200.0, 10, None, Some(1))
        .unwrap();
    assert_eq!(friends, vec![2]);
}

#[test]
fn test_update_counts_collisions() {
    for kind in [SpatialKind::QuadTree, SpatialKind::UniformGrid] {
        let mut manager = manager(kind);
        let mut world = TestWorld::new();
        let ship = world.add(ObjectSnapshot::ship(1, 1, v(0.0, 0.0), 50.0));
        let projectile =
            world.add(ObjectSnapshot::projectile(2, 2, v(400.0, 0.0), 5.0, v(0.0, 0.0)));
        manager.add(&ship).unwrap();
        manager.add(&projectile).unwrap();

        let mut hits = Vec::new();
        assert_eq!(manager.update(&world, 1.0 / 60.0, |event| hits.push(*event)), 0);
        assert_eq!(manager.collisions(), 0);

        // Moves into the ship; the update pass picks up the new position.
        world.move_to(2, 30.0, 0.0);
        assert_eq!(manager.update(&world, 1.0 / 60.0, |event| hits.push(*event)), 1);
        assert_eq!(manager.collisions(), 1);
        assert_eq!((hits[0].instigator, hits[0].victim), (2, 1));

        world.deactivate(2);
        manager.update(&world, 1.0 / 60.0, |_| {});
        assert_eq!(manager.count(), 1);
        assert_eq!(manager.collisions(), 0);
    }
}

#[test]
fn test_destroy() {
    let mut manager = manager(SpatialKind::UniformGrid);
    manager.add(&ObjectSnapshot::ship(1, 1, v(0.0, 0.0), 50.0)).unwrap();
    manager.destroy();
    assert_eq!(manager.count(), 0);
    assert_eq!(manager.name(), "None");
    assert_eq!(manager.full_size(), 0.0);
}
