use approx::assert_relative_eq;
use tangle::snapshot::{ConstraintRecord, GroupRecord};
use tangle::{
    ClothConfig, Constraint, DistanceConstraint, Particle, PinConstraint, SnapshotError, SpringConstraint,
    Vec2, World, WorldConfig, WorldSnapshot,
};

fn busy_world() -> World {
    let mut world = World::new(
        WorldConfig::new()
            .with_friction(0.05)
            .with_collision_iterations(6)
            .with_verlet_rebuild_freq(1),
    );
    let a = world.add_particle(Particle::new(Vec2::new(100.0, 100.0)).with_velocity(Vec2::new(3.0, -2.0)));
    let b = world.add_particle(Particle::new(Vec2::new(160.0, 100.0)).with_mass(2.5).with_radius(8.0));
    let c = world.add_particle(Particle::new(Vec2::new(220.0, 140.0)));
    let d = world.add_particle(Particle::new(Vec2::new(260.0, 140.0)));
    world.add_constraint(DistanceConstraint::new(a, b, 60.0).with_stiffness(0.8)).unwrap();
    world.add_constraint(SpringConstraint::new(b, c, 70.0, 12.0).with_max_force(500.0)).unwrap();
    world.add_constraint(PinConstraint::new(a, Vec2::new(100.0, 100.0))).unwrap();
    world.create_group(&[c, d], 0.7, false).unwrap();
    let sheet = ClothConfig::default().with_segments(3, 2).with_size(60.0, 40.0).with_tear_factor(2.0);
    world.create_cloth(Vec2::new(400.0, 50.0), &sheet).unwrap();
    // A hole in the middle of the list exercises dense re-indexing.
    world.remove_particle(d);
    for _ in 0..10 {
        world.update(1.0 / 60.0);
    }
    world
}

fn assert_equivalent(a: &World, b: &World) {
    assert_eq!(a.particle_count(), b.particle_count());
    for ((_, p), (_, q)) in a.particles().zip(b.particles()) {
        assert_relative_eq!(p.pos.x, q.pos.x, epsilon = 1e-9);
        assert_relative_eq!(p.pos.y, q.pos.y, epsilon = 1e-9);
        assert_relative_eq!(p.vel.x, q.vel.x, epsilon = 1e-9);
        assert_relative_eq!(p.vel.y, q.vel.y, epsilon = 1e-9);
        assert_eq!(p.radius, q.radius);
        assert_eq!(p.mass(), q.mass());
        assert_eq!(p.is_fixed(), q.is_fixed());
    }
    assert_eq!(a.constraint_count(), b.constraint_count());
    assert_eq!(a.group_count(), b.group_count());
    assert_eq!(a.config(), b.config());
}

#[test]
fn snapshot_round_trips_through_json() {
    let world = busy_world();
    let json = world.snapshot().to_json().unwrap();
    let restored = WorldSnapshot::from_json(&json).unwrap().restore().unwrap();

    assert_equivalent(&world, &restored);
    assert_eq!(WorldSnapshot::capture(&restored), world.snapshot());
    assert_eq!(restored.frame(), world.frame());
}

#[test]
fn constraint_parameters_survive() {
    let world = busy_world();
    let restored = world.snapshot().restore().unwrap();

    let springs: Vec<_> = restored
        .constraints()
        .filter_map(|(_, c)| match c {
            Constraint::Spring(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(springs.len(), 1);
    assert_eq!(springs[0].rest_length, 70.0);
    assert_eq!(springs[0].stiffness, 12.0);
    assert_eq!(springs[0].max_force, 500.0);
    assert!(springs[0].damping.is_some());

    let stiffnesses: Vec<f64> = restored
        .constraints()
        .filter_map(|(_, c)| match c {
            Constraint::Distance(d) => Some(d.stiffness),
            _ => None,
        })
        .collect();
    assert_eq!(stiffnesses, vec![0.8]);
}

#[test]
fn removed_particles_leave_no_gaps() {
    let snapshot = busy_world().snapshot();
    let count = snapshot.particles.len();
    for record in &snapshot.constraints {
        match record {
            ConstraintRecord::Distance(link) => assert!(link.a < count && link.b < count),
            ConstraintRecord::Pin { particle, .. } => assert!(*particle < count),
            ConstraintRecord::Spring { a, b, .. } => assert!(*a < count && *b < count),
        }
    }
    let rigid = snapshot
        .groups
        .iter()
        .find_map(|g| match g {
            GroupRecord::RigidBody { particles, .. } => Some(particles.clone()),
            GroupRecord::Cloth { .. } => None,
        })
        .unwrap();
    assert_eq!(rigid.len(), 1);
}

#[test]
fn save_and_load_file() {
    let world = busy_world();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.json");

    world.save_json(&path).unwrap();
    let restored = World::load_json(&path).unwrap();

    assert_equivalent(&world, &restored);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = World::<f64>::load_json(dir.path().join("nope.json"));
    assert!(matches!(result, Err(SnapshotError::Io(_))));
}

#[test]
fn restored_world_keeps_stepping_identically() {
    let mut original = busy_world();
    let mut restored = original.snapshot().restore().unwrap();
    for _ in 0..30 {
        original.update(1.0 / 60.0);
        restored.update(1.0 / 60.0);
    }
    assert_equivalent(&original, &restored);
}
