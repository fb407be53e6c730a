use approx::assert_relative_eq;
use tangle::{ClothConfig, Emitter, Particle, ParticleId, Vec2, World, WorldConfig};

fn weightless() -> World {
    World::new(WorldConfig::new().with_gravity(Vec2::zero()).with_friction(0.0))
}

fn small_sheet() -> ClothConfig<f64> {
    ClothConfig::default().with_size(100.0, 100.0).with_segments(2, 2)
}

#[test]
fn cloth_links_are_private_to_the_cloth() {
    let mut world: World = World::default();
    let cloth = world.create_cloth(Vec2::new(300.0, 50.0), &small_sheet()).unwrap();

    assert_eq!(world.particle_count(), 9);
    // Two corner pins; structural and shear links stay inside the cloth.
    assert_eq!(world.constraint_count(), 2);
    let sheet = world.group(cloth).unwrap().as_cloth().unwrap();
    assert_eq!(sheet.constraint_count(), 6 + 6 + 8);
}

#[test]
fn overstretched_links_tear() {
    let mut world: World = World::default();
    let sheet = small_sheet().with_tear_factor(1.5);
    let cloth = world.create_cloth(Vec2::new(300.0, 50.0), &sheet).unwrap();
    let corner = world.group(cloth).unwrap().as_cloth().unwrap().particle_at(2, 2).unwrap();
    let links_before = world.group(cloth).unwrap().as_cloth().unwrap().constraint_count();

    world.particle_mut(corner).unwrap().pos += Vec2::new(300.0, 300.0);
    world.update(1.0 / 60.0);

    let sheet = world.group(cloth).unwrap().as_cloth().unwrap();
    assert!(sheet.constraint_count() < links_before);
    assert!(sheet.constraints().iter().all(|c| c.a != corner && c.b != corner));
    assert_eq!(sheet.particles().count(), 9);
    assert_eq!(world.particle_count(), 9);
    assert_eq!(world.constraint_count(), 2);
}

#[test]
fn tear_at_cuts_one_particle_loose() {
    let mut world: World = World::default();
    let cloth = world.create_cloth(Vec2::new(300.0, 50.0), &small_sheet()).unwrap();

    let sheet = world.group_mut(cloth).unwrap().as_cloth_mut().unwrap();
    let center = sheet.particle_at(1, 1).unwrap();
    sheet.tear_at(1, 1);

    // The centre touches four structural and four shear links.
    assert_eq!(sheet.constraint_count(), 20 - 8);
    assert!(sheet.constraints().iter().all(|c| c.a != center && c.b != center));
    assert_eq!(sheet.particle_at(1, 1), Some(center));
}

#[test]
fn removing_a_cloth_particle_empties_its_cell() {
    let mut world: World = World::default();
    let cloth = world.create_cloth(Vec2::new(300.0, 50.0), &small_sheet()).unwrap();
    let center = world.group(cloth).unwrap().as_cloth().unwrap().particle_at(1, 1).unwrap();

    world.remove_particle(center);

    let sheet = world.group(cloth).unwrap().as_cloth().unwrap();
    assert_eq!(sheet.particle_at(1, 1), None);
    assert_eq!(sheet.cells()[4], None);
    assert_eq!(sheet.particles().count(), 8);
    assert!(sheet.constraints().iter().all(|c| c.a != center && c.b != center));

    // Still steps cleanly with the hole.
    for _ in 0..20 {
        world.update(1.0 / 60.0);
    }
    assert!(world.particles().all(|(_, p)| p.is_finite()));
}

#[test]
fn removing_a_group_keeps_its_particles() {
    let mut world: World = World::default();
    let cloth = world.create_cloth(Vec2::new(300.0, 50.0), &small_sheet()).unwrap();

    let removed = world.remove_group(cloth).unwrap();
    assert_eq!(removed.particles().len(), 9);
    assert!(world.group(cloth).is_none());
    assert_eq!(world.group_count(), 0);
    assert_eq!(world.particle_count(), 9);
    assert_eq!(world.constraint_count(), 2);
    assert!(world.remove_group(cloth).is_none());
}

fn square(world: &mut World, origin: Vec2<f64>, side: f64) -> Vec<ParticleId> {
    [(0.0, 0.0), (side, 0.0), (side, side), (0.0, side)]
        .iter()
        .map(|&(x, y)| world.add_particle(Particle::new(origin + Vec2::new(x, y))))
        .collect()
}

fn pairwise_distances(world: &World, ids: &[ParticleId]) -> Vec<f64> {
    let mut out = Vec::new();
    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            out.push(world.particle(a).unwrap().pos.distance(world.particle(b).unwrap().pos));
        }
    }
    out
}

#[test]
fn rigid_body_keeps_its_shape() {
    let mut world: World = World::default();
    let ids = square(&mut world, Vec2::new(300.0, 100.0), 40.0);
    world.create_group(&ids, 1.0, false).unwrap();
    let rest = pairwise_distances(&world, &ids);

    // Spin it up by kicking one corner sideways.
    world.particle_mut(ids[0]).unwrap().vel = Vec2::new(-120.0, 0.0);
    for _ in 0..30 {
        world.update(1.0 / 60.0);
    }

    for (now, before) in pairwise_distances(&world, &ids).into_iter().zip(rest) {
        assert_relative_eq!(now, before, epsilon = 1e-6);
    }
    assert!(world.particle(ids[0]).unwrap().pos.y > 100.0);
}

#[test]
fn fixed_group_is_not_solved() {
    let mut world = weightless();
    let ids = square(&mut world, Vec2::new(300.0, 100.0), 40.0);
    world.create_group(&ids, 1.0, true).unwrap();

    world.particle_mut(ids[0]).unwrap().pos = Vec2::new(250.0, 100.0);
    world.update(1.0 / 60.0);

    assert_eq!(world.particle(ids[0]).unwrap().pos, Vec2::new(250.0, 100.0));
}

#[test]
fn removing_a_member_recentres_the_rest_shape() {
    let mut world = weightless();
    let ids = square(&mut world, Vec2::new(300.0, 100.0), 40.0);
    let group = world.create_group(&ids, 1.0, false).unwrap();

    world.remove_particle(ids[2]);

    let body = world.group(group).unwrap().as_rigid_body().unwrap();
    assert_eq!(body.particles(), &[ids[0], ids[1], ids[3]]);
    let mut sum = Vec2::zero();
    for r in body.rest_offsets() {
        sum += *r;
    }
    assert_relative_eq!(sum.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(sum.y, 0.0, epsilon = 1e-9);

    for &id in &[ids[0], ids[1], ids[3]] {
        world.remove_particle(id);
    }
    assert!(world.group(group).is_none());
}

#[test]
fn emitter_spawns_on_schedule_and_reaps_old_particles() {
    let mut world = weightless();
    let mut emitter = Emitter::new(Vec2::new(400.0, 300.0), Vec2::new(1.0, 0.0))
        .with_seed(7)
        .with_rate(0.1)
        .with_lifetime(Some(0.35));

    let mut emitted = 0;
    for _ in 0..10 {
        emitted += emitter.update(0.1, &mut world);
        world.update(0.1);
    }

    assert_eq!(emitted, 10);
    assert_eq!(emitter.particles().count(), 4);
    assert_eq!(world.particle_count(), 4);
    for id in emitter.particles() {
        assert!(world.particle(id).is_some());
    }
}

#[test]
fn emitter_forgets_particles_removed_elsewhere() {
    let mut world = weightless();
    let mut emitter = Emitter::new(Vec2::new(400.0, 300.0), Vec2::new(0.0, -1.0))
        .with_seed(1)
        .with_lifetime(None);
    let first = emitter.emit(&mut world);
    emitter.emit(&mut world);

    world.remove_particle(first);
    emitter.update(0.01, &mut world);

    let live: Vec<ParticleId> = emitter.particles().collect();
    assert_eq!(live.len(), 1);
    assert!(!live.contains(&first));
}
