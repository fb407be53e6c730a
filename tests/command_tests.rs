use approx::assert_relative_eq;
use tangle::spring::critical_damping;
use tangle::{Constraint, Particle, SpringConstraint, StepObserver, Vec2, World, WorldCommand, WorldConfig};

#[derive(Default)]
struct RebuildCounter(usize);

impl StepObserver for RebuildCounter {
    fn on_neighbor_rebuild(&mut self, _pairs: usize) {
        self.0 += 1;
    }
}

fn spring_of(world: &World) -> SpringConstraint<f64> {
    world
        .constraints()
        .find_map(|(_, c)| match c {
            Constraint::Spring(s) => Some(s.clone()),
            _ => None,
        })
        .unwrap()
}

#[test]
fn commands_wait_for_the_next_update() {
    let mut world: World = World::default();
    world.queue(WorldCommand::SetGravity(Vec2::new(0.0, -10.0)));
    assert_eq!(world.pending_commands(), 1);
    assert_eq!(world.config().gravity, Vec2::new(0.0, 981.0));

    world.update(1.0 / 60.0);
    assert_eq!(world.pending_commands(), 0);
    assert_eq!(world.config().gravity, Vec2::new(0.0, -10.0));
}

#[test]
fn later_commands_win() {
    let mut world: World = World::default();
    world.queue(WorldCommand::SetFriction(0.5));
    world.queue(WorldCommand::SetCollisionIterations(9));
    world.queue(WorldCommand::SetFriction(0.1));
    world.apply_commands();

    assert_eq!(world.config().friction, 0.1);
    assert_eq!(world.config().collision_iterations, 9);
}

#[test]
fn out_of_range_values_are_sanitized() {
    let mut world: World = World::default();
    world.queue(WorldCommand::SetFriction(-1.0));
    world.queue(WorldCommand::SetRestitution(3.0));
    world.queue(WorldCommand::SetVerletRebuildFreq(0));
    world.queue(WorldCommand::SetVerletSkin(-2.0));
    world.apply_commands();

    let config = world.config();
    assert_eq!(config.friction, 0.0);
    assert_eq!(config.restitution, 1.0);
    assert_eq!(config.verlet_rebuild_freq, 1);
    assert_eq!(config.verlet_skin, 0.0);
}

#[test]
fn paused_world_stands_still() {
    let mut world: World = World::default();
    let p = world.add_particle(Particle::new(Vec2::new(400.0, 100.0)));

    world.queue(WorldCommand::SetPaused(true));
    for _ in 0..5 {
        world.update(1.0 / 60.0);
    }
    assert!(world.is_paused());
    assert_eq!(world.frame(), 0);
    assert_eq!(world.particle(p).unwrap().pos, Vec2::new(400.0, 100.0));

    // Commands still drain while paused.
    world.queue(WorldCommand::SetBounds { width: 1000.0, height: 700.0 });
    world.update(1.0 / 60.0);
    assert_eq!((world.config().width, world.config().height), (1000.0, 700.0));

    world.queue(WorldCommand::TogglePause);
    world.update(1.0 / 60.0);
    assert!(!world.is_paused());
    assert_eq!(world.frame(), 1);
    assert!(world.particle(p).unwrap().pos.y > 100.0);
}

#[test]
fn invalid_time_step_is_ignored() {
    let mut world: World = World::default();
    let p = world.add_particle(Particle::new(Vec2::new(400.0, 100.0)));
    world.queue(WorldCommand::SetFriction(0.2));

    world.update(0.0);
    world.update(-1.0);
    world.update(f64::NAN);

    assert_eq!(world.frame(), 0);
    assert_eq!(world.config().friction, 0.2);
    assert_eq!(world.particle(p).unwrap().pos, Vec2::new(400.0, 100.0));
}

#[test]
fn tune_springs_retunes_every_spring() {
    let mut world: World = World::default();
    let a = world.add_particle(Particle::new(Vec2::new(100.0, 100.0)).with_mass(1.0));
    let b = world.add_particle(Particle::new(Vec2::new(200.0, 100.0)).with_mass(3.0));
    world.add_constraint(SpringConstraint::new(a, b, 100.0, 10.0).with_damping(5.0)).unwrap();

    world.queue(WorldCommand::TuneSprings { rest_length: Some(50.0), stiffness: Some(20.0), damping: None });
    world.apply_commands();
    let s = spring_of(&world);
    assert_eq!(s.rest_length, 50.0);
    assert_eq!(s.stiffness, 20.0);
    assert_eq!(s.damping, Some(5.0));

    world.queue(WorldCommand::TuneSprings { rest_length: None, stiffness: None, damping: Some(None) });
    world.apply_commands();
    let s = spring_of(&world);
    assert_eq!(s.rest_length, 50.0);
    assert_relative_eq!(s.effective_damping(), critical_damping(20.0, 2.0), epsilon = 1e-12);

    world.queue(WorldCommand::TuneSprings { rest_length: None, stiffness: None, damping: Some(Some(1.5)) });
    world.apply_commands();
    assert_eq!(spring_of(&world).damping, Some(1.5));
}

#[test]
fn cell_size_change_forces_a_rebuild() {
    let mut world = World::new(WorldConfig::new().with_verlet_rebuild_freq(100));
    world.add_particle(Particle::new(Vec2::new(100.0, 100.0)));
    world.add_particle(Particle::new(Vec2::new(115.0, 100.0)));

    let mut rebuilds = RebuildCounter::default();
    world.update_with(1.0 / 60.0, &mut rebuilds);
    world.update_with(1.0 / 60.0, &mut rebuilds);
    assert_eq!(rebuilds.0, 1);

    world.queue(WorldCommand::SetCellSize(64.0));
    world.update_with(1.0 / 60.0, &mut rebuilds);
    assert_eq!(rebuilds.0, 2);
    assert_eq!(world.config().cell_size, 64.0);
}

#[test]
fn clear_keeps_configuration() {
    let mut world: World = World::default();
    let a = world.add_particle(Particle::new(Vec2::new(100.0, 100.0)));
    let b = world.add_particle(Particle::new(Vec2::new(150.0, 100.0)));
    world.add_constraint(SpringConstraint::new(a, b, 50.0, 10.0)).unwrap();
    world.create_group(&[a, b], 1.0, false).unwrap();

    world.queue(WorldCommand::SetGravity(Vec2::new(5.0, 5.0)));
    world.queue(WorldCommand::Clear);
    world.update(1.0 / 60.0);

    assert_eq!(world.particle_count(), 0);
    assert_eq!(world.constraint_count(), 0);
    assert_eq!(world.group_count(), 0);
    assert!(world.particle(a).is_none());
    assert_eq!(world.config().gravity, Vec2::new(5.0, 5.0));
}

#[test]
fn commands_serialize_as_json() {
    let command: WorldCommand = WorldCommand::SetBounds { width: 640.0, height: 480.0 };
    let json = serde_json::to_string(&command).unwrap();
    let back: WorldCommand = serde_json::from_str(&json).unwrap();
    assert_eq!(back, command);
}
