//! The world: entity ownership and the per-step pipeline.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::arena::{Arena, ArenaId, ConstraintId, GroupId, ParticleId};
use crate::bounds::{apply_restitution, clamp_to_bounds};
use crate::cloth::{per_pass_stiffness, Cloth, ClothConfig};
use crate::collision::{resolve, CollisionPassStats};
use crate::command::WorldCommand;
use crate::config::WorldConfig;
use crate::constraint::{Constraint, Particles, PinConstraint};
use crate::error::PhysicsError;
use crate::float::Float;
use crate::group::Group;
use crate::observer::{NoOpStepObserver, StepObserver};
use crate::particle::Particle;
use crate::rigid::RigidBody;
use crate::spatial::{NeighborList, SpatialGrid};
use crate::vec::Vec2;

/// Owns every particle, constraint and group and advances them together.
///
/// One step (see [`World::update_with`]):
///
/// 1. drain queued commands
/// 2. accumulate gravity, drag and spring forces; semi-implicit Euler
/// 3. constraint relaxation passes (distance, pin, groups)
/// 4. clamp to the world box
/// 5. neighbor-list maintenance and collision passes
/// 6. clamp to the world box
/// 7. velocities from net displacement
/// 8. wall restitution
/// 9. roll back any particle left with non-finite state
///
/// ```
/// use tangle::prelude::*;
///
/// let mut world: World = World::new(WorldConfig::new().with_gravity(Vec2::new(0.0, 0.0)));
/// let a = world.add_particle(Particle::new(Vec2::new(300.0, 200.0)));
/// let b = world.add_particle(Particle::new(Vec2::new(400.0, 200.0)));
/// world.add_constraint(SpringConstraint::new(a, b, 80.0, 15.0)).unwrap();
/// world.update(1.0 / 60.0);
/// assert!(world.particle(a).unwrap().vel.x > 0.0);
/// ```
pub struct World<F: Float = f64> {
    config: WorldConfig<F>,
    particles: Particles<F>,
    constraints: Arena<ConstraintId, Constraint<F>>,
    groups: Arena<GroupId, Group<F>>,
    grid: SpatialGrid<F>,
    neighbors: NeighborList<F>,
    commands: VecDeque<WorldCommand<F>>,
    paused: bool,
    frame: u64,
    /// Bumped on every particle insertion or removal.
    structure_version: u64,
    // Per-step scratch, indexed by particle slot.
    forces: Vec<Vec2<F>>,
    saved: Vec<Option<Particle<F>>>,
}

impl<F: Float> World<F> {
    pub fn new(config: WorldConfig<F>) -> Self {
        World {
            grid: SpatialGrid::new(config.cell_size),
            config,
            particles: Arena::new(),
            constraints: Arena::new(),
            groups: Arena::new(),
            neighbors: NeighborList::new(),
            commands: VecDeque::new(),
            paused: false,
            frame: 0,
            structure_version: 0,
            forces: Vec::new(),
            saved: Vec::new(),
        }
    }

    // -- particles ---------------------------------------------------------

    pub fn add_particle(&mut self, particle: Particle<F>) -> ParticleId {
        self.structure_version += 1;
        self.particles.insert(particle)
    }

    /// Remove a particle, every constraint that references it, and its group
    /// memberships. Groups left without members are removed. A stale handle is
    /// a no-op.
    pub fn remove_particle(&mut self, id: ParticleId) -> Option<Particle<F>> {
        let removed = self.particles.remove(id)?;
        self.structure_version += 1;

        let dropped = self.constraints.retain(|_, c| !c.references(id));
        for group in self.groups.values_mut() {
            group.forget(id);
        }
        let particles = &self.particles;
        let emptied = self.groups.retain(|_, g| g.is_alive(particles));
        debug!(?id, constraints = dropped.len(), groups = emptied.len(), "particle removed");
        Some(removed)
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle<F>> {
        self.particles.get(id)
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle<F>> {
        self.particles.get_mut(id)
    }

    /// Particles in slot order.
    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle<F>)> + '_ {
        self.particles.iter()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// The particle whose disc contains `point`, nearest centre first.
    pub fn particle_at(&self, point: Vec2<F>) -> Option<ParticleId> {
        let mut best: Option<(ParticleId, F)> = None;
        for (id, p) in self.particles.iter() {
            let d = p.pos.distance_sq(point);
            if d > p.radius * p.radius {
                continue;
            }
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((id, d));
            }
        }
        best.map(|(id, _)| id)
    }

    // -- constraints -------------------------------------------------------

    /// Validate and insert a constraint.
    ///
    /// Endpoints must exist and be distinct. A spring without an explicit
    /// damping gets the critical value for its endpoints' masses; a pin marks
    /// its particle fixed.
    pub fn add_constraint(&mut self, constraint: impl Into<Constraint<F>>) -> Result<ConstraintId, PhysicsError> {
        let mut constraint = constraint.into();
        let ends = constraint.particles();
        for &id in &ends {
            if !self.particles.contains(id) {
                return Err(PhysicsError::missing(id));
            }
        }
        if ends.len() == 2 && ends[0] == ends[1] {
            return Err(PhysicsError::DegenerateConstraint);
        }

        match &mut constraint {
            Constraint::Distance(c) => {
                if !non_negative(c.stiffness) || !non_negative(c.compliance) || !non_negative(c.rest_distance) {
                    return Err(PhysicsError::InvalidStiffness);
                }
            }
            Constraint::Spring(s) => {
                if !non_negative(s.stiffness) || !non_negative(s.rest_length) {
                    return Err(PhysicsError::InvalidStiffness);
                }
                if s.damping.is_some_and(|d| !non_negative(d)) {
                    return Err(PhysicsError::InvalidStiffness);
                }
                let (ma, mb) = self.masses(s.a, s.b);
                s.resolve_damping(ma, mb);
            }
            Constraint::Pin(pin) => {
                if !pin.anchor.is_finite() {
                    return Err(PhysicsError::NonFiniteState);
                }
                pin.attach(&mut self.particles);
            }
        }
        Ok(self.constraints.insert(constraint))
    }

    /// Remove a constraint. Particles it referenced keep their state; a pinned
    /// particle stays fixed.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<Constraint<F>> {
        self.constraints.remove(id)
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint<F>> {
        self.constraints.get(id)
    }

    /// Live access for retuning parameters between steps.
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint<F>> {
        self.constraints.get_mut(id)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint<F>)> + '_ {
        self.constraints.iter()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Move a pin to another particle, releasing the one it held.
    pub fn repin(&mut self, id: ConstraintId, particle: ParticleId) -> Result<(), PhysicsError> {
        if !self.particles.contains(particle) {
            return Err(PhysicsError::missing(particle));
        }
        match self.constraints.get_mut(id) {
            Some(Constraint::Pin(pin)) => {
                pin.set_particle(particle, &mut self.particles);
                Ok(())
            }
            Some(_) => Err(PhysicsError::NotAPin),
            None => Err(PhysicsError::missing_constraint(id)),
        }
    }

    fn masses(&self, a: ParticleId, b: ParticleId) -> (F, F) {
        let mass = |id| self.particles.get(id).map_or(F::one(), |p: &Particle<F>| p.mass());
        (mass(a), mass(b))
    }

    // -- groups ------------------------------------------------------------

    /// Lay out a cloth sheet with its top-left particle at `top_left`.
    ///
    /// Pinned particles are held by world-level pin constraints at their
    /// initial positions. The cloth's link stiffness is converted to a
    /// per-pass value for the current `constraint_iterations`.
    pub fn create_cloth(&mut self, top_left: Vec2<F>, cloth: &ClothConfig<F>) -> Result<GroupId, PhysicsError> {
        let size_ok = cloth.width.is_finite()
            && cloth.height.is_finite()
            && cloth.width > F::zero()
            && cloth.height > F::zero();
        if cloth.segments_x == 0 || cloth.segments_y == 0 || !size_ok {
            return Err(PhysicsError::InvalidGridDimensions);
        }
        if !non_negative(cloth.stiffness) || !non_negative(cloth.tear_factor) {
            return Err(PhysicsError::InvalidStiffness);
        }
        if !top_left.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        let template = Particle::try_new(top_left, cloth.particle_radius, cloth.particle_mass, false)?;

        let (cols, rows) = (cloth.cols(), cloth.rows());
        let dx = cloth.width / F::from_f32(cloth.segments_x as f32);
        let dy = cloth.height / F::from_f32(cloth.segments_y as f32);
        let mut ids = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let offset = Vec2::new(dx * F::from_f32(col as f32), dy * F::from_f32(row as f32));
                let mut p = template.clone();
                p.pos = top_left + offset;
                ids.push(self.add_particle(p));
            }
        }

        let pinned: Vec<usize> = if cloth.pin_top_row {
            (0..cols).collect()
        } else if cloth.pinned_corners {
            vec![0, cols - 1]
        } else {
            Vec::new()
        };
        for col in pinned {
            let id = ids[col];
            let anchor = self.particles.get(id).map_or(top_left, |p| p.pos);
            self.add_constraint(PinConstraint::new(id, anchor))?;
        }

        let k = per_pass_stiffness(cloth.stiffness, self.config.constraint_iterations);
        let sheet = Cloth::new(ids, cols, rows, &self.particles, k, cloth.tear_factor);
        debug!(cols, rows, links = sheet.constraint_count(), "cloth created");
        Ok(self.groups.insert(sheet.into()))
    }

    /// Make the given particles a shape-matched rigid body, taking their
    /// current layout as the rest shape.
    pub fn create_group(&mut self, ids: &[ParticleId], stiffness: F, fixed: bool) -> Result<GroupId, PhysicsError> {
        if ids.is_empty() {
            return Err(PhysicsError::EmptyGroup);
        }
        if let Some(&missing) = ids.iter().find(|&&id| !self.particles.contains(id)) {
            return Err(PhysicsError::missing(missing));
        }
        if !non_negative(stiffness) {
            return Err(PhysicsError::InvalidStiffness);
        }
        let body = RigidBody::new(ids, &self.particles, stiffness, fixed);
        Ok(self.groups.insert(body.into()))
    }

    pub(crate) fn insert_group(&mut self, group: Group<F>) -> GroupId {
        self.groups.insert(group)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group<F>> {
        self.groups.get(id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group<F>> {
        self.groups.get_mut(id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group<F>)> + '_ {
        self.groups.iter()
    }

    /// Remove a group. Its particles stay in the world; a cloth's private
    /// links go with it.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group<F>> {
        self.groups.remove(id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // -- configuration and commands ----------------------------------------

    pub fn config(&self) -> &WorldConfig<F> {
        &self.config
    }

    pub fn set_config(&mut self, config: WorldConfig<F>) {
        self.grid.set_cell_size(config.cell_size);
        self.neighbors.invalidate();
        self.config = config;
    }

    pub fn queue(&mut self, command: WorldCommand<F>) {
        self.commands.push_back(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Apply every queued command now, in the order queued.
    pub fn apply_commands(&mut self) {
        while let Some(command) = self.commands.pop_front() {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: WorldCommand<F>) {
        debug!(?command, "applying command");
        match command {
            WorldCommand::SetGravity(g) => self.config.gravity = g,
            WorldCommand::SetFriction(f) => self.config.friction = f.max(F::zero()),
            WorldCommand::SetRestitution(r) => self.config.restitution = r.clamp(F::zero(), F::one()),
            WorldCommand::SetCollisionIterations(n) => self.config.collision_iterations = n,
            WorldCommand::SetConstraintIterations(n) => self.config.constraint_iterations = n,
            WorldCommand::SetCellSize(size) => {
                self.config.cell_size = size;
                self.grid.set_cell_size(size);
                self.neighbors.invalidate();
            }
            WorldCommand::SetVerletRebuildFreq(n) => self.config.verlet_rebuild_freq = n.max(1),
            WorldCommand::SetVerletSkin(skin) => {
                self.config.verlet_skin = skin.max(F::zero());
                self.neighbors.invalidate();
            }
            WorldCommand::SetBounds { width, height } => {
                self.config.width = width;
                self.config.height = height;
            }
            WorldCommand::SetPaused(paused) => self.paused = paused,
            WorldCommand::TogglePause => self.paused = !self.paused,
            WorldCommand::TuneSprings { rest_length, stiffness, damping } => {
                self.tune_springs(rest_length, stiffness, damping)
            }
            WorldCommand::Clear => self.clear(),
        }
    }

    fn tune_springs(&mut self, rest_length: Option<F>, stiffness: Option<F>, damping: Option<Option<F>>) {
        let particles = &self.particles;
        for c in self.constraints.values_mut() {
            let Constraint::Spring(s) = c else {
                continue;
            };
            if let Some(l) = rest_length {
                s.rest_length = l;
            }
            if let Some(k) = stiffness {
                s.stiffness = k;
            }
            if let Some(d) = damping {
                s.damping = d;
                let mass = |id| particles.get(id).map_or(F::one(), |p: &Particle<F>| p.mass());
                s.resolve_damping(mass(s.a), mass(s.b));
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub(crate) fn set_frame(&mut self, frame: u64) {
        self.frame = frame;
    }

    /// Steps advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Remove every particle, constraint and group. Configuration is kept.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.constraints.clear();
        self.groups.clear();
        self.neighbors.invalidate();
        self.structure_version += 1;
    }

    /// Candidate pairs from the last neighbor-list rebuild.
    pub fn neighbor_pairs(&self) -> impl Iterator<Item = (ParticleId, ParticleId)> + '_ {
        self.neighbors.pairs().iter().filter_map(|&(i, j)| {
            Some((self.particles.id_at_slot(i)?, self.particles.id_at_slot(j)?))
        })
    }

    // -- stepping ----------------------------------------------------------

    pub fn update(&mut self, dt: F) {
        self.update_with(dt, &mut NoOpStepObserver);
    }

    /// Advance one step of `dt` seconds, reporting progress to `observer`.
    ///
    /// A paused world, or a `dt` that is not finite and positive, only
    /// drains the command queue.
    pub fn update_with<O: StepObserver<F> + ?Sized>(&mut self, dt: F, observer: &mut O) {
        self.apply_commands();
        if self.paused || !(dt.is_finite() && dt > F::zero()) {
            return;
        }
        self.frame += 1;

        self.begin_step();
        self.integrate(dt);
        observer.on_integrate();

        for i in 0..self.config.constraint_iterations {
            self.relax(dt);
            observer.on_constraint_iteration(i);
        }

        self.clamp_all();
        self.collide(observer);
        self.clamp_all();

        self.reconcile_velocities(dt);
        let (width, height, e) = (self.config.width, self.config.height, self.config.restitution);
        for p in self.particles.values_mut() {
            apply_restitution(p, width, height, e);
        }

        self.reject_non_finite(observer);
        observer.on_step_complete();
        trace!(frame = self.frame, particles = self.particles.len(), "step complete");
    }

    fn begin_step(&mut self) {
        let slots = self.particles.slot_capacity();
        self.saved.clear();
        self.saved.extend((0..slots).map(|s| self.particles.get_by_slot(s).cloned()));
        for c in self.constraints.values_mut() {
            c.begin_step();
        }
        for g in self.groups.values_mut() {
            g.begin_step();
        }
    }

    fn integrate(&mut self, dt: F) {
        let slots = self.particles.slot_capacity();
        self.forces.clear();
        self.forces.resize(slots, Vec2::zero());

        let gravity = self.config.gravity;
        let friction = self.config.friction;
        for (slot, force) in self.forces.iter_mut().enumerate() {
            if let Some(p) = self.particles.get_by_slot(slot) {
                if !p.is_fixed() {
                    *force = gravity.scale(p.mass()) - p.vel.scale(friction);
                }
            }
        }

        for c in self.constraints.values() {
            let Constraint::Spring(s) = c else {
                continue;
            };
            let (Some(pa), Some(pb)) = (self.particles.get(s.a), self.particles.get(s.b)) else {
                continue;
            };
            let f = s.compute_force(pa.pos, pb.pos, pa.vel, pb.vel);
            self.forces[s.a.index() as usize] += f;
            self.forces[s.b.index() as usize] -= f;
        }

        for (slot, force) in self.forces.iter().enumerate() {
            let Some(p) = self.particles.get_by_slot_mut(slot) else {
                continue;
            };
            if p.is_fixed() {
                continue;
            }
            p.vel += force.scale(p.inv_mass() * dt);
            p.pos += p.vel * dt;
        }
    }

    fn relax(&mut self, dt: F) {
        for c in self.constraints.values_mut() {
            c.solve(&mut self.particles, dt);
        }
        for g in self.groups.values_mut() {
            g.solve(&mut self.particles, dt);
        }
    }

    fn clamp_all(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        for p in self.particles.values_mut() {
            clamp_to_bounds(p, width, height);
        }
    }

    fn collide<O: StepObserver<F> + ?Sized>(&mut self, observer: &mut O) {
        let count = self.particles.len();
        let freq = self.config.verlet_rebuild_freq;
        if self.neighbors.needs_rebuild(self.frame, freq, count, self.structure_version) {
            self.neighbors.rebuild(&self.particles, &mut self.grid, self.config.verlet_skin, self.structure_version);
            observer.on_neighbor_rebuild(self.neighbors.pairs().len());
        }

        let params = self.config.collision_params();
        for pass in 0..self.config.collision_iterations {
            let mut stats = CollisionPassStats::default();
            for &(i, j) in self.neighbors.pairs() {
                let Some((a, b)) = self.particles.get2_by_slot_mut(i, j) else {
                    continue;
                };
                if let Some(correction) = resolve(a, b, &params) {
                    stats.record(correction);
                }
            }
            observer.on_collision_pass(pass, &stats);
        }
    }

    fn reconcile_velocities(&mut self, dt: F) {
        for (slot, before) in self.saved.iter().enumerate() {
            let (Some(before), Some(p)) = (before, self.particles.get_by_slot_mut(slot)) else {
                continue;
            };
            if !p.is_fixed() {
                p.vel = (p.pos - before.pos) / dt;
            }
        }
    }

    fn reject_non_finite<O: StepObserver<F> + ?Sized>(&mut self, observer: &mut O) {
        for (slot, before) in self.saved.iter().enumerate() {
            let Some(before) = before else {
                continue;
            };
            let Some(p) = self.particles.get_by_slot_mut(slot) else {
                continue;
            };
            if p.is_finite() {
                continue;
            }
            *p = before.clone();
            if let Some(id) = self.particles.id_at_slot(slot) {
                warn!(?id, frame = self.frame, "non-finite particle state, step discarded");
                observer.on_particle_rejected(id);
            }
        }
    }
}

impl<F: Float> Default for World<F> {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

fn non_negative<F: Float>(v: F) -> bool {
    v.is_finite() && v >= F::zero()
}
