//! Composite solvers that act on a subset of the world's particles.

use crate::arena::ParticleId;
use crate::cloth::Cloth;
use crate::constraint::Particles;
use crate::float::Float;
use crate::rigid::RigidBody;

/// A group solver, run once per relaxation pass.
#[derive(Clone, Debug, PartialEq)]
pub enum Group<F: Float = f64> {
    Cloth(Cloth<F>),
    RigidBody(RigidBody<F>),
}

impl<F: Float> Group<F> {
    pub fn solve(&mut self, particles: &mut Particles<F>, dt: F) {
        match self {
            Group::Cloth(c) => c.solve(particles, dt),
            Group::RigidBody(r) => r.solve(particles, dt),
        }
    }

    /// Member particles still present in the world.
    pub fn particles(&self) -> Vec<ParticleId> {
        match self {
            Group::Cloth(c) => c.particles().collect(),
            Group::RigidBody(r) => r.particles().to_vec(),
        }
    }

    /// At least one member particle still exists.
    pub fn is_alive(&self, particles: &Particles<F>) -> bool {
        self.particles().iter().any(|&id| particles.contains(id))
    }

    pub fn as_cloth(&self) -> Option<&Cloth<F>> {
        match self {
            Group::Cloth(c) => Some(c),
            Group::RigidBody(_) => None,
        }
    }

    pub fn as_cloth_mut(&mut self) -> Option<&mut Cloth<F>> {
        match self {
            Group::Cloth(c) => Some(c),
            Group::RigidBody(_) => None,
        }
    }

    pub fn as_rigid_body(&self) -> Option<&RigidBody<F>> {
        match self {
            Group::RigidBody(r) => Some(r),
            Group::Cloth(_) => None,
        }
    }

    pub fn as_rigid_body_mut(&mut self) -> Option<&mut RigidBody<F>> {
        match self {
            Group::RigidBody(r) => Some(r),
            Group::Cloth(_) => None,
        }
    }

    pub(crate) fn forget(&mut self, id: ParticleId) {
        match self {
            Group::Cloth(c) => c.forget(id),
            Group::RigidBody(r) => r.forget(id),
        }
    }

    pub(crate) fn begin_step(&mut self) {
        if let Group::Cloth(c) = self {
            c.begin_step();
        }
    }
}

impl<F: Float> From<Cloth<F>> for Group<F> {
    fn from(c: Cloth<F>) -> Self {
        Group::Cloth(c)
    }
}

impl<F: Float> From<RigidBody<F>> for Group<F> {
    fn from(r: RigidBody<F>) -> Self {
        Group::RigidBody(r)
    }
}
