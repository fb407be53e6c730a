//! Positional constraints (distance, pin) and the constraint sum type.

use crate::arena::{Arena, ParticleId};
use crate::float::Float;
use crate::particle::Particle;
use crate::spring::SpringConstraint;
use crate::vec::Vec2;

/// Violations smaller than this are left alone so links at rest length don't jitter.
pub const DISTANCE_SLOP: f32 = 1e-4;

const EPSILON: f32 = 1e-9;

/// Particle storage shared by constraints, groups and the world.
pub type Particles<F = f64> = Arena<ParticleId, Particle<F>>;

/// A world-level constraint.
///
/// Distance and pin constraints are positional and run inside the relaxation
/// loop; springs are force based and are evaluated by the integrator instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint<F: Float = f64> {
    Distance(DistanceConstraint<F>),
    Pin(PinConstraint<F>),
    Spring(SpringConstraint<F>),
}

/// Keeps two particles at a fixed separation.
///
/// With `compliance == 0` this is classic position-based dynamics and
/// `stiffness` is the fraction of the violation removed per pass. A positive
/// compliance switches to the compliant (XPBD) update, where stiffness is
/// `1 / compliance` and `stiffness` is ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceConstraint<F: Float = f64> {
    pub a: ParticleId,
    pub b: ParticleId,
    pub rest_distance: F,
    pub stiffness: F,
    pub compliance: F,
    lambda: F,
}

/// Holds one particle at a world-space anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct PinConstraint<F: Float = f64> {
    pub particle: ParticleId,
    pub anchor: Vec2<F>,
}

impl<F: Float> Constraint<F> {
    /// Positional correction for one relaxation pass. Springs are a no-op here.
    pub fn solve(&mut self, particles: &mut Particles<F>, dt: F) {
        match self {
            Constraint::Distance(c) => c.solve(particles, dt),
            Constraint::Pin(c) => c.solve(particles),
            Constraint::Spring(_) => {}
        }
    }

    /// Particles this constraint refers to.
    pub fn particles(&self) -> Vec<ParticleId> {
        match self {
            Constraint::Distance(c) => vec![c.a, c.b],
            Constraint::Pin(c) => vec![c.particle],
            Constraint::Spring(s) => vec![s.a, s.b],
        }
    }

    pub fn references(&self, id: ParticleId) -> bool {
        match self {
            Constraint::Distance(c) => c.a == id || c.b == id,
            Constraint::Pin(c) => c.particle == id,
            Constraint::Spring(s) => s.a == id || s.b == id,
        }
    }

    pub fn is_spring(&self) -> bool {
        matches!(self, Constraint::Spring(_))
    }

    pub(crate) fn begin_step(&mut self) {
        if let Constraint::Distance(c) = self {
            c.reset_lambda();
        }
    }
}

impl<F: Float> From<DistanceConstraint<F>> for Constraint<F> {
    fn from(c: DistanceConstraint<F>) -> Self {
        Constraint::Distance(c)
    }
}

impl<F: Float> From<PinConstraint<F>> for Constraint<F> {
    fn from(c: PinConstraint<F>) -> Self {
        Constraint::Pin(c)
    }
}

impl<F: Float> From<SpringConstraint<F>> for Constraint<F> {
    fn from(c: SpringConstraint<F>) -> Self {
        Constraint::Spring(c)
    }
}

impl<F: Float> DistanceConstraint<F> {
    pub fn new(a: ParticleId, b: ParticleId, rest_distance: F) -> Self {
        DistanceConstraint {
            a,
            b,
            rest_distance,
            stiffness: F::one(),
            compliance: F::zero(),
            lambda: F::zero(),
        }
    }

    /// Rest distance taken from the particles' current separation.
    pub fn from_particles(a: ParticleId, b: ParticleId, particles: &Particles<F>) -> Option<Self> {
        let pa = particles.get(a)?;
        let pb = particles.get(b)?;
        Some(Self::new(a, b, pa.pos.distance(pb.pos)))
    }

    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_compliance(mut self, compliance: F) -> Self {
        self.compliance = compliance;
        self
    }

    /// Current separation minus rest distance, if both endpoints exist.
    pub fn violation(&self, particles: &Particles<F>) -> Option<F> {
        let pa = particles.get(self.a)?;
        let pb = particles.get(self.b)?;
        Some(pa.pos.distance(pb.pos) - self.rest_distance)
    }

    pub(crate) fn reset_lambda(&mut self) {
        self.lambda = F::zero();
    }

    pub fn solve(&mut self, particles: &mut Particles<F>, dt: F) {
        let Some((pa, pb)) = particles.get2_mut(self.a, self.b) else {
            return;
        };
        self.solve_pair(pa, pb, dt);
    }

    pub(crate) fn solve_pair(&mut self, pa: &mut Particle<F>, pb: &mut Particle<F>, dt: F) {
        let wa = pa.inv_mass();
        let wb = pb.inv_mass();
        let w_total = wa + wb;
        if w_total.is_near_zero(F::from_f32(EPSILON)) {
            return; // both fixed
        }

        let delta = pb.pos - pa.pos;
        let dist = delta.length();
        // A non-finite endpoint is rolled back at the end of the step; it must
        // not drag its partner along.
        if !dist.is_finite() || dist.is_near_zero(F::from_f32(EPSILON)) {
            return;
        }
        let n = delta.scale(F::one() / dist);
        let error = dist - self.rest_distance;

        if self.compliance > F::zero() && dt > F::zero() {
            let gamma = self.compliance / (dt * dt);
            let d_lambda = -(error + gamma * self.lambda) / (w_total + gamma);
            pa.pos -= n.scale(wa * d_lambda);
            pb.pos += n.scale(wb * d_lambda);
            self.lambda = self.lambda + d_lambda;
        } else {
            if error.abs() <= F::from_f32(DISTANCE_SLOP) {
                return;
            }
            let s = self.stiffness * error / w_total;
            pa.pos += n.scale(wa * s);
            pb.pos -= n.scale(wb * s);
        }
    }
}

impl<F: Float> PinConstraint<F> {
    pub fn new(particle: ParticleId, anchor: Vec2<F>) -> Self {
        PinConstraint { particle, anchor }
    }

    /// Marks the pinned particle fixed. Called when the pin joins a world.
    pub(crate) fn attach(&self, particles: &mut Particles<F>) {
        if let Some(p) = particles.get_mut(self.particle) {
            p.pin();
        }
    }

    /// Move the pin to another particle, releasing the previous one.
    pub fn set_particle(&mut self, particle: ParticleId, particles: &mut Particles<F>) {
        if let Some(p) = particles.get_mut(self.particle) {
            p.set_fixed(false);
        }
        self.particle = particle;
        self.attach(particles);
    }

    pub fn solve(&self, particles: &mut Particles<F>) {
        if let Some(p) = particles.get_mut(self.particle) {
            p.pos = self.anchor;
            p.vel = Vec2::zero();
        }
    }
}
