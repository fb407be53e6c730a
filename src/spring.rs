//! Damped springs between two particles.
//!
//! Unlike distance constraints, springs never move particles directly. The
//! integrator evaluates [`SpringConstraint::compute_force`] from the current
//! positions and velocities and feeds the result into the force accumulators.

use crate::arena::ParticleId;
use crate::float::Float;
use crate::vec::Vec2;

/// Default clamp on spring force magnitude.
pub const DEFAULT_MAX_FORCE: f32 = 1.0e5;

const EPSILON: f32 = 1e-9;

/// A Hookean spring with viscous damping along its axis.
#[derive(Clone, Debug, PartialEq)]
pub struct SpringConstraint<F: Float = f64> {
    pub a: ParticleId,
    pub b: ParticleId,
    pub rest_length: F,
    pub stiffness: F,
    /// `None` means "critically damped"; resolved when the spring joins a world.
    pub damping: Option<F>,
    pub max_force: F,
}

/// Damping coefficient that makes a spring between two masses critically damped.
pub fn critical_damping<F: Float>(stiffness: F, average_mass: F) -> F {
    let km = stiffness * average_mass;
    if !(km > F::zero()) {
        return F::zero();
    }
    F::two() * km.sqrt()
}

impl<F: Float> SpringConstraint<F> {
    pub fn new(a: ParticleId, b: ParticleId, rest_length: F, stiffness: F) -> Self {
        SpringConstraint {
            a,
            b,
            rest_length,
            stiffness,
            damping: None,
            max_force: F::from_f32(DEFAULT_MAX_FORCE),
        }
    }

    pub fn with_damping(mut self, damping: F) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_max_force(mut self, max_force: F) -> Self {
        self.max_force = max_force;
        self
    }

    /// Replace an unset damping coefficient with the critical value for the given masses.
    pub fn resolve_damping(&mut self, mass_a: F, mass_b: F) {
        if self.damping.is_none() {
            self.damping = Some(critical_damping(self.stiffness, (mass_a + mass_b) * F::half()));
        }
    }

    /// Damping coefficient in effect; zero until resolved.
    pub fn effective_damping(&self) -> F {
        self.damping.unwrap_or_else(F::zero)
    }

    /// Force acting on endpoint `a`; endpoint `b` receives the negation.
    ///
    /// Pure function of the inputs. Returns zero for coincident endpoints or a
    /// non-finite result, and clamps the magnitude to `max_force`.
    pub fn compute_force(
        &self,
        p1_pos: Vec2<F>,
        p2_pos: Vec2<F>,
        p1_vel: Vec2<F>,
        p2_vel: Vec2<F>,
    ) -> Vec2<F> {
        let delta = p2_pos - p1_pos;
        let dist = delta.length();
        if !dist.is_finite() || dist.is_near_zero(F::from_f32(EPSILON)) {
            return Vec2::zero();
        }
        let n = delta.scale(F::one() / dist);
        let stretch = dist - self.rest_length;
        let closing = (p2_vel - p1_vel).dot(n);
        let mut magnitude = self.stiffness * stretch + self.effective_damping() * closing;
        if !magnitude.is_finite() {
            return Vec2::zero();
        }
        let limit = self.max_force.abs();
        magnitude = magnitude.clamp(-limit, limit);
        n.scale(magnitude)
    }
}
