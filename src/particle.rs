//! Point masses advanced by the world integrator.

use crate::error::PhysicsError;
use crate::float::Float;
use crate::vec::Vec2;

/// Default particle radius.
pub const DEFAULT_RADIUS: f32 = 6.0;
/// Default particle mass.
pub const DEFAULT_MASS: f32 = 1.0;

/// A point mass with an explicit velocity.
///
/// `mass` and `fixed` are private so the derived inverse mass can never drift
/// out of sync: a fixed particle (or one with non-positive mass) always has an
/// inverse mass of zero and takes no share of any correction.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle<F: Float = f64> {
    pub pos: Vec2<F>,
    pub vel: Vec2<F>,
    pub radius: F,
    mass: F,
    inv_mass: F,
    fixed: bool,
}

impl<F: Float> Particle<F> {
    pub fn new(pos: Vec2<F>) -> Self {
        Particle {
            pos,
            vel: Vec2::zero(),
            radius: F::from_f32(DEFAULT_RADIUS),
            mass: F::from_f32(DEFAULT_MASS),
            inv_mass: F::one() / F::from_f32(DEFAULT_MASS),
            fixed: false,
        }
    }

    /// Validating constructor for input that comes from outside the engine.
    pub fn try_new(pos: Vec2<F>, radius: F, mass: F, fixed: bool) -> Result<Self, PhysicsError> {
        if !pos.is_finite() {
            return Err(PhysicsError::NonFiniteState);
        }
        if !radius.is_finite() || radius < F::zero() {
            return Err(PhysicsError::InvalidRadius);
        }
        if !fixed && !(mass.is_finite() && mass > F::zero()) {
            return Err(PhysicsError::InvalidMass);
        }
        Ok(Particle::new(pos).with_radius(radius).with_mass(mass).fixed(fixed))
    }

    pub fn with_velocity(mut self, vel: Vec2<F>) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_radius(mut self, radius: F) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_mass(mut self, mass: F) -> Self {
        self.set_mass(mass);
        self
    }

    pub fn fixed(mut self, fixed: bool) -> Self {
        self.set_fixed(fixed);
        self
    }

    pub fn mass(&self) -> F {
        self.mass
    }

    pub fn inv_mass(&self) -> F {
        self.inv_mass
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn set_mass(&mut self, mass: F) {
        self.mass = mass;
        self.update_inv_mass();
    }

    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
        self.update_inv_mass();
    }

    /// Pin in place: fixed, at rest.
    pub fn pin(&mut self) {
        self.set_fixed(true);
        self.vel = Vec2::zero();
    }

    fn update_inv_mass(&mut self) {
        self.inv_mass = if self.fixed || !(self.mass > F::zero()) {
            F::zero()
        } else {
            F::one() / self.mass
        };
    }

    /// Position and velocity are both finite.
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite()
    }
}
