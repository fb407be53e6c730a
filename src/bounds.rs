//! Axis-aligned world box: positional clamp and restitution.
//!
//! The two are separate passes. The clamp runs around collision resolution and
//! only moves positions; restitution runs once, after velocities have been
//! reconciled, and only flips velocity components that still point outward.

use crate::float::Float;
use crate::particle::Particle;

fn clamp_axis<F: Float>(v: F, radius: F, extent: F) -> F {
    let lo = radius;
    let hi = extent - radius;
    if lo > hi {
        // Box narrower than the particle: centre it.
        return extent * F::half();
    }
    v.clamp(lo, hi)
}

/// Keep the particle's disc inside `[0, width] x [0, height]`.
///
/// Non-finite positions are left as they are for the world's rollback.
pub fn clamp_to_bounds<F: Float>(p: &mut Particle<F>, width: F, height: F) {
    if p.is_fixed() || !p.pos.is_finite() {
        return;
    }
    p.pos.x = clamp_axis(p.pos.x, p.radius, width);
    p.pos.y = clamp_axis(p.pos.y, p.radius, height);
}

/// Reflect outward velocity components of a particle resting on a wall.
pub fn apply_restitution<F: Float>(p: &mut Particle<F>, width: F, height: F, restitution: F) {
    if p.is_fixed() {
        return;
    }
    let r = p.radius;
    if (p.pos.x <= r && p.vel.x < F::zero()) || (p.pos.x >= width - r && p.vel.x > F::zero()) {
        p.vel.x = -p.vel.x * restitution;
    }
    if (p.pos.y <= r && p.vel.y < F::zero()) || (p.pos.y >= height - r && p.vel.y > F::zero()) {
        p.vel.y = -p.vel.y * restitution;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec::Vec2;

    #[test]
    fn clamp_keeps_disc_inside() {
        let mut p: Particle = Particle::new(Vec2::new(-20.0, 700.0)).with_radius(5.0);
        clamp_to_bounds(&mut p, 800.0, 600.0);
        assert_eq!(p.pos, Vec2::new(5.0, 595.0));
    }

    #[test]
    fn clamp_ignores_fixed() {
        let mut p: Particle = Particle::new(Vec2::new(-20.0, 0.0)).fixed(true);
        clamp_to_bounds(&mut p, 800.0, 600.0);
        assert_eq!(p.pos.x, -20.0);
    }

    #[test]
    fn outward_velocity_is_reflected_and_scaled() {
        let mut p: Particle = Particle::new(Vec2::new(795.0, 300.0))
            .with_radius(5.0)
            .with_velocity(Vec2::new(10.0, 3.0));
        apply_restitution(&mut p, 800.0, 600.0, 0.5);
        assert_eq!(p.vel, Vec2::new(-5.0, 3.0));
    }

    #[test]
    fn inward_velocity_is_left_alone() {
        let mut p: Particle = Particle::new(Vec2::new(5.0, 300.0))
            .with_radius(5.0)
            .with_velocity(Vec2::new(10.0, 0.0));
        apply_restitution(&mut p, 800.0, 600.0, 0.5);
        assert_eq!(p.vel, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn clamp_leaves_nan_alone() {
        let mut p: Particle = Particle::new(Vec2::new(f64::NAN, 10.0));
        clamp_to_bounds(&mut p, 800.0, 600.0);
        assert!(p.pos.x.is_nan());
    }

    #[test]
    fn narrow_box_centres_particle() {
        let mut p: Particle = Particle::new(Vec2::new(1.0, 1.0)).with_radius(10.0);
        clamp_to_bounds(&mut p, 8.0, 100.0);
        assert_eq!(p.pos.x, 4.0);
    }
}
