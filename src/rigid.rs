//! Shape-matched rigid bodies.
//!
//! Each pass finds the rotation that best maps the rest shape onto the
//! particles' current layout (2D shape matching) and pulls every particle
//! toward its place in that rotated rest shape.

use crate::arena::ParticleId;
use crate::constraint::Particles;
use crate::float::Float;
use crate::vec::Vec2;

#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody<F: Float = f64> {
    particles: Vec<ParticleId>,
    rest_offsets: Vec<Vec2<F>>,
    pub stiffness: F,
    pub fixed: bool,
}

fn centroid<F: Float>(points: &[Vec2<F>]) -> Vec2<F> {
    if points.is_empty() {
        return Vec2::zero();
    }
    let mut sum = Vec2::zero();
    for p in points {
        sum += *p;
    }
    sum.scale(F::one() / F::from_f32(points.len() as f32))
}

impl<F: Float> RigidBody<F> {
    /// Capture the rest shape from the particles' current positions.
    /// Handles that don't resolve are skipped.
    pub fn new(ids: &[ParticleId], particles: &Particles<F>, stiffness: F, fixed: bool) -> Self {
        let mut kept = Vec::with_capacity(ids.len());
        let mut positions = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(p) = particles.get(id) {
                kept.push(id);
                positions.push(p.pos);
            }
        }
        let rest_centroid = centroid(&positions);
        let rest_offsets = positions.iter().map(|&p| p - rest_centroid).collect();
        RigidBody { particles: kept, rest_offsets, stiffness, fixed }
    }

    pub(crate) fn from_parts(
        particles: Vec<ParticleId>,
        rest_offsets: Vec<Vec2<F>>,
        stiffness: F,
        fixed: bool,
    ) -> Self {
        RigidBody { particles, rest_offsets, stiffness, fixed }
    }

    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    /// Offsets of each particle from the rest centroid.
    pub fn rest_offsets(&self) -> &[Vec2<F>] {
        &self.rest_offsets
    }

    /// Drop a particle and re-centre the remaining rest shape.
    pub(crate) fn forget(&mut self, id: ParticleId) {
        let Some(i) = self.particles.iter().position(|&p| p == id) else {
            return;
        };
        self.particles.remove(i);
        self.rest_offsets.remove(i);
        let shift = centroid(&self.rest_offsets);
        for r in self.rest_offsets.iter_mut() {
            *r -= shift;
        }
    }

    /// Best-fit rotation angle of the rest shape (offsets taken about
    /// `rest_center`) onto the current positions about `center`, or `None`
    /// when it is undefined.
    fn best_rotation(&self, current: &[(usize, Vec2<F>)], center: Vec2<F>, rest_center: Vec2<F>) -> Option<(F, F)> {
        let mut dot_sum = F::zero();
        let mut cross_sum = F::zero();
        for &(i, pos) in current {
            let p = pos - center;
            let r = self.rest_offsets[i] - rest_center;
            dot_sum = dot_sum + r.dot(p);
            cross_sum = cross_sum + r.cross(p);
        }
        if dot_sum == F::zero() && cross_sum == F::zero() {
            return None;
        }
        let theta = F::atan2(cross_sum, dot_sum);
        Some((theta.cos(), theta.sin()))
    }

    pub fn solve(&self, particles: &mut Particles<F>, _dt: F) {
        if self.fixed || self.particles.len() < 2 {
            return;
        }

        let current: Vec<(usize, Vec2<F>)> = self
            .particles
            .iter()
            .enumerate()
            .filter_map(|(i, &id)| particles.get(id).map(|p| (i, p.pos)))
            .filter(|(_, pos)| pos.is_finite())
            .collect();
        if current.len() < 2 {
            return;
        }
        let positions: Vec<Vec2<F>> = current.iter().map(|&(_, p)| p).collect();
        let center = centroid(&positions);
        // Match only the members present, about their own rest centroid.
        let rest_center = if current.len() == self.particles.len() {
            Vec2::zero()
        } else {
            let offsets: Vec<Vec2<F>> = current.iter().map(|&(i, _)| self.rest_offsets[i]).collect();
            centroid(&offsets)
        };
        let (cos_t, sin_t) = self.best_rotation(&current, center, rest_center).unwrap_or((F::one(), F::zero()));
        let alpha = self.stiffness.clamp(F::zero(), F::one());

        for &(i, _) in &current {
            let Some(p) = particles.get_mut(self.particles[i]) else {
                continue;
            };
            if p.is_fixed() {
                continue;
            }
            let target = center + (self.rest_offsets[i] - rest_center).rotated(cos_t, sin_t);
            p.pos = p.pos.lerp(target, alpha);
        }
    }
}
