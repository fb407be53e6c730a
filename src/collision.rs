//! Narrow phase: circle-circle overlap and positional separation.
//!
//! Resolution only moves positions. The world reconciles velocities from the
//! net displacement once every pass has run.

use crate::float::Float;
use crate::particle::Particle;
use crate::vec::Vec2;

const EPSILON: f32 = 1e-9;

/// Tuning for one resolution pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionParams<F: Float = f64> {
    /// Penetration depth ignored before correcting.
    pub slop: F,
    /// Fraction of the remaining penetration removed per pass.
    pub percent: F,
    /// Largest displacement any one particle may receive in a single pass.
    pub max_correction: F,
}

impl<F: Float> Default for CollisionParams<F> {
    fn default() -> Self {
        CollisionParams {
            slop: F::from_f32(0.001),
            percent: F::one(),
            max_correction: F::from_f32(0.9),
        }
    }
}

/// Per-pass collision statistics reported to observers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CollisionPassStats<F: Float = f64> {
    /// Overlapping pairs found in the pass.
    pub contacts: usize,
    /// Largest single-particle correction applied in the pass.
    pub max_correction: F,
}

impl<F: Float> CollisionPassStats<F> {
    pub(crate) fn record(&mut self, correction: F) {
        self.contacts += 1;
        self.max_correction = self.max_correction.max(correction);
    }
}

/// Whether two circles overlap (touching does not count).
pub fn intersects<F: Float>(a: &Particle<F>, b: &Particle<F>) -> bool {
    let r = a.radius + b.radius;
    a.pos.distance_sq(b.pos) < r * r
}

/// Push an overlapping pair apart along the line between their centres.
///
/// Returns `None` when the pair does not overlap or both are fixed, otherwise
/// the larger of the two displacements applied (zero when the penetration is
/// within the slop). The split follows inverse mass; when the clamp kicks in
/// both shares are scaled together so the split is kept.
pub fn resolve<F: Float>(a: &mut Particle<F>, b: &mut Particle<F>, params: &CollisionParams<F>) -> Option<F> {
    let wa = a.inv_mass();
    let wb = b.inv_mass();
    let w_total = wa + wb;
    if w_total.is_near_zero(F::from_f32(EPSILON)) {
        return None;
    }
    if !intersects(a, b) {
        return None;
    }

    let delta = b.pos - a.pos;
    let dist = delta.length();
    // Coincident centres have no separating axis; pick +x.
    let normal = if dist.is_near_zero(F::from_f32(EPSILON)) {
        Vec2::new(F::one(), F::zero())
    } else {
        delta.scale(F::one() / dist)
    };

    let penetration = a.radius + b.radius - dist;
    let depth = (penetration - params.slop).max(F::zero()) * params.percent;
    if !(depth > F::zero()) {
        return Some(F::zero());
    }

    let mut share_a = depth * wa / w_total;
    let mut share_b = depth * wb / w_total;
    let largest = share_a.max(share_b);
    let limit = params.max_correction.abs();
    if largest > limit {
        let k = limit / largest;
        share_a = share_a * k;
        share_b = share_b * k;
    }

    a.pos -= normal.scale(share_a);
    b.pos += normal.scale(share_b);
    Some(share_a.max(share_b))
}
