//! Cloth: a grid of world particles held together by private distance constraints.

use tracing::debug;

use crate::arena::ParticleId;
use crate::constraint::{DistanceConstraint, Particles};
use crate::float::Float;
use crate::particle::{DEFAULT_MASS, DEFAULT_RADIUS};

/// Configuration for a cloth sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct ClothConfig<F: Float = f64> {
    /// Sheet extent along x.
    pub width: F,
    /// Sheet extent along y.
    pub height: F,
    pub segments_x: usize,
    pub segments_y: usize,
    /// A link tears once stretched to `rest * tear_factor`. Zero disables tearing.
    pub tear_factor: F,
    /// Pin the two top corners in place.
    pub pinned_corners: bool,
    /// Pin every particle of the top row.
    pub pin_top_row: bool,
    /// Target stiffness in [0, 1] after all relaxation passes of a step.
    pub stiffness: F,
    pub particle_radius: F,
    pub particle_mass: F,
}

impl<F: Float> Default for ClothConfig<F> {
    fn default() -> Self {
        ClothConfig {
            width: F::from_f32(150.0),
            height: F::from_f32(150.0),
            segments_x: 5,
            segments_y: 5,
            tear_factor: F::zero(),
            pinned_corners: true,
            pin_top_row: false,
            stiffness: F::half(),
            particle_radius: F::from_f32(DEFAULT_RADIUS),
            particle_mass: F::from_f32(DEFAULT_MASS),
        }
    }
}

impl<F: Float> ClothConfig<F> {
    pub fn with_size(mut self, width: F, height: F) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_segments(mut self, segments_x: usize, segments_y: usize) -> Self {
        self.segments_x = segments_x;
        self.segments_y = segments_y;
        self
    }

    pub fn with_tear_factor(mut self, tear_factor: F) -> Self {
        self.tear_factor = tear_factor;
        self
    }

    pub fn with_stiffness(mut self, stiffness: F) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_pinned_corners(mut self, pinned: bool) -> Self {
        self.pinned_corners = pinned;
        self
    }

    pub fn with_pinned_top_row(mut self, pinned: bool) -> Self {
        self.pin_top_row = pinned;
        self
    }

    pub fn with_particles(mut self, radius: F, mass: F) -> Self {
        self.particle_radius = radius;
        self.particle_mass = mass;
        self
    }

    pub fn cols(&self) -> usize {
        self.segments_x + 1
    }

    pub fn rows(&self) -> usize {
        self.segments_y + 1
    }
}

/// Stiffness to apply on each of `iterations` passes so the compound effect
/// over a step matches `stiffness`.
pub fn per_pass_stiffness<F: Float>(stiffness: F, iterations: usize) -> F {
    let s = stiffness.clamp(F::zero(), F::one());
    if iterations == 0 || s >= F::one() {
        return s;
    }
    let exponent = F::one() / F::from_f32(iterations as f32);
    F::one() - (F::one() - s).powf(exponent)
}

/// A cloth sheet over a row-major grid of world particles.
///
/// The constraints are owned by the cloth, not by the world, so tearing only
/// ever shrinks this private list. Grid cells whose particle was removed from
/// the world become `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cloth<F: Float = f64> {
    particles: Vec<Option<ParticleId>>,
    constraints: Vec<DistanceConstraint<F>>,
    cols: usize,
    rows: usize,
    tear_factor: F,
}

impl<F: Float> Cloth<F> {
    /// Build structural (right, down) and shear (both diagonals) links from
    /// the particles' current positions.
    ///
    /// `particles` holds `cols * rows` handles in row-major order.
    pub fn new(
        particles: Vec<ParticleId>,
        cols: usize,
        rows: usize,
        arena: &Particles<F>,
        pass_stiffness: F,
        tear_factor: F,
    ) -> Self {
        let mut constraints = Vec::new();
        let at = |col: usize, row: usize| particles[row * cols + col];
        let mut link = |a: ParticleId, b: ParticleId| {
            if let Some(c) = DistanceConstraint::from_particles(a, b, arena) {
                constraints.push(c.with_stiffness(pass_stiffness));
            }
        };

        for row in 0..rows {
            for col in 0..cols {
                let here = at(col, row);
                // Structural
                if col + 1 < cols {
                    link(here, at(col + 1, row));
                }
                if row + 1 < rows {
                    link(here, at(col, row + 1));
                }
                // Shear
                if col + 1 < cols && row + 1 < rows {
                    link(here, at(col + 1, row + 1));
                }
                if col >= 1 && row + 1 < rows {
                    link(here, at(col - 1, row + 1));
                }
            }
        }

        let particles = particles.into_iter().map(Some).collect();
        Cloth { particles, constraints, cols, rows, tear_factor }
    }

    /// Reassemble a cloth from persisted parts.
    pub(crate) fn from_parts(
        particles: Vec<Option<ParticleId>>,
        constraints: Vec<DistanceConstraint<F>>,
        cols: usize,
        rows: usize,
        tear_factor: F,
    ) -> Self {
        Cloth { particles, constraints, cols, rows, tear_factor }
    }

    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    pub fn particle_at(&self, col: usize, row: usize) -> Option<ParticleId> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.particles.get(self.index(col, row)).copied().flatten()
    }

    /// Member particles still present, in row-major order.
    pub fn particles(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.particles.iter().flatten().copied()
    }

    /// Row-major grid cells, `None` where the particle is gone.
    pub fn cells(&self) -> &[Option<ParticleId>] {
        &self.particles
    }

    pub fn constraints(&self) -> &[DistanceConstraint<F>] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut [DistanceConstraint<F>] {
        &mut self.constraints
    }

    pub fn cols(&self) -> usize { self.cols }
    pub fn rows(&self) -> usize { self.rows }
    pub fn constraint_count(&self) -> usize { self.constraints.len() }
    pub fn tear_factor(&self) -> F { self.tear_factor }

    pub fn set_tear_factor(&mut self, tear_factor: F) {
        self.tear_factor = tear_factor;
    }

    /// Cut every link attached to the particle at (col, row).
    pub fn tear_at(&mut self, col: usize, row: usize) {
        if let Some(id) = self.particle_at(col, row) {
            self.unlink(id);
        }
    }

    pub(crate) fn forget(&mut self, id: ParticleId) {
        self.unlink(id);
        for cell in self.particles.iter_mut() {
            if *cell == Some(id) {
                *cell = None;
            }
        }
    }

    fn unlink(&mut self, id: ParticleId) {
        self.constraints.retain(|c| c.a != id && c.b != id);
    }

    pub(crate) fn begin_step(&mut self) {
        for c in self.constraints.iter_mut() {
            c.reset_lambda();
        }
    }

    /// One relaxation pass over the internal links, then tearing.
    pub fn solve(&mut self, particles: &mut Particles<F>, dt: F) {
        for c in self.constraints.iter_mut() {
            c.solve(particles, dt);
        }

        if self.tear_factor > F::zero() {
            let factor = self.tear_factor;
            let before = self.constraints.len();
            self.constraints.retain(|c| match (particles.get(c.a), particles.get(c.b)) {
                (Some(pa), Some(pb)) => pa.pos.distance(pb.pos) < c.rest_distance * factor,
                _ => false,
            });
            let torn = before - self.constraints.len();
            if torn > 0 {
                debug!(torn, remaining = self.constraints.len(), "cloth links torn");
            }
        }
    }
}
