//! World configuration.

use serde::{Deserialize, Serialize};

use crate::collision::CollisionParams;
use crate::float::Float;
use crate::vec::Vec2;

/// Simulation parameters owned by a [`World`](crate::world::World).
///
/// # Builder Pattern
/// ```
/// use tangle::config::WorldConfig;
/// use tangle::vec::Vec2;
///
/// let config: WorldConfig = WorldConfig::new()
///     .with_bounds(1024.0, 768.0)
///     .with_gravity(Vec2::new(0.0, 0.0))
///     .with_collision_iterations(8)
///     .with_verlet_rebuild_freq(3);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct WorldConfig<F: Float = f64> {
    /// World box extent along x. Default: 800.
    pub width: F,
    /// World box extent along y (y grows downward). Default: 600.
    pub height: F,
    /// Gravity acceleration. Default: (0, 981).
    pub gravity: Vec2<F>,
    /// Linear drag coefficient: force `-vel * friction`. Default: 0.02.
    pub friction: F,
    /// Fraction of outward velocity kept on wall contact. Default: 0.3.
    pub restitution: F,
    /// Collision resolution passes per step. Default: 4.
    pub collision_iterations: usize,
    /// Constraint relaxation passes per step. Default: 4.
    pub constraint_iterations: usize,
    /// Spatial grid cell size. Default: 32.
    pub cell_size: F,
    /// Neighbor-list rebuild period in frames, at least 1. Default: 5.
    pub verlet_rebuild_freq: usize,
    /// Extra margin added to the neighbor cutoff. Default: 4.
    pub verlet_skin: F,
    /// Penetration ignored by collision resolution. Default: 0.001.
    pub collision_slop: F,
    /// Fraction of the penetration removed per pass. Default: 1.
    pub collision_percent: F,
    /// Per-particle cap on a single pass's collision correction. Default: 0.9.
    pub max_collision_correction: F,
}

impl<F: Float> WorldConfig<F> {
    pub fn new() -> Self {
        WorldConfig {
            width: F::from_f32(800.0),
            height: F::from_f32(600.0),
            gravity: Vec2::new(F::zero(), F::from_f32(981.0)),
            friction: F::from_f32(0.02),
            restitution: F::from_f32(0.3),
            collision_iterations: 4,
            constraint_iterations: 4,
            cell_size: F::from_f32(32.0),
            verlet_rebuild_freq: 5,
            verlet_skin: F::from_f32(4.0),
            collision_slop: F::from_f32(0.001),
            collision_percent: F::one(),
            max_collision_correction: F::from_f32(0.9),
        }
    }

    pub fn with_bounds(mut self, width: F, height: F) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2<F>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_friction(mut self, friction: F) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: F) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_collision_iterations(mut self, iterations: usize) -> Self {
        self.collision_iterations = iterations;
        self
    }

    pub fn with_constraint_iterations(mut self, iterations: usize) -> Self {
        self.constraint_iterations = iterations;
        self
    }

    pub fn with_cell_size(mut self, cell_size: F) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_verlet_rebuild_freq(mut self, frames: usize) -> Self {
        self.verlet_rebuild_freq = frames.max(1);
        self
    }

    pub fn with_verlet_skin(mut self, skin: F) -> Self {
        self.verlet_skin = skin;
        self
    }

    pub fn with_max_collision_correction(mut self, max_correction: F) -> Self {
        self.max_collision_correction = max_correction;
        self
    }

    /// Set slop, percent and per-pass cap in one go.
    pub fn with_collision_params(mut self, params: CollisionParams<F>) -> Self {
        self.collision_slop = params.slop;
        self.collision_percent = params.percent;
        self.max_collision_correction = params.max_correction;
        self
    }

    pub fn collision_params(&self) -> CollisionParams<F> {
        CollisionParams {
            slop: self.collision_slop,
            percent: self.collision_percent,
            max_correction: self.max_collision_correction,
        }
    }
}

impl<F: Float> Default for WorldConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}
