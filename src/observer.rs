//! Step observer trait for monitoring the pipeline from inside a step.

use crate::arena::ParticleId;
use crate::collision::CollisionPassStats;
use crate::float::Float;

/// Hooks called by [`World::update_with`](crate::world::World::update_with).
///
/// All methods default to no-ops.
pub trait StepObserver<F: Float = f64> {
    /// Called after forces are applied and every particle is integrated.
    fn on_integrate(&mut self) {}

    /// Called after each constraint relaxation pass.
    fn on_constraint_iteration(&mut self, _iteration: usize) {}

    /// Called when the neighbor list was rebuilt this step.
    fn on_neighbor_rebuild(&mut self, _pairs: usize) {}

    /// Called after each collision resolution pass.
    fn on_collision_pass(&mut self, _pass: usize, _stats: &CollisionPassStats<F>) {}

    /// Called when a particle's step was discarded for non-finite state.
    fn on_particle_rejected(&mut self, _id: ParticleId) {}

    /// Called when a simulation step is fully complete.
    fn on_step_complete(&mut self) {}
}

/// Observer that ignores every hook.
pub struct NoOpStepObserver;

impl<F: Float> StepObserver<F> for NoOpStepObserver {}
