//! Tuning commands for a live world.
//!
//! A control surface never touches the world directly while it is stepping.
//! It queues commands with [`World::queue`](crate::world::World::queue); the
//! queue is drained in FIFO order at the top of the next update.

use serde::{Deserialize, Serialize};

use crate::float::Float;
use crate::vec::Vec2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub enum WorldCommand<F: Float = f64> {
    SetGravity(Vec2<F>),
    /// Negative values are treated as zero.
    SetFriction(F),
    /// Clamped to `[0, 1]`.
    SetRestitution(F),
    SetCollisionIterations(usize),
    SetConstraintIterations(usize),
    SetCellSize(F),
    /// Zero is treated as one.
    SetVerletRebuildFreq(usize),
    SetVerletSkin(F),
    SetBounds { width: F, height: F },
    SetPaused(bool),
    TogglePause,
    /// Retune every spring in the world. `None` leaves a field alone;
    /// `damping: Some(None)` resets damping to the critical value.
    TuneSprings {
        rest_length: Option<F>,
        stiffness: Option<F>,
        damping: Option<Option<F>>,
    },
    /// Remove every particle, constraint and group.
    Clear,
}
