//! Real-time 2D particle-constraint physics.
//!
//! `tangle` simulates a world of point masses joined by distance, pin and
//! spring constraints, advanced with semi-implicit Euler, corrected by
//! position-based relaxation, and kept apart by circle-circle collisions
//! against an axis-aligned world box.
//!
//! # Features
//!
//! - **Stable handles**: particles, constraints and groups live in generational arenas
//! - **Constraints**: distance (rigid or compliant), pin, and damped springs with a force clamp
//! - **Groups**: tearable cloth sheets and shape-matched rigid bodies
//! - **Broad phase**: uniform grid hash feeding a periodically rebuilt Verlet neighbor list
//! - **Fail-safe stepping**: a particle driven to NaN/infinity is rolled back, not propagated
//! - **Live tuning**: a command queue drained at the top of each step
//! - **Persistence**: JSON snapshots that round-trip through `serde`
//! - **Observable**: monitor each pipeline stage through the `StepObserver` trait
//!
//! # Quick Start
//!
//! ```
//! use tangle::prelude::*;
//!
//! let mut world: World = World::default();
//! let sheet = ClothConfig::default().with_segments(5, 5).with_pinned_top_row(true);
//! world.create_cloth(Vec2::new(300.0, 50.0), &sheet).unwrap();
//!
//! for _ in 0..120 {
//!     world.update(1.0 / 120.0);
//! }
//! assert!(world.particles().all(|(_, p)| p.pos.is_finite()));
//! ```

pub mod arena;
pub mod bounds;
pub mod cloth;
pub mod collision;
pub mod command;
pub mod config;
pub mod constraint;
pub mod emitter;
pub mod error;
pub mod float;
pub mod group;
pub mod observer;
pub mod particle;
pub mod rigid;
pub mod snapshot;
pub mod spatial;
pub mod spring;
pub mod vec;
pub mod world;

// Re-export primary API
pub use arena::{Arena, ArenaId, ConstraintId, GroupId, ParticleId};
pub use cloth::{Cloth, ClothConfig};
pub use collision::{CollisionParams, CollisionPassStats};
pub use command::WorldCommand;
pub use config::WorldConfig;
pub use constraint::{Constraint, DistanceConstraint, Particles, PinConstraint};
pub use emitter::Emitter;
pub use error::{PhysicsError, SnapshotError};
pub use float::Float;
pub use group::Group;
pub use observer::{NoOpStepObserver, StepObserver};
pub use particle::Particle;
pub use rigid::RigidBody;
pub use snapshot::WorldSnapshot;
pub use spatial::{NeighborList, SpatialGrid};
pub use spring::SpringConstraint;
pub use vec::{Vec2, Vector2};
pub use world::World;

/// Everything needed to build and step a world.
pub mod prelude {
    pub use crate::{
        ClothConfig, Constraint, ConstraintId, DistanceConstraint, GroupId, ParticleId, Particle,
        PinConstraint, SpringConstraint, Vec2, World, WorldCommand, WorldConfig,
    };
}
