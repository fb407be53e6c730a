//! Error types for physics operations.
//!
//! The simulation step itself never fails; these errors only surface from
//! operations that accept external input: building entities and loading
//! persisted state.

use thiserror::Error;

/// Errors from constructing or inserting simulation entities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Mass must be positive and finite for a non-fixed particle.
    #[error("mass must be positive and finite")]
    InvalidMass,
    /// Radius must be non-negative and finite.
    #[error("radius must be non-negative and finite")]
    InvalidRadius,
    /// Stiffness must be finite and non-negative.
    #[error("stiffness must be finite and non-negative")]
    InvalidStiffness,
    /// A position or velocity was NaN or infinite.
    #[error("position or velocity is not finite")]
    NonFiniteState,
    /// A referenced particle handle does not resolve.
    #[error("particle {0} does not exist")]
    ParticleNotFound(String),
    /// A constraint handle does not resolve.
    #[error("constraint {0} does not exist")]
    ConstraintNotFound(String),
    /// The constraint exists but is not a pin.
    #[error("constraint is not a pin")]
    NotAPin,
    /// A two-particle constraint referenced the same particle twice.
    #[error("constraint endpoints must be distinct particles")]
    DegenerateConstraint,
    /// Cloth must have at least one segment on each axis and a positive size.
    #[error("cloth needs at least 1x1 segments and a positive size")]
    InvalidGridDimensions,
    /// A group needs at least one particle.
    #[error("group needs at least one particle")]
    EmptyGroup,
}

impl PhysicsError {
    pub(crate) fn missing<I: core::fmt::Debug>(id: I) -> Self {
        PhysicsError::ParticleNotFound(format!("{:?}", id))
    }

    pub(crate) fn missing_constraint<I: core::fmt::Debug>(id: I) -> Self {
        PhysicsError::ConstraintNotFound(format!("{:?}", id))
    }
}

/// Errors from saving or loading persisted world state.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the backing file failed.
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The JSON document is malformed.
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A record refers to a particle index past the end of the particle list.
    #[error("particle index {index} out of range (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },
    /// A record failed validation when rebuilt into a world.
    #[error("invalid record: {0}")]
    Physics(#[from] PhysicsError),
}
