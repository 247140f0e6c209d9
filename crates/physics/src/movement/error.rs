//! Controller error types.

use thiserror::Error;

use crate::backend::{CameraId, ColliderHandle};

use super::config::Bound;

/// A [`LocomotionConfig`](super::LocomotionConfig) field violates its bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} = {value} is outside {bound}")]
    OutOfBounds {
        field: &'static str,
        value: f32,
        bound: Bound,
    },

    #[error("capsuleHalfHeight ({half_height}) must be at least capsuleRadius ({radius})")]
    CapsuleTooShort { half_height: f32, radius: f32 },

    #[error("maxSlopeClimbAngle ({climb}) must not exceed slideThreshold ({threshold})")]
    SlopeLimitsInverted { climb: f32, threshold: f32 },

    #[error("slideMinSpeed ({min_speed}) exceeds maxSpeed * slideSpeedMultiplier ({limit})")]
    SlideUnreachable { min_speed: f32, limit: f32 },
}

/// A collaborator required for activation is missing or unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    #[error("no {0} collaborator was provided")]
    MissingCollaborator(&'static str),

    #[error("collider {0:?} is not registered with the physics backend")]
    UnknownCollider(ColliderHandle),

    #[error("camera {0:?} does not exist")]
    UnknownCamera(CameraId),

    #[error("controller has been disposed")]
    Disposed,
}

/// Any failure surfaced by the controller API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("invalid locomotion config: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("controller initialization failed: {0}")]
    Initialization(#[from] InitializationError),
}
