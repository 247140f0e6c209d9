//! Character locomotion.
//!
//! This module implements capsule character movement with:
//!
//! - Ground friction/acceleration and air-strafe acceleration
//! - Slope classification (walkable, slick, too steep) and auto-stepping
//! - A crouch/slide stance machine with jump chaining (bunny-hop)
//! - First- and third-person camera coupling
//!
//! # Design
//!
//! Movement is driven by the [`CharacterController`], which owns the
//! controlled body and the [`LocomotionState`] and calls into the injected
//! collaborators once per [`CharacterController::update`]. Every numeric rule
//! lives in a pure function (see [`integrator`], [`probe`] and [`stance`]) so
//! it can be tested without a physics world.

mod animation;
mod camera;
mod config;
mod controller;
mod error;
pub mod integrator;
mod patch;
mod presets;
pub mod probe;
pub mod stance;
mod state;

pub use animation::{AnimationClips, LocomotionPhase};
pub use camera::{apply_look, camera_pose, forward_from_yaw, right_from_yaw, CameraMode, CameraPose};
pub use config::{Bound, ClampedField, LocomotionConfig, GRAVITY};
pub use controller::{
    CharacterController, Collaborators, ControllerBuilder, ControllerDiagnostics,
};
pub use error::{ConfigurationError, ControllerError, InitializationError};
pub use patch::LocomotionConfigPatch;
pub use presets::Preset;
pub use state::{Contact, LocomotionState, Posture, SurfaceKind};
