//! Stride Physics
//!
//! A capsule character locomotion controller with Quake-style ground and air
//! movement, slope-aware ground probing, auto-stepping, a crouch/slide stance
//! machine and first/third-person camera coupling.
//!
//! # Architecture
//!
//! The crate is split into three parts:
//!
//! - **Backend**: Traits for the collaborators the controller consumes
//!   (physics, camera, input) and the controlled body capability
//! - **Movement**: The locomotion core. Config, integrator, probe, stance
//!   machine, camera coupling and the [`CharacterController`] facade
//! - **Collision**: A parry3d-backed [`CollisionWorld`] that implements the
//!   physics collaborator for hosts without their own engine
//!
//! # Frame order
//!
//! ```text
//! update(dt) -> probe -> stance machine -> integrator -> kinematic move -> camera
//! ```

pub mod backend;
pub mod collision;
pub mod movement;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use backend::{
    BodyMode, BodyPose, ButtonState, CameraBackend, CameraId, ColliderHandle, ControlledBody,
    FollowConfig, InputFrame, InputSource, KinematicMove, PhysicsBackend, SharedCamera,
    SharedInput, SharedPhysics, SweepHit,
};
pub use collision::{BodyEntry, BrushId, CapsuleShape, CollisionWorld, ContentFlags, TraceResult};
pub use movement::{
    AnimationClips, CameraMode, CameraPose, CharacterController, Collaborators,
    ConfigurationError, ControllerBuilder, ControllerDiagnostics, ControllerError,
    Contact, InitializationError, LocomotionConfig, LocomotionConfigPatch, LocomotionPhase,
    LocomotionState, Posture, Preset, SurfaceKind,
};
