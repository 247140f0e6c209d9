//! Stride Game
//!
//! Host-side pieces around the stride locomotion controller.
//!
//! # Modules
//!
//! - **actor**: Entities that can enable and disable a character controller
//! - **camera**: Camera registry implementing the camera collaborator
//! - **input**: Raw key state to edge-detected input frames
//! - **level**: Collision geometry, spawn points and the locomotion test arena
//! - **simulation**: Fixed-step loop that owns the shared collaborators

pub mod actor;
pub mod camera;
pub mod input;
pub mod level;
pub mod simulation;

pub use actor::{Actor, ActorBody, EntityId};
pub use camera::{CameraRig, RigCamera};
pub use input::{ActionInput, InputTracker, MovementInput, RawInput};
pub use level::{Landmark, Level, SpawnPoint};
pub use simulation::{Simulation, SimulationConfig, SimulationError};

// Re-export physics types commonly needed by hosts
pub use stride_physics::{
    CameraMode, CameraPose, ControllerError, LocomotionConfig, LocomotionConfigPatch,
    LocomotionState, Posture, Preset,
};
