//! Reference collision world.
//!
//! A parry3d-backed environment of box brushes plus a registry of capsule
//! bodies, implementing [`PhysicsBackend`](crate::backend::PhysicsBackend)
//! for hosts that do not bring their own physics engine.
//!
//! # Key Types
//!
//! - [`CollisionWorld`]: The collision environment containing all geometry
//! - [`TraceResult`]: Output from a capsule trace
//! - [`CapsuleShape`]: Vertical capsule used for every trace
//!
//! # Tracing Algorithm
//!
//! Traces sweep a capsule between two centre positions and return:
//! - How far the shape traveled (fraction 0.0-1.0)
//! - The final position, backed off by the skin width
//! - Surface normal at impact (if any)
//! - Content flags and dynamic flag of what was hit

mod flags;
mod kinematic;
mod trace;
mod world;

pub use flags::ContentFlags;
pub use kinematic::BodyEntry;
pub use trace::{CapsuleShape, TraceResult};
pub use world::{BrushId, CollisionWorld};
