//! Collaborator interfaces consumed by the character controller.
//!
//! The controller never owns the physics world, the camera manager or the
//! input device layer. It talks to them through the traits in this module,
//! which hosts implement for their own engines and tests implement with fakes.
//!
//! All poses handed to a [`PhysicsBackend`] are capsule-centre poses: the
//! controller adds the configured collider offset before calling in and
//! removes it from the result.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::movement::{CameraMode, CameraPose};

/// Handle of a collider registered with a physics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderHandle(pub u32);

/// Identifier of a camera owned by a camera backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CameraId(pub u32);

/// World-space placement of a controlled body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPose {
    /// Position of the body origin.
    pub position: Vec3,
    /// Facing around world up, in radians.
    pub yaw: f32,
}

impl Default for BodyPose {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl BodyPose {
    pub fn new(position: Vec3) -> Self {
        Self { position, yaw: 0.0 }
    }

    /// Same pose moved by `delta`.
    #[inline]
    pub fn translated(self, delta: Vec3) -> Self {
        Self {
            position: self.position + delta,
            ..self
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.yaw.is_finite()
    }
}

/// How the physics engine drives a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyMode {
    /// Force-driven rigid body.
    Dynamic,
    /// Position driven by game code, still resolves collisions.
    Kinematic,
    /// Never moves.
    Static,
}

/// First contact found by a capsule sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepHit {
    /// Distance travelled along the sweep direction before contact.
    pub distance: f32,
    /// Surface normal at the contact, pointing away from the surface.
    pub normal: Vec3,
    /// Whether the collider that was hit belongs to a dynamic body.
    pub dynamic: bool,
}

/// Outcome of a kinematic move request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicMove {
    /// Pose the body actually reached.
    pub pose: BodyPose,
    /// First blocking contact encountered, if any.
    pub blocked: Option<SweepHit>,
    /// Part of the requested delta that could not be applied.
    pub remaining: Vec3,
}

/// Physics engine operations the controller depends on.
pub trait PhysicsBackend {
    /// Sweep a vertical capsule from `pose` along `direction` (unit length).
    ///
    /// `half_height` is half of the total capsule height, caps included.
    fn sweep_capsule(
        &self,
        pose: BodyPose,
        radius: f32,
        half_height: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<SweepHit>;

    /// Move a kinematic body by `desired_delta`, sliding along whatever it hits.
    fn move_kinematic_body(
        &mut self,
        collider: ColliderHandle,
        pose: BodyPose,
        desired_delta: Vec3,
    ) -> KinematicMove;

    /// Resize the capsule of a registered collider.
    fn set_collider_half_height(&mut self, collider: ColliderHandle, half_height: f32);

    fn set_collider_radius(&mut self, collider: ColliderHandle, radius: f32);

    /// Current mode of the body owning `collider`, `None` if unknown.
    fn body_mode(&self, collider: ColliderHandle) -> Option<BodyMode>;

    fn set_body_mode(&mut self, collider: ColliderHandle, mode: BodyMode);
}

/// Follow binding handed to the camera backend on activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FollowConfig {
    pub mode: CameraMode,
    pub distance: f32,
    pub height: f32,
}

/// Camera manager operations the controller depends on.
pub trait CameraBackend {
    fn set_camera_follow(&mut self, camera: CameraId, config: FollowConfig);

    fn clear_camera_follow(&mut self, camera: CameraId);

    /// Current pose of a camera, `None` if no such camera exists.
    fn get_camera(&self, camera: CameraId) -> Option<CameraPose>;

    /// Bind a camera to the viewport, or unbind with `None`.
    fn set_active_camera(&mut self, camera: Option<CameraId>);

    /// Camera currently bound to the viewport.
    fn active_camera(&self) -> Option<CameraId>;

    fn set_camera_pose(&mut self, camera: CameraId, pose: CameraPose);
}

/// Held/pressed/released state of one digital button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonState {
    /// Button is down this frame.
    pub held: bool,
    /// Button went down this frame.
    pub pressed: bool,
    /// Button went up this frame.
    pub released: bool,
}

impl ButtonState {
    /// Derive edges from the previous and current held state.
    pub fn from_edges(was_held: bool, held: bool) -> Self {
        Self {
            held,
            pressed: held && !was_held,
            released: !held && was_held,
        }
    }
}

/// Input snapshot for a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Forward/backward axis (-1.0 to 1.0). Positive = forward.
    pub forward: f32,
    /// Strafe axis (-1.0 to 1.0). Positive = right.
    pub right: f32,
    /// Mouse-look delta this frame, in device units (x = yaw, y = pitch).
    pub look: Vec2,
    pub jump: ButtonState,
    pub crouch: ButtonState,
    pub sprint: ButtonState,
}

impl InputFrame {
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.forward.is_finite() && self.right.is_finite() && self.look.is_finite()
    }
}

/// Source of per-frame input snapshots.
pub trait InputSource {
    fn frame(&self) -> InputFrame;
}

/// Capability the controller needs from the object it drives.
pub trait ControlledBody {
    fn pose(&self) -> BodyPose;

    fn set_pose(&mut self, pose: BodyPose);

    fn collider(&self) -> ColliderHandle;
}

/// Shared single-threaded handle to a physics backend.
pub type SharedPhysics = Rc<RefCell<dyn PhysicsBackend>>;

/// Shared single-threaded handle to a camera backend.
pub type SharedCamera = Rc<RefCell<dyn CameraBackend>>;

/// Shared single-threaded handle to an input source.
pub type SharedInput = Rc<RefCell<dyn InputSource>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edges() {
        assert_eq!(
            ButtonState::from_edges(false, true),
            ButtonState { held: true, pressed: true, released: false }
        );
        assert_eq!(
            ButtonState::from_edges(true, true),
            ButtonState { held: true, pressed: false, released: false }
        );
        assert_eq!(
            ButtonState::from_edges(true, false),
            ButtonState { held: false, pressed: false, released: true }
        );
    }

    #[test]
    fn test_pose_finite() {
        assert!(BodyPose::new(Vec3::ONE).is_finite());
        assert!(!BodyPose::new(Vec3::new(f32::NAN, 0.0, 0.0)).is_finite());
    }
}
