//! Camera coupling.
//!
//! Converts the body pose and buffered look angles into a camera pose. The
//! pose is recomputed from the post-move body position every update, so the
//! camera can never lag the physics body by a frame.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::config::LocomotionConfig;
use super::state::LocomotionState;

/// Viewpoint attached to the controlled actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CameraMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

/// Camera placement handed to the camera backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Eye position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Yaw in radians.
    pub yaw: f32,
    /// Pitch in radians, positive looks up.
    pub pitch: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::X,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl CameraPose {
    /// Get the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Unit vector from the eye toward the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

/// Horizontal forward direction for a yaw. Yaw 0 faces +X, PI/2 faces +Z.
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(cos_yaw, 0.0, sin_yaw)
}

/// Horizontal right direction for a yaw.
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(-sin_yaw, 0.0, cos_yaw)
}

/// Full look direction including pitch.
pub fn look_direction(yaw: f32, pitch: f32) -> Vec3 {
    let (sin_pitch, cos_pitch) = pitch.sin_cos();
    let (sin_yaw, cos_yaw) = yaw.sin_cos();
    Vec3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw)
}

/// Apply a mouse-look delta to the state's yaw and pitch.
///
/// Positive `look.x` turns right, positive `look.y` (screen down) looks down.
pub fn apply_look(state: &mut LocomotionState, look: Vec2, config: &LocomotionConfig) {
    state.yaw = wrap_angle(state.yaw + look.x * config.camera_sensitivity);
    state.pitch = (state.pitch - look.y * config.camera_sensitivity)
        .clamp(-config.camera_down_limit, config.camera_up_limit);
}

/// Camera pose for a body at `body_position` with the state's look angles.
pub fn camera_pose(body_position: Vec3, state: &LocomotionState, config: &LocomotionConfig) -> CameraPose {
    let pivot = body_position + Vec3::new(0.0, config.camera_height, 0.0);

    match config.camera_mode {
        CameraMode::FirstPerson => CameraPose {
            position: pivot,
            target: pivot + look_direction(state.yaw, state.pitch),
            yaw: state.yaw,
            pitch: state.pitch,
        },
        CameraMode::ThirdPerson => {
            let position = pivot - forward_from_yaw(state.yaw) * config.camera_distance;
            let to_body = (body_position - position).normalize_or_zero();
            let (yaw, pitch) = if to_body == Vec3::ZERO {
                (state.yaw, state.pitch)
            } else {
                (to_body.z.atan2(to_body.x), to_body.y.clamp(-1.0, 1.0).asin())
            };
            CameraPose {
                position,
                target: body_position,
                yaw,
                pitch,
            }
        }
    }
}

/// Wrap an angle to (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}
