//! Per-controller locomotion state.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::animation::LocomotionPhase;

/// Body posture, ordered by capsule height (highest to lowest).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Posture {
    #[default]
    Standing,
    Crouching,
    /// Only reachable while grounded.
    Sliding,
}

impl Posture {
    /// Crouched capsule (crouching or sliding).
    #[inline]
    pub fn is_low(self) -> bool {
        !matches!(self, Posture::Standing)
    }
}

/// Whether the capsule is supported by the ground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Contact {
    Grounded,
    #[default]
    Airborne,
}

/// Ground surface classification from the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    /// Slope at or below `max_slope_climb_angle`.
    Walkable,
    /// Between `max_slope_climb_angle` and `slide_threshold`.
    Slick,
}

/// Complete mutable state for one controlled actor.
///
/// Timestamps are seconds on the controller's own simulated clock
/// (`elapsed`); `None` means the event has not happened yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionState {
    /// Velocity in world space (meters/second).
    pub velocity: Vec3,

    pub contact: Contact,

    /// Surface under the actor, `None` while airborne.
    pub surface: Option<SurfaceKind>,

    /// Ground surface normal (world up while airborne).
    pub ground_normal: Vec3,

    pub posture: Posture,

    /// Time spent in the current slide (seconds).
    pub slide_elapsed: f32,

    /// Horizontal unit direction captured when the slide started.
    pub slide_direction: Vec3,

    /// View yaw in radians, wrapped to (-PI, PI].
    pub yaw: f32,

    /// View pitch in radians, positive looks up.
    pub pitch: f32,

    pub last_landed_at: Option<f64>,

    pub last_jump_requested_at: Option<f64>,

    /// Simulated time accumulated from `update` (seconds).
    pub elapsed: f64,

    /// Capsule half-height currently applied to the collider.
    pub half_height: f32,

    /// Sprint was active on the last update.
    pub sprinting: bool,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            contact: Contact::Airborne,
            surface: None,
            ground_normal: Vec3::Y,
            posture: Posture::Standing,
            slide_elapsed: 0.0,
            slide_direction: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            last_landed_at: None,
            last_jump_requested_at: None,
            elapsed: 0.0,
            half_height: 0.0,
            sprinting: false,
        }
    }
}

impl LocomotionState {
    /// Create a standing, airborne state with the given collider half-height.
    pub fn new(half_height: f32) -> Self {
        Self {
            half_height,
            ..Default::default()
        }
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        self.contact == Contact::Grounded
    }

    #[inline]
    pub fn crouching(&self) -> bool {
        self.posture == Posture::Crouching
    }

    #[inline]
    pub fn sliding(&self) -> bool {
        self.posture == Posture::Sliding
    }

    /// Velocity with the vertical component removed.
    #[inline]
    pub fn horizontal_velocity(&self) -> Vec3 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z)
    }

    #[inline]
    pub fn horizontal_speed(&self) -> f32 {
        self.horizontal_velocity().length()
    }

    /// Replace the horizontal velocity, keeping the vertical component.
    #[inline]
    pub fn set_horizontal_velocity(&mut self, horizontal: Vec3) {
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;
    }

    /// Phase used for animation selection.
    pub fn phase(&self) -> LocomotionPhase {
        if !self.grounded() {
            return if self.velocity.y > 0.0 {
                LocomotionPhase::Jump
            } else {
                LocomotionPhase::Fall
            };
        }

        match self.posture {
            Posture::Sliding => LocomotionPhase::Slide,
            Posture::Crouching => LocomotionPhase::Crouch,
            Posture::Standing if self.horizontal_speed() < 0.1 => LocomotionPhase::Idle,
            Posture::Standing if self.sprinting => LocomotionPhase::Sprint,
            Posture::Standing => LocomotionPhase::Walk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_velocity_ignores_vertical() {
        let mut state = LocomotionState::new(0.9);
        state.velocity = Vec3::new(3.0, -7.0, 4.0);
        assert!((state.horizontal_speed() - 5.0).abs() < 1e-6);

        state.set_horizontal_velocity(Vec3::new(1.0, 99.0, 0.0));
        assert_eq!(state.velocity, Vec3::new(1.0, -7.0, 0.0));
    }

    #[test]
    fn test_phase_selection() {
        let mut state = LocomotionState::new(0.9);
        state.velocity = Vec3::new(0.0, 2.0, 0.0);
        assert_eq!(state.phase(), LocomotionPhase::Jump);

        state.velocity.y = -2.0;
        assert_eq!(state.phase(), LocomotionPhase::Fall);

        state.contact = Contact::Grounded;
        state.velocity = Vec3::ZERO;
        assert_eq!(state.phase(), LocomotionPhase::Idle);

        state.velocity = Vec3::new(4.0, 0.0, 0.0);
        assert_eq!(state.phase(), LocomotionPhase::Walk);

        state.sprinting = true;
        assert_eq!(state.phase(), LocomotionPhase::Sprint);

        state.posture = Posture::Sliding;
        assert_eq!(state.phase(), LocomotionPhase::Slide);
    }
}
