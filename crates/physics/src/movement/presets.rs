//! Named configuration presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::camera::CameraMode;
use super::config::LocomotionConfig;

/// Tuned starting points for common game styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    #[default]
    FirstPerson,
    ThirdPerson,
    Platformer,
    Surf,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::FirstPerson,
        Preset::ThirdPerson,
        Preset::Platformer,
        Preset::Surf,
    ];

    pub fn config(self) -> LocomotionConfig {
        match self {
            Preset::FirstPerson => LocomotionConfig::first_person(),
            Preset::ThirdPerson => LocomotionConfig::third_person(),
            Preset::Platformer => LocomotionConfig::platformer(),
            Preset::Surf => LocomotionConfig::surf(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::FirstPerson => "first-person",
            Preset::ThirdPerson => "third-person",
            Preset::Platformer => "platformer",
            Preset::Surf => "surf",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| format!("unknown preset '{}'", s))
    }
}

impl LocomotionConfig {
    /// Walk-tuned first-person shooter movement, no sliding.
    pub fn first_person() -> Self {
        Self {
            max_speed: 4.5,
            acceleration: 40.0,
            sprint_multiplier: 1.5,
            jump_force: 4.8,
            camera_mode: CameraMode::FirstPerson,
            camera_height: 0.7,
            ground_friction: 24.0,
            slide_enabled: false,
            ..Default::default()
        }
    }

    /// Over-the-shoulder camera with a wider auto-step that includes
    /// dynamic obstacles.
    pub fn third_person() -> Self {
        Self {
            max_speed: 5.0,
            acceleration: 25.0,
            camera_mode: CameraMode::ThirdPerson,
            camera_distance: 4.5,
            camera_height: 1.2,
            camera_down_limit: 60f32.to_radians(),
            auto_step_max_height: 0.45,
            auto_step_min_width: 0.3,
            auto_step_include_dynamic: true,
            ..Default::default()
        }
    }

    /// Floaty high jumps, close camera and permissive slopes.
    pub fn platformer() -> Self {
        Self {
            max_speed: 6.0,
            acceleration: 35.0,
            jump_force: 8.0,
            gravity_scale: 1.6,
            camera_mode: CameraMode::ThirdPerson,
            camera_distance: 3.0,
            camera_height: 1.0,
            max_slope_climb_angle: 55f32.to_radians(),
            slide_threshold: 70f32.to_radians(),
            air_acceleration: 20.0,
            air_max_speed: 2.0,
            air_friction: 0.5,
            ..Default::default()
        }
    }

    /// Quake-style strafe jumping: low friction, strong air control and a
    /// bunny-hop window.
    pub fn surf() -> Self {
        Self {
            max_speed: 6.0,
            acceleration: 50.0,
            ground_friction: 6.0,
            stop_speed: 1.0,
            air_acceleration: 100.0,
            air_max_speed: 1.0,
            strafe_responsiveness: 1.5,
            max_velocity: 40.0,
            momentum_preservation: 1.0,
            slope_friction: 0.5,
            bunny_hop_tolerance: 0.15,
            pre_speed_boost: 1.1,
            slide_enabled: true,
            slide_duration: 1.2,
            slide_deceleration: 2.0,
            jump_while_sliding: true,
            ..Default::default()
        }
    }
}
