//! Locomotion configuration.
//!
//! All movement parameters for one character archetype are grouped here.
//! Values use metric units (meters, seconds) and radians for angles.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::backend::FollowConfig;

use super::animation::AnimationClips;
use super::camera::CameraMode;
use super::error::ConfigurationError;
use super::state::Posture;

/// Standard gravity (meters/second²), scaled per archetype by `gravity_scale`.
pub const GRAVITY: f32 = 9.81;

/// Smallest capsule dimension or velocity cap accepted.
const MIN_DIMENSION: f32 = 0.001;

/// Camera, slope and threshold angles stay strictly below vertical.
const MAX_ANGLE: f32 = FRAC_PI_2 - 0.001;

/// Configuration for one character archetype.
///
/// Serialized names are camelCase so host-side JSON reads like the tuning
/// sheet (`maxSpeed`, `slideThreshold`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocomotionConfig {
    // ========================================================================
    // Movement
    // ========================================================================
    /// Walking speed cap (meters/second).
    pub max_speed: f32,

    /// Ground acceleration (meters/second²).
    pub acceleration: f32,

    /// Speed cap multiplier while sprinting.
    pub sprint_multiplier: f32,

    /// Jump impulse (meters/second at `gravity_scale = 1`).
    pub jump_force: f32,

    // ========================================================================
    // Body Shape
    // ========================================================================
    pub capsule_radius: f32,

    /// Half of the standing capsule height, caps included (meters).
    pub capsule_half_height: f32,

    /// Capsule centre relative to the body origin.
    pub collider_offset: Vec3,

    /// Skin width kept between the capsule and the ground (meters).
    pub offset: f32,

    // ========================================================================
    // Ground Traversal
    // ========================================================================
    /// Steepest slope still walked normally (radians).
    pub max_slope_climb_angle: f32,

    pub auto_step_max_height: f32,

    /// Free landing depth required on top of a step (meters).
    pub auto_step_min_width: f32,

    /// Allow stepping onto dynamic bodies.
    pub auto_step_include_dynamic: bool,

    /// How far below the capsule the ground is searched for (meters).
    pub snap_to_ground_distance: f32,

    // ========================================================================
    // Camera
    // ========================================================================
    pub camera_mode: CameraMode,

    /// Third-person boom length (meters).
    pub camera_distance: f32,

    /// Eye/pivot height above the body origin (meters).
    pub camera_height: f32,

    /// Radians per unit of mouse delta.
    pub camera_sensitivity: f32,

    pub camera_up_limit: f32,
    pub camera_down_limit: f32,

    // ========================================================================
    // Physics
    // ========================================================================
    pub gravity_scale: f32,

    /// Most negative vertical velocity allowed (meters/second, negative).
    pub max_fall_speed: f32,

    // ========================================================================
    // Air Control
    // ========================================================================
    pub air_acceleration: f32,

    /// Speed allowed along the wish direction while airborne.
    pub air_max_speed: f32,

    pub strafe_responsiveness: f32,

    /// Fraction of horizontal speed lost per second in the air.
    pub air_friction: f32,

    // ========================================================================
    // Ground Friction
    // ========================================================================
    /// Speed lost per second on walkable ground (meters/second²).
    pub ground_friction: f32,

    /// Speed below which the actor stops dead when friction applies.
    pub stop_speed: f32,

    /// Friction used on slick slopes instead of `ground_friction`.
    pub slope_friction: f32,

    /// Slope angle above which the ground no longer supports the actor (radians).
    pub slide_threshold: f32,

    // ========================================================================
    // Velocity Governance
    // ========================================================================
    pub max_velocity: f32,

    /// Velocity retained per 1/60 s (1.0 = no damping).
    pub velocity_damping: f32,

    /// Horizontal velocity kept across speed-cap transitions.
    pub momentum_preservation: f32,

    /// Tangential velocity kept after hitting a blocking surface.
    pub bounce_velocity_retention: f32,

    // ========================================================================
    // Crouch / Slide
    // ========================================================================
    pub crouch_speed_multiplier: f32,

    /// Fraction of the capsule height removed while crouched.
    pub crouch_height_reduction: f32,

    /// Whether a crouch press while moving fast starts a slide.
    pub slide_enabled: bool,

    pub slide_speed_multiplier: f32,

    /// Maximum slide length (seconds).
    pub slide_duration: f32,

    /// Slide speed lost per second (meters/second²).
    pub slide_deceleration: f32,

    pub slide_min_speed: f32,

    // ========================================================================
    // Jump Chaining
    // ========================================================================
    /// Horizontal speed multiplier for jumps inside the bunny-hop window.
    pub pre_speed_boost: f32,

    /// Bunny-hop window after landing (seconds).
    pub bunny_hop_tolerance: f32,

    pub jump_while_sliding: bool,

    // ========================================================================
    // Animation
    // ========================================================================
    pub animations: AnimationClips,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            // Movement
            max_speed: 5.0,
            acceleration: 30.0,
            sprint_multiplier: 1.6,
            jump_force: 5.0,

            // Body (1.8m tall, 0.8m wide)
            capsule_radius: 0.4,
            capsule_half_height: 0.9,
            collider_offset: Vec3::ZERO,
            offset: 0.02,

            // Ground traversal
            max_slope_climb_angle: 45f32.to_radians(),
            auto_step_max_height: 0.35,
            auto_step_min_width: 0.2,
            auto_step_include_dynamic: false,
            snap_to_ground_distance: 0.2,

            // Camera
            camera_mode: CameraMode::FirstPerson,
            camera_distance: 4.0,
            camera_height: 0.7,
            camera_sensitivity: 0.002,
            camera_up_limit: 85f32.to_radians(),
            camera_down_limit: 85f32.to_radians(),

            // Physics
            gravity_scale: 1.0,
            max_fall_speed: -50.0,

            // Air control
            air_acceleration: 10.0,
            air_max_speed: 1.0,
            strafe_responsiveness: 1.0,
            air_friction: 0.0,

            // Ground friction
            ground_friction: 20.0,
            stop_speed: 0.5,
            slope_friction: 4.0,
            slide_threshold: 60f32.to_radians(),

            // Governance
            max_velocity: 30.0,
            velocity_damping: 1.0,
            momentum_preservation: 0.9,
            bounce_velocity_retention: 1.0,

            // Crouch / slide
            crouch_speed_multiplier: 0.5,
            crouch_height_reduction: 0.4,
            slide_enabled: true,
            slide_speed_multiplier: 1.3,
            slide_duration: 0.8,
            slide_deceleration: 4.0,
            slide_min_speed: 3.0,

            // Jump chaining
            pre_speed_boost: 1.0,
            bunny_hop_tolerance: 0.0,
            jump_while_sliding: true,

            animations: AnimationClips::default(),
        }
    }
}

/// Inclusive range a scalar config field must lie in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub min: f32,
    pub max: f32,
}

impl Bound {
    const NON_NEGATIVE: Self = Self::new(0.0, f32::INFINITY);
    const POSITIVE: Self = Self::new(MIN_DIMENSION, f32::INFINITY);
    const UNIT: Self = Self::new(0.0, 1.0);
    const ANGLE: Self = Self::new(0.0, MAX_ANGLE);
    const ANY: Self = Self::new(f32::NEG_INFINITY, f32::INFINITY);

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Finite and inside the range.
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Nearest value inside the range. Non-finite input maps to the finite end.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else if value == f32::INFINITY && self.max.is_finite() {
            self.max
        } else if value == f32::NEG_INFINITY && self.min.is_finite() {
            self.min
        } else if self.min.is_finite() {
            self.min
        } else if self.max.is_finite() {
            self.max
        } else {
            0.0
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// A field that [`LocomotionConfig::clamp_to_bounds`] had to adjust.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedField {
    pub field: &'static str,
    pub from: f32,
    pub to: f32,
}

impl LocomotionConfig {
    /// Check every field against its bounds and the cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut probe = self.clone();
        for (field, value, bound) in probe.scalar_fields_mut() {
            if !bound.contains(*value) {
                return Err(ConfigurationError::OutOfBounds {
                    field,
                    value: *value,
                    bound,
                });
            }
        }

        if let Some(value) = self.collider_offset.to_array().into_iter().find(|v| !v.is_finite()) {
            return Err(ConfigurationError::OutOfBounds {
                field: "colliderOffset",
                value,
                bound: Bound::ANY,
            });
        }

        if self.capsule_half_height < self.capsule_radius {
            return Err(ConfigurationError::CapsuleTooShort {
                half_height: self.capsule_half_height,
                radius: self.capsule_radius,
            });
        }

        if self.max_slope_climb_angle > self.slide_threshold {
            return Err(ConfigurationError::SlopeLimitsInverted {
                climb: self.max_slope_climb_angle,
                threshold: self.slide_threshold,
            });
        }

        let limit = self.slide_speed_limit();
        if self.slide_min_speed > limit {
            return Err(ConfigurationError::SlideUnreachable {
                min_speed: self.slide_min_speed,
                limit,
            });
        }

        Ok(())
    }

    /// Pull every field to its nearest valid value.
    ///
    /// Returns the fields that changed, in declaration order. After this call
    /// [`validate`](Self::validate) always succeeds.
    pub fn clamp_to_bounds(&mut self) -> Vec<ClampedField> {
        let mut clamped = Vec::new();

        for (field, value, bound) in self.scalar_fields_mut() {
            if !bound.contains(*value) {
                let to = bound.clamp(*value);
                clamped.push(ClampedField { field, from: *value, to });
                *value = to;
            }
        }

        if !self.collider_offset.is_finite() {
            clamped.push(ClampedField {
                field: "colliderOffset",
                from: f32::NAN,
                to: 0.0,
            });
            self.collider_offset = Vec3::ZERO;
        }

        if self.capsule_half_height < self.capsule_radius {
            clamped.push(ClampedField {
                field: "capsuleHalfHeight",
                from: self.capsule_half_height,
                to: self.capsule_radius,
            });
            self.capsule_half_height = self.capsule_radius;
        }

        if self.max_slope_climb_angle > self.slide_threshold {
            clamped.push(ClampedField {
                field: "maxSlopeClimbAngle",
                from: self.max_slope_climb_angle,
                to: self.slide_threshold,
            });
            self.max_slope_climb_angle = self.slide_threshold;
        }

        let limit = self.slide_speed_limit();
        if self.slide_min_speed > limit {
            clamped.push(ClampedField {
                field: "slideMinSpeed",
                from: self.slide_min_speed,
                to: limit,
            });
            self.slide_min_speed = limit;
        }

        clamped
    }

    fn scalar_fields_mut(&mut self) -> Vec<(&'static str, &mut f32, Bound)> {
        vec![
            ("maxSpeed", &mut self.max_speed, Bound::NON_NEGATIVE),
            ("acceleration", &mut self.acceleration, Bound::NON_NEGATIVE),
            ("sprintMultiplier", &mut self.sprint_multiplier, Bound::NON_NEGATIVE),
            ("jumpForce", &mut self.jump_force, Bound::NON_NEGATIVE),
            ("capsuleRadius", &mut self.capsule_radius, Bound::POSITIVE),
            ("capsuleHalfHeight", &mut self.capsule_half_height, Bound::POSITIVE),
            ("offset", &mut self.offset, Bound::NON_NEGATIVE),
            ("maxSlopeClimbAngle", &mut self.max_slope_climb_angle, Bound::ANGLE),
            ("autoStepMaxHeight", &mut self.auto_step_max_height, Bound::NON_NEGATIVE),
            ("autoStepMinWidth", &mut self.auto_step_min_width, Bound::NON_NEGATIVE),
            ("snapToGroundDistance", &mut self.snap_to_ground_distance, Bound::NON_NEGATIVE),
            ("cameraDistance", &mut self.camera_distance, Bound::NON_NEGATIVE),
            ("cameraHeight", &mut self.camera_height, Bound::ANY),
            ("cameraSensitivity", &mut self.camera_sensitivity, Bound::NON_NEGATIVE),
            ("cameraUpLimit", &mut self.camera_up_limit, Bound::ANGLE),
            ("cameraDownLimit", &mut self.camera_down_limit, Bound::ANGLE),
            ("gravityScale", &mut self.gravity_scale, Bound::NON_NEGATIVE),
            ("maxFallSpeed", &mut self.max_fall_speed, Bound::new(f32::NEG_INFINITY, -MIN_DIMENSION)),
            ("airAcceleration", &mut self.air_acceleration, Bound::NON_NEGATIVE),
            ("airMaxSpeed", &mut self.air_max_speed, Bound::NON_NEGATIVE),
            ("strafeResponsiveness", &mut self.strafe_responsiveness, Bound::NON_NEGATIVE),
            ("airFriction", &mut self.air_friction, Bound::NON_NEGATIVE),
            ("groundFriction", &mut self.ground_friction, Bound::NON_NEGATIVE),
            ("stopSpeed", &mut self.stop_speed, Bound::NON_NEGATIVE),
            ("slopeFriction", &mut self.slope_friction, Bound::NON_NEGATIVE),
            ("slideThreshold", &mut self.slide_threshold, Bound::ANGLE),
            ("maxVelocity", &mut self.max_velocity, Bound::POSITIVE),
            ("velocityDamping", &mut self.velocity_damping, Bound::UNIT),
            ("momentumPreservation", &mut self.momentum_preservation, Bound::UNIT),
            ("bounceVelocityRetention", &mut self.bounce_velocity_retention, Bound::UNIT),
            ("crouchSpeedMultiplier", &mut self.crouch_speed_multiplier, Bound::NON_NEGATIVE),
            ("crouchHeightReduction", &mut self.crouch_height_reduction, Bound::new(0.0, 0.95)),
            ("slideSpeedMultiplier", &mut self.slide_speed_multiplier, Bound::NON_NEGATIVE),
            ("slideDuration", &mut self.slide_duration, Bound::NON_NEGATIVE),
            ("slideDeceleration", &mut self.slide_deceleration, Bound::NON_NEGATIVE),
            ("slideMinSpeed", &mut self.slide_min_speed, Bound::NON_NEGATIVE),
            ("preSpeedBoost", &mut self.pre_speed_boost, Bound::NON_NEGATIVE),
            ("bunnyHopTolerance", &mut self.bunny_hop_tolerance, Bound::NON_NEGATIVE),
        ]
    }

    /// Fastest speed a slide can start at.
    #[inline]
    pub fn slide_speed_limit(&self) -> f32 {
        self.max_speed * self.slide_speed_multiplier
    }

    /// Horizontal speed cap for the posture. Sprint never combines with crouch or slide.
    pub fn speed_cap(&self, posture: Posture, sprinting: bool) -> f32 {
        let multiplier = match posture {
            Posture::Crouching => self.crouch_speed_multiplier,
            Posture::Sliding => self.slide_speed_multiplier,
            Posture::Standing if sprinting => self.sprint_multiplier,
            Posture::Standing => 1.0,
        };
        self.max_speed * multiplier
    }

    /// Capsule half-height for the posture.
    pub fn half_height(&self, posture: Posture) -> f32 {
        match posture {
            Posture::Standing => self.capsule_half_height,
            Posture::Crouching | Posture::Sliding => self.crouched_half_height(),
        }
    }

    #[inline]
    pub fn crouched_half_height(&self) -> f32 {
        self.capsule_half_height * (1.0 - self.crouch_height_reduction)
    }

    /// Gravity acceleration magnitude (meters/second²).
    #[inline]
    pub fn gravity(&self) -> f32 {
        GRAVITY * self.gravity_scale
    }

    /// Vertical velocity set by a jump.
    #[inline]
    pub fn jump_velocity(&self) -> f32 {
        self.jump_force * self.gravity_scale.sqrt()
    }

    /// Follow binding matching the camera section.
    pub fn follow_config(&self) -> FollowConfig {
        FollowConfig {
            mode: self.camera_mode,
            distance: self.camera_distance,
            height: self.camera_height,
        }
    }
}
