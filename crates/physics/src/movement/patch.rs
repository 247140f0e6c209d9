//! Partial configuration updates.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::animation::AnimationClips;
use super::camera::CameraMode;
use super::config::{ClampedField, LocomotionConfig};

macro_rules! config_patch {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// Sparse set of [`LocomotionConfig`] fields to overwrite.
        ///
        /// Unset fields keep their current value. Applying a patch never
        /// fails: out-of-range values are clamped to the nearest bound.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct LocomotionConfigPatch {
            $(pub $field: Option<$ty>,)*
        }

        impl LocomotionConfigPatch {
            fn write_into(&self, config: &mut LocomotionConfig) {
                $(
                    if let Some(value) = &self.$field {
                        config.$field = value.clone();
                    }
                )*
            }

            /// No field is set.
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }
        }
    };
}

config_patch! {
    max_speed: f32,
    acceleration: f32,
    sprint_multiplier: f32,
    jump_force: f32,
    capsule_radius: f32,
    capsule_half_height: f32,
    collider_offset: Vec3,
    offset: f32,
    max_slope_climb_angle: f32,
    auto_step_max_height: f32,
    auto_step_min_width: f32,
    auto_step_include_dynamic: bool,
    snap_to_ground_distance: f32,
    camera_mode: CameraMode,
    camera_distance: f32,
    camera_height: f32,
    camera_sensitivity: f32,
    camera_up_limit: f32,
    camera_down_limit: f32,
    gravity_scale: f32,
    max_fall_speed: f32,
    air_acceleration: f32,
    air_max_speed: f32,
    strafe_responsiveness: f32,
    air_friction: f32,
    ground_friction: f32,
    stop_speed: f32,
    slope_friction: f32,
    slide_threshold: f32,
    max_velocity: f32,
    velocity_damping: f32,
    momentum_preservation: f32,
    bounce_velocity_retention: f32,
    crouch_speed_multiplier: f32,
    crouch_height_reduction: f32,
    slide_enabled: bool,
    slide_speed_multiplier: f32,
    slide_duration: f32,
    slide_deceleration: f32,
    slide_min_speed: f32,
    pre_speed_boost: f32,
    bunny_hop_tolerance: f32,
    jump_while_sliding: bool,
    animations: AnimationClips,
}

impl LocomotionConfigPatch {
    /// Copy `base`, overwrite the set fields and clamp the result.
    ///
    /// Every clamped field is logged and returned.
    pub fn apply(&self, base: &LocomotionConfig) -> (LocomotionConfig, Vec<ClampedField>) {
        let mut merged = base.clone();
        self.write_into(&mut merged);

        let clamped = merged.clamp_to_bounds();
        for field in &clamped {
            log::warn!(
                "config patch: {} out of range, clamped {} -> {}",
                field.field,
                field.from,
                field.to
            );
        }
        (merged, clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_overwrites_only_set_fields() {
        let base = LocomotionConfig::default();
        let patch = LocomotionConfigPatch {
            max_speed: Some(7.0),
            camera_mode: Some(CameraMode::ThirdPerson),
            ..Default::default()
        };

        let (merged, clamped) = patch.apply(&base);
        assert!(clamped.is_empty());
        assert_eq!(merged.max_speed, 7.0);
        assert_eq!(merged.camera_mode, CameraMode::ThirdPerson);
        assert_eq!(merged.acceleration, base.acceleration);
        // Base untouched
        assert_eq!(base.max_speed, LocomotionConfig::default().max_speed);
    }

    #[test]
    fn test_patch_clamps_out_of_range() {
        let base = LocomotionConfig::default();
        let patch = LocomotionConfigPatch {
            velocity_damping: Some(3.0),
            capsule_radius: Some(-1.0),
            ..Default::default()
        };

        let (merged, clamped) = patch.apply(&base);
        assert_eq!(merged.velocity_damping, 1.0);
        assert!(merged.capsule_radius > 0.0);
        assert_eq!(clamped.len(), 2);
        assert_eq!(merged.validate(), Ok(()));
    }

    #[test]
    fn test_empty_patch() {
        assert!(LocomotionConfigPatch::default().is_empty());
        let patch = LocomotionConfigPatch {
            slide_enabled: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_from_json() {
        let patch: LocomotionConfigPatch =
            serde_json::from_str(r#"{ "airAcceleration": 40.0, "jumpWhileSliding": false }"#).unwrap();
        assert_eq!(patch.air_acceleration, Some(40.0));
        assert_eq!(patch.jump_while_sliding, Some(false));
        assert_eq!(patch.max_speed, None);
    }
}
