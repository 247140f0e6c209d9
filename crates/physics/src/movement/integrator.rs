//! Velocity integration.
//!
//! Pure functions turning the wish direction, current velocity and ground
//! classification into a new velocity. All rates are scaled by `dt`.

use glam::Vec3;

use crate::backend::InputFrame;

use super::camera::{forward_from_yaw, right_from_yaw};
use super::config::LocomotionConfig;
use super::state::{Contact, LocomotionState, SurfaceKind};

/// Reference tick for `velocity_damping` (seconds).
const DAMPING_REFERENCE_DT: f32 = 1.0 / 60.0;

/// World-space unit wish direction from the input axes, or zero.
pub fn wish_direction(input: &InputFrame, yaw: f32) -> Vec3 {
    let wish = forward_from_yaw(yaw) * input.forward + right_from_yaw(yaw) * input.right;
    if !wish.is_finite() || wish.length_squared() < 0.0001 {
        return Vec3::ZERO;
    }
    wish.normalize()
}

/// Ground friction on a horizontal velocity.
///
/// Above `stop_speed` the speed drops linearly by `friction * dt` (never
/// below zero); at or below it the velocity is zeroed.
pub fn apply_friction(horizontal: Vec3, friction: f32, stop_speed: f32, dt: f32) -> Vec3 {
    let speed = horizontal.length();
    if speed <= stop_speed || speed <= f32::EPSILON {
        return Vec3::ZERO;
    }
    let new_speed = (speed - friction * dt).max(0.0);
    horizontal * (new_speed / speed)
}

/// Ground branch: friction, then acceleration toward `wish` capped at `cap`.
///
/// Friction applies when there is no wish input or when the carried speed
/// exceeds the cap. The cap stops acceleration from adding speed; a faster
/// carried speed is bled off by friction instead of snapped down.
pub fn ground_move(
    horizontal: Vec3,
    wish: Vec3,
    friction: f32,
    cap: f32,
    config: &LocomotionConfig,
    dt: f32,
) -> Vec3 {
    let has_wish = wish != Vec3::ZERO;
    let mut velocity = horizontal;

    if !has_wish || horizontal.length() > cap {
        velocity = apply_friction(velocity, friction, config.stop_speed, dt);
    }

    if has_wish {
        let carried = velocity.length();
        velocity += wish * config.acceleration * dt;
        velocity = velocity.clamp_length_max(cap.max(carried));
    }

    velocity
}

/// Air branch: classic accelerate-and-clip, then air friction.
pub fn air_move(horizontal: Vec3, wish: Vec3, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let mut velocity = horizontal;

    if wish != Vec3::ZERO {
        let projection = velocity.dot(wish);
        let max_add = config.air_acceleration * dt * config.strafe_responsiveness;
        let add_speed = (config.air_max_speed - projection).clamp(0.0, max_add);
        velocity += wish * add_speed;
    }

    velocity * (1.0 - config.air_friction * dt).max(0.0)
}

/// Gravity on the vertical velocity, floored at `max_fall_speed`.
#[inline]
pub fn apply_gravity(vertical: f32, config: &LocomotionConfig, dt: f32) -> f32 {
    (vertical - config.gravity() * dt).max(config.max_fall_speed)
}

/// Horizontal part of gravity projected onto a slope plane, over `dt`.
pub fn slope_pull(normal: Vec3, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let gravity = Vec3::new(0.0, -config.gravity(), 0.0);
    let along = gravity - normal * gravity.dot(normal);
    Vec3::new(along.x, 0.0, along.z) * dt
}

/// Damping and the absolute velocity cap, applied every tick.
pub fn govern(velocity: Vec3, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let damping = config.velocity_damping.powf(dt / DAMPING_REFERENCE_DT);
    (velocity * damping).clamp_length_max(config.max_velocity)
}

/// Response to a blocking surface.
///
/// Removes the into-surface component and keeps `retention` of the
/// tangential remainder. Velocity already leaving the surface is untouched.
pub fn clip_against(velocity: Vec3, normal: Vec3, retention: f32) -> Vec3 {
    let into = velocity.dot(normal);
    if into >= 0.0 {
        return velocity;
    }
    (velocity - normal * into) * retention
}

/// Full velocity update for one tick from the post-transition state.
pub fn integrate(state: &LocomotionState, wish: Vec3, config: &LocomotionConfig, dt: f32) -> Vec3 {
    let horizontal = state.horizontal_velocity();

    let velocity = match state.contact {
        Contact::Grounded if state.sliding() => horizontal,
        Contact::Grounded => {
            let cap = config.speed_cap(state.posture, state.sprinting);
            match state.surface {
                Some(SurfaceKind::Slick) => {
                    ground_move(horizontal, wish, config.slope_friction, cap, config, dt)
                        + slope_pull(state.ground_normal, config, dt)
                }
                _ => ground_move(horizontal, wish, config.ground_friction, cap, config, dt),
            }
        }
        Contact::Airborne => {
            let horizontal = air_move(horizontal, wish, config, dt);
            Vec3::new(horizontal.x, apply_gravity(state.velocity.y, config, dt), horizontal.z)
        }
    };

    govern(velocity, config, dt)
}
