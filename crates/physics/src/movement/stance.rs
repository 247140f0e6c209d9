//! Locomotion state machine.
//!
//! Resolves jump, landing, crouch and slide transitions once per update.
//! Transitions are evaluated in a fixed priority order and applied
//! sequentially, so a later rule sees the result of an earlier one:
//!
//! 1. Jump
//! 2. Land
//! 3. Crouch engage
//! 4. Slide engage
//! 5. Slide tick
//! 6. Crouch release
//!
//! The machine itself never queries physics. Checks that need the world
//! (standing up under a low ceiling) are done by the caller and passed in,
//! the same way the caller runs the ground probe first.

use glam::Vec3;

use crate::backend::InputFrame;

use super::config::LocomotionConfig;
use super::probe::GroundProbe;
use super::state::{Contact, LocomotionState, Posture};

/// Button state the machine reacts to.
#[derive(Debug, Clone, Copy, Default)]
pub struct StanceInput {
    pub jump_pressed: bool,
    pub crouch_held: bool,
    pub crouch_pressed: bool,
    pub sprint_held: bool,
    /// Time step in seconds.
    pub dt: f32,
}

impl StanceInput {
    pub fn from_frame(frame: &InputFrame, dt: f32) -> Self {
        Self {
            jump_pressed: frame.jump.pressed,
            crouch_held: frame.crouch.held,
            crouch_pressed: frame.crouch.pressed,
            sprint_held: frame.sprint.held,
            dt,
        }
    }
}

/// Which transitions fired during one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionReport {
    pub jumped: bool,
    /// Jump was pressed but not allowed.
    pub jump_rejected: bool,
    /// Jump landed inside the bunny-hop window.
    pub bunny_hop: bool,
    pub landed: bool,
    /// Left the ground without jumping.
    pub left_ground: bool,
    pub crouch_engaged: bool,
    pub slide_engaged: bool,
    pub slide_ended: bool,
    pub stood_up: bool,
    /// Wanted to stand but the ceiling is too low.
    pub stand_blocked: bool,
}

impl TransitionReport {
    /// Whether any transition changed the posture.
    pub fn posture_changed(&self) -> bool {
        self.crouch_engaged || self.slide_engaged || self.slide_ended || self.stood_up
    }
}

/// Apply this update's transitions to `state`.
///
/// `probe` is the ground classification for this tick and `can_stand`
/// whether the full-height capsule fits. `state.elapsed` must already
/// include `input.dt`.
pub fn resolve(
    state: &mut LocomotionState,
    probe: &GroundProbe,
    input: &StanceInput,
    can_stand: bool,
    config: &LocomotionConfig,
) -> TransitionReport {
    let mut report = TransitionReport::default();
    let now = state.elapsed;
    let was_grounded = state.grounded();
    let grounded = probe.grounded();

    // ========================================================================
    // Jump
    // ========================================================================
    if input.jump_pressed {
        state.last_jump_requested_at = Some(now);

        if grounded && (!state.sliding() || config.jump_while_sliding) {
            if !was_grounded {
                // Touching down and jumping on the same tick counts as landing now
                state.last_landed_at = Some(now);
                report.landed = true;
            }

            if in_bunny_hop_window(state, now, config) {
                let boosted = state.horizontal_velocity() * config.pre_speed_boost;
                state.set_horizontal_velocity(boosted);
                report.bunny_hop = true;
            }

            if state.sliding() {
                end_slide(state, input.crouch_held, can_stand, config, &mut report);
            }

            state.velocity.y = config.jump_velocity();
            lift_off(state);
            report.jumped = true;
            log::debug!(
                "jump: vy={:.2} bunny_hop={} posture={:?}",
                state.velocity.y,
                report.bunny_hop,
                state.posture
            );
        } else {
            report.jump_rejected = true;
            log::debug!("jump rejected: grounded={} posture={:?}", grounded, state.posture);
        }
    }

    // ========================================================================
    // Land / leave ground
    // ========================================================================
    if !report.jumped {
        if grounded {
            if !was_grounded {
                state.last_landed_at = Some(now);
                let carried = state.horizontal_velocity() * config.momentum_preservation;
                state.set_horizontal_velocity(carried);
                state.velocity.y = 0.0;
                report.landed = true;
                log::debug!("landed: speed={:.2}", state.horizontal_speed());
            }
            state.contact = Contact::Grounded;
            state.surface = probe.surface;
            state.ground_normal = probe.normal;
        } else {
            if was_grounded {
                report.left_ground = true;
                if state.sliding() {
                    // Slides only exist on the ground; keep the low capsule
                    state.posture = Posture::Crouching;
                    state.slide_elapsed = 0.0;
                    report.slide_ended = true;
                }
                log::debug!("left ground: posture={:?}", state.posture);
            }
            lift_off(state);
        }
    }

    // ========================================================================
    // Crouch engage
    // ========================================================================
    if input.crouch_held && state.grounded() && state.posture == Posture::Standing {
        state.posture = Posture::Crouching;
        state.half_height = config.half_height(Posture::Crouching);
        report.crouch_engaged = true;
        log::debug!("crouch engaged: half_height={:.3}", state.half_height);
    }

    // ========================================================================
    // Slide engage
    // ========================================================================
    if config.slide_enabled
        && input.crouch_pressed
        && state.grounded()
        && !state.sliding()
        && state.horizontal_speed() >= config.slide_min_speed
        && state.horizontal_speed() > f32::EPSILON
    {
        let horizontal = state.horizontal_velocity();
        let speed = horizontal.length();
        state.slide_direction = horizontal / speed;
        state.slide_elapsed = 0.0;
        state.set_horizontal_velocity(state.slide_direction * speed * config.slide_speed_multiplier);
        state.posture = Posture::Sliding;
        state.half_height = config.half_height(Posture::Sliding);
        report.slide_engaged = true;
        log::debug!("slide engaged: speed={:.2}", state.horizontal_speed());
    }

    // ========================================================================
    // Slide tick
    // ========================================================================
    if state.sliding() {
        state.slide_elapsed += input.dt;
        let speed = (state.horizontal_speed() - config.slide_deceleration * input.dt).max(0.0);
        state.set_horizontal_velocity(state.slide_direction * speed);

        let expired = state.slide_elapsed >= config.slide_duration;
        let too_slow = speed < config.slide_min_speed;
        if expired || too_slow || !input.crouch_held {
            log::debug!(
                "slide ended: elapsed={:.2} speed={:.2} crouch_held={}",
                state.slide_elapsed,
                speed,
                input.crouch_held
            );
            end_slide(state, input.crouch_held, can_stand, config, &mut report);
        }
    }

    // ========================================================================
    // Crouch release
    // ========================================================================
    if !input.crouch_held && state.crouching() {
        if can_stand {
            stand_up(state, config, &mut report);
        } else {
            report.stand_blocked = true;
        }
    }

    state.sprinting = input.sprint_held && state.posture == Posture::Standing;
    report
}

/// Whether a jump at `now` falls inside the bunny-hop window.
pub fn in_bunny_hop_window(state: &LocomotionState, now: f64, config: &LocomotionConfig) -> bool {
    state
        .last_landed_at
        .is_some_and(|landed| now - landed <= f64::from(config.bunny_hop_tolerance))
}

fn lift_off(state: &mut LocomotionState) {
    state.contact = Contact::Airborne;
    state.surface = None;
    state.ground_normal = Vec3::Y;
}

fn end_slide(
    state: &mut LocomotionState,
    crouch_held: bool,
    can_stand: bool,
    config: &LocomotionConfig,
    report: &mut TransitionReport,
) {
    let carried = state.horizontal_velocity() * config.momentum_preservation;
    state.set_horizontal_velocity(carried);
    state.slide_elapsed = 0.0;
    state.posture = Posture::Crouching;
    report.slide_ended = true;

    if !crouch_held {
        if can_stand {
            stand_up(state, config, report);
        } else {
            report.stand_blocked = true;
        }
    }
}

fn stand_up(state: &mut LocomotionState, config: &LocomotionConfig, report: &mut TransitionReport) {
    state.posture = Posture::Standing;
    state.half_height = config.half_height(Posture::Standing);
    report.stood_up = true;
    log::debug!("stood up: half_height={:.3}", state.half_height);
}
