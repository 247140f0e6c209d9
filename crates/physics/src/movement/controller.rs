//! Character controller facade.
//!
//! This is the main entry point for character movement. It owns the
//! controlled body and its locomotion state, and runs one fixed pipeline per
//! [`CharacterController::update`]:
//!
//! 1. Probe the ground
//! 2. Resolve stance transitions
//! 3. Integrate velocity
//! 4. Move the kinematic body (with auto-step)
//! 5. Reposition the camera from the resulting pose

use std::fmt;
use std::rc::Rc;

use glam::Vec3;

use crate::backend::{
    BodyMode, BodyPose, CameraId, ControlledBody, SharedCamera, SharedInput, SharedPhysics,
};

use super::camera::{apply_look, camera_pose, CameraPose};
use super::config::{ClampedField, LocomotionConfig};
use super::error::{ConfigurationError, InitializationError};
use super::integrator::{clip_against, integrate, wish_direction};
use super::patch::LocomotionConfigPatch;
use super::probe::{self, GroundProbe};
use super::stance::{self, StanceInput, TransitionReport};
use super::state::{Contact, LocomotionState};

/// Spawn probe reach below the requested position (meters).
const SPAWN_PROBE_DISTANCE: f32 = 3.0;

/// Collaborators injected into a controller.
///
/// Every field is optional at construction so hosts can wire them up in any
/// order; [`CharacterController::activate_camera`] checks that all of them
/// are present.
#[derive(Clone, Default)]
pub struct Collaborators {
    pub physics: Option<SharedPhysics>,
    pub camera: Option<SharedCamera>,
    pub camera_id: Option<CameraId>,
    pub input: Option<SharedInput>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("physics", &self.physics.is_some())
            .field("camera", &self.camera.is_some())
            .field("camera_id", &self.camera_id)
            .field("input", &self.input.is_some())
            .finish()
    }
}

/// Counters describing what the controller has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerDiagnostics {
    /// Updates that ran the full pipeline.
    pub updates: u64,
    /// Updates skipped because `dt`, the pose or the input was not finite.
    pub degenerate_frames: u64,
    /// Updates ignored because the controller was inert.
    pub ignored_updates: u64,
    pub steps_taken: u64,
    /// Moves stopped by a non-walkable surface.
    pub blocked_moves: u64,
    /// Fields clamped by config patches.
    pub clamped_fields: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    /// Built, or deactivated. `update` does nothing.
    Idle,
    Active,
    /// Activation failed. `update` does nothing until activation succeeds.
    Inert,
    Disposed,
}

/// Builder for [`CharacterController`].
pub struct ControllerBuilder<B> {
    config: LocomotionConfig,
    body: B,
    collaborators: Collaborators,
}

impl<B: ControlledBody> ControllerBuilder<B> {
    pub fn physics(mut self, physics: SharedPhysics) -> Self {
        self.collaborators.physics = Some(physics);
        self
    }

    pub fn camera(mut self, id: CameraId, camera: SharedCamera) -> Self {
        self.collaborators.camera_id = Some(id);
        self.collaborators.camera = Some(camera);
        self
    }

    pub fn input(mut self, input: SharedInput) -> Self {
        self.collaborators.input = Some(input);
        self
    }

    /// Replace all collaborators at once.
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Validate the config and create the controller.
    pub fn build(self) -> Result<CharacterController<B>, ConfigurationError> {
        self.config.validate()?;

        let mut state = LocomotionState::new(self.config.capsule_half_height);
        let yaw = self.body.pose().yaw;
        if yaw.is_finite() {
            state.yaw = yaw;
        }

        Ok(CharacterController {
            config: self.config,
            body: self.body,
            state,
            collaborators: self.collaborators,
            lifecycle: Lifecycle::Idle,
            prior_mode: None,
            camera_pose: None,
            last_report: TransitionReport::default(),
            diagnostics: ControllerDiagnostics::default(),
        })
    }
}

/// Capsule character controller driving one body.
pub struct CharacterController<B> {
    config: LocomotionConfig,
    body: B,
    state: LocomotionState,
    collaborators: Collaborators,
    lifecycle: Lifecycle,
    /// Body mode before the first successful activation.
    prior_mode: Option<BodyMode>,
    camera_pose: Option<CameraPose>,
    last_report: TransitionReport,
    diagnostics: ControllerDiagnostics,
}

impl<B: ControlledBody> CharacterController<B> {
    pub fn builder(config: LocomotionConfig, body: B) -> ControllerBuilder<B> {
        ControllerBuilder {
            config,
            body,
            collaborators: Collaborators::default(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Check the collaborators, switch the body to kinematic and bind the
    /// camera to the viewport.
    ///
    /// On failure the controller becomes inert and every update is a no-op
    /// until a later activation succeeds.
    pub fn activate_camera(&mut self) -> Result<(), InitializationError> {
        match self.lifecycle {
            Lifecycle::Active => return Ok(()),
            Lifecycle::Disposed => return Err(InitializationError::Disposed),
            Lifecycle::Idle | Lifecycle::Inert => {}
        }

        let (physics, camera, camera_id) = match self.check_collaborators() {
            Ok(parts) => parts,
            Err(error) => {
                log::warn!("character controller inert: {}", error);
                self.lifecycle = Lifecycle::Inert;
                return Err(error);
            }
        };

        let collider = self.body.collider();
        {
            let mut physics = physics.borrow_mut();
            if self.prior_mode.is_none() {
                self.prior_mode = physics.body_mode(collider);
            }
            physics.set_body_mode(collider, BodyMode::Kinematic);
            physics.set_collider_radius(collider, self.config.capsule_radius);
            physics.set_collider_half_height(collider, self.state.half_height);
        }

        let pose = camera_pose(self.body.pose().position, &self.state, &self.config);
        {
            let mut camera = camera.borrow_mut();
            camera.set_camera_follow(camera_id, self.config.follow_config());
            camera.set_active_camera(Some(camera_id));
            camera.set_camera_pose(camera_id, pose);
        }
        self.camera_pose = Some(pose);

        self.lifecycle = Lifecycle::Active;
        log::info!(
            "character controller active: collider={:?} camera={:?} mode={:?}",
            collider,
            camera_id,
            self.config.camera_mode
        );
        Ok(())
    }

    /// Release the camera binding and stop consuming input. The locomotion
    /// state is kept so a later activation resumes where this one stopped.
    pub fn deactivate(&mut self) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        self.release_camera();
        self.lifecycle = Lifecycle::Idle;
        log::info!("character controller deactivated");
    }

    /// Restore the body's prior physics mode, release the camera and drop
    /// every collaborator. Idempotent; a no-op before the first activation.
    pub fn dispose(&mut self) {
        match self.lifecycle {
            Lifecycle::Disposed => return,
            _ if self.prior_mode.is_none() && self.lifecycle != Lifecycle::Inert => return,
            _ => {}
        }

        if self.lifecycle == Lifecycle::Active {
            self.release_camera();
        }

        if let (Some(physics), Some(mode)) = (&self.collaborators.physics, self.prior_mode) {
            let collider = self.body.collider();
            let mut physics = physics.borrow_mut();
            physics.set_collider_half_height(collider, self.config.capsule_half_height);
            physics.set_body_mode(collider, mode);
        }

        self.collaborators = Collaborators::default();
        self.state = LocomotionState::new(self.config.capsule_half_height);
        self.camera_pose = None;
        self.prior_mode = None;
        self.lifecycle = Lifecycle::Disposed;
        log::info!("character controller disposed");
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    pub fn is_inert(&self) -> bool {
        self.lifecycle == Lifecycle::Inert
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle == Lifecycle::Disposed
    }

    fn check_collaborators(&self) -> Result<(SharedPhysics, SharedCamera, CameraId), InitializationError> {
        let physics = self
            .collaborators
            .physics
            .clone()
            .ok_or(InitializationError::MissingCollaborator("physics"))?;
        let camera = self
            .collaborators
            .camera
            .clone()
            .ok_or(InitializationError::MissingCollaborator("camera"))?;
        let camera_id = self
            .collaborators
            .camera_id
            .ok_or(InitializationError::MissingCollaborator("camera id"))?;
        if self.collaborators.input.is_none() {
            return Err(InitializationError::MissingCollaborator("input"));
        }

        let collider = self.body.collider();
        if physics.borrow().body_mode(collider).is_none() {
            return Err(InitializationError::UnknownCollider(collider));
        }
        if camera.borrow().get_camera(camera_id).is_none() {
            return Err(InitializationError::UnknownCamera(camera_id));
        }

        Ok((physics, camera, camera_id))
    }

    fn release_camera(&mut self) {
        if let (Some(camera), Some(id)) = (&self.collaborators.camera, self.collaborators.camera_id) {
            let mut camera = camera.borrow_mut();
            camera.clear_camera_follow(id);
            // Another controller may own the viewport by now
            if camera.active_camera() == Some(id) {
                camera.set_active_camera(None);
            }
        }
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Advance the controller by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        match self.lifecycle {
            Lifecycle::Active => {}
            Lifecycle::Inert => {
                if self.diagnostics.ignored_updates == 0 {
                    log::warn!("update on inert character controller ignored");
                }
                self.diagnostics.ignored_updates += 1;
                return;
            }
            Lifecycle::Idle | Lifecycle::Disposed => return,
        }

        let (Some(physics), Some(input)) = (&self.collaborators.physics, &self.collaborators.input) else {
            return;
        };
        let physics = Rc::clone(physics);
        let frame = input.borrow().frame();
        let pose = self.body.pose();

        if !dt.is_finite() || dt <= 0.0 || !pose.is_finite() || !frame.is_finite() {
            self.diagnostics.degenerate_frames += 1;
            log::warn!(
                "degenerate frame skipped: dt={} pose={:?} input_finite={}",
                dt,
                pose.position,
                frame.is_finite()
            );
            return;
        }

        self.diagnostics.updates += 1;
        self.state.elapsed += f64::from(dt);
        apply_look(&mut self.state, frame.look, &self.config);

        let collider = self.body.collider();
        let mut center = pose.translated(self.config.collider_offset);

        // Probe
        let ground = probe::probe_ground(
            &*physics.borrow(),
            center,
            self.state.half_height,
            self.state.velocity.y,
            &self.config,
        );
        let can_stand = !self.state.posture.is_low()
            || probe::has_headroom(
                &*physics.borrow(),
                center,
                self.state.half_height,
                self.config.capsule_half_height,
                &self.config,
            );

        // Stance
        let previous_half_height = self.state.half_height;
        let stance_input = StanceInput::from_frame(&frame, dt);
        let report = stance::resolve(&mut self.state, &ground, &stance_input, can_stand, &self.config);
        if report.posture_changed() {
            log::debug!("posture -> {:?} (half height {:.2})", self.state.posture, self.state.half_height);
        }

        if self.state.half_height != previous_half_height {
            physics
                .borrow_mut()
                .set_collider_half_height(collider, self.state.half_height);
            // Bottom of the capsule stays put
            center = center.translated(Vec3::new(0.0, self.state.half_height - previous_half_height, 0.0));
        }
        if self.state.contact == Contact::Grounded && !report.jumped {
            center = center.translated(Vec3::new(0.0, -ground.snap_distance, 0.0));
        }

        // Integrate
        let wish = wish_direction(&frame, self.state.yaw);
        self.state.velocity = integrate(&self.state, wish, &self.config, dt);

        // Move
        let center = self.move_body(&physics, center, dt);
        self.body.set_pose(BodyPose {
            position: center.position - self.config.collider_offset,
            yaw: self.state.yaw,
        });

        // Camera
        self.sync_camera();
        self.last_report = report;
    }

    fn move_body(&mut self, physics: &SharedPhysics, center: BodyPose, dt: f32) -> BodyPose {
        let collider = self.body.collider();
        let moved = physics
            .borrow_mut()
            .move_kinematic_body(collider, center, self.state.velocity * dt);

        let Some(hit) = moved.blocked else {
            return moved.pose;
        };

        if self.state.grounded() {
            let stepped = probe::try_step(
                &mut *physics.borrow_mut(),
                collider,
                moved.pose,
                self.state.half_height,
                &hit,
                moved.remaining,
                &self.config,
            );
            if let Some(stepped) = stepped {
                self.diagnostics.steps_taken += 1;
                log::debug!(
                    "auto-step: rise={:.3}",
                    stepped.position.y - moved.pose.position.y
                );
                return stepped;
            }
        }

        if !probe::is_walkable(hit.normal, &self.config) {
            self.state.velocity = clip_against(
                self.state.velocity,
                hit.normal,
                self.config.bounce_velocity_retention,
            );
            self.diagnostics.blocked_moves += 1;
        }
        moved.pose
    }

    fn sync_camera(&mut self) {
        let pose = camera_pose(self.body.pose().position, &self.state, &self.config);
        if let (Some(camera), Some(id)) = (&self.collaborators.camera, self.collaborators.camera_id) {
            camera.borrow_mut().set_camera_pose(id, pose);
        }
        self.camera_pose = Some(pose);
    }

    /// Drop the body onto the ground below `position`.
    ///
    /// Returns `false` (leaving the body at `position`, airborne) when no
    /// physics backend is attached or nothing is found within reach.
    pub fn spawn_at(&mut self, position: Vec3) -> bool {
        let yaw = self.state.yaw;
        self.body.set_pose(BodyPose { position, yaw });
        self.state.velocity = Vec3::ZERO;
        self.state.contact = Contact::Airborne;
        self.state.surface = None;

        let Some(physics) = &self.collaborators.physics else {
            return false;
        };
        let center = BodyPose { position, yaw }.translated(self.config.collider_offset);
        let hit = physics.borrow().sweep_capsule(
            center,
            self.config.capsule_radius,
            self.state.half_height,
            Vec3::NEG_Y,
            SPAWN_PROBE_DISTANCE,
        );

        let Some(hit) = hit else {
            return false;
        };
        let drop = (hit.distance - self.config.offset).max(0.0);
        self.body.set_pose(BodyPose {
            position: position - Vec3::new(0.0, drop, 0.0),
            yaw,
        });
        if probe::is_walkable(hit.normal, &self.config) {
            self.state.contact = Contact::Grounded;
            self.state.surface = probe::classify_slope(probe::slope_angle(hit.normal), &self.config);
            self.state.ground_normal = hit.normal;
            self.state.last_landed_at = Some(self.state.elapsed);
        }
        true
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Replace the config wholesale. Rejected if invalid, leaving the current
    /// config in place.
    pub fn set_config(&mut self, config: LocomotionConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        self.install_config(config);
        Ok(())
    }

    /// Merge a partial patch, clamping out-of-range fields.
    pub fn update_config(&mut self, patch: &LocomotionConfigPatch) -> Vec<ClampedField> {
        if patch.is_empty() {
            return Vec::new();
        }
        let (merged, clamped) = patch.apply(&self.config);
        self.diagnostics.clamped_fields += clamped.len() as u64;
        self.install_config(merged);
        clamped
    }

    fn install_config(&mut self, config: LocomotionConfig) {
        let half_height = config.half_height(self.state.posture);
        let radius_changed = config.capsule_radius != self.config.capsule_radius;
        let camera_changed = config.follow_config() != self.config.follow_config();
        self.config = config;
        log::debug!("config installed: maxSpeed={} cameraMode={:?}", self.config.max_speed, self.config.camera_mode);

        if radius_changed && self.lifecycle == Lifecycle::Active {
            if let Some(physics) = &self.collaborators.physics {
                physics
                    .borrow_mut()
                    .set_collider_radius(self.body.collider(), self.config.capsule_radius);
            }
        }

        if half_height != self.state.half_height {
            self.state.half_height = half_height;
            if let Some(physics) = &self.collaborators.physics {
                if self.lifecycle == Lifecycle::Active {
                    physics
                        .borrow_mut()
                        .set_collider_half_height(self.body.collider(), half_height);
                }
            }
        }

        if self.lifecycle == Lifecycle::Active {
            if camera_changed {
                if let (Some(camera), Some(id)) = (&self.collaborators.camera, self.collaborators.camera_id) {
                    camera.borrow_mut().set_camera_follow(id, self.config.follow_config());
                }
            }
            self.sync_camera();
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_pose(&self) -> BodyPose {
        self.body.pose()
    }

    /// Camera pose computed by the last update or activation.
    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.camera_pose
    }

    /// Clip for the current locomotion phase, if one is configured.
    pub fn current_animation(&self) -> Option<&str> {
        self.config.animations.clip(self.state.phase())
    }

    /// Transitions fired by the last update.
    pub fn last_transitions(&self) -> TransitionReport {
        self.last_report
    }

    pub fn diagnostics(&self) -> ControllerDiagnostics {
        self.diagnostics
    }

    /// Ground probe for the current pose, without changing any state.
    pub fn probe_ground(&self) -> Option<GroundProbe> {
        let physics = self.collaborators.physics.as_ref()?;
        let center = self.body.pose().translated(self.config.collider_offset);
        Some(probe::probe_ground(
            &*physics.borrow(),
            center,
            self.state.half_height,
            self.state.velocity.y,
            &self.config,
        ))
    }

    /// Dispose and hand the body back.
    pub fn into_body(mut self) -> B {
        self.dispose();
        self.body
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::backend::{ButtonState, CameraBackend, InputFrame};
    use crate::movement::animation::AnimationClips;
    use crate::movement::camera::CameraMode;
    use crate::movement::state::Posture;
    use crate::test_support::{FakeBody, FakeCamera, FakeInput, FakePhysics, BODY, CAMERA};

    const DT: f32 = 1.0 / 60.0;

    struct Rig {
        physics: Rc<RefCell<FakePhysics>>,
        camera: Rc<RefCell<FakeCamera>>,
        input: Rc<RefCell<FakeInput>>,
    }

    impl Rig {
        /// Flat floor at y = 0 with the body resting on it.
        fn new() -> Self {
            Self {
                physics: Rc::new(RefCell::new(FakePhysics::with_floor(0.0))),
                camera: Rc::new(RefCell::new(FakeCamera::with_camera(CAMERA))),
                input: Rc::new(RefCell::new(FakeInput::default())),
            }
        }

        fn controller(&self, config: LocomotionConfig) -> CharacterController<FakeBody> {
            let start = Vec3::new(0.0, config.capsule_half_height + config.offset, 0.0);
            CharacterController::builder(config, FakeBody::new(start))
                .physics(self.physics.clone())
                .camera(CAMERA, self.camera.clone())
                .input(self.input.clone())
                .build()
                .unwrap()
        }

        fn active(&self, config: LocomotionConfig) -> CharacterController<FakeBody> {
            let mut controller = self.controller(config);
            controller.activate_camera().unwrap();
            controller
        }

        fn set_input(&self, frame: InputFrame) {
            self.input.borrow_mut().frame = frame;
        }
    }

    fn forward() -> InputFrame {
        InputFrame {
            forward: 1.0,
            ..Default::default()
        }
    }

    fn pressed() -> ButtonState {
        ButtonState::from_edges(false, true)
    }

    fn held() -> ButtonState {
        ButtonState::from_edges(true, true)
    }

    #[test]
    fn test_invalid_config_builds_nothing() {
        let config = LocomotionConfig {
            capsule_radius: -0.1,
            ..Default::default()
        };
        let result = CharacterController::builder(config, FakeBody::new(Vec3::ZERO)).build();
        assert!(matches!(result, Err(ConfigurationError::OutOfBounds { field: "capsuleRadius", .. })));
    }

    #[test]
    fn test_update_before_activation_is_noop() {
        let rig = Rig::new();
        let mut controller = rig.controller(LocomotionConfig::default());
        let start = controller.body_pose();

        rig.set_input(forward());
        controller.update(DT);
        assert_eq!(controller.body_pose(), start);
        assert_eq!(controller.diagnostics().updates, 0);
    }

    #[test]
    fn test_missing_input_makes_controller_inert() {
        let rig = Rig::new();
        let config = LocomotionConfig::default();
        let mut controller = CharacterController::builder(config, FakeBody::new(Vec3::ONE))
            .physics(rig.physics.clone())
            .camera(CAMERA, rig.camera.clone())
            .build()
            .unwrap();

        let error = controller.activate_camera().unwrap_err();
        assert_eq!(error, InitializationError::MissingCollaborator("input"));
        assert!(controller.is_inert());

        controller.update(DT);
        controller.update(DT);
        assert_eq!(controller.body_pose().position, Vec3::ONE);
        assert_eq!(controller.diagnostics().ignored_updates, 2);
        assert_eq!(rig.camera.borrow().active, None);
    }

    #[test]
    fn test_unknown_collider_rejected() {
        let rig = Rig::new();
        let mut controller = CharacterController::builder(LocomotionConfig::default(), FakeBody::with_collider(Vec3::ZERO, 99))
            .physics(rig.physics.clone())
            .camera(CAMERA, rig.camera.clone())
            .input(rig.input.clone())
            .build()
            .unwrap();

        assert!(matches!(
            controller.activate_camera(),
            Err(InitializationError::UnknownCollider(_))
        ));
        assert!(controller.is_inert());
    }

    #[test]
    fn test_activation_binds_camera_and_kinematic_mode() {
        let rig = Rig::new();
        let controller = rig.active(LocomotionConfig::default());

        assert!(controller.is_active());
        assert_eq!(rig.physics.borrow().modes.get(&BODY), Some(&BodyMode::Kinematic));
        let camera = rig.camera.borrow();
        assert_eq!(camera.active, Some(CAMERA));
        assert!(camera.follows.contains_key(&CAMERA));
        assert!(camera.poses.contains_key(&CAMERA));
    }

    #[test]
    fn test_dispose_restores_mode_and_is_idempotent() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());

        controller.dispose();
        assert!(controller.is_disposed());
        assert_eq!(rig.physics.borrow().modes.get(&BODY), Some(&BodyMode::Dynamic));
        assert_eq!(rig.camera.borrow().active, None);
        assert!(!rig.camera.borrow().follows.contains_key(&CAMERA));

        let mode_calls = rig.physics.borrow().mode_changes;
        controller.dispose();
        assert_eq!(rig.physics.borrow().mode_changes, mode_calls);
        assert_eq!(controller.activate_camera(), Err(InitializationError::Disposed));
    }

    #[test]
    fn test_dispose_before_activation_is_noop() {
        let rig = Rig::new();
        let mut controller = rig.controller(LocomotionConfig::default());
        controller.dispose();
        assert!(!controller.is_disposed());
        assert_eq!(rig.physics.borrow().mode_changes, 0);
        assert!(controller.activate_camera().is_ok());
    }

    #[test]
    fn test_deactivate_keeps_state() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        rig.set_input(forward());
        for _ in 0..10 {
            controller.update(DT);
        }
        let state = controller.state().clone();
        let pose = controller.body_pose();

        controller.deactivate();
        assert_eq!(rig.camera.borrow().active, None);
        controller.update(DT);
        assert_eq!(controller.state(), &state);
        assert_eq!(controller.body_pose(), pose);

        controller.activate_camera().unwrap();
        controller.update(DT);
        assert!(controller.body_pose().position.x > pose.position.x);
    }

    #[test]
    fn test_walks_forward_on_floor() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        rig.set_input(forward());

        for _ in 0..60 {
            controller.update(DT);
        }
        let state = controller.state();
        assert!(state.grounded());
        assert!((state.horizontal_speed() - controller.config().max_speed).abs() < 1e-3);
        assert!(controller.body_pose().position.x > 3.0);
        // Resting at skin distance above the floor
        let bottom = controller.body_pose().position.y - state.half_height;
        assert!((bottom - controller.config().offset).abs() < 1e-3, "bottom at {}", bottom);
    }

    #[test]
    fn test_jump_and_land() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        controller.update(DT);
        assert!(controller.state().grounded());

        rig.set_input(InputFrame {
            jump: pressed(),
            ..Default::default()
        });
        controller.update(DT);
        assert!(controller.last_transitions().jumped);
        assert!(!controller.state().grounded());

        rig.set_input(InputFrame::default());
        let mut peak = 0.0f32;
        let mut landed = false;
        for _ in 0..120 {
            controller.update(DT);
            peak = peak.max(controller.body_pose().position.y);
            if controller.last_transitions().landed {
                landed = true;
                break;
            }
        }
        assert!(landed, "never landed");
        assert!(peak > 1.5, "jump too low: {}", peak);
        assert!(controller.state().last_landed_at.is_some());
    }

    #[test]
    fn test_speed_never_exceeds_max_velocity() {
        let rig = Rig::new();
        let config = LocomotionConfig {
            max_velocity: 4.0,
            bunny_hop_tolerance: 1.0,
            pre_speed_boost: 2.0,
            ..Default::default()
        };
        let mut controller = rig.active(config);

        for tick in 0..240 {
            let jump = if tick % 20 == 0 { pressed() } else { ButtonState::default() };
            rig.set_input(InputFrame {
                forward: 1.0,
                jump,
                sprint: held(),
                ..Default::default()
            });
            controller.update(DT);
            assert!(controller.state().velocity.length() <= 4.0 + 1e-4);
        }
    }

    #[test]
    fn test_crouch_resizes_collider() {
        let rig = Rig::new();
        let config = LocomotionConfig {
            capsule_half_height: 0.9,
            crouch_height_reduction: 0.4,
            ..Default::default()
        };
        let mut controller = rig.active(config);
        controller.update(DT);

        rig.set_input(InputFrame {
            crouch: pressed(),
            ..Default::default()
        });
        controller.update(DT);
        assert_eq!(controller.state().posture, Posture::Crouching);
        let last = rig.physics.borrow().half_heights.last().copied();
        assert!(matches!(last, Some((BODY, h)) if (h - 0.54).abs() < 1e-6));

        rig.set_input(InputFrame::default());
        controller.update(DT);
        assert_eq!(controller.state().posture, Posture::Standing);
        assert_eq!(rig.physics.borrow().half_heights.last().copied(), Some((BODY, 0.9)));
    }

    #[test]
    fn test_low_ceiling_keeps_crouch() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        controller.update(DT);

        rig.set_input(InputFrame {
            crouch: pressed(),
            ..Default::default()
        });
        controller.update(DT);

        rig.physics.borrow_mut().ceiling = Some(0.1);
        rig.set_input(InputFrame::default());
        controller.update(DT);
        assert_eq!(controller.state().posture, Posture::Crouching);
        assert!(controller.last_transitions().stand_blocked);
    }

    #[test]
    fn test_degenerate_frames_counted() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        let pose = controller.body_pose();

        controller.update(f32::NAN);
        controller.update(-1.0);
        rig.set_input(InputFrame {
            forward: f32::INFINITY,
            ..Default::default()
        });
        controller.update(DT);

        assert_eq!(controller.diagnostics().degenerate_frames, 3);
        assert_eq!(controller.body_pose(), pose);

        rig.set_input(forward());
        controller.update(DT);
        assert_eq!(controller.diagnostics().updates, 1);
    }

    #[test]
    fn test_wall_blocks_and_clips_velocity() {
        let rig = Rig::new();
        rig.physics.borrow_mut().wall_x = Some(1.0);
        let mut controller = rig.active(LocomotionConfig::default());
        rig.set_input(InputFrame {
            forward: 1.0,
            right: 0.5,
            ..Default::default()
        });

        for _ in 0..120 {
            controller.update(DT);
        }
        let pose = controller.body_pose();
        assert!(pose.position.x + controller.config().capsule_radius <= 1.0 + 1e-3);
        assert!(controller.diagnostics().blocked_moves > 0);
        // Still sliding along the wall
        assert!(controller.state().velocity.z > 0.0);
    }

    #[test]
    fn test_patch_clamps_and_applies_height() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());

        let clamped = controller.update_config(&LocomotionConfigPatch {
            capsule_half_height: Some(1.2),
            velocity_damping: Some(7.0),
            ..Default::default()
        });
        assert_eq!(clamped.len(), 1);
        assert_eq!(controller.config().velocity_damping, 1.0);
        assert_eq!(controller.state().half_height, 1.2);
        assert_eq!(rig.physics.borrow().half_heights.last().copied(), Some((BODY, 1.2)));
        assert_eq!(controller.diagnostics().clamped_fields, 1);
    }

    #[test]
    fn test_radius_patch_resizes_collider() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        assert_eq!(rig.physics.borrow().radii.last().copied(), Some((BODY, 0.4)));

        controller.update_config(&LocomotionConfigPatch {
            capsule_radius: Some(0.2),
            ..Default::default()
        });
        assert_eq!(controller.config().capsule_radius, 0.2);
        assert_eq!(rig.physics.borrow().radii.last().copied(), Some((BODY, 0.2)));

        // Unchanged radius is not pushed again
        let calls = rig.physics.borrow().radii.len();
        controller.update_config(&LocomotionConfigPatch {
            max_speed: Some(7.0),
            ..Default::default()
        });
        assert_eq!(rig.physics.borrow().radii.len(), calls);
    }

    #[test]
    fn test_patch_keeps_locomotion_state() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        rig.set_input(InputFrame {
            forward: 1.0,
            crouch: pressed(),
            ..Default::default()
        });
        controller.update(DT);
        rig.set_input(InputFrame {
            forward: 1.0,
            crouch: held(),
            ..Default::default()
        });
        for _ in 0..10 {
            controller.update(DT);
        }
        let before = controller.state().clone();
        assert_eq!(before.posture, Posture::Crouching);
        assert!(before.velocity.x > 0.0);

        controller.update_config(&LocomotionConfigPatch {
            max_speed: Some(9.0),
            ground_friction: Some(10.0),
            ..Default::default()
        });
        assert!(controller.update_config(&LocomotionConfigPatch::default()).is_empty());
        let after = controller.state();
        assert_eq!(after.velocity, before.velocity);
        assert_eq!(after.posture, before.posture);
        assert_eq!(after.yaw, before.yaw);
        assert_eq!(after.elapsed, before.elapsed);
    }

    #[test]
    fn test_release_leaves_other_active_camera_alone() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());

        // Some other owner took the viewport
        let other = CameraId(8);
        rig.camera.borrow_mut().known.push(other);
        rig.camera.borrow_mut().set_active_camera(Some(other));

        controller.deactivate();
        assert_eq!(rig.camera.borrow().active, Some(other));
        assert!(!rig.camera.borrow().follows.contains_key(&CAMERA));

        controller.activate_camera().unwrap();
        assert_eq!(rig.camera.borrow().active, Some(CAMERA));
        rig.camera.borrow_mut().set_active_camera(Some(other));
        controller.dispose();
        assert_eq!(rig.camera.borrow().active, Some(other));
    }

    #[test]
    fn test_set_config_rejects_invalid() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        let bad = LocomotionConfig {
            max_fall_speed: 3.0,
            ..Default::default()
        };
        assert!(controller.set_config(bad).is_err());
        assert_eq!(controller.config(), &LocomotionConfig::default());

        let third = LocomotionConfig {
            camera_mode: CameraMode::ThirdPerson,
            ..Default::default()
        };
        controller.set_config(third).unwrap();
        let follow = rig.camera.borrow().follows.get(&CAMERA).copied();
        assert_eq!(follow.map(|f| f.mode), Some(CameraMode::ThirdPerson));
    }

    #[test]
    fn test_camera_tracks_body_every_update() {
        let rig = Rig::new();
        let mut controller = rig.active(LocomotionConfig::default());
        rig.set_input(InputFrame {
            forward: 1.0,
            look: glam::Vec2::new(50.0, 0.0),
            ..Default::default()
        });

        for _ in 0..30 {
            controller.update(DT);
            let body = controller.body_pose().position;
            let pose = rig.camera.borrow().poses.get(&CAMERA).copied().unwrap();
            let expected = body + Vec3::new(0.0, controller.config().camera_height, 0.0);
            assert!((pose.position - expected).length() < 1e-5);
            assert_eq!(pose.yaw, controller.state().yaw);
        }
    }

    #[test]
    fn test_animation_lookup() {
        let rig = Rig::new();
        let config = LocomotionConfig {
            animations: AnimationClips {
                idle: Some("stand".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut controller = rig.active(config);
        controller.update(DT);
        assert_eq!(controller.current_animation(), Some("stand"));

        rig.set_input(forward());
        for _ in 0..10 {
            controller.update(DT);
        }
        assert_eq!(controller.current_animation(), None);
    }

    #[test]
    fn test_into_body_disposes() {
        let rig = Rig::new();
        let controller = rig.active(LocomotionConfig::default());
        let body = controller.into_body();
        assert_eq!(body.collider, BODY);
        assert_eq!(rig.physics.borrow().modes.get(&BODY), Some(&BodyMode::Dynamic));
    }
}
