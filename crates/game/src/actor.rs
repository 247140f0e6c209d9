//! Actor entity and its optional character controller.

use glam::Vec3;
use stride_physics::movement::ClampedField;
use stride_physics::{
    BodyPose, CameraPose, CharacterController, Collaborators, ColliderHandle, ControlledBody,
    ControllerError, LocomotionConfig, LocomotionConfigPatch, LocomotionState,
};

/// Unique identifier for entities.
pub type EntityId = u32;

/// Transform and collider of an actor, the part a controller drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorBody {
    pub pose: BodyPose,
    pub collider: ColliderHandle,
}

impl ControlledBody for ActorBody {
    fn pose(&self) -> BodyPose {
        self.pose
    }

    fn set_pose(&mut self, pose: BodyPose) {
        self.pose = pose;
    }

    fn collider(&self) -> ColliderHandle {
        self.collider
    }
}

/// Who currently owns the actor's body.
enum Locomotion {
    /// Host moves the body directly.
    Manual(ActorBody),
    /// A character controller owns the body.
    Controlled(Box<CharacterController<ActorBody>>),
}

/// An actor in the game.
pub struct Actor {
    /// Unique actor ID.
    pub id: EntityId,

    /// Actor name/handle.
    pub name: String,

    locomotion: Locomotion,

    /// Collaborators handed to every controller this actor enables.
    collaborators: Collaborators,
}

impl std::fmt::Debug for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("body", &self.body())
            .field("controlled", &self.has_character_controller_enabled())
            .finish()
    }
}

impl Actor {
    /// Create an actor without a controller.
    pub fn new(id: EntityId, name: String, body: ActorBody, collaborators: Collaborators) -> Self {
        Self {
            id,
            name,
            locomotion: Locomotion::Manual(body),
            collaborators,
        }
    }

    /// Snapshot of the body, wherever it currently lives.
    pub fn body(&self) -> ActorBody {
        match &self.locomotion {
            Locomotion::Manual(body) => *body,
            Locomotion::Controlled(controller) => *controller.body(),
        }
    }

    /// Get the actor's body centre.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body().pose.position
    }

    /// Move the body. With a controller enabled this is a respawn: the body
    /// is dropped onto the ground below `position`.
    pub fn teleport(&mut self, position: Vec3) {
        match &mut self.locomotion {
            Locomotion::Manual(body) => body.pose.position = position,
            Locomotion::Controlled(controller) => {
                controller.spawn_at(position);
            }
        }
    }

    // ========================================================================
    // Character controller
    // ========================================================================

    /// Attach and activate a character controller built from `config`.
    ///
    /// An already enabled controller is replaced. On error the actor keeps
    /// its body and stays without a controller.
    pub fn enable_character_controller(&mut self, config: LocomotionConfig) -> Result<(), ControllerError> {
        self.disable_character_controller();

        let body = self.body();
        let mut controller = CharacterController::builder(config, body)
            .collaborators(self.collaborators.clone())
            .build()?;
        controller.activate_camera()?;
        controller.spawn_at(body.pose.position);

        log::info!("actor {} '{}': character controller enabled", self.id, self.name);
        self.locomotion = Locomotion::Controlled(Box::new(controller));
        Ok(())
    }

    /// Dispose the controller and take the body back.
    pub fn disable_character_controller(&mut self) {
        let placeholder = Locomotion::Manual(self.body());
        if let Locomotion::Controlled(controller) = std::mem::replace(&mut self.locomotion, placeholder) {
            self.locomotion = Locomotion::Manual((*controller).into_body());
            log::info!("actor {} '{}': character controller disabled", self.id, self.name);
        }
    }

    /// Merge a config patch into the enabled controller.
    ///
    /// Returns the clamped fields, or `None` when no controller is enabled.
    pub fn update_character_controller_config(&mut self, patch: &LocomotionConfigPatch) -> Option<Vec<ClampedField>> {
        self.controller_mut().map(|controller| controller.update_config(patch))
    }

    pub fn has_character_controller_enabled(&self) -> bool {
        matches!(self.locomotion, Locomotion::Controlled(_))
    }

    pub fn get_character_controller_config(&self) -> Option<LocomotionConfig> {
        self.controller().map(|controller| controller.config().clone())
    }

    pub fn controller(&self) -> Option<&CharacterController<ActorBody>> {
        match &self.locomotion {
            Locomotion::Controlled(controller) => Some(controller.as_ref()),
            Locomotion::Manual(_) => None,
        }
    }

    pub fn controller_mut(&mut self) -> Option<&mut CharacterController<ActorBody>> {
        match &mut self.locomotion {
            Locomotion::Controlled(controller) => Some(controller.as_mut()),
            Locomotion::Manual(_) => None,
        }
    }

    /// Locomotion state of the enabled controller.
    pub fn locomotion_state(&self) -> Option<&LocomotionState> {
        self.controller().map(|controller| controller.state())
    }

    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.controller().and_then(|controller| controller.camera_pose())
    }

    /// Advance the enabled controller; a no-op without one.
    pub fn update(&mut self, dt: f32) {
        if let Some(controller) = self.controller_mut() {
            controller.update(dt);
        }
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        self.disable_character_controller();
    }
}
