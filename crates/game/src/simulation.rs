//! Game simulation - the main game loop.
//!
//! The simulation owns the shared collaborators (collision world, camera rig
//! and input tracker) and the actors. Each tick it records the raw input and
//! updates every actor that has a character controller enabled.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use stride_physics::{
    BodyEntry, BodyMode, BodyPose, CameraId, CapsuleShape, Collaborators, ControllerError,
    LocomotionConfig, Preset, SharedCamera, SharedInput, SharedPhysics,
};
use thiserror::Error;

use crate::actor::{Actor, ActorBody, EntityId};
use crate::camera::CameraRig;
use crate::input::{InputTracker, RawInput};
use crate::level::Level;

/// Height above a spawn point the body is dropped from.
const SPAWN_DROP_HEIGHT: f32 = 0.5;

/// Game simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Simulation tick rate (ticks per second).
    pub tick_rate: u32,

    /// Locomotion configuration for new character controllers.
    pub locomotion: LocomotionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            locomotion: LocomotionConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            locomotion: preset.config(),
            ..Default::default()
        }
    }

    /// Get the time step per tick in seconds.
    pub fn delta_time(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

/// Failures of simulation-level operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("no actor with id {0}")]
    UnknownActor(EntityId),

    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// An actor's entry: the actor plus the camera it owns.
#[derive(Debug)]
struct ActorSlot {
    actor: Actor,
    camera: CameraId,
}

/// The main game simulation.
#[derive(Debug)]
pub struct Simulation {
    /// Current frame/tick number.
    pub frame: u64,

    /// Simulation configuration.
    pub config: SimulationConfig,

    /// Current level.
    pub level: Level,

    actors: Vec<ActorSlot>,
    cameras: Rc<RefCell<CameraRig>>,
    input: Rc<RefCell<InputTracker>>,

    /// Next entity ID to assign.
    next_entity_id: EntityId,
}

impl Simulation {
    /// Create a new simulation with the given configuration and level.
    pub fn new(config: SimulationConfig, level: Level) -> Self {
        Self {
            frame: 0,
            config,
            level,
            actors: Vec::new(),
            cameras: Rc::new(RefCell::new(CameraRig::new())),
            input: Rc::new(RefCell::new(InputTracker::new())),
            next_entity_id: 1,
        }
    }

    /// Create a simulation with default configuration and test arena.
    pub fn test() -> Self {
        Self::new(SimulationConfig::default(), Level::test_arena())
    }

    /// Add an actor at the next spawn point, with its own camera.
    ///
    /// Returns the actor's ID.
    pub fn add_actor(&mut self, name: &str) -> EntityId {
        let spawn_index = self.actors.len() % self.level.player_spawn_count().max(1);
        let spawn = self.level.get_player_spawn(spawn_index).copied();
        let feet = spawn.map(|s| s.position).unwrap_or(Vec3::ZERO);
        let facing = spawn.map(|s| s.facing).unwrap_or(0.0);

        self.add_actor_at(name, feet, facing)
    }

    /// Add an actor standing at `feet`, facing `yaw`.
    pub fn add_actor_at(&mut self, name: &str, feet: Vec3, yaw: f32) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;

        let shape = CapsuleShape::new(
            self.config.locomotion.capsule_radius,
            self.config.locomotion.capsule_half_height,
        );
        let collider = self
            .level
            .collision
            .borrow_mut()
            .register_body(BodyEntry::new(shape, BodyMode::Dynamic));
        let camera = self.cameras.borrow_mut().add_camera();

        let center = feet + Vec3::new(0.0, shape.half_height + SPAWN_DROP_HEIGHT, 0.0);
        let body = ActorBody {
            pose: BodyPose { position: center, yaw },
            collider,
        };

        let physics: SharedPhysics = self.level.collision.clone();
        let cameras: SharedCamera = self.cameras.clone();
        let input: SharedInput = self.input.clone();
        let collaborators = Collaborators {
            physics: Some(physics),
            camera: Some(cameras),
            camera_id: Some(camera),
            input: Some(input),
        };

        log::debug!("actor {} '{}' added at {:?}", id, name, feet);
        self.actors.push(ActorSlot {
            actor: Actor::new(id, name.to_string(), body, collaborators),
            camera,
        });
        id
    }

    /// Remove an actor, disposing its controller and camera.
    pub fn remove_actor(&mut self, actor_id: EntityId) {
        if let Some(index) = self.actors.iter().position(|slot| slot.actor.id == actor_id) {
            let slot = self.actors.remove(index);
            let collider = slot.actor.body().collider;
            drop(slot.actor);
            self.cameras.borrow_mut().remove_camera(slot.camera);
            self.level.collision.borrow_mut().remove_body(collider);
        }
    }

    /// Enable a character controller on an actor with the simulation's
    /// locomotion config.
    pub fn enable_controller(&mut self, actor_id: EntityId) -> Result<(), SimulationError> {
        let config = self.config.locomotion.clone();
        self.enable_controller_with(actor_id, config)
    }

    pub fn enable_controller_with(&mut self, actor_id: EntityId, config: LocomotionConfig) -> Result<(), SimulationError> {
        let actor = self
            .get_actor_mut(actor_id)
            .ok_or(SimulationError::UnknownActor(actor_id))?;
        actor.enable_character_controller(config)?;
        Ok(())
    }

    /// Get an actor by ID.
    pub fn get_actor(&self, actor_id: EntityId) -> Option<&Actor> {
        self.actors
            .iter()
            .map(|slot| &slot.actor)
            .find(|actor| actor.id == actor_id)
    }

    /// Get a mutable reference to an actor by ID.
    pub fn get_actor_mut(&mut self, actor_id: EntityId) -> Option<&mut Actor> {
        self.actors
            .iter_mut()
            .map(|slot| &mut slot.actor)
            .find(|actor| actor.id == actor_id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn cameras(&self) -> &Rc<RefCell<CameraRig>> {
        &self.cameras
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32, raw: &RawInput) {
        self.input.borrow_mut().push(raw);

        for slot in &mut self.actors {
            slot.actor.update(dt);
        }

        self.frame += 1;
    }

    /// Advance by one fixed tick.
    pub fn step(&mut self, raw: &RawInput) {
        self.tick(self.config.delta_time(), raw);
    }

    /// Get the delta time for this simulation.
    pub fn delta_time(&self) -> f32 {
        self.config.delta_time()
    }
}

// ============================================================================
// Tests
// ============================================================================
