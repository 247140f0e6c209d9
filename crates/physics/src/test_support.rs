//! Fake collaborators for unit tests.

use std::collections::HashMap;

use glam::Vec3;

use crate::backend::{
    BodyMode, BodyPose, CameraBackend, CameraId, ColliderHandle, ControlledBody, FollowConfig,
    InputFrame, InputSource, KinematicMove, PhysicsBackend, SweepHit,
};
use crate::movement::CameraPose;

pub const BODY: ColliderHandle = ColliderHandle(1);
pub const CAMERA: CameraId = CameraId(7);

/// Gap the fake keeps between the capsule and any surface it stops at.
const SKIN: f32 = 0.02;

#[derive(Debug, Clone, Copy)]
pub enum Ground {
    None,
    /// Every downward sweep hits this normal at this distance.
    Fixed { normal: Vec3, distance: f32 },
    /// Horizontal floor at this height.
    Floor { height: f32 },
}

/// Analytic physics: an optional floor, an optional wall at `x = wall_x`
/// facing -X, and an optional ceiling at a fixed distance above the capsule.
#[derive(Debug, Clone)]
pub struct FakePhysics {
    pub ground: Ground,
    pub wall_x: Option<f32>,
    pub ceiling: Option<f32>,
    pub radius: f32,
    pub modes: HashMap<ColliderHandle, BodyMode>,
    pub mode_changes: usize,
    pub half_heights: Vec<(ColliderHandle, f32)>,
    pub radii: Vec<(ColliderHandle, f32)>,
}

impl Default for FakePhysics {
    fn default() -> Self {
        let mut modes = HashMap::new();
        modes.insert(BODY, BodyMode::Dynamic);
        Self {
            ground: Ground::None,
            wall_x: None,
            ceiling: None,
            radius: 0.4,
            modes,
            mode_changes: 0,
            half_heights: Vec::new(),
            radii: Vec::new(),
        }
    }
}

impl FakePhysics {
    pub fn with_ground(normal: Vec3, distance: f32) -> Self {
        Self {
            ground: Ground::Fixed { normal, distance },
            ..Default::default()
        }
    }

    pub fn with_floor(height: f32) -> Self {
        Self {
            ground: Ground::Floor { height },
            ..Default::default()
        }
    }

    fn half_height(&self, collider: ColliderHandle) -> f32 {
        self.half_heights
            .iter()
            .rev()
            .find(|(handle, _)| *handle == collider)
            .map_or(0.9, |(_, h)| *h)
    }
}

impl PhysicsBackend for FakePhysics {
    fn sweep_capsule(
        &self,
        pose: BodyPose,
        radius: f32,
        half_height: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<SweepHit> {
        let hit = |distance: f32, normal: Vec3| {
            (distance <= max_distance).then_some(SweepHit {
                distance: distance.max(0.0),
                normal,
                dynamic: false,
            })
        };

        if direction.y < -0.5 {
            match self.ground {
                Ground::None => None,
                Ground::Fixed { normal, distance } => hit(distance, normal),
                Ground::Floor { height } => hit(pose.position.y - half_height - height, Vec3::Y),
            }
        } else if direction.y > 0.5 {
            self.ceiling.and_then(|distance| hit(distance, Vec3::NEG_Y))
        } else if direction.x > 0.0 {
            let wall = self.wall_x?;
            hit((wall - pose.position.x - radius) / direction.x, Vec3::NEG_X)
        } else {
            None
        }
    }

    fn move_kinematic_body(&mut self, collider: ColliderHandle, pose: BodyPose, desired_delta: Vec3) -> KinematicMove {
        let mut target = pose.position + desired_delta;
        let mut blocked = None;

        if let Some(wall) = self.wall_x {
            let limit = wall - self.radius - SKIN;
            if desired_delta.x > 0.0 && target.x > limit {
                target.x = limit.max(pose.position.x);
                blocked = Some(SweepHit {
                    distance: target.x - pose.position.x,
                    normal: Vec3::NEG_X,
                    dynamic: false,
                });
            }
        }

        if let Ground::Floor { height } = self.ground {
            let limit = height + self.half_height(collider) + SKIN;
            if desired_delta.y < 0.0 && target.y < limit {
                target.y = limit.min(pose.position.y);
                blocked.get_or_insert(SweepHit {
                    distance: pose.position.y - target.y,
                    normal: Vec3::Y,
                    dynamic: false,
                });
            }
        }

        let achieved = target - pose.position;
        KinematicMove {
            pose: BodyPose { position: target, yaw: pose.yaw },
            blocked,
            remaining: desired_delta - achieved,
        }
    }

    fn set_collider_half_height(&mut self, collider: ColliderHandle, half_height: f32) {
        self.half_heights.push((collider, half_height));
    }

    fn set_collider_radius(&mut self, collider: ColliderHandle, radius: f32) {
        self.radii.push((collider, radius));
        self.radius = radius;
    }

    fn body_mode(&self, collider: ColliderHandle) -> Option<BodyMode> {
        self.modes.get(&collider).copied()
    }

    fn set_body_mode(&mut self, collider: ColliderHandle, mode: BodyMode) {
        self.modes.insert(collider, mode);
        self.mode_changes += 1;
    }
}

/// Camera registry recording everything the controller asks for.
#[derive(Debug, Clone, Default)]
pub struct FakeCamera {
    pub known: Vec<CameraId>,
    pub follows: HashMap<CameraId, FollowConfig>,
    pub poses: HashMap<CameraId, CameraPose>,
    pub active: Option<CameraId>,
}

impl FakeCamera {
    pub fn with_camera(id: CameraId) -> Self {
        Self {
            known: vec![id],
            ..Default::default()
        }
    }
}

impl CameraBackend for FakeCamera {
    fn set_camera_follow(&mut self, camera: CameraId, config: FollowConfig) {
        self.follows.insert(camera, config);
    }

    fn clear_camera_follow(&mut self, camera: CameraId) {
        self.follows.remove(&camera);
    }

    fn get_camera(&self, camera: CameraId) -> Option<CameraPose> {
        if !self.known.contains(&camera) {
            return None;
        }
        Some(self.poses.get(&camera).copied().unwrap_or_default())
    }

    fn set_active_camera(&mut self, camera: Option<CameraId>) {
        self.active = camera;
    }

    fn active_camera(&self) -> Option<CameraId> {
        self.active
    }

    fn set_camera_pose(&mut self, camera: CameraId, pose: CameraPose) {
        self.poses.insert(camera, pose);
    }
}

/// Input source returning whatever frame the test last stored.
#[derive(Debug, Clone, Default)]
pub struct FakeInput {
    pub frame: InputFrame,
}

impl InputSource for FakeInput {
    fn frame(&self) -> InputFrame {
        self.frame
    }
}

#[derive(Debug, Clone)]
pub struct FakeBody {
    pub pose: BodyPose,
    pub collider: ColliderHandle,
}

impl FakeBody {
    pub fn new(position: Vec3) -> Self {
        Self::with_collider(position, BODY.0)
    }

    pub fn with_collider(position: Vec3, collider: u32) -> Self {
        Self {
            pose: BodyPose::new(position),
            collider: ColliderHandle(collider),
        }
    }
}

impl ControlledBody for FakeBody {
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
