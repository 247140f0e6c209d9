//! Camera registry used as the controller's camera collaborator.

use std::collections::HashMap;

use glam::Mat4;
use stride_physics::{CameraBackend, CameraId, CameraPose, FollowConfig};

/// One camera owned by the rig.
#[derive(Debug, Clone)]
pub struct RigCamera {
    pub pose: CameraPose,

    /// Follow binding set by a character controller.
    pub follow: Option<FollowConfig>,

    /// Field of view in degrees.
    pub fov: f32,

    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for RigCamera {
    fn default() -> Self {
        Self {
            pose: CameraPose::default(),
            follow: None,
            fov: 90.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl RigCamera {
    /// Get the combined view-projection matrix.
    pub fn view_projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, 0.1, 1000.0) * self.pose.view_matrix()
    }
}

/// All cameras in the scene plus which one renders to the viewport.
#[derive(Debug, Default)]
pub struct CameraRig {
    cameras: HashMap<CameraId, RigCamera>,
    active: Option<CameraId>,
    next_id: u32,
}

impl CameraRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera and return its id.
    pub fn add_camera(&mut self) -> CameraId {
        let id = CameraId(self.next_id);
        self.next_id += 1;
        self.cameras.insert(id, RigCamera::default());
        id
    }

    pub fn remove_camera(&mut self, id: CameraId) -> Option<RigCamera> {
        if self.active == Some(id) {
            self.active = None;
        }
        self.cameras.remove(&id)
    }

    pub fn camera(&self, id: CameraId) -> Option<&RigCamera> {
        self.cameras.get(&id)
    }

    /// Camera bound to the viewport, if any.
    pub fn active_camera(&self) -> Option<CameraId> {
        self.active
    }

    pub fn active_pose(&self) -> Option<CameraPose> {
        self.active.and_then(|id| self.cameras.get(&id)).map(|camera| camera.pose)
    }
}

impl CameraBackend for CameraRig {
    fn set_camera_follow(&mut self, camera: CameraId, config: FollowConfig) {
        match self.cameras.get_mut(&camera) {
            Some(entry) => entry.follow = Some(config),
            None => log::warn!("set_camera_follow: unknown camera {:?}", camera),
        }
    }

    fn clear_camera_follow(&mut self, camera: CameraId) {
        if let Some(entry) = self.cameras.get_mut(&camera) {
            entry.follow = None;
        }
    }

    fn get_camera(&self, camera: CameraId) -> Option<CameraPose> {
        self.cameras.get(&camera).map(|entry| entry.pose)
    }

    fn set_active_camera(&mut self, camera: Option<CameraId>) {
        match camera {
            Some(id) if !self.cameras.contains_key(&id) => {
                log::warn!("set_active_camera: unknown camera {:?}", id);
            }
            _ => self.active = camera,
        }
    }

    fn active_camera(&self) -> Option<CameraId> {
        self.active
    }

    fn set_camera_pose(&mut self, camera: CameraId, pose: CameraPose) {
        if let Some(entry) = self.cameras.get_mut(&camera) {
            entry.pose = pose;
        }
    }
}
