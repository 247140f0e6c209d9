//! Animation clip selection.
//!
//! The controller does not blend animations. It maps its locomotion phase to
//! an optional clip name that the host plays; a missing name means "keep
//! whatever is playing" and is not an error.

use serde::{Deserialize, Serialize};

/// Named clip per locomotion phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationClips {
    pub idle: Option<String>,
    pub walk: Option<String>,
    pub sprint: Option<String>,
    pub jump: Option<String>,
    pub fall: Option<String>,
    pub crouch: Option<String>,
    pub slide: Option<String>,
}

/// Coarse locomotion phase used to pick a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocomotionPhase {
    Idle,
    Walk,
    Sprint,
    Jump,
    Fall,
    Crouch,
    Slide,
}

impl AnimationClips {
    /// Clip for a phase, if one is configured.
    pub fn clip(&self, phase: LocomotionPhase) -> Option<&str> {
        let clip = match phase {
            LocomotionPhase::Idle => &self.idle,
            LocomotionPhase::Walk => &self.walk,
            LocomotionPhase::Sprint => &self.sprint,
            LocomotionPhase::Jump => &self.jump,
            LocomotionPhase::Fall => &self.fall,
            LocomotionPhase::Crouch => &self.crouch,
            LocomotionPhase::Slide => &self.slide,
        };
        clip.as_deref()
    }

    /// Standard clip names for every phase (`"idle"`, `"walk"`, ...).
    pub fn standard() -> Self {
        Self {
            idle: Some("idle".into()),
            walk: Some("walk".into()),
            sprint: Some("sprint".into()),
            jump: Some("jump".into()),
            fall: Some("fall".into()),
            crouch: Some("crouch".into()),
            slide: Some("slide".into()),
        }
    }
}
