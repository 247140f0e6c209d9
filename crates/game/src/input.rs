//! Player input handling.
//!
//! This module converts raw input (keyboard and mouse) into the per-frame
//! [`InputFrame`] snapshot the character controller consumes.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use stride_physics::{ButtonState, InputFrame, InputSource};

/// Raw player input for a single frame.
///
/// This is the input format received from the client input system: which
/// keys are down right now, with no notion of edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInput {
    /// Movement keys pressed.
    pub movement: MovementInput,

    /// Mouse delta this frame (pixels).
    pub mouse_delta: (f32, f32),

    /// Action buttons held.
    pub actions: ActionInput,

    /// Frame number this input was generated.
    pub frame: u32,
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Action button states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInput {
    pub jump: bool,
    pub crouch: bool,
    pub sprint: bool,
}

impl RawInput {
    /// Forward and strafe axes, with diagonal movement normalized.
    pub fn axes(&self) -> (f32, f32) {
        let mut forward: f32 = 0.0;
        let mut right: f32 = 0.0;

        if self.movement.forward {
            forward += 1.0;
        }
        if self.movement.backward {
            forward -= 1.0;
        }
        if self.movement.right {
            right += 1.0;
        }
        if self.movement.left {
            right -= 1.0;
        }

        // Normalize diagonal movement
        let magnitude: f32 = (forward * forward + right * right).sqrt();
        if magnitude > 1.0 {
            forward /= magnitude;
            right /= magnitude;
        }

        (forward, right)
    }

    /// Check if any movement input is active.
    pub fn has_movement(&self) -> bool {
        self.movement.forward || self.movement.backward || self.movement.left || self.movement.right
    }
}

/// Turns successive [`RawInput`] snapshots into edge-detected frames.
///
/// The tracker is the input collaborator handed to character controllers:
/// the host pushes raw input once per tick, then every controller reads the
/// same frame.
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    previous: ActionInput,
    current: InputFrame,
    frames: u64,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's raw input and return the resulting frame.
    pub fn push(&mut self, raw: &RawInput) -> InputFrame {
        let (forward, right) = raw.axes();
        let actions = raw.actions;

        self.current = InputFrame {
            forward,
            right,
            look: Vec2::new(raw.mouse_delta.0, raw.mouse_delta.1),
            jump: ButtonState::from_edges(self.previous.jump, actions.jump),
            crouch: ButtonState::from_edges(self.previous.crouch, actions.crouch),
            sprint: ButtonState::from_edges(self.previous.sprint, actions.sprint),
        };
        self.previous = actions;
        self.frames += 1;
        self.current
    }

    /// Forget held buttons, e.g. after the window loses focus.
    pub fn reset(&mut self) {
        *self = Self {
            frames: self.frames,
            ..Self::default()
        };
    }

    /// Number of frames pushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl InputSource for InputTracker {
    fn frame(&self) -> InputFrame {
        self.current
    }
}
