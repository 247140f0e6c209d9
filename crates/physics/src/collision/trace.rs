//! Trace results and shapes for collision queries.

use glam::Vec3;
use parry3d::shape::SharedShape;
use serde::{Deserialize, Serialize};

/// Result of a capsule trace through the world.
///
/// Traces sweep a shape from a start position to an end position and
/// report what was hit along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    /// How far along the trace path we got before hitting something.
    ///
    /// - `1.0` = traveled the full distance (no collision)
    /// - `0.0` = hit something immediately at start
    /// - `0.5` = hit something halfway through
    pub fraction: f32,

    /// Final capsule-centre position after the trace.
    ///
    /// If `fraction < 1.0`, this is backed off from the impact point by the
    /// world's skin width.
    pub end_position: Vec3,

    /// Surface normal at the impact point.
    ///
    /// Points away from the surface that was hit. `None` if no collision
    /// occurred (`fraction == 1.0`).
    pub hit_normal: Option<Vec3>,

    /// The brush that was hit belongs to a dynamic object.
    pub hit_dynamic: bool,

    /// Whether the trace started and ended inside solid geometry, so the
    /// capsule could not move at all.
    pub all_solid: bool,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO)
    }
}

impl TraceResult {
    /// Create a trace result indicating no collision occurred.
    pub fn no_hit(end_position: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position,
            hit_normal: None,
            hit_dynamic: false,
            all_solid: false,
        }
    }

    /// Check if this trace hit something.
    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }

    /// Get the hit normal, defaulting to up if none.
    #[inline]
    pub fn normal_or_up(&self) -> Vec3 {
        self.hit_normal.unwrap_or(Vec3::Y)
    }
}

/// A vertical capsule (pill shape), centred on the trace origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapsuleShape {
    /// Radius of the capsule cylinder and end caps.
    pub radius: f32,
    /// Half of the total height, caps included.
    pub half_height: f32,
}

impl CapsuleShape {
    /// 1.8m tall, 0.8m wide.
    pub const STANDING: Self = Self::new(0.4, 0.9);

    pub const fn new(radius: f32, half_height: f32) -> Self {
        Self { radius, half_height }
    }

    /// Distance from the centre to the lowest point.
    #[inline]
    pub fn bottom_offset(&self) -> f32 {
        self.half_height.max(self.radius)
    }

    /// Local-space bounding box.
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        let half = Vec3::new(self.radius, self.bottom_offset(), self.radius);
        (-half, half)
    }

    /// Parry capsule. Parry measures the half-height of the cylinder part only.
    pub(crate) fn to_parry(self) -> SharedShape {
        let segment_half_height = (self.half_height - self.radius).max(0.0);
        SharedShape::capsule_y(segment_half_height, self.radius)
    }
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self::STANDING
    }
}
