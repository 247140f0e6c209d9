//! Kinematic capsule bodies and the [`PhysicsBackend`] implementation.
//!
//! Moves use the Quake slide algorithm: trace the remaining displacement,
//! stop at the first surface, clip what is left against every plane touched
//! so far and repeat.

use glam::Vec3;

use crate::backend::{BodyMode, BodyPose, ColliderHandle, KinematicMove, PhysicsBackend, SweepHit};

use super::flags::ContentFlags;
use super::trace::CapsuleShape;
use super::world::CollisionWorld;

/// Maximum number of clip planes to consider per move.
const MAX_CLIP_PLANES: usize = 5;

/// Slightly over 1 so a clipped move does not re-enter the plane.
const OVERBOUNCE: f32 = 1.001;

/// Moves shorter than this are treated as done.
const MIN_MOVE: f32 = 1e-5;

/// A capsule registered with the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyEntry {
    pub mode: BodyMode,
    pub shape: CapsuleShape,
    /// Content this body collides with.
    pub mask: ContentFlags,
}

impl BodyEntry {
    pub fn new(shape: CapsuleShape, mode: BodyMode) -> Self {
        Self {
            mode,
            shape,
            mask: ContentFlags::MASK_CHARACTER_SOLID,
        }
    }
}

impl PhysicsBackend for CollisionWorld {
    fn sweep_capsule(
        &self,
        pose: BodyPose,
        radius: f32,
        half_height: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<SweepHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO || max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }

        let shape = CapsuleShape::new(radius, half_height);
        let start = pose.position;
        let trace = self.trace(
            start,
            start + direction * max_distance,
            shape,
            ContentFlags::MASK_CHARACTER_SOLID,
        );

        if !trace.hit_something() {
            return None;
        }

        Some(SweepHit {
            distance: trace.fraction * max_distance,
            normal: trace.normal_or_up(),
            dynamic: trace.hit_dynamic,
        })
    }

    fn move_kinematic_body(
        &mut self,
        collider: ColliderHandle,
        pose: BodyPose,
        desired_delta: Vec3,
    ) -> KinematicMove {
        let Some(entry) = self.body(collider).copied() else {
            log::warn!("move_kinematic_body: unknown collider {:?}", collider);
            return KinematicMove {
                pose,
                blocked: None,
                remaining: desired_delta,
            };
        };

        if entry.mode == BodyMode::Static {
            return KinematicMove {
                pose,
                blocked: None,
                remaining: desired_delta,
            };
        }

        let mut position = pose.position;
        if self.point_in_solid(position, entry.shape, entry.mask) {
            position = self.resolve_penetration(position, entry.shape, entry.mask);
            log::debug!("depenetrated {:?} by {:?}", collider, position - pose.position);
        }

        let mut remaining = desired_delta;
        let mut planes: Vec<Vec3> = Vec::with_capacity(MAX_CLIP_PLANES);
        let mut blocked = None;

        for _ in 0..MAX_CLIP_PLANES {
            let length = remaining.length();
            if length < MIN_MOVE {
                break;
            }

            let trace = self.trace(position, position + remaining, entry.shape, entry.mask);
            position = trace.end_position;

            if !trace.hit_something() {
                break;
            }

            let normal = trace.normal_or_up();
            blocked.get_or_insert(SweepHit {
                distance: trace.fraction * length,
                normal,
                dynamic: trace.hit_dynamic,
            });

            if trace.all_solid {
                break;
            }

            planes.push(normal);
            remaining = clip_to_planes(remaining * (1.0 - trace.fraction), &planes);
        }

        let achieved = position - pose.position;
        KinematicMove {
            pose: BodyPose {
                position,
                yaw: pose.yaw,
            },
            blocked,
            remaining: desired_delta - achieved,
        }
    }

    fn set_collider_half_height(&mut self, collider: ColliderHandle, half_height: f32) {
        match self.bodies.get_mut(&collider) {
            Some(entry) => entry.shape.half_height = half_height,
            None => log::warn!("set_collider_half_height: unknown collider {:?}", collider),
        }
    }

    fn set_collider_radius(&mut self, collider: ColliderHandle, radius: f32) {
        match self.bodies.get_mut(&collider) {
            Some(entry) => entry.shape.radius = radius,
            None => log::warn!("set_collider_radius: unknown collider {:?}", collider),
        }
    }

    fn body_mode(&self, collider: ColliderHandle) -> Option<BodyMode> {
        self.bodies.get(&collider).map(|entry| entry.mode)
    }

    fn set_body_mode(&mut self, collider: ColliderHandle, mode: BodyMode) {
        if let Some(entry) = self.bodies.get_mut(&collider) {
            entry.mode = mode;
        }
    }
}

/// Clip a displacement to slide along a surface.
///
/// Removes the component going into the plane, scaled by `overbounce`.
#[inline]
fn clip_velocity(delta: Vec3, normal: Vec3, overbounce: f32) -> Vec3 {
    let backoff = delta.dot(normal);
    let backoff = if backoff < 0.0 {
        backoff * overbounce
    } else {
        backoff / overbounce
    };
    delta - normal * backoff
}

/// Clip against the first plane whose result respects all the others, fall
/// back to the crease of the first two.
fn clip_to_planes(delta: Vec3, planes: &[Vec3]) -> Vec3 {
    for (i, &plane) in planes.iter().enumerate() {
        let clipped = clip_velocity(delta, plane, OVERBOUNCE);
        let respects_others = planes
            .iter()
            .enumerate()
            .all(|(j, &other)| j == i || clipped.dot(other) >= -0.01);
        if respects_others {
            return clipped;
        }
    }

    // Two planes: slide along the crease
    if let [first, second, ..] = planes {
        let crease = first.cross(*second).normalize_or_zero();
        let along = crease * delta.dot(crease);
        if planes.iter().all(|plane| along.dot(*plane) >= -0.01) {
            return along;
        }
    }

    Vec3::ZERO
}
