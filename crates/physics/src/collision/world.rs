//! Collision world containing all static and dynamic geometry.
//!
//! The collision world stores all collidable brushes and the capsule bodies
//! registered with it, and provides trace queries through the brushes.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use parry3d::math::{Isometry, Real, Vector};
use parry3d::query::{cast_shapes, contact, intersection_test, ShapeCastOptions};
use parry3d::shape::SharedShape;

use crate::backend::ColliderHandle;

use super::flags::ContentFlags;
use super::kinematic::BodyEntry;
use super::trace::{CapsuleShape, TraceResult};

/// Identifier of a brush inside one [`CollisionWorld`].
pub type BrushId = u32;

/// Gap kept between a traced capsule and whatever it stopped against.
const DEFAULT_SKIN: f32 = 0.005;

/// A piece of collision geometry in the world.
#[derive(Debug, Clone)]
pub struct CollisionBrush {
    /// Unique identifier for this brush.
    pub id: BrushId,
    /// The collision shape.
    pub shape: SharedShape,
    /// Position and orientation in world space.
    pub transform: Isometry<Real>,
    /// Content flags (solid, clip, trigger).
    pub contents: ContentFlags,
    /// Belongs to a dynamic object (crate, platform) rather than the level.
    pub dynamic: bool,
}

/// Where a capsule touches a brush.
#[derive(Debug, Clone, Copy)]
struct BrushContact {
    normal: Vec3,
    depth: f32,
    dynamic: bool,
}

/// First brush a swept capsule runs into.
#[derive(Debug, Clone, Copy)]
struct BrushImpact {
    /// Fraction of the sweep at first contact.
    fraction: f32,
    /// Outward surface normal, zero if the cast could not compute one.
    normal: Vec3,
    dynamic: bool,
}

/// The collision world containing all geometry and character bodies.
///
/// Brushes are boxes, axis-aligned or oriented. Bodies are vertical capsules
/// addressed by [`ColliderHandle`]; their positions are owned by the host and
/// passed in with every query.
#[derive(Debug)]
pub struct CollisionWorld {
    brushes: Vec<CollisionBrush>,
    next_id: BrushId,
    pub(super) bodies: HashMap<ColliderHandle, BodyEntry>,
    next_body: u32,
    skin: f32,
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionWorld {
    /// Create an empty collision world.
    pub fn new() -> Self {
        Self::with_skin(DEFAULT_SKIN)
    }

    pub fn with_skin(skin: f32) -> Self {
        Self {
            brushes: Vec::new(),
            next_id: 0,
            bodies: HashMap::new(),
            next_body: 1,
            skin: skin.max(0.0),
        }
    }

    #[inline]
    pub fn skin(&self) -> f32 {
        self.skin
    }

    // ========================================================================
    // Brushes
    // ========================================================================

    /// Add an axis-aligned box to the world.
    ///
    /// # Arguments
    ///
    /// * `center` - Center position of the box in world space
    /// * `half_extents` - Half-size in each axis (x, y, z)
    /// * `contents` - Content flags for collision filtering
    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3, contents: ContentFlags) -> BrushId {
        self.add_oriented_box(center, half_extents, Quat::IDENTITY, contents)
    }

    /// Add a rotated box, used for ramps and tilted walls.
    pub fn add_oriented_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
    ) -> BrushId {
        self.push_brush(center, half_extents, rotation, contents, false)
    }

    /// Add a solid box that belongs to a dynamic object.
    pub fn add_dynamic_box(&mut self, center: Vec3, half_extents: Vec3) -> BrushId {
        self.push_brush(center, half_extents, Quat::IDENTITY, ContentFlags::SOLID, true)
    }

    /// Move a brush to a new centre. Returns `false` for an unknown brush.
    pub fn set_brush_position(&mut self, id: BrushId, center: Vec3) -> bool {
        match self.brushes.iter_mut().find(|brush| brush.id == id) {
            Some(brush) => {
                brush.transform.translation.vector = Vector::new(center.x, center.y, center.z);
                true
            }
            None => false,
        }
    }

    pub fn remove_brush(&mut self, id: BrushId) -> bool {
        let before = self.brushes.len();
        self.brushes.retain(|brush| brush.id != id);
        self.brushes.len() != before
    }

    /// Remove all collision geometry. Registered bodies are kept.
    pub fn clear(&mut self) {
        self.brushes.clear();
    }

    /// Get the number of collision brushes.
    pub fn brush_count(&self) -> usize {
        self.brushes.len()
    }

    fn push_brush(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        contents: ContentFlags,
        dynamic: bool,
    ) -> BrushId {
        let id = self.next_id;
        self.next_id += 1;

        let shape = SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z);
        let axis = rotation.to_scaled_axis();
        let transform = Isometry::new(
            Vector::new(center.x, center.y, center.z),
            Vector::new(axis.x, axis.y, axis.z),
        );

        self.brushes.push(CollisionBrush {
            id,
            shape,
            transform,
            contents,
            dynamic,
        });

        id
    }

    // ========================================================================
    // Bodies
    // ========================================================================

    /// Register a capsule body and return its collider handle.
    pub fn register_body(&mut self, entry: BodyEntry) -> ColliderHandle {
        let handle = ColliderHandle(self.next_body);
        self.next_body += 1;
        self.bodies.insert(handle, entry);
        handle
    }

    pub fn body(&self, collider: ColliderHandle) -> Option<&BodyEntry> {
        self.bodies.get(&collider)
    }

    pub fn remove_body(&mut self, collider: ColliderHandle) -> Option<BodyEntry> {
        self.bodies.remove(&collider)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Trace a capsule through the world.
    ///
    /// This is the primary collision query. It sweeps the capsule centre
    /// from `start` to `end` and returns information about what was hit.
    pub fn trace(&self, start: Vec3, end: Vec3, shape: CapsuleShape, mask: ContentFlags) -> TraceResult {
        let delta = end - start;
        let distance = delta.length();
        let started_in_solid = self.point_in_solid(start, shape, mask);

        // No movement - just check if position is valid
        if distance < 0.0001 {
            return if started_in_solid {
                self.solid_result(start, shape, mask, Vec3::ZERO)
            } else {
                TraceResult::no_hit(start)
            };
        }

        let direction = delta / distance;

        if started_in_solid {
            return if self.point_in_solid(end, shape, mask) {
                self.solid_result(start, shape, mask, direction)
            } else {
                TraceResult::no_hit(end)
            };
        }

        let Some(impact) = self.first_impact(start, delta, shape, mask) else {
            return TraceResult::no_hit(end);
        };

        let travelled = (impact.fraction * distance - self.skin).max(0.0);
        let end_position = start + direction * travelled;

        let normal = Some(impact.normal)
            .filter(|n| n.dot(direction) < 0.0)
            .or_else(|| {
                self.deepest_contact(start + delta * impact.fraction, shape, mask)
                    .map(|c| c.normal)
                    .filter(|n| n.dot(direction) < 0.0)
            })
            .unwrap_or_else(|| fallback_normal(direction));

        TraceResult {
            fraction: impact.fraction,
            end_position,
            hit_normal: Some(normal),
            hit_dynamic: impact.dynamic,
            all_solid: false,
        }
    }

    /// Check if a capsule centred at `position` overlaps solid geometry.
    pub fn point_in_solid(&self, position: Vec3, shape: CapsuleShape, mask: ContentFlags) -> bool {
        let test_shape = shape.to_parry();
        let test_transform = Isometry::translation(position.x, position.y, position.z);

        self.brushes
            .iter()
            .filter(|brush| mask.intersects(brush.contents))
            .any(|brush| {
                intersection_test(&test_transform, test_shape.as_ref(), &brush.transform, brush.shape.as_ref())
                    .unwrap_or(false)
            })
    }

    /// Resolve collision by pushing the capsule out of solid geometry.
    ///
    /// Returns the corrected centre position.
    pub fn resolve_penetration(&self, position: Vec3, shape: CapsuleShape, mask: ContentFlags) -> Vec3 {
        let mut resolved = position;

        for _ in 0..4 {
            let contacts: Vec<_> = self
                .contacts(resolved, shape, mask)
                .into_iter()
                .filter(|c| c.depth > 0.0)
                .collect();
            if contacts.is_empty() {
                break;
            }
            let correction: Vec3 = contacts
                .iter()
                .map(|c| c.normal * (c.depth + self.skin))
                .sum();
            resolved += correction;
        }

        resolved
    }

    // ========================================================================
    // Private helpers
    // ========================================================================

    fn contacts(&self, position: Vec3, shape: CapsuleShape, mask: ContentFlags) -> Vec<BrushContact> {
        let test_shape = shape.to_parry();
        let test_transform = Isometry::translation(position.x, position.y, position.z);

        self.brushes
            .iter()
            .filter(|brush| mask.intersects(brush.contents))
            .filter_map(|brush| {
                let hit = contact(
                    &test_transform,
                    test_shape.as_ref(),
                    &brush.transform,
                    brush.shape.as_ref(),
                    0.0,
                )
                .ok()
                .flatten()?;

                // normal2 points out of the brush, toward the capsule
                let normal = Vec3::new(hit.normal2.x, hit.normal2.y, hit.normal2.z);
                Some(BrushContact {
                    normal: normal.normalize_or_zero(),
                    depth: (-hit.dist).max(0.0),
                    dynamic: brush.dynamic,
                })
            })
            .collect()
    }

    /// Earliest time of impact of the capsule swept from `start` by `delta`.
    fn first_impact(&self, start: Vec3, delta: Vec3, shape: CapsuleShape, mask: ContentFlags) -> Option<BrushImpact> {
        let test_shape = shape.to_parry();
        let test_transform = Isometry::translation(start.x, start.y, start.z);
        let velocity = Vector::new(delta.x, delta.y, delta.z);
        let at_rest = Vector::<Real>::zeros();

        self.brushes
            .iter()
            .filter(|brush| mask.intersects(brush.contents))
            .filter_map(|brush| {
                let hit = cast_shapes(
                    &test_transform,
                    &velocity,
                    test_shape.as_ref(),
                    &brush.transform,
                    &at_rest,
                    brush.shape.as_ref(),
                    ShapeCastOptions::with_max_time_of_impact(1.0),
                )
                .ok()
                .flatten()?;

                // normal1 is in the capsule's frame, which is never rotated
                let normal = -Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z);
                Some(BrushImpact {
                    fraction: hit.time_of_impact.clamp(0.0, 1.0),
                    normal: normal.normalize_or_zero(),
                    dynamic: brush.dynamic,
                })
            })
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }

    fn deepest_contact(&self, position: Vec3, shape: CapsuleShape, mask: ContentFlags) -> Option<BrushContact> {
        self.contacts(position, shape, mask)
            .into_iter()
            .max_by(|a, b| a.depth.total_cmp(&b.depth))
    }

    fn solid_result(&self, start: Vec3, shape: CapsuleShape, mask: ContentFlags, direction: Vec3) -> TraceResult {
        let touching = self.deepest_contact(start, shape, mask);
        TraceResult {
            fraction: 0.0,
            end_position: start,
            hit_normal: Some(touching.map_or_else(|| fallback_normal(direction), |c| c.normal)),
            hit_dynamic: touching.is_some_and(|c| c.dynamic),
            all_solid: true,
        }
    }
}

/// Opposite of the movement direction, projected to horizontal when possible.
fn fallback_normal(direction: Vec3) -> Vec3 {
    let horizontal = Vec3::new(-direction.x, 0.0, -direction.z);
    if horizontal.length_squared() > 0.1 {
        horizontal.normalize()
    } else if direction.y > 0.0 {
        Vec3::NEG_Y
    } else {
        Vec3::Y
    }
}

// ============================================================================
// Tests
// ============================================================================
