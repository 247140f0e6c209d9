//! Level construction.

use std::cell::RefCell;
use std::f32::consts::PI;
use std::rc::Rc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use stride_physics::{BrushId, CollisionWorld, ContentFlags};

/// A game level containing collision geometry and spawn points.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics, shared with the character controllers.
    pub collision: Rc<RefCell<CollisionWorld>>,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,

    /// Named places of interest, used by scripted runs and tests.
    pub landmarks: Vec<(Landmark, Vec3)>,

    /// Dynamic brushes (crates, platforms) the host may move.
    pub dynamic_brushes: Vec<BrushId>,
}

/// A spawn point for actors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Position in world space (feet).
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

/// Features of the test arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Landmark {
    /// Foot of a 20 degree ramp rising toward +X.
    WalkableRamp,
    /// Foot of a 50 degree ramp rising toward +X.
    SlickRamp,
    /// Foot of a 75 degree slab rising toward +X.
    SteepWall,
    /// In front of a flight of 0.2m steps climbing toward +X.
    Stairs,
    /// In front of a low dynamic crate toward +X.
    Crate,
    /// Under the middle of a 1.3m high ceiling.
    LowCeiling,
}

impl Level {
    /// Height of each stair step.
    pub const STEP_HEIGHT: f32 = 0.2;

    /// Number of stair steps.
    pub const STEP_COUNT: usize = 5;

    /// Clearance under the low ceiling.
    pub const CEILING_CLEARANCE: f32 = 1.3;

    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: Rc::new(RefCell::new(CollisionWorld::new())),
            spawn_points: Vec::new(),
            landmarks: Vec::new(),
            dynamic_brushes: Vec::new(),
        }
    }

    /// Create the locomotion test arena.
    ///
    /// Every feature sits on its own lane along +X so a scripted run can
    /// walk straight into it from the matching landmark.
    pub fn test_arena() -> Self {
        let mut level = Self::new("test_arena", "Locomotion Test Arena");
        let mut world = CollisionWorld::new();

        // Floor
        world.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(50.0, 0.5, 50.0),
            ContentFlags::SOLID,
        );

        // Walls
        let wall_height = 5.0;
        let wall_thickness = 0.5;
        let arena_size = 50.0;

        for (center, half_extents) in [
            (Vec3::new(0.0, wall_height / 2.0, -arena_size), Vec3::new(arena_size, wall_height / 2.0, wall_thickness)),
            (Vec3::new(0.0, wall_height / 2.0, arena_size), Vec3::new(arena_size, wall_height / 2.0, wall_thickness)),
            (Vec3::new(arena_size, wall_height / 2.0, 0.0), Vec3::new(wall_thickness, wall_height / 2.0, arena_size)),
            (Vec3::new(-arena_size, wall_height / 2.0, 0.0), Vec3::new(wall_thickness, wall_height / 2.0, arena_size)),
        ] {
            world.add_box(center, half_extents, ContentFlags::SOLID);
        }

        // Ramps, foot at x=4 on their lane
        for (landmark, z, degrees) in [
            (Landmark::WalkableRamp, -20.0, 20.0),
            (Landmark::SlickRamp, -12.0, 50.0),
            (Landmark::SteepWall, -4.0, 75.0),
        ] {
            add_ramp(&mut world, z, degrees);
            level.landmarks.push((landmark, Vec3::new(2.0, 0.0, z)));
        }

        // Stairs
        let stairs_z = 4.0;
        for i in 0..Self::STEP_COUNT {
            let height = Self::STEP_HEIGHT * (i + 1) as f32;
            world.add_box(
                Vec3::new(4.2 + 0.4 * i as f32, height / 2.0, stairs_z),
                Vec3::new(0.2, height / 2.0, 1.5),
                ContentFlags::SOLID,
            );
        }
        level.landmarks.push((Landmark::Stairs, Vec3::new(2.0, 0.0, stairs_z)));

        // Low dynamic crate
        let crate_z = 12.0;
        let crate_id = world.add_dynamic_box(Vec3::new(4.5, 0.1, crate_z), Vec3::new(0.5, 0.1, 1.0));
        level.dynamic_brushes.push(crate_id);
        level.landmarks.push((Landmark::Crate, Vec3::new(2.0, 0.0, crate_z)));

        // Low ceiling slab
        let ceiling = Vec3::new(6.0, Self::CEILING_CLEARANCE + 0.25, 20.0);
        world.add_box(ceiling, Vec3::new(3.0, 0.25, 3.0), ContentFlags::SOLID);
        level.landmarks.push((Landmark::LowCeiling, Vec3::new(ceiling.x, 0.0, ceiling.z)));

        // Spawn points
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(-20.0, 0.0, 30.0),
            facing: 0.0,
        });
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(20.0, 0.0, 30.0),
            facing: PI,
        });

        level.collision = Rc::new(RefCell::new(world));
        level
    }

    /// Position of a landmark, if this level has it.
    pub fn landmark(&self, which: Landmark) -> Option<Vec3> {
        self.landmarks
            .iter()
            .find(|(landmark, _)| *landmark == which)
            .map(|(_, position)| *position)
    }

    /// Get a player spawn point.
    pub fn get_player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Get the number of player spawn points.
    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points.len()
    }
}

/// Oriented slab whose top face rises toward +X at `degrees`, with its foot
/// on the floor at x=4 on lane `z`.
fn add_ramp(world: &mut CollisionWorld, z: f32, degrees: f32) {
    let angle = degrees.to_radians();
    let half_extents = Vec3::new(3.0, 0.25, 1.5);
    let (sin, cos) = angle.sin_cos();

    // Put the low end of the top face at (4, 0)
    let center = Vec3::new(
        4.0 + half_extents.x * cos + half_extents.y * sin,
        half_extents.x * sin - half_extents.y * cos,
        z,
    );
    world.add_oriented_box(center, half_extents, Quat::from_rotation_z(angle), ContentFlags::SOLID);
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_physics::CapsuleShape;

    fn surface_angle_below(level: &Level, x: f32, z: f32) -> f32 {
        let result = level.collision.borrow().trace(
            Vec3::new(x, 8.0, z),
            Vec3::new(x, -1.0, z),
            CapsuleShape::STANDING,
            ContentFlags::MASK_CHARACTER_SOLID,
        );
        assert!(result.hit_something());
        result.normal_or_up().angle_between(Vec3::Y).to_degrees()
    }

    #[test]
    fn test_level_creation() {
        let level = Level::new("test", "Test Level");
        assert_eq!(level.id, "test");
        assert_eq!(level.collision.borrow().brush_count(), 0);
    }

    #[test]
    fn test_test_arena() {
        let level = Level::test_arena();
        assert!(level.collision.borrow().brush_count() > 0);
        assert!(level.player_spawn_count() >= 2);
        assert_eq!(level.dynamic_brushes.len(), 1);
        for landmark in [
            Landmark::WalkableRamp,
            Landmark::SlickRamp,
            Landmark::SteepWall,
            Landmark::Stairs,
            Landmark::Crate,
            Landmark::LowCeiling,
        ] {
            assert!(level.landmark(landmark).is_some(), "missing {:?}", landmark);
        }
    }

    #[test]
    fn test_ramp_angles() {
        let level = Level::test_arena();
        for (landmark, degrees) in [
            (Landmark::WalkableRamp, 20.0),
            (Landmark::SlickRamp, 50.0),
            (Landmark::SteepWall, 75.0),
        ] {
            let foot = level.landmark(landmark).unwrap_or_default();
            // Point a little way up the ramp, clear of its foot and crest
            let angle = surface_angle_below(&level, foot.x + 3.0, foot.z);
            assert!((angle - degrees).abs() < 1.0, "{:?}: {} degrees", landmark, angle);
        }
    }

    #[test]
    fn test_ramp_foot_meets_floor() {
        let level = Level::test_arena();
        let foot = level.landmark(Landmark::WalkableRamp).unwrap_or_default();
        // Just before the foot the floor is flat
        let angle = surface_angle_below(&level, foot.x + 1.0, foot.z);
        assert!(angle < 1.0);
    }

    #[test]
    fn test_stair_heights() {
        let level = Level::test_arena();
        let stairs = level.landmark(Landmark::Stairs).unwrap_or_default();

        for i in 0..Level::STEP_COUNT {
            let x = 4.2 + 0.4 * i as f32;
            let probe = level.collision.borrow().trace(
                Vec3::new(x, 5.0, stairs.z),
                Vec3::new(x, -1.0, stairs.z),
                CapsuleShape::new(0.1, 0.1),
                ContentFlags::SOLID,
            );
            let top = probe.end_position.y - 0.1;
            let expected = Level::STEP_HEIGHT * (i + 1) as f32;
            assert!((top - expected).abs() < 0.01, "step {}: {}", i, top);
        }
    }
}
