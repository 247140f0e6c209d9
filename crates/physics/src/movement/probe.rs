//! Ground and step probing.
//!
//! Every query goes through the [`PhysicsBackend`] with capsule-centre
//! poses. The probe never mutates locomotion state; it reports what it found
//! and the controller decides what to do with it.

use glam::Vec3;

use crate::backend::{BodyPose, ColliderHandle, PhysicsBackend, SweepHit};

use super::config::LocomotionConfig;
use super::state::{Contact, SurfaceKind};

/// Ground hits are ignored while rising faster than this (just jumped).
const JUMP_IGNORE_SPEED: f32 = 0.1;

/// Extra probe reach so a body resting exactly at skin distance still hits.
const GROUND_EPSILON: f32 = 0.01;

/// Smallest rise or displacement worth acting on.
const MIN_STEP_MOVE: f32 = 0.001;

/// Result of a downward ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    pub contact: Contact,
    /// `None` while airborne.
    pub surface: Option<SurfaceKind>,
    /// Hit normal, or world up when nothing supports the body.
    pub normal: Vec3,
    /// Angle between the hit normal and world up (radians), 0 when airborne.
    pub slope_angle: f32,
    /// Downward correction that puts the capsule at skin distance from the
    /// ground. Zero when airborne.
    pub snap_distance: f32,
    /// The supporting collider belongs to a dynamic body.
    pub dynamic: bool,
}

impl GroundProbe {
    pub fn airborne() -> Self {
        Self {
            contact: Contact::Airborne,
            surface: None,
            normal: Vec3::Y,
            slope_angle: 0.0,
            snap_distance: 0.0,
            dynamic: false,
        }
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        self.contact == Contact::Grounded
    }
}

/// Angle between a surface normal and world up.
#[inline]
pub fn slope_angle(normal: Vec3) -> f32 {
    normal.normalize_or_zero().y.clamp(-1.0, 1.0).acos()
}

/// Classify a slope angle. `None` means too steep to stand on.
pub fn classify_slope(angle: f32, config: &LocomotionConfig) -> Option<SurfaceKind> {
    if angle <= config.max_slope_climb_angle {
        Some(SurfaceKind::Walkable)
    } else if angle < config.slide_threshold {
        Some(SurfaceKind::Slick)
    } else {
        None
    }
}

/// Whether a hit normal counts as walkable ground rather than an obstacle.
#[inline]
pub fn is_walkable(normal: Vec3, config: &LocomotionConfig) -> bool {
    slope_angle(normal) <= config.max_slope_climb_angle
}

/// Sweep the capsule down and classify what supports it.
///
/// `center` is the capsule-centre pose, `vertical_velocity` the velocity
/// before this tick's transitions.
pub fn probe_ground(
    physics: &dyn PhysicsBackend,
    center: BodyPose,
    half_height: f32,
    vertical_velocity: f32,
    config: &LocomotionConfig,
) -> GroundProbe {
    if vertical_velocity > JUMP_IGNORE_SPEED {
        return GroundProbe::airborne();
    }

    let reach = config.snap_to_ground_distance + config.offset + GROUND_EPSILON;
    let Some(hit) = physics.sweep_capsule(center, config.capsule_radius, half_height, Vec3::NEG_Y, reach)
    else {
        return GroundProbe::airborne();
    };

    let angle = slope_angle(hit.normal);
    match classify_slope(angle, config) {
        Some(surface) => GroundProbe {
            contact: Contact::Grounded,
            surface: Some(surface),
            normal: hit.normal.normalize_or_zero(),
            slope_angle: angle,
            snap_distance: (hit.distance - config.offset).max(0.0),
            dynamic: hit.dynamic,
        },
        None => GroundProbe {
            slope_angle: angle,
            ..GroundProbe::airborne()
        },
    }
}

/// Try to climb the obstacle that blocked a horizontal move.
///
/// Raises the capsule by up to `auto_step_max_height`, checks that
/// `auto_step_min_width` of free space lies past the obstacle, moves the
/// blocked remainder forward and settles onto a walkable landing. Returns the
/// stepped capsule-centre pose, or `None` when the obstacle does not qualify.
pub fn try_step(
    physics: &mut dyn PhysicsBackend,
    collider: ColliderHandle,
    center: BodyPose,
    half_height: f32,
    blocked: &SweepHit,
    remaining: Vec3,
    config: &LocomotionConfig,
) -> Option<BodyPose> {
    if config.auto_step_max_height <= MIN_STEP_MOVE {
        return None;
    }
    if blocked.dynamic && !config.auto_step_include_dynamic {
        return None;
    }
    // Walkable hits are slopes, not steps; ceilings are never steps
    if is_walkable(blocked.normal, config) || blocked.normal.y < -MIN_STEP_MOVE {
        return None;
    }

    let horizontal = Vec3::new(remaining.x, 0.0, remaining.z);
    let advance = horizontal.length();
    if advance <= MIN_STEP_MOVE {
        return None;
    }
    let direction = horizontal / advance;
    let radius = config.capsule_radius;

    // Up
    let raised = physics.move_kinematic_body(collider, center, Vec3::new(0.0, config.auto_step_max_height, 0.0));
    let rise = raised.pose.position.y - center.position.y;
    if rise <= MIN_STEP_MOVE {
        return None;
    }

    // Width check at the raised height
    let clearance = advance + config.auto_step_min_width;
    if physics
        .sweep_capsule(raised.pose, radius, half_height, direction, clearance)
        .is_some()
    {
        return None;
    }

    // Landing is measured with the capsule fully over the step
    let probe = raised.pose.translated(direction * clearance);
    let landing = physics.sweep_capsule(
        probe,
        radius,
        half_height,
        Vec3::NEG_Y,
        rise + config.offset + GROUND_EPSILON,
    )?;
    if !is_walkable(landing.normal, config) {
        return None;
    }
    if landing.dynamic && !config.auto_step_include_dynamic {
        return None;
    }
    let drop = (landing.distance - config.offset).max(0.0);
    if rise - drop <= MIN_STEP_MOVE {
        return None;
    }

    // Forward
    let forward = physics.move_kinematic_body(collider, raised.pose, horizontal);
    if forward.blocked.is_some() {
        return None;
    }

    Some(forward.pose.translated(Vec3::new(0.0, -drop, 0.0)))
}

/// Whether the capsule can grow from `current_half_height` to
/// `target_half_height` with its bottom kept in place.
pub fn has_headroom(
    physics: &dyn PhysicsBackend,
    center: BodyPose,
    current_half_height: f32,
    target_half_height: f32,
    config: &LocomotionConfig,
) -> bool {
    let growth = (target_half_height - current_half_height) * 2.0;
    if growth <= 0.0 {
        return true;
    }
    physics
        .sweep_capsule(center, config.capsule_radius, current_half_height, Vec3::Y, growth + config.offset)
        .is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BodyMode;
    use crate::collision::{BodyEntry, CapsuleShape, CollisionWorld, ContentFlags};
    use crate::test_support::FakePhysics;

    fn slope_normal(degrees: f32) -> Vec3 {
        let angle = degrees.to_radians();
        Vec3::new(angle.sin(), angle.cos(), 0.0)
    }

    fn slope_config() -> LocomotionConfig {
        LocomotionConfig {
            max_slope_climb_angle: 45f32.to_radians(),
            slide_threshold: 60f32.to_radians(),
            ..Default::default()
        }
    }

    #[test]
    fn test_slick_slope_is_grounded() {
        let config = slope_config();
        let physics = FakePhysics::with_ground(slope_normal(50.0), 0.03);

        let probe = probe_ground(&physics, BodyPose::default(), 0.9, 0.0, &config);
        assert_eq!(probe.contact, Contact::Grounded);
        assert_eq!(probe.surface, Some(SurfaceKind::Slick));
        assert!((probe.slope_angle - 50f32.to_radians()).abs() < 1e-4);
    }

    #[test]
    fn test_walkable_slope() {
        let config = slope_config();
        let physics = FakePhysics::with_ground(slope_normal(30.0), 0.05);

        let probe = probe_ground(&physics, BodyPose::default(), 0.9, 0.0, &config);
        assert_eq!(probe.surface, Some(SurfaceKind::Walkable));
        assert!((probe.snap_distance - (0.05 - config.offset)).abs() < 1e-5);
    }

    #[test]
    fn test_too_steep_is_airborne() {
        let config = slope_config();
        let physics = FakePhysics::with_ground(slope_normal(70.0), 0.0);

        let probe = probe_ground(&physics, BodyPose::default(), 0.9, 0.0, &config);
        assert_eq!(probe.contact, Contact::Airborne);
        assert_eq!(probe.surface, None);
    }

    #[test]
    fn test_no_hit_is_airborne() {
        let config = slope_config();
        let physics = FakePhysics::default();

        let probe = probe_ground(&physics, BodyPose::default(), 0.9, 0.0, &config);
        assert!(!probe.grounded());
    }

    #[test]
    fn test_rising_ignores_ground() {
        let config = slope_config();
        let physics = FakePhysics::with_ground(Vec3::Y, 0.0);

        let probe = probe_ground(&physics, BodyPose::default(), 0.9, 4.0, &config);
        assert!(!probe.grounded());
    }

    #[test]
    fn test_classify_boundaries() {
        let config = slope_config();
        assert_eq!(classify_slope(config.max_slope_climb_angle, &config), Some(SurfaceKind::Walkable));
        assert_eq!(classify_slope(config.slide_threshold, &config), None);
    }

    #[test]
    fn test_headroom_blocked_by_ceiling() {
        let config = LocomotionConfig::default();
        let mut physics = FakePhysics::default();
        assert!(has_headroom(&physics, BodyPose::default(), 0.54, 0.9, &config));

        physics.ceiling = Some(0.3);
        assert!(!has_headroom(&physics, BodyPose::default(), 0.54, 0.9, &config));
    }

    /// Floor at y=0 and a box of the given height whose face is at x=0.5.
    fn step_world(height: f32, dynamic: bool) -> (CollisionWorld, ColliderHandle) {
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0), ContentFlags::SOLID);
        let center = Vec3::new(2.5, height * 0.5, 0.0);
        let half_extents = Vec3::new(2.0, height * 0.5, 2.0);
        if dynamic {
            world.add_dynamic_box(center, half_extents);
        } else {
            world.add_box(center, half_extents, ContentFlags::SOLID);
        }
        let body = world.register_body(BodyEntry::new(CapsuleShape::STANDING, BodyMode::Kinematic));
        (world, body)
    }

    /// Walk into the step and let the probe try to climb it.
    fn walk_into_step(world: &mut CollisionWorld, body: ColliderHandle, config: &LocomotionConfig) -> Option<BodyPose> {
        let start = BodyPose::new(Vec3::new(0.0, 0.9 + config.offset, 0.0));
        let moved = world.move_kinematic_body(body, start, Vec3::new(0.3, 0.0, 0.0));
        let hit = moved.blocked.expect("step face should block");
        try_step(world, body, moved.pose, 0.9, &hit, moved.remaining, config)
    }

    #[test]
    fn test_steps_onto_low_ledge() {
        let config = LocomotionConfig::default();
        let (mut world, body) = step_world(0.2, false);

        let stepped = walk_into_step(&mut world, body, &config).expect("0.2m ledge is climbable");
        let bottom = stepped.position.y - 0.9;
        assert!((bottom - (0.2 + config.offset)).abs() < 0.02, "bottom={}", bottom);
        assert!(!world.point_in_solid(stepped.position, CapsuleShape::STANDING, ContentFlags::SOLID));
    }

    #[test]
    fn test_wall_taller_than_step_height() {
        let config = LocomotionConfig::default();
        let (mut world, body) = step_world(0.6, false);
        assert!(walk_into_step(&mut world, body, &config).is_none());
    }

    #[test]
    fn test_step_refused_without_room_past_ledge() {
        let config = LocomotionConfig::default();
        let mut world = CollisionWorld::new();
        world.add_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(20.0, 0.5, 20.0), ContentFlags::SOLID);
        // Ledge from x=0.5 to x=0.8, then a wall
        world.add_box(Vec3::new(0.65, 0.1, 0.0), Vec3::new(0.15, 0.1, 2.0), ContentFlags::SOLID);
        world.add_box(Vec3::new(1.3, 1.0, 0.0), Vec3::new(0.5, 1.0, 2.0), ContentFlags::SOLID);
        let body = world.register_body(BodyEntry::new(CapsuleShape::STANDING, BodyMode::Kinematic));

        assert!(walk_into_step(&mut world, body, &config).is_none());
    }

    #[test]
    fn test_dynamic_step_needs_opt_in() {
        let mut config = LocomotionConfig::default();
        let (mut world, body) = step_world(0.2, true);
        assert!(walk_into_step(&mut world, body, &config).is_none());

        config.auto_step_include_dynamic = true;
        let (mut world, body) = step_world(0.2, true);
        assert!(walk_into_step(&mut world, body, &config).is_some());
    }

    #[test]
    fn test_step_disabled() {
        let config = LocomotionConfig {
            auto_step_max_height: 0.0,
            ..Default::default()
        };
        let (mut world, body) = step_world(0.2, false);
        assert!(walk_into_step(&mut world, body, &config).is_none());
    }
}
