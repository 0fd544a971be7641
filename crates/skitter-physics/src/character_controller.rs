//! Character body using rapier3d's kinematic character controller

use glam::Vec3;
use rapier3d::control::{
    CharacterAutostep, CharacterCollision, CharacterLength, KinematicCharacterController,
};
use rapier3d::prelude::*;

use crate::oracle::{CastHit, CollisionFlags, CollisionOracle, ContactHit, MoveOutcome, OneWayPlatform};
use crate::PhysicsWorld;

/// Contacts whose surface normal is within this band of horizontal count as side hits
const SIDE_NORMAL_BAND: f32 = 0.5;

/// Character controller configuration
#[derive(Debug, Clone)]
pub struct CharacterControllerConfig {
    /// Capsule height (default: 1.8m)
    pub height: f32,
    /// Capsule radius (default: 0.4m)
    pub radius: f32,
    /// Maximum slope angle in degrees (default: 45)
    pub max_slope_angle: f32,
    /// Step height for climbing stairs (default: 0.25m)
    pub step_height: f32,
    /// Skin width for collision detection (default: 0.02m)
    pub skin_width: f32,
    /// Whether to snap to ground when walking down slopes
    pub snap_to_ground: bool,
    /// Maximum ground snap distance
    pub ground_snap_distance: f32,
}

impl Default for CharacterControllerConfig {
    fn default() -> Self {
        Self {
            height: 1.8,
            radius: 0.4,
            max_slope_angle: 45.0,
            step_height: 0.25,
            skin_width: 0.02,
            snap_to_ground: true,
            ground_snap_distance: 0.2,
        }
    }
}

/// Capsule body moved through the world with collision resolution
///
/// `position` is the bottom of the capsule.
pub struct CharacterController {
    /// Configuration
    pub config: CharacterControllerConfig,
    /// Current position (capsule bottom)
    pub position: Vec3,
    /// Whether the last move ended on the ground
    pub grounded: bool,
    /// The collider handle for this character
    pub collider_handle: Option<ColliderHandle>,
    /// Rapier's kinematic character controller
    controller: KinematicCharacterController,
}

impl CharacterController {
    /// Create a new character controller with default config
    pub fn new() -> Self {
        Self::with_config(CharacterControllerConfig::default())
    }

    /// Create a new character controller with custom config
    pub fn with_config(config: CharacterControllerConfig) -> Self {
        let mut controller = KinematicCharacterController::default();
        controller.max_slope_climb_angle = config.max_slope_angle.to_radians();
        controller.min_slope_slide_angle = config.max_slope_angle.to_radians();
        controller.autostep = Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(config.step_height),
            min_width: CharacterLength::Relative(0.5),
            include_dynamic_bodies: false,
        });
        controller.snap_to_ground = if config.snap_to_ground {
            Some(CharacterLength::Absolute(config.ground_snap_distance))
        } else {
            None
        };
        controller.offset = CharacterLength::Absolute(config.skin_width);

        Self {
            config,
            position: Vec3::ZERO,
            grounded: false,
            collider_handle: None,
            controller,
        }
    }

    /// Spawn the character in the physics world
    pub fn spawn(&mut self, physics: &mut PhysicsWorld, position: Vec3) -> ColliderHandle {
        self.position = position;

        let collider = ColliderBuilder::capsule_y(self.half_segment(), self.config.radius)
            .translation(vector![position.x, position.y + self.config.height / 2.0, position.z])
            .friction(0.0)
            .restitution(0.0)
            .build();

        let handle = physics.add_static_collider(collider);
        self.collider_handle = Some(handle);
        handle
    }

    fn half_segment(&self) -> f32 {
        ((self.config.height - 2.0 * self.config.radius) / 2.0).max(0.01)
    }

    fn center_isometry(&self) -> Isometry<Real> {
        Isometry::translation(
            self.position.x,
            self.position.y + self.config.height / 2.0,
            self.position.z,
        )
    }

    /// Move the character with collision detection
    ///
    /// Colliders whose pair with this body is suppressed in `physics` are
    /// passed through.
    pub fn move_character(
        &mut self,
        physics: &mut PhysicsWorld,
        desired_translation: Vec3,
        dt: f32,
    ) -> MoveOutcome {
        let Some(collider_handle) = self.collider_handle else {
            return MoveOutcome::default();
        };

        let Some(collider) = physics.collider_set.get(collider_handle) else {
            return MoveOutcome::default();
        };

        let shape = collider.shape();
        let current_pos = self.center_isometry();

        let world: &PhysicsWorld = physics;
        let respects_suppression =
            |other: ColliderHandle, _: &Collider| world.collision_enabled(collider_handle, other);
        let filter = QueryFilter::default()
            .exclude_sensors()
            .exclude_collider(collider_handle)
            .predicate(&respects_suppression);

        let mut contacts = Vec::new();
        let movement = self.controller.move_shape(
            dt,
            &world.rigid_body_set,
            &world.collider_set,
            &world.query_pipeline,
            shape,
            &current_pos,
            vector![desired_translation.x, desired_translation.y, desired_translation.z],
            filter,
            |collision: CharacterCollision| {
                // normal1 belongs to the obstacle; normal2 is the character's side
                let n = collision.hit.normal1;
                contacts.push(ContactHit {
                    collider: collision.handle,
                    normal: Vec3::new(n.x, n.y, n.z),
                });
            },
        );

        let mut flags = CollisionFlags {
            below: movement.grounded,
            ..Default::default()
        };
        for contact in &contacts {
            if contact.normal.y < -SIDE_NORMAL_BAND {
                flags.above = true;
            } else if contact.normal.y.abs() <= SIDE_NORMAL_BAND {
                flags.sides = true;
            }
        }
        self.grounded = movement.grounded;

        let applied = Vec3::new(
            movement.translation.x,
            movement.translation.y,
            movement.translation.z,
        );
        self.position += applied;

        if let Some(collider) = physics.collider_set.get_mut(collider_handle) {
            collider.set_translation(vector![
                self.position.x,
                self.position.y + self.config.height / 2.0,
                self.position.z
            ]);
        }

        MoveOutcome {
            applied,
            flags,
            contacts,
        }
    }

    /// Lowest point of the body, lifted by the skin width
    pub fn feet_position(&self) -> Vec3 {
        Vec3::new(
            self.position.x,
            self.position.y + self.config.skin_width,
            self.position.z,
        )
    }

    /// Check if standing on ground
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }
}

impl Default for CharacterController {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds one character body to the world for the duration of a tick
pub struct RapierOracle<'a> {
    pub world: &'a mut PhysicsWorld,
    pub body: &'a mut CharacterController,
}

impl<'a> RapierOracle<'a> {
    pub fn new(world: &'a mut PhysicsWorld, body: &'a mut CharacterController) -> Self {
        Self { world, body }
    }

    fn probe_filter(&self) -> QueryFilter<'static> {
        let filter = QueryFilter::default().exclude_sensors();
        match self.body.collider_handle {
            Some(handle) => filter.exclude_collider(handle),
            None => filter,
        }
    }
}

impl CollisionOracle for RapierOracle<'_> {
    fn move_and_resolve(&mut self, displacement: Vec3, dt: f32) -> MoveOutcome {
        self.body.move_character(self.world, displacement, dt)
    }

    fn feet_position(&self) -> Vec3 {
        self.body.feet_position()
    }

    fn body_radius(&self) -> f32 {
        self.body.config.radius
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<CastHit> {
        self.world
            .cast_ball(origin, radius, direction, max_distance, self.probe_filter())
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32) -> Vec<ColliderHandle> {
        let shape = SharedShape::capsule(point![a.x, a.y, a.z], point![b.x, b.y, b.z], radius);
        self.world
            .intersections(&Isometry::identity(), &*shape, self.probe_filter())
    }

    fn set_collision_enabled(&mut self, other: ColliderHandle, enabled: bool) {
        if let Some(handle) = self.body.collider_handle {
            self.world.set_collision_enabled(handle, other, enabled);
        }
    }

    fn collider_exists(&self, collider: ColliderHandle) -> bool {
        self.world.get_collider(collider).is_some()
    }

    fn one_way_platform(&self, collider: ColliderHandle) -> Option<OneWayPlatform> {
        self.world.one_way_platform(collider)
    }

    fn overlapping_triggers(&self) -> Vec<ColliderHandle> {
        let Some(handle) = self.body.collider_handle else {
            return Vec::new();
        };
        let shape = SharedShape::capsule_y(self.body.half_segment(), self.body.config.radius);
        let world: &PhysicsWorld = self.world;
        let sensors_only = |_: ColliderHandle, collider: &Collider| collider.is_sensor();
        let filter = QueryFilter::default()
            .exclude_collider(handle)
            .predicate(&sensors_only);
        world.intersections(&self.body.center_isometry(), &*shape, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with_platform(up: bool, down: bool) -> (PhysicsWorld, OneWayPlatform) {
        let mut world = PhysicsWorld::new();
        world.create_ground(0.0);
        let platform = world.create_one_way_platform(
            Vec3::new(3.0, 0.25, 3.0),
            Vec3::new(0.0, 2.75, 0.0),
            up,
            down,
        );
        world.refresh_queries();
        (world, platform)
    }

    fn settle(world: &mut PhysicsWorld, body: &mut CharacterController) {
        for _ in 0..30 {
            body.move_character(world, Vec3::new(0.0, -0.1, 0.0), 1.0 / 60.0);
        }
    }

    #[test]
    fn test_character_controller_config() {
        let config = CharacterControllerConfig::default();
        assert_eq!(config.height, 1.8);
        assert_eq!(config.radius, 0.4);
        assert_eq!(config.max_slope_angle, 45.0);
    }

    #[test]
    fn test_feet_position_includes_skin() {
        let mut controller = CharacterController::new();
        controller.position = Vec3::new(1.0, 2.0, 3.0);
        let feet = controller.feet_position();
        assert!((feet.y - 2.02).abs() < 1e-6);
        assert_eq!(feet.x, 1.0);
    }

    #[test]
    fn test_lands_on_ground() {
        let (mut world, _) = level_with_platform(true, true);
        let mut body = CharacterController::new();
        body.spawn(&mut world, Vec3::new(0.0, 0.5, 0.0));

        settle(&mut world, &mut body);

        assert!(body.is_grounded());
        assert!(body.position.y < 0.2);
    }

    #[test]
    fn test_platform_blocks_until_suppressed() {
        let (mut world, platform) = level_with_platform(true, true);
        let mut body = CharacterController::new();
        let handle = body.spawn(&mut world, Vec3::new(0.0, 0.1, 0.0));
        settle(&mut world, &mut body);

        // Head would reach 1.8 + 1.0; the slab underside sits at 2.5
        body.move_character(&mut world, Vec3::new(0.0, 1.0, 0.0), 1.0 / 60.0);
        let blocked = body.position.y;
        assert!(blocked + body.config.height <= 2.5 + 0.05);

        world.set_collision_enabled(handle, platform.solid, false);
        body.move_character(&mut world, Vec3::new(0.0, 3.0, 0.0), 1.0 / 60.0);
        assert!(body.position.y > blocked + 2.0);
    }

    #[test]
    fn test_ceiling_contact_normal_faces_character() {
        let (mut world, platform) = level_with_platform(true, true);
        let mut body = CharacterController::new();
        body.spawn(&mut world, Vec3::new(0.0, 0.1, 0.0));
        settle(&mut world, &mut body);

        let outcome = body.move_character(&mut world, Vec3::new(0.0, 1.0, 0.0), 1.0 / 60.0);

        let hit = outcome
            .contacts
            .iter()
            .find(|c| c.collider == platform.solid)
            .expect("rising into the slab should touch it");
        assert!(hit.normal.y < -0.9);
        assert!(outcome.flags.above);
    }

    #[test]
    fn test_upward_cast_skips_floor_underfoot() {
        let mut world = PhysicsWorld::new();
        world.create_ground(0.0);
        world.refresh_queries();
        let mut body = CharacterController::new();
        body.spawn(&mut world, Vec3::new(0.0, 0.1, 0.0));
        settle(&mut world, &mut body);
        assert!(body.is_grounded());

        {
            let oracle = RapierOracle::new(&mut world, &mut body);
            let origin = oracle.feet_position() + Vec3::Y * 0.05;
            assert!(oracle.sphere_cast(origin, 0.38, Vec3::Y, 0.4).is_none());
        }

        // Slab underside 0.6 above the floor, inside the jump cast reach
        let slab = world.create_one_way_platform(
            Vec3::new(2.0, 0.1, 2.0),
            Vec3::new(0.0, 0.7, 0.0),
            true,
            true,
        );
        world.refresh_queries();

        let mut oracle = RapierOracle::new(&mut world, &mut body);
        let origin = oracle.feet_position() + Vec3::Y * 0.05;
        let hit = oracle
            .sphere_cast(origin, 0.38, Vec3::Y, 0.4)
            .expect("cast should reach the slab");
        assert_eq!(hit.collider, slab.solid);
        assert!(hit.distance > 0.0 && hit.distance < 0.4);
        assert!(hit.normal.y < -0.9);

        oracle.set_collision_enabled(slab.solid, false);
        let before = oracle.feet_position().y;
        oracle.move_and_resolve(Vec3::new(0.0, 1.0, 0.0), 1.0 / 60.0);
        assert!(oracle.feet_position().y > before + 0.9);
    }

    #[test]
    fn test_oracle_finds_platform_below_feet() {
        let (mut world, platform) = level_with_platform(true, true);
        let mut body = CharacterController::new();
        body.spawn(&mut world, Vec3::new(0.0, platform.top_y + 0.01, 0.0));
        world.refresh_queries();

        let oracle = RapierOracle::new(&mut world, &mut body);
        let feet = oracle.feet_position();
        let hits = oracle.overlap_capsule(
            feet + Vec3::Y * 0.02,
            feet - Vec3::Y * 0.06,
            oracle.body_radius() * 0.98,
        );
        assert!(hits.contains(&platform.solid));
        assert_eq!(
            oracle.one_way_platform(platform.solid).map(|p| p.solid),
            Some(platform.solid)
        );
    }

    #[test]
    fn test_oracle_reports_trigger_overlap() {
        let mut world = PhysicsWorld::new();
        let ladder = world.create_trigger_volume(Vec3::new(0.5, 2.0, 0.5), Vec3::new(0.0, 2.0, 0.0));
        let mut body = CharacterController::new();
        body.spawn(&mut world, Vec3::new(0.0, 0.5, 0.0));
        world.refresh_queries();

        let oracle = RapierOracle::new(&mut world, &mut body);
        assert_eq!(oracle.overlapping_triggers(), vec![ladder]);
    }
}
