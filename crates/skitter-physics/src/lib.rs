//! Skitter Physics - Collision oracle using rapier3d
//!
//! Provides the static level geometry, the character body and the
//! [`CollisionOracle`] implementation the movement core runs against.

mod character_controller;
mod oracle;

pub use character_controller::{CharacterController, CharacterControllerConfig, RapierOracle};
pub use oracle::{
    CastHit, CollisionFlags, CollisionOracle, ContactHit, MoveOutcome, OneWayPlatform,
};
pub use rapier3d::prelude::ColliderHandle;

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use nalgebra::Unit;
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::parry::shape::Shape;
use rapier3d::prelude::*;
use skitter_core::EntityId;
use tracing::debug;

/// The level's collision state: static geometry, trigger volumes,
/// one-way platform descriptors and suppressed collider pairs
pub struct PhysicsWorld {
    /// Rigid body storage
    pub rigid_body_set: RigidBodySet,
    /// Collider storage
    pub collider_set: ColliderSet,

    /// Island manager (needed for collider removal)
    island_manager: IslandManager,
    /// Query pipeline for casts and overlaps
    query_pipeline: QueryPipeline,
    /// One-way platform descriptors keyed by their solid collider
    platforms: HashMap<ColliderHandle, OneWayPlatform>,
    /// Collider pairs whose collision response is disabled
    ignored_pairs: HashSet<(ColliderHandle, ColliderHandle)>,
}

impl PhysicsWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            island_manager: IslandManager::new(),
            query_pipeline: QueryPipeline::new(),
            platforms: HashMap::new(),
            ignored_pairs: HashSet::new(),
        }
    }

    /// Rebuild the query acceleration structure after adding or removing colliders
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Add a static collider (ground, walls, etc.)
    pub fn add_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Remove a collider along with any platform descriptor and suppressed pairs
    pub fn remove_collider(&mut self, handle: ColliderHandle) {
        self.collider_set
            .remove(handle, &mut self.island_manager, &mut self.rigid_body_set, true);
        self.platforms.remove(&handle);
        self.ignored_pairs.retain(|(a, b)| *a != handle && *b != handle);
    }

    /// Get a collider by handle
    pub fn get_collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.collider_set.get(handle)
    }

    /// Create a ground plane collider
    pub fn create_ground(&mut self, y: f32) -> ColliderHandle {
        let normal = Unit::new_normalize(vector![0.0, 1.0, 0.0]);
        let ground = ColliderBuilder::halfspace(normal)
            .translation(vector![0.0, y, 0.0])
            .friction(0.7)
            .restitution(0.0)
            .build();
        self.add_static_collider(ground)
    }

    /// Create a static box collider
    pub fn create_static_box(&mut self, half_extents: Vec3, position: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![position.x, position.y, position.z])
            .friction(0.7)
            .build();
        self.add_static_collider(collider)
    }

    /// Create a one-way platform slab and register its descriptor
    ///
    /// The top surface Y is taken from the solid collider's bounds.
    pub fn create_one_way_platform(
        &mut self,
        half_extents: Vec3,
        position: Vec3,
        jump_up_through: bool,
        jump_down_through: bool,
    ) -> OneWayPlatform {
        let solid = self.create_static_box(half_extents, position);
        let top_y = self
            .collider_set
            .get(solid)
            .map(|c| c.compute_aabb().maxs.y)
            .unwrap_or(f32::NEG_INFINITY);

        let platform = OneWayPlatform {
            id: EntityId::new(),
            solid,
            top_y,
            jump_up_through,
            jump_down_through,
        };
        debug!(
            id = %platform.id,
            top_y,
            jump_up_through,
            jump_down_through,
            "one-way platform created"
        );
        self.platforms.insert(solid, platform);
        platform
    }

    /// Create a trigger volume (e.g. the reach area of a ladder)
    pub fn create_trigger_volume(&mut self, half_extents: Vec3, position: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(vector![position.x, position.y, position.z])
            .sensor(true)
            .build();
        self.add_static_collider(collider)
    }

    /// Look up the one-way platform a collider belongs to
    pub fn one_way_platform(&self, handle: ColliderHandle) -> Option<OneWayPlatform> {
        self.platforms.get(&handle).copied()
    }

    /// Enable or disable collision response between two colliders
    pub fn set_collision_enabled(&mut self, a: ColliderHandle, b: ColliderHandle, enabled: bool) {
        let pair = Self::pair_key(a, b);
        if enabled {
            self.ignored_pairs.remove(&pair);
        } else {
            self.ignored_pairs.insert(pair);
        }
    }

    /// Whether two colliders currently collide with each other
    pub fn collision_enabled(&self, a: ColliderHandle, b: ColliderHandle) -> bool {
        !self.ignored_pairs.contains(&Self::pair_key(a, b))
    }

    fn pair_key(a: ColliderHandle, b: ColliderHandle) -> (ColliderHandle, ColliderHandle) {
        if a.into_raw_parts() <= b.into_raw_parts() {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Cast a ball and return the first hit
    ///
    /// Colliders the ball already touches at `origin` are skipped when the
    /// cast moves away from them, so a probe starting on the floor still
    /// reports what lies ahead.
    pub fn cast_ball(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<CastHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }

        let shape = SharedShape::ball(radius);
        let shape_pos = Isometry::translation(origin.x, origin.y, origin.z);
        let shape_vel = vector![direction.x, direction.y, direction.z];

        self.query_pipeline
            .cast_shape(
                &self.rigid_body_set,
                &self.collider_set,
                &shape_pos,
                &shape_vel,
                &*shape,
                ShapeCastOptions {
                    max_time_of_impact: max_distance,
                    stop_at_penetration: false,
                    ..ShapeCastOptions::default()
                },
                filter,
            )
            .map(|(handle, hit)| CastHit {
                collider: handle,
                distance: hit.time_of_impact,
                normal: Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z),
            })
    }

    /// All colliders intersecting a shape placed at `shape_pos`
    pub fn intersections(
        &self,
        shape_pos: &Isometry<Real>,
        shape: &dyn Shape,
        filter: QueryFilter,
    ) -> Vec<ColliderHandle> {
        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.rigid_body_set,
            &self.collider_set,
            shape_pos,
            shape,
            filter,
            |handle| {
                hits.push(handle);
                true
            },
        );
        hits
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
