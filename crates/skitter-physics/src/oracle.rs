//! The collision oracle contract
//!
//! The movement core never talks to the physics engine directly. Everything
//! it needs from the world (resolved movement, proximity probes, pairwise
//! collision suppression, one-way platform lookup) goes through
//! [`CollisionOracle`]. An oracle is bound to a single character body.

use glam::Vec3;
use rapier3d::prelude::ColliderHandle;
use skitter_core::EntityId;

/// Which sides of the body were blocked during a move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    /// Standing on something
    pub below: bool,
    /// Head hit something
    pub above: bool,
    /// Blocked horizontally
    pub sides: bool,
}

impl CollisionFlags {
    /// True when the move touched nothing
    pub fn is_empty(&self) -> bool {
        !(self.below || self.above || self.sides)
    }
}

/// A single contact reported while resolving a move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactHit {
    /// The collider that was touched
    pub collider: ColliderHandle,
    /// Surface normal of the touched collider, pointing towards the character
    pub normal: Vec3,
}

/// Result of [`CollisionOracle::move_and_resolve`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveOutcome {
    /// The displacement actually applied
    pub applied: Vec3,
    /// Blocked axes
    pub flags: CollisionFlags,
    /// Every contact touched during the move, in order
    pub contacts: Vec<ContactHit>,
}

/// Shape cast hit information
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Distance travelled along the cast direction
    pub distance: f32,
    /// Surface normal of the hit collider, pointing back along the cast
    pub normal: Vec3,
}

/// Descriptor of a one-way platform, read-only to the movement core
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneWayPlatform {
    /// Level object identity
    pub id: EntityId,
    /// The solid (non-trigger) collider of the slab
    pub solid: ColliderHandle,
    /// Authoritative world Y of the top surface
    pub top_y: f32,
    /// Whether the body may pass through from below
    pub jump_up_through: bool,
    /// Whether the body may drop through from above
    pub jump_down_through: bool,
}

/// Queries and mutations the movement core needs from the physics world
pub trait CollisionOracle {
    /// Move the body by `displacement`, resolving collisions
    fn move_and_resolve(&mut self, displacement: Vec3, dt: f32) -> MoveOutcome;

    /// World position of the body's lowest point
    fn feet_position(&self) -> Vec3;

    /// Radius of the body's footprint
    fn body_radius(&self) -> f32;

    /// Cast a sphere and return the first solid hit
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<CastHit>;

    /// All solid colliders overlapping a capsule between `a` and `b`
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32) -> Vec<ColliderHandle>;

    /// Enable or disable collision between this body and `other`
    fn set_collision_enabled(&mut self, other: ColliderHandle, enabled: bool);

    /// Whether `collider` still exists in the world
    fn collider_exists(&self, collider: ColliderHandle) -> bool;

    /// The one-way platform `collider` belongs to, if any
    fn one_way_platform(&self, collider: ColliderHandle) -> Option<OneWayPlatform>;

    /// Trigger volumes currently overlapping the body
    fn overlapping_triggers(&self) -> Vec<ColliderHandle>;
}
