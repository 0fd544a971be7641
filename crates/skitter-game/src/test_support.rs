//! Scripted collision oracle for unit tests

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use skitter_core::EntityId;
use skitter_physics::{
    CastHit, ColliderHandle, CollisionFlags, CollisionOracle, ContactHit, MoveOutcome,
    OneWayPlatform,
};

pub fn handle(index: u32) -> ColliderHandle {
    ColliderHandle::from_raw_parts(index, 0)
}

pub fn platform(solid: ColliderHandle, top_y: f32, up: bool, down: bool) -> OneWayPlatform {
    OneWayPlatform {
        id: EntityId::new(),
        solid,
        top_y,
        jump_up_through: up,
        jump_down_through: down,
    }
}

/// Oracle whose answers are set directly by the test
///
/// Moves shift `feet` by the displacement, except that a grounded body does
/// not sink.
pub struct ScriptedOracle {
    pub grounded: bool,
    pub feet: Vec3,
    pub radius: f32,
    pub cast_up: Option<CastHit>,
    pub cast_down: Option<CastHit>,
    pub overlap: Vec<ColliderHandle>,
    pub contacts: Vec<ContactHit>,
    pub triggers: Vec<ColliderHandle>,
    platforms: HashMap<ColliderHandle, OneWayPlatform>,
    disabled: HashSet<ColliderHandle>,
    restored: HashSet<ColliderHandle>,
    destroyed: HashSet<ColliderHandle>,
    moves: Vec<Vec3>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            grounded: false,
            feet: Vec3::ZERO,
            radius: 0.4,
            cast_up: None,
            cast_down: None,
            overlap: Vec::new(),
            contacts: Vec::new(),
            triggers: Vec::new(),
            platforms: HashMap::new(),
            disabled: HashSet::new(),
            restored: HashSet::new(),
            destroyed: HashSet::new(),
            moves: Vec::new(),
        }
    }

    pub fn add_platform(&mut self, platform: OneWayPlatform) {
        self.platforms.insert(platform.solid, platform);
    }

    pub fn destroy(&mut self, collider: ColliderHandle) {
        self.destroyed.insert(collider);
        self.platforms.remove(&collider);
    }

    pub fn collision_enabled(&self, collider: ColliderHandle) -> bool {
        !self.disabled.contains(&collider)
    }

    pub fn was_restored(&self, collider: ColliderHandle) -> bool {
        self.restored.contains(&collider)
    }

    pub fn last_move(&self) -> Vec3 {
        self.moves.last().copied().unwrap_or(Vec3::ZERO)
    }
}

impl CollisionOracle for ScriptedOracle {
    fn move_and_resolve(&mut self, displacement: Vec3, _dt: f32) -> MoveOutcome {
        self.moves.push(displacement);

        let mut applied = displacement;
        if self.grounded && applied.y < 0.0 {
            applied.y = 0.0;
        }
        self.feet += applied;

        MoveOutcome {
            applied,
            flags: CollisionFlags {
                below: self.grounded,
                ..Default::default()
            },
            contacts: self.contacts.clone(),
        }
    }

    fn feet_position(&self) -> Vec3 {
        self.feet
    }

    fn body_radius(&self) -> f32 {
        self.radius
    }

    fn sphere_cast(
        &self,
        _origin: Vec3,
        _radius: f32,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<CastHit> {
        let hit = if direction.y > 0.0 {
            self.cast_up
        } else {
            self.cast_down
        };
        hit.filter(|h| h.distance <= max_distance)
    }

    fn overlap_capsule(&self, _a: Vec3, _b: Vec3, _radius: f32) -> Vec<ColliderHandle> {
        self.overlap.clone()
    }

    fn set_collision_enabled(&mut self, other: ColliderHandle, enabled: bool) {
        if enabled {
            self.disabled.remove(&other);
            self.restored.insert(other);
        } else {
            self.disabled.insert(other);
        }
    }

    fn collider_exists(&self, collider: ColliderHandle) -> bool {
        !self.destroyed.contains(&collider)
    }

    fn one_way_platform(&self, collider: ColliderHandle) -> Option<OneWayPlatform> {
        self.platforms.get(&collider).copied()
    }

    fn overlapping_triggers(&self) -> Vec<ColliderHandle> {
        self.triggers.clone()
    }
}
