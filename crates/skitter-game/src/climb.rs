//! Climbable surfaces and their trigger volumes

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use glam::Vec3;
use rapier3d::prelude::ColliderHandle;
use serde::{Deserialize, Serialize};
use skitter_core::EntityId;

use crate::player::Motor;

/// Kind of climbable surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbType {
    #[default]
    Ladder,
    Vine,
    Pipe,
}

/// A surface the character can attach to
///
/// `climb_axis`, `snap_point` and `enter_offset` describe the surface for
/// level tooling and presentation. Climb movement itself runs straight along
/// world Y and does not read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Climbable {
    pub id: EntityId,
    pub name: String,
    pub kind: ClimbType,
    /// Primary axis to move along while climbing
    pub climb_axis: Vec3,
    /// Optional point to snap to when attaching
    pub snap_point: Option<Vec3>,
    /// Pull-in distance when attaching
    pub enter_offset: f32,
}

impl Default for Climbable {
    fn default() -> Self {
        Self {
            id: EntityId::new(),
            name: String::new(),
            kind: ClimbType::Ladder,
            climb_axis: Vec3::Y,
            snap_point: None,
            enter_offset: 0.2,
        }
    }
}

impl Climbable {
    pub fn new(name: impl Into<String>, kind: ClimbType) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }
}

/// Level registry: trigger collider to the climbable it belongs to
///
/// The set owns the climbables. Removing one invalidates every weak
/// reference the motor or a tracker still holds.
#[derive(Debug, Default)]
pub struct ClimbableSet {
    by_trigger: HashMap<ColliderHandle, Arc<Climbable>>,
}

impl ClimbableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, trigger: ColliderHandle, climbable: Climbable) -> Arc<Climbable> {
        let climbable = Arc::new(climbable);
        self.by_trigger.insert(trigger, climbable.clone());
        climbable
    }

    pub fn remove(&mut self, trigger: ColliderHandle) -> Option<Arc<Climbable>> {
        self.by_trigger.remove(&trigger)
    }

    pub fn get(&self, trigger: ColliderHandle) -> Option<&Arc<Climbable>> {
        self.by_trigger.get(&trigger)
    }

    pub fn len(&self) -> usize {
        self.by_trigger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_trigger.is_empty()
    }
}

/// Turns per-tick trigger overlaps into enter/exit calls on the motor
#[derive(Debug, Default)]
pub struct ClimbTriggerTracker {
    inside: HashMap<ColliderHandle, Weak<Climbable>>,
}

impl ClimbTriggerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `overlapping` against the previous tick
    ///
    /// Exits are delivered before enters, so moving between two touching
    /// climbables leaves the newer one as the candidate.
    pub fn sync(&mut self, set: &ClimbableSet, overlapping: &[ColliderHandle], motor: &mut Motor) {
        let exited: Vec<ColliderHandle> = self
            .inside
            .keys()
            .filter(|handle| !overlapping.contains(handle))
            .copied()
            .collect();

        for handle in exited {
            if let Some(climbable) = self.inside.remove(&handle).and_then(|w| w.upgrade()) {
                motor.clear_climb_candidate(&climbable);
            }
        }

        for &handle in overlapping {
            if self.inside.contains_key(&handle) {
                continue;
            }
            if let Some(climbable) = set.get(handle) {
                self.inside.insert(handle, Arc::downgrade(climbable));
                motor.set_climb_candidate(climbable);
            }
        }
    }

    /// Number of climbable triggers the body is inside
    pub fn inside_count(&self) -> usize {
        self.inside.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::events::{MovementEvent, RecordingSink};
    use crate::player::{MovementConfig, PassThroughConfig};
    use crate::test_support::{handle, ScriptedOracle};

    fn motor() -> (Motor, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let motor = Motor::new(
            MovementConfig::default(),
            PassThroughConfig::default(),
            sink.clone(),
        );
        (motor, sink)
    }

    #[test]
    fn test_enter_and_exit_trigger() {
        let (mut motor, _) = motor();
        let mut set = ClimbableSet::new();
        let ladder = set.register(handle(10), Climbable::new("ladder", ClimbType::Ladder));
        let mut tracker = ClimbTriggerTracker::new();

        tracker.sync(&set, &[handle(10)], &mut motor);
        assert!(motor.has_climb_candidate());
        assert_eq!(motor.current_climbable().map(|c| c.id), Some(ladder.id));

        // Staying inside does not re-enter
        tracker.sync(&set, &[handle(10)], &mut motor);
        assert_eq!(tracker.inside_count(), 1);

        tracker.sync(&set, &[], &mut motor);
        assert!(!motor.has_climb_candidate());
    }

    #[test]
    fn test_stale_exit_does_not_clobber_newer_candidate() {
        let (mut motor, sink) = motor();
        let mut set = ClimbableSet::new();
        set.register(handle(10), Climbable::new("ladder", ClimbType::Ladder));
        let vine = set.register(handle(11), Climbable::new("vine", ClimbType::Vine));
        let mut tracker = ClimbTriggerTracker::new();

        tracker.sync(&set, &[handle(10)], &mut motor);
        tracker.sync(&set, &[handle(10), handle(11)], &mut motor);
        tracker.sync(&set, &[handle(11)], &mut motor);

        assert_eq!(motor.current_climbable().map(|c| c.id), Some(vine.id));
        let cleared = sink
            .events()
            .iter()
            .filter(|e| matches!(e, MovementEvent::ClimbCandidateCleared { .. }))
            .count();
        assert_eq!(cleared, 0);
    }

    #[test]
    fn test_removed_climbable_goes_stale() {
        let (mut motor, _) = motor();
        let mut set = ClimbableSet::new();
        let ladder = set.register(handle(10), Climbable::new("ladder", ClimbType::Ladder));
        let mut tracker = ClimbTriggerTracker::new();

        tracker.sync(&set, &[handle(10)], &mut motor);
        drop(ladder);
        set.remove(handle(10));

        assert!(!motor.has_climb_candidate());
        assert!(motor.current_climbable().is_none());

        // The trigger vanished with it; leaving is quiet
        tracker.sync(&set, &[], &mut motor);
        assert_eq!(tracker.inside_count(), 0);
    }

    #[test]
    fn test_tilted_descriptor_still_climbs_straight_up() {
        let (mut motor, _) = motor();
        let mut set = ClimbableSet::new();
        set.register(
            handle(12),
            Climbable {
                climb_axis: Vec3::new(1.0, 1.0, 0.0).normalize(),
                snap_point: Some(Vec3::new(4.0, 0.0, 0.0)),
                enter_offset: 1.0,
                ..Climbable::new("slanted vine", ClimbType::Vine)
            },
        );
        let mut tracker = ClimbTriggerTracker::new();
        let mut oracle = ScriptedOracle::new();
        let start = oracle.feet;

        tracker.sync(&set, &[handle(12)], &mut motor);
        motor.enter_climb();
        motor.set_vertical_climb_input(1.0);
        motor.tick(&mut oracle, 0.1);

        let moved = oracle.feet - start;
        assert_eq!(moved.x, 0.0);
        assert_eq!(moved.z, 0.0);
        assert!((moved.y - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_climbable_from_toml() {
        let climbable: Climbable = toml::from_str(
            r#"
            name = "drainpipe"
            kind = "pipe"
            "#,
        )
        .unwrap();
        assert_eq!(climbable.kind, ClimbType::Pipe);
        assert_eq!(climbable.climb_axis, Vec3::Y);
        assert_eq!(climbable.enter_offset, 0.2);
    }
}
