//! Temporary collision suppression against one-way platforms
//!
//! Each suppressed collider owns one pending entry with a release condition.
//! Entries are polled once per tick after the body has moved; when the
//! condition holds the entry is removed first and collision is restored
//! second.

use rapier3d::prelude::ColliderHandle;
use serde::{Deserialize, Serialize};

use skitter_physics::CollisionOracle;

use crate::events::{collider_key, MovementEvent, ReleaseKind, SharedSink};

/// Tolerance on accumulated tick time when checking a duration release
const DURATION_EPSILON: f32 = 1e-5;

/// Pass-through tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassThroughConfig {
    /// How far above a platform top the feet must rise before it turns solid again
    pub cross_buffer: f32,
}

impl Default for PassThroughConfig {
    fn default() -> Self {
        Self { cross_buffer: 0.05 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Release {
    /// Feet strictly above this world Y
    AboveY(f32),
    /// Accumulated tick time reaches `duration`
    After { duration: f32, elapsed: f32 },
}

impl Release {
    fn kind(&self) -> ReleaseKind {
        match *self {
            Release::AboveY(threshold_y) => ReleaseKind::Above { threshold_y },
            Release::After { duration, .. } => ReleaseKind::After { duration },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Suppression {
    collider: ColliderHandle,
    release: Release,
}

/// Owns the set of colliders the body currently passes through
pub struct PlatformPass {
    config: PassThroughConfig,
    pending: Vec<Suppression>,
    sink: SharedSink,
}

impl PlatformPass {
    pub fn new(config: PassThroughConfig, sink: SharedSink) -> Self {
        Self {
            config,
            pending: Vec::new(),
            sink,
        }
    }

    pub fn config(&self) -> &PassThroughConfig {
        &self.config
    }

    /// Ignore `collider` until the feet rise above `top_y` plus the cross buffer
    ///
    /// Returns false when `collider` is `None` or already ignored.
    pub fn pass_up_through(
        &mut self,
        oracle: &mut dyn CollisionOracle,
        collider: Option<ColliderHandle>,
        top_y: f32,
    ) -> bool {
        let threshold = top_y + self.config.cross_buffer;
        self.begin(oracle, collider, Release::AboveY(threshold))
    }

    /// Ignore `collider` for `duration` seconds regardless of position
    pub fn drop_down_through(
        &mut self,
        oracle: &mut dyn CollisionOracle,
        collider: Option<ColliderHandle>,
        duration: f32,
    ) -> bool {
        self.begin(
            oracle,
            collider,
            Release::After {
                duration,
                elapsed: 0.0,
            },
        )
    }

    fn begin(
        &mut self,
        oracle: &mut dyn CollisionOracle,
        collider: Option<ColliderHandle>,
        release: Release,
    ) -> bool {
        let Some(collider) = collider else {
            return false;
        };

        if self.is_ignoring(collider) {
            self.sink.record(MovementEvent::PassThroughAlreadyActive {
                collider: collider_key(collider),
            });
            return false;
        }

        oracle.set_collision_enabled(collider, false);
        self.pending.push(Suppression { collider, release });
        self.sink.record(MovementEvent::PassThroughStarted {
            collider: collider_key(collider),
            release: release.kind(),
        });
        true
    }

    /// Whether collision with `collider` is currently suppressed
    pub fn is_ignoring(&self, collider: ColliderHandle) -> bool {
        self.pending.iter().any(|s| s.collider == collider)
    }

    /// Number of outstanding suppressions
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Advance timers and release every entry whose condition holds
    pub fn update(&mut self, oracle: &mut dyn CollisionOracle, dt: f32) {
        if self.pending.is_empty() {
            return;
        }

        let feet_y = oracle.feet_position().y;
        let mut i = 0;
        while i < self.pending.len() {
            let entry = &mut self.pending[i];
            let due = match &mut entry.release {
                Release::AboveY(threshold) => feet_y > *threshold,
                Release::After { duration, elapsed } => {
                    *elapsed += dt;
                    *elapsed + DURATION_EPSILON >= *duration
                }
            };

            if due {
                let entry = self.pending.swap_remove(i);
                self.restore(oracle, entry.collider);
            } else {
                i += 1;
            }
        }
    }

    fn restore(&self, oracle: &mut dyn CollisionOracle, collider: ColliderHandle) {
        let key = collider_key(collider);
        if !oracle.collider_exists(collider) {
            self.sink
                .record(MovementEvent::PassThroughStale { collider: key });
            return;
        }
        oracle.set_collision_enabled(collider, true);
        self.sink
            .record(MovementEvent::PassThroughReleased { collider: key });
    }
}
