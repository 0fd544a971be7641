//! Structured movement events
//!
//! Motor, brain and pass-through report what they decide through an
//! [`EventSink`] instead of formatted log lines. The default sink forwards to
//! `tracing`; tests and the sandbox record events for inspection.

use std::sync::Arc;

use parking_lot::Mutex;
use rapier3d::prelude::ColliderHandle;
use serde::Serialize;
use skitter_core::EntityId;
use tracing::{debug, info, warn};

use crate::player::{MotorMode, PlayerState};

/// Serializable collider reference (index, generation)
pub type ColliderKey = (u32, u32);

/// Convert a collider handle into its serializable key
pub fn collider_key(handle: ColliderHandle) -> ColliderKey {
    handle.into_raw_parts()
}

/// Why gravity/terminal were overwritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityCause {
    Mode(MotorMode),
    GlideEnded,
    ClimbEnded,
    Jump,
    GroundedReset,
    External,
}

/// How a pass-through suppression is released
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseKind {
    /// Once the feet rise above `threshold_y`
    Above { threshold_y: f32 },
    /// After `duration` seconds
    After { duration: f32 },
}

/// Why a drop-through attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropRejection {
    NotGrounded,
    NoPlatform,
}

/// Everything observable the movement core does
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MovementEvent {
    ModeEntered {
        mode: MotorMode,
    },
    GlideRejected,
    GlideEndedOnLanding,
    GravityChanged {
        gravity: f32,
        terminal: f32,
        cause: GravityCause,
    },
    GravityMismatch {
        gravity: f32,
        terminal: f32,
    },
    Jumped {
        velocity_y: f32,
    },
    JumpIgnored,
    JumpCut {
        from: f32,
        to: f32,
    },
    PlatformPreOpened {
        platform: EntityId,
    },
    UndersidePassGranted {
        platform: EntityId,
    },
    DroppedThrough {
        platform: EntityId,
        duration: f32,
    },
    DropRejected {
        reason: DropRejection,
    },
    PassThroughStarted {
        collider: ColliderKey,
        release: ReleaseKind,
    },
    PassThroughAlreadyActive {
        collider: ColliderKey,
    },
    PassThroughReleased {
        collider: ColliderKey,
    },
    PassThroughStale {
        collider: ColliderKey,
    },
    ClimbCandidateSet {
        climbable: EntityId,
    },
    ClimbCandidateCleared {
        climbable: EntityId,
    },
    StateExited {
        state: PlayerState,
    },
    StateEntered {
        state: PlayerState,
    },
}

/// Receives movement events
pub trait EventSink: Send + Sync {
    fn record(&self, event: MovementEvent);
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn EventSink>;

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: MovementEvent) {
        match &event {
            MovementEvent::GravityMismatch { .. } | MovementEvent::PassThroughStale { .. } => {
                warn!(?event, "movement")
            }
            MovementEvent::StateEntered { .. }
            | MovementEvent::DroppedThrough { .. }
            | MovementEvent::PlatformPreOpened { .. }
            | MovementEvent::UndersidePassGranted { .. } => info!(?event, "movement"),
            _ => debug!(?event, "movement"),
        }
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: MovementEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MovementEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<MovementEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<MovementEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Whether any recorded event satisfies `pred`
    pub fn any(&self, pred: impl Fn(&MovementEvent) -> bool) -> bool {
        self.events.lock().iter().any(pred)
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: MovementEvent) {
        self.events.lock().push(event);
    }
}

/// The default sink: tracing output
pub fn tracing_sink() -> SharedSink {
    Arc::new(TracingSink)
}
