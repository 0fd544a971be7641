//! Skitter Game - platformer movement
//!
//! Intent tracking, the movement brain and motor, one-way platform
//! pass-through and climbable surfaces.

pub mod climb;
pub mod error;
pub mod events;
pub mod input;
pub mod player;

#[cfg(test)]
mod test_support;

pub use climb::{ClimbTriggerTracker, ClimbType, Climbable, ClimbableSet};
pub use error::ConfigError;
pub use events::{
    tracing_sink, EventSink, MovementEvent, NullSink, RecordingSink, SharedSink, TracingSink,
};
pub use input::{InputAction, InputState, IntentFrame, IntentTracker};
pub use player::{
    Brain, BrainConfig, Motor, MotorMode, MotorSnapshot, MovementConfig, PassThroughConfig,
    PlayerConfig, PlayerController, PlayerState,
};
