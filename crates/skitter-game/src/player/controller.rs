//! Player controller: one character's intent, brain and motor

use serde::{Deserialize, Serialize};

use skitter_physics::{CollisionOracle, MoveOutcome};

use crate::climb::{ClimbTriggerTracker, ClimbableSet};
use crate::error::ConfigError;
use crate::events::SharedSink;
use crate::input::{InputState, IntentFrame, IntentTracker};

use super::brain::{Brain, BrainConfig};
use super::motor::Motor;
use super::movement::MovementConfig;
use super::platform_pass::PassThroughConfig;
use super::state::PlayerState;

/// All tuning for one character
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub movement: MovementConfig,
    pub pass_through: PassThroughConfig,
    pub brain: BrainConfig,
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.movement.validate()?;
        self.brain.validate()?;
        if self.pass_through.cross_buffer < 0.0 {
            return Err(ConfigError::NegativeSpeed {
                name: "cross_buffer",
                value: self.pass_through.cross_buffer,
            });
        }
        Ok(())
    }
}

/// Drives one character through fixed ticks
///
/// Per tick: diff intent, run the brain, integrate and move, poll pass-through
/// releases, then sync climbable trigger overlaps for the next tick. The
/// first tick only moves the body and enters Idle.
pub struct PlayerController {
    tracker: IntentTracker,
    brain: Brain,
    motor: Motor,
    climb_tracker: ClimbTriggerTracker,
    /// Seconds of simulated time
    clock: f64,
    started: bool,
}

impl PlayerController {
    pub fn new(config: PlayerConfig, sink: SharedSink) -> Self {
        Self {
            tracker: IntentTracker::new(),
            brain: Brain::new(config.brain, sink.clone()),
            motor: Motor::new(config.movement, config.pass_through, sink),
            climb_tracker: ClimbTriggerTracker::new(),
            clock: 0.0,
            started: false,
        }
    }

    /// Validate `config` before building the controller
    pub fn try_new(config: PlayerConfig, sink: SharedSink) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, sink))
    }

    /// Advance one fixed step
    pub fn fixed_update(
        &mut self,
        oracle: &mut dyn CollisionOracle,
        climbables: &ClimbableSet,
        frame: &IntentFrame,
        dt: f32,
    ) -> MoveOutcome {
        self.clock += f64::from(dt);
        let input = self.tracker.advance(frame);

        let outcome = if self.started {
            self.brain.update(&mut self.motor, oracle, input, self.clock);
            let outcome = self.motor.tick(oracle, dt);
            self.motor.update_pass_through(oracle, dt);
            outcome
        } else {
            // Settle against the world first so Idle starts from a real
            // grounded reading
            let outcome = self.motor.tick(oracle, dt);
            self.brain.start(&mut self.motor, oracle, input);
            self.started = true;
            outcome
        };

        let overlapping = oracle.overlapping_triggers();
        self.climb_tracker
            .sync(climbables, &overlapping, &mut self.motor);

        outcome
    }

    /// Current state; `None` before the first tick
    pub fn state(&self) -> Option<PlayerState> {
        self.brain.current_state()
    }

    pub fn motor(&self) -> &Motor {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut Motor {
        &mut self.motor
    }

    pub fn input(&self) -> &InputState {
        self.tracker.state()
    }

    /// Forget held intents, e.g. when the input binding is dropped
    pub fn release_input(&mut self) {
        self.tracker.reset();
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }
}
