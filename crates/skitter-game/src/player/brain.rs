//! Transition rules between movement states
//!
//! Evaluated once per tick, in order: the current state's update hook, then
//! the airborne, climb, jump/drop and grounded-locomotion rule classes. A
//! class that changes state ends evaluation for the tick.

use serde::{Deserialize, Serialize};

use skitter_physics::CollisionOracle;

use crate::error::ConfigError;
use crate::events::SharedSink;
use crate::input::{InputAction, InputState};

use super::motor::Motor;
use super::state::{PlayerState, StateContext, StateMachine};

/// Brain tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Seconds jump must be held after the press before gliding engages
    pub glide_hold_time: f32,
    /// Only glide while not ascending
    pub glide_requires_descent: bool,
    /// How far down the move stick must be pushed for the drop chord
    pub drop_chord_threshold: f32,
    /// Halve upward speed when jump is released during the Jump state
    pub cut_jump_on_release: bool,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            glide_hold_time: 0.08,
            glide_requires_descent: true,
            drop_chord_threshold: 0.5,
            cut_jump_on_release: false,
        }
    }
}

impl BrainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.glide_hold_time < 0.0 {
            return Err(ConfigError::NegativeSpeed {
                name: "glide_hold_time",
                value: self.glide_hold_time,
            });
        }
        if !(0.0..=1.0).contains(&self.drop_chord_threshold) {
            return Err(ConfigError::OutOfUnitRange {
                name: "drop_chord_threshold",
                value: self.drop_chord_threshold,
            });
        }
        Ok(())
    }
}

/// Interprets intent and drives the motor through state changes
pub struct Brain {
    config: BrainConfig,
    machine: StateMachine,
    /// Clock value of the latest jump press
    last_jump_press: f64,
}

impl Brain {
    pub fn new(config: BrainConfig, sink: SharedSink) -> Self {
        Self {
            config,
            machine: StateMachine::new(sink),
            last_jump_press: f64::NEG_INFINITY,
        }
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn current_state(&self) -> Option<PlayerState> {
        self.machine.current()
    }

    /// Enter Idle
    pub fn start(&mut self, motor: &mut Motor, oracle: &mut dyn CollisionOracle, input: &InputState) {
        let mut ctx = StateContext {
            motor,
            oracle,
            input,
        };
        self.machine.initialize(PlayerState::Idle, &mut ctx);
    }

    fn glide_hold_satisfied(&self, motor: &Motor, input: &InputState, now: f64) -> bool {
        if motor.is_grounded() || !input.is_held(InputAction::Jump) {
            return false;
        }
        let held_for = now - self.last_jump_press;
        if held_for < f64::from(self.config.glide_hold_time) {
            return false;
        }
        !(self.config.glide_requires_descent && motor.vertical_speed() > 0.0)
    }

    /// Run one tick of transition evaluation
    ///
    /// `now` is the caller's clock in seconds; only differences matter.
    pub fn update(
        &mut self,
        motor: &mut Motor,
        oracle: &mut dyn CollisionOracle,
        input: &InputState,
        now: f64,
    ) {
        if input.is_just_pressed(InputAction::Jump) {
            self.last_jump_press = now;
        }

        let mut ctx = StateContext {
            motor,
            oracle,
            input,
        };
        self.machine.update(&mut ctx);

        if !ctx.motor.is_grounded() && self.airborne_transition(&mut ctx, now) {
            return;
        }

        if input.is_just_pressed(InputAction::Climb) && self.climb_transition(&mut ctx) {
            return;
        }

        if input.is_just_pressed(InputAction::Jump) && self.jump_transition(&mut ctx) {
            return;
        }

        if self.config.cut_jump_on_release
            && input.is_just_released(InputAction::Jump)
            && self.machine.is(PlayerState::Jump)
        {
            ctx.motor.jump_cut();
        }

        self.locomotion_transition(&mut ctx);
    }

    fn airborne_transition(&mut self, ctx: &mut StateContext<'_>, now: f64) -> bool {
        let gliding = self.machine.is(PlayerState::Glide);

        let next = if !gliding && self.glide_hold_satisfied(ctx.motor, ctx.input, now) {
            PlayerState::Glide
        } else if gliding && !ctx.input.is_held(InputAction::Jump) {
            PlayerState::Air
        } else if !self.machine.current().is_some_and(PlayerState::is_airborne) {
            PlayerState::Air
        } else {
            return false;
        };

        self.machine.change_state(next, ctx);
        true
    }

    /// Attach with a candidate, or toggle off when already climbing
    fn climb_transition(&mut self, ctx: &mut StateContext<'_>) -> bool {
        let next = if self.machine.is(PlayerState::Climb) {
            PlayerState::Air
        } else if ctx.motor.has_climb_candidate() {
            PlayerState::Climb
        } else {
            return false;
        };
        self.machine.change_state(next, ctx);
        true
    }

    fn jump_transition(&mut self, ctx: &mut StateContext<'_>) -> bool {
        if ctx.input.drop_chord(self.config.drop_chord_threshold) {
            let duration = ctx.motor.config().drop_through_duration;
            // The press is consumed; the motor's nudge carries the body down
            if ctx.motor.try_drop_through(ctx.oracle, duration) {
                return true;
            }
        }

        let can_jump = ctx.motor.is_grounded()
            && self
                .machine
                .current()
                .is_some_and(PlayerState::is_grounded_locomotion);
        if !can_jump {
            return false;
        }
        self.machine.change_state(PlayerState::Jump, ctx);
        true
    }

    fn locomotion_transition(&mut self, ctx: &mut StateContext<'_>) {
        let in_locomotion = matches!(
            self.machine.current(),
            Some(PlayerState::Walk | PlayerState::Sprint | PlayerState::Crouch)
        );
        if !ctx.motor.is_grounded() && !in_locomotion {
            return;
        }

        let moving = ctx.input.is_moving();
        let next = if ctx.input.is_held(InputAction::Crawl) {
            PlayerState::Crouch
        } else if moving && ctx.input.is_held(InputAction::Sprint) {
            PlayerState::Sprint
        } else if moving {
            PlayerState::Walk
        } else {
            PlayerState::Idle
        };

        if !self.machine.is(next) {
            self.machine.change_state(next, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::climb::{ClimbType, Climbable};
    use crate::events::{MovementEvent, RecordingSink};
    use crate::input::{IntentFrame, IntentTracker};
    use crate::player::{MovementConfig, PassThroughConfig};
    use crate::test_support::{handle, platform, ScriptedOracle};

    const DT: f32 = 1.0 / 60.0;

    /// Brain, motor and oracle stepped together the way the controller does
    struct Rig {
        brain: Brain,
        motor: Motor,
        oracle: ScriptedOracle,
        tracker: IntentTracker,
        sink: Arc<RecordingSink>,
        now: f64,
    }

    impl Rig {
        fn new(grounded: bool) -> Self {
            Self::with_config(BrainConfig::default(), grounded)
        }

        fn with_config(config: BrainConfig, grounded: bool) -> Self {
            let sink = Arc::new(RecordingSink::new());
            let mut motor = Motor::new(
                MovementConfig::default(),
                PassThroughConfig::default(),
                sink.clone(),
            );
            let mut oracle = ScriptedOracle::new();
            oracle.grounded = grounded;
            motor.tick(&mut oracle, DT);

            let tracker = IntentTracker::new();
            let mut brain = Brain::new(config, sink.clone());
            brain.start(&mut motor, &mut oracle, tracker.state());
            sink.take();
            Self {
                brain,
                motor,
                oracle,
                tracker,
                sink,
                now: 0.0,
            }
        }

        /// Brain only, no motor integration
        fn think(&mut self, frame: &IntentFrame) {
            self.now += f64::from(DT);
            let input = self.tracker.advance(frame);
            self.brain
                .update(&mut self.motor, &mut self.oracle, input, self.now);
        }

        /// Brain, motor tick and pass-through poll
        fn step(&mut self, frame: &IntentFrame) {
            self.think(frame);
            self.motor.tick(&mut self.oracle, DT);
            self.motor.update_pass_through(&mut self.oracle, DT);
        }

        fn state(&self) -> Option<PlayerState> {
            self.brain.current_state()
        }
    }

    fn jump() -> IntentFrame {
        IntentFrame::new().holding(InputAction::Jump)
    }

    fn climb() -> IntentFrame {
        IntentFrame::new().holding(InputAction::Climb)
    }

    #[test]
    fn test_starts_idle() {
        let rig = Rig::new(true);
        assert_eq!(rig.state(), Some(PlayerState::Idle));
    }

    #[test]
    fn test_idle_to_walk() {
        let mut rig = Rig::new(true);
        let right = IntentFrame::new().with_move(1.0, 0.0);

        rig.step(&right);
        assert_eq!(rig.state(), Some(PlayerState::Walk));

        // Walk's update hook steers from the following tick on
        rig.step(&right);
        assert_eq!(rig.motor.velocity().x, 4.0);
    }

    #[test]
    fn test_locomotion_priority() {
        let mut rig = Rig::new(true);

        let sprint = IntentFrame::new()
            .with_move(1.0, 0.0)
            .holding(InputAction::Sprint);
        rig.step(&sprint);
        assert_eq!(rig.state(), Some(PlayerState::Sprint));
        rig.step(&sprint);
        assert_eq!(rig.motor.velocity().x, 7.0);

        // Crouch wins over sprint
        rig.step(
            &IntentFrame::new()
                .with_move(1.0, 0.0)
                .holding(InputAction::Sprint)
                .holding(InputAction::Crawl),
        );
        assert_eq!(rig.state(), Some(PlayerState::Crouch));

        // Crouching in place stays crouched
        rig.step(&IntentFrame::new().holding(InputAction::Crawl));
        assert_eq!(rig.state(), Some(PlayerState::Crouch));

        rig.step(&IntentFrame::new());
        assert_eq!(rig.state(), Some(PlayerState::Idle));
    }

    #[test]
    fn test_walk_to_jump() {
        let mut rig = Rig::new(true);
        rig.step(&IntentFrame::new().with_move(1.0, 0.0));

        rig.think(&jump().with_move(1.0, 0.0));

        assert_eq!(rig.state(), Some(PlayerState::Jump));
        assert!((rig.motor.vertical_speed() - 11.49).abs() < 0.01);
        assert_eq!(rig.motor.mode(), crate::player::MotorMode::AirMove);
    }

    #[test]
    fn test_airborne_jump_press_is_ignored() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        assert_eq!(rig.state(), Some(PlayerState::Air));
        let vy = rig.motor.vertical_speed();

        rig.think(&jump());

        assert_eq!(rig.state(), Some(PlayerState::Air));
        assert_eq!(rig.motor.vertical_speed(), vy);
    }

    #[test]
    fn test_glide_after_hold_while_descending() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        rig.motor.force_velocity(Vec3::new(0.0, -5.0, 0.0));

        // Press edge; dwell not yet met
        rig.think(&jump());
        assert_eq!(rig.state(), Some(PlayerState::Air));

        // 1/60 s per think; the dwell threshold is 0.08 s
        for _ in 0..4 {
            rig.think(&jump());
            assert_eq!(rig.state(), Some(PlayerState::Air));
        }
        rig.think(&jump());

        assert_eq!(rig.state(), Some(PlayerState::Glide));
        assert!(rig.motor.is_gliding());
        assert_eq!(rig.motor.gravity().0, -6.0);
        assert_eq!(rig.motor.vertical_speed(), -5.0);
    }

    #[test]
    fn test_glide_requires_descent() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        rig.motor.force_velocity(Vec3::new(0.0, 3.0, 0.0));

        for _ in 0..10 {
            rig.think(&jump());
        }
        assert_eq!(rig.state(), Some(PlayerState::Air));

        let config = BrainConfig {
            glide_requires_descent: false,
            ..Default::default()
        };
        let mut rig = Rig::with_config(config, false);
        rig.step(&IntentFrame::new());
        rig.motor.force_velocity(Vec3::new(0.0, 3.0, 0.0));
        for _ in 0..10 {
            rig.think(&jump());
        }
        assert_eq!(rig.state(), Some(PlayerState::Glide));
        assert_eq!(rig.motor.vertical_speed(), 0.0);
    }

    #[test]
    fn test_releasing_jump_ends_glide() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        for _ in 0..10 {
            rig.think(&jump());
        }
        assert_eq!(rig.state(), Some(PlayerState::Glide));

        rig.think(&IntentFrame::new());

        assert_eq!(rig.state(), Some(PlayerState::Air));
        assert!(!rig.motor.is_gliding());
        assert_eq!(rig.motor.gravity(), (-30.0, -40.0));
    }

    #[test]
    fn test_landing_from_glide() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        for _ in 0..10 {
            rig.step(&jump());
        }
        assert_eq!(rig.state(), Some(PlayerState::Glide));

        rig.oracle.grounded = true;
        rig.step(&jump());
        assert!(!rig.motor.is_gliding());
        assert_eq!(rig.motor.gravity(), (-30.0, -40.0));

        // Next evaluation sees the ground and settles into locomotion
        rig.step(&jump());
        assert_eq!(rig.state(), Some(PlayerState::Idle));
    }

    #[test]
    fn test_drop_chord_consumes_jump_press() {
        let mut rig = Rig::new(true);
        let slab = handle(3);
        rig.oracle.add_platform(platform(slab, 0.0, false, true));
        rig.oracle.overlap = vec![slab];

        rig.think(&jump().with_move(0.0, -1.0));

        assert_eq!(rig.state(), Some(PlayerState::Idle));
        assert!(rig.motor.vertical_speed() <= -5.0);
        assert!(rig.motor.platform_pass().is_ignoring(slab));
        assert!(!rig
            .sink
            .any(|e| matches!(e, MovementEvent::StateEntered { .. })));
    }

    #[test]
    fn test_failed_drop_falls_back_to_jump() {
        let mut rig = Rig::new(true);
        rig.think(&jump().holding(InputAction::Crawl));
        assert_eq!(rig.state(), Some(PlayerState::Jump));
    }

    #[test]
    fn test_climb_toggle() {
        let mut rig = Rig::new(false);
        rig.step(&IntentFrame::new());
        let ladder = Arc::new(Climbable::new("ladder", ClimbType::Ladder));
        rig.motor.set_climb_candidate(&ladder);

        rig.think(&climb());
        assert_eq!(rig.state(), Some(PlayerState::Climb));
        assert!(rig.motor.is_climbing());
        assert_eq!(rig.motor.vertical_speed(), 0.0);

        for _ in 0..5 {
            rig.step(&IntentFrame::new());
            assert_eq!(rig.motor.vertical_speed(), 0.0);
        }

        rig.think(&climb());
        assert_eq!(rig.state(), Some(PlayerState::Air));
        assert!(!rig.motor.is_climbing());
        assert_eq!(rig.motor.gravity(), (-30.0, -40.0));
    }

    #[test]
    fn test_climb_press_without_candidate() {
        let mut rig = Rig::new(true);
        rig.think(&climb());
        assert_eq!(rig.state(), Some(PlayerState::Idle));
    }

    #[test]
    fn test_jump_cut_on_release() {
        let config = BrainConfig {
            cut_jump_on_release: true,
            ..Default::default()
        };
        let mut rig = Rig::with_config(config, true);
        rig.think(&jump());
        let launch = rig.motor.vertical_speed();

        rig.oracle.grounded = false;
        rig.motor.tick(&mut rig.oracle, DT);
        rig.motor.tick(&mut rig.oracle, DT);
        let before = rig.motor.vertical_speed();
        rig.think(&IntentFrame::new());

        assert!(before < launch);
        assert_eq!(rig.motor.vertical_speed(), before * 0.5);
    }

    #[test]
    fn test_validate() {
        assert!(BrainConfig::default().validate().is_ok());
        let config = BrainConfig {
            drop_chord_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
