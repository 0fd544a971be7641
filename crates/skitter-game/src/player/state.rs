//! Player movement states and the machine that switches between them
//!
//! The state set is closed. Each variant maps to a static table of three
//! hooks; the machine calls `exit` on the old state before `enter` on the new
//! one, and `update` once per tick before transitions are evaluated.

use serde::{Deserialize, Serialize};

use skitter_physics::CollisionOracle;

use crate::events::{MovementEvent, SharedSink};
use crate::input::InputState;

use super::motor::Motor;

/// The character's current movement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Walk,
    Sprint,
    Crouch,
    Jump,
    Air,
    Glide,
    Climb,
}

impl PlayerState {
    pub const ALL: [PlayerState; 8] = [
        PlayerState::Idle,
        PlayerState::Walk,
        PlayerState::Sprint,
        PlayerState::Crouch,
        PlayerState::Jump,
        PlayerState::Air,
        PlayerState::Glide,
        PlayerState::Climb,
    ];

    /// Standing states a jump can start from
    pub fn is_grounded_locomotion(self) -> bool {
        matches!(
            self,
            PlayerState::Idle | PlayerState::Walk | PlayerState::Sprint | PlayerState::Crouch
        )
    }

    /// States the airborne fallback leaves alone
    pub fn is_airborne(self) -> bool {
        matches!(
            self,
            PlayerState::Jump | PlayerState::Air | PlayerState::Glide | PlayerState::Climb
        )
    }

    pub fn hooks(self) -> &'static StateHooks {
        match self {
            PlayerState::Idle => &IDLE,
            PlayerState::Walk => &WALK,
            PlayerState::Sprint => &SPRINT,
            PlayerState::Crouch => &CROUCH,
            PlayerState::Jump => &JUMP,
            PlayerState::Air => &AIR,
            PlayerState::Glide => &GLIDE,
            PlayerState::Climb => &CLIMB,
        }
    }
}

/// Everything a state hook may touch during one call
pub struct StateContext<'a> {
    pub motor: &'a mut Motor,
    pub oracle: &'a mut dyn CollisionOracle,
    pub input: &'a InputState,
}

pub type Hook = fn(&mut StateContext<'_>);

/// Lifecycle hooks of one state
pub struct StateHooks {
    pub enter: Hook,
    pub update: Hook,
    pub exit: Hook,
}

fn noop(_: &mut StateContext<'_>) {}

fn steer(ctx: &mut StateContext<'_>) {
    ctx.motor.set_horizontal_input(ctx.input.move_axis.x);
}

fn release_steering(ctx: &mut StateContext<'_>) {
    ctx.motor.set_horizontal_input(0.0);
}

fn stop_steering(ctx: &mut StateContext<'_>) {
    ctx.motor.set_horizontal_input(0.0);
    ctx.motor.zero_horizontal();
}

static IDLE: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_walk();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: noop,
    exit: noop,
};

static WALK: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_walk();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: stop_steering,
};

static SPRINT: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_sprint();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: stop_steering,
};

static CROUCH: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_crouch();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: stop_steering,
};

static JUMP: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.jump(ctx.oracle);
        ctx.motor.enter_air_move();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: release_steering,
};

static AIR: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_air_move();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: release_steering,
};

static GLIDE: StateHooks = StateHooks {
    enter: |ctx| {
        ctx.motor.enter_glide();
        ctx.motor.set_horizontal_input(0.0);
    },
    update: steer,
    exit: |ctx| {
        ctx.motor.exit_glide();
        ctx.motor.set_horizontal_input(0.0);
    },
};

static CLIMB: StateHooks = StateHooks {
    enter: |ctx| ctx.motor.enter_climb(),
    update: |ctx| {
        ctx.motor.set_vertical_climb_input(ctx.input.move_axis.y);
        ctx.motor.set_horizontal_input(0.0);
    },
    exit: |ctx| {
        ctx.motor.exit_climb();
        ctx.motor.set_vertical_climb_input(0.0);
    },
};

/// Holds exactly one current state once initialized
pub struct StateMachine {
    current: Option<PlayerState>,
    sink: SharedSink,
}

impl StateMachine {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            current: None,
            sink,
        }
    }

    pub fn current(&self) -> Option<PlayerState> {
        self.current
    }

    /// Whether `state` is the current state
    pub fn is(&self, state: PlayerState) -> bool {
        self.current == Some(state)
    }

    /// Enter the starting state without exiting anything
    pub fn initialize(&mut self, state: PlayerState, ctx: &mut StateContext<'_>) {
        self.current = Some(state);
        (state.hooks().enter)(ctx);
        self.sink.record(MovementEvent::StateEntered { state });
    }

    /// Fully exit the current state, then enter `next`
    ///
    /// Changing to the current state does nothing.
    pub fn change_state(&mut self, next: PlayerState, ctx: &mut StateContext<'_>) {
        if let Some(prev) = self.current {
            if prev == next {
                return;
            }
            (prev.hooks().exit)(ctx);
            self.sink.record(MovementEvent::StateExited { state: prev });
        }
        self.current = Some(next);
        (next.hooks().enter)(ctx);
        self.sink.record(MovementEvent::StateEntered { state: next });
    }

    /// Run the current state's per-tick hook
    pub fn update(&mut self, ctx: &mut StateContext<'_>) {
        if let Some(state) = self.current {
            (state.hooks().update)(ctx);
        }
    }
}
