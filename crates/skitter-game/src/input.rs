//! Intent input with per-tick edge detection
//!
//! The movement core never reads device state. Whatever binds devices
//! produces an [`IntentFrame`] every tick: the held actions and a 2D move
//! vector. [`IntentTracker`] keeps the previous tick's held set and derives
//! press/release edges from the difference, so no callbacks are registered
//! anywhere.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Squared move magnitude above which the character counts as moving
const MOVE_EPSILON_SQ: f32 = 0.0001;

/// Named intents that can be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputAction {
    /// Jump (also drives gliding while held in the air)
    Jump,
    /// Dedicated glide control
    Glide,
    /// Sprint modifier
    Sprint,
    /// Crawl/crouch modifier
    Crawl,
    /// Attach to / detach from a climbable
    Climb,
}

impl InputAction {
    pub const ALL: [InputAction; 5] = [
        InputAction::Jump,
        InputAction::Glide,
        InputAction::Sprint,
        InputAction::Crawl,
        InputAction::Climb,
    ];
}

/// What the intent source reports for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentFrame {
    /// Move vector, x = horizontal, y = vertical (climb / drop)
    pub move_axis: Vec2,
    /// Actions currently held
    pub held: HashSet<InputAction>,
}

impl IntentFrame {
    /// An idle frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the move vector
    pub fn with_move(mut self, x: f32, y: f32) -> Self {
        self.move_axis = Vec2::new(x, y);
        self
    }

    /// Builder: hold an action
    pub fn holding(mut self, action: InputAction) -> Self {
        self.held.insert(action);
        self
    }
}

/// Input state for one tick, including edges
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Actions currently held down
    pub held: HashSet<InputAction>,
    /// Actions that were pressed this tick
    pub just_pressed: HashSet<InputAction>,
    /// Actions that were released this tick
    pub just_released: HashSet<InputAction>,
    /// Move vector for this tick
    pub move_axis: Vec2,
}

impl InputState {
    /// Create a new empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if an action is currently held
    pub fn is_held(&self, action: InputAction) -> bool {
        self.held.contains(&action)
    }

    /// Check if an action was pressed this tick
    pub fn is_just_pressed(&self, action: InputAction) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Check if an action was released this tick
    pub fn is_just_released(&self, action: InputAction) -> bool {
        self.just_released.contains(&action)
    }

    /// Whether the move vector is non-zero
    pub fn is_moving(&self) -> bool {
        self.move_axis.length_squared() > MOVE_EPSILON_SQ
    }

    /// Down + jump or crawl + jump: the "drop through" chord
    pub fn drop_chord(&self, down_threshold: f32) -> bool {
        self.is_held(InputAction::Crawl) || self.move_axis.y <= -down_threshold
    }

    /// Clear tick-specific data
    pub fn clear_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }

    /// Clear all input state
    pub fn clear_all(&mut self) {
        self.held.clear();
        self.clear_frame();
        self.move_axis = Vec2::ZERO;
    }
}

/// Per-binding intent context: turns successive frames into edges
///
/// One tracker per character binding; nothing is shared globally.
#[derive(Debug, Default)]
pub struct IntentTracker {
    state: InputState,
}

impl IntentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff `frame` against the previous tick and return the new state
    pub fn advance(&mut self, frame: &IntentFrame) -> &InputState {
        self.state.clear_frame();

        for action in InputAction::ALL {
            let was = self.state.held.contains(&action);
            let is = frame.held.contains(&action);
            match (was, is) {
                (false, true) => {
                    self.state.just_pressed.insert(action);
                }
                (true, false) => {
                    self.state.just_released.insert(action);
                }
                _ => {}
            }
        }

        self.state.held.clone_from(&frame.held);
        self.state.move_axis = frame.move_axis;
        &self.state
    }

    /// The state produced by the last [`advance`](Self::advance)
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Forget all held actions (e.g. when the binding is dropped)
    pub fn reset(&mut self) {
        self.state.clear_all();
    }
}
