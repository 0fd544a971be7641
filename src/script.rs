//! Scripted intent for the sandbox run

use skitter_game::{InputAction, IntentFrame};

/// Intent held from `at` seconds until the next cue
#[derive(Debug, Clone)]
pub struct Cue {
    pub at: f64,
    pub label: &'static str,
    pub frame: IntentFrame,
}

/// Cues ordered by start time
#[derive(Debug, Clone, Default)]
pub struct Script {
    cues: Vec<Cue>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cue; cues must be added in time order
    pub fn then(mut self, at: f64, label: &'static str, frame: IntentFrame) -> Self {
        debug_assert!(self.cues.last().map_or(true, |c| c.at <= at));
        self.cues.push(Cue { at, label, frame });
        self
    }

    /// The cue active at `time`
    pub fn cue_at(&self, time: f64) -> Option<&Cue> {
        self.cues.iter().rev().find(|c| c.at <= time)
    }

    /// Jump up through the one-way platform, drop back down, hop onto the
    /// ladder, climb it and glide down from the top
    ///
    /// Timings assume the default tuning and the sandbox level: the platform
    /// spans x 2..8 just above head height and the ladder spans x -4..-2.
    pub fn tour() -> Self {
        let right = IntentFrame::new().with_move(1.0, 0.0);
        let left = IntentFrame::new().with_move(-1.0, 0.0);
        let up = IntentFrame::new().with_move(0.0, 1.0);

        Self::new()
            .then(0.0, "settle", IntentFrame::new())
            .then(0.5, "walk under platform", right.clone())
            .then(1.2, "jump up through", right.holding(InputAction::Jump))
            .then(1.3, "land on platform", IntentFrame::new())
            .then(
                2.5,
                "drop through",
                IntentFrame::new()
                    .with_move(0.0, -1.0)
                    .holding(InputAction::Jump),
            )
            .then(2.6, "land", IntentFrame::new())
            .then(3.2, "walk to ladder", left.clone())
            .then(4.0, "sprint to ladder", left.holding(InputAction::Sprint))
            // Grounded climbers fall back to locomotion, so grab mid-hop
            .then(4.4, "hop", IntentFrame::new().holding(InputAction::Jump))
            .then(4.5, "grab ladder", up.clone().holding(InputAction::Climb))
            .then(4.55, "climb up", up)
            .then(5.5, "let go", IntentFrame::new().holding(InputAction::Climb))
            .then(5.6, "glide", IntentFrame::new().holding(InputAction::Jump))
            .then(8.0, "idle", IntentFrame::new())
    }
}
