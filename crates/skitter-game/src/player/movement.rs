//! Movement configuration and constants

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// World axis that carries horizontal movement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAxis {
    #[default]
    X,
    Z,
}

/// Movement tuning for the motor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Which world axis horizontal input drives
    pub horizontal_axis: HorizontalAxis,
    /// Walking speed cap in meters per second
    pub walk_speed: f32,
    /// Sprinting speed cap
    pub sprint_speed: f32,
    /// Crouching speed cap
    pub crouch_speed: f32,
    /// Horizontal speed cap while airborne
    pub air_move_speed: f32,
    /// Horizontal speed cap while gliding
    pub glide_horizontal_speed: f32,
    /// Vertical speed while climbing at full input
    pub climb_speed: f32,
    /// Horizontal speed cap while attached to a climbable
    pub climb_horizontal_speed: f32,
    /// Apex height of a jump in meters
    pub jump_height: f32,
    /// Baseline gravity (negative = down)
    pub normal_gravity: f32,
    /// Gravity while gliding
    pub glide_gravity: f32,
    /// Baseline terminal fall speed (negative)
    pub terminal_fall_speed: f32,
    /// Terminal fall speed while gliding (negative)
    pub glide_fall_speed: f32,
    /// Vertical speed held while grounded to keep contact
    pub ground_stick_speed: f32,
    /// Downward speed applied when dropping through a platform
    pub drop_nudge_speed: f32,
    /// How long a dropped-through platform stays open
    pub drop_through_duration: f32,
    /// Proximity probe tuning
    pub probes: ProbeConfig,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            horizontal_axis: HorizontalAxis::X,
            walk_speed: 4.0,
            sprint_speed: 7.0,
            crouch_speed: 2.0,
            air_move_speed: 4.0,
            glide_horizontal_speed: 3.0,
            climb_speed: 3.0,
            climb_horizontal_speed: 0.0,
            jump_height: 2.2,
            normal_gravity: -30.0,
            glide_gravity: -6.0,
            terminal_fall_speed: -40.0,
            glide_fall_speed: -8.0,
            ground_stick_speed: -2.0,
            drop_nudge_speed: -5.0,
            drop_through_duration: 0.30,
            probes: ProbeConfig::default(),
        }
    }
}

impl MovementConfig {
    /// Launch speed for a jump of `jump_height` under baseline gravity
    pub fn jump_velocity(&self) -> f32 {
        (2.0 * self.normal_gravity.abs() * self.jump_height).sqrt()
    }

    /// Reject tuning the motor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("walk_speed", self.walk_speed),
            ("sprint_speed", self.sprint_speed),
            ("crouch_speed", self.crouch_speed),
            ("air_move_speed", self.air_move_speed),
            ("glide_horizontal_speed", self.glide_horizontal_speed),
            ("climb_speed", self.climb_speed),
            ("climb_horizontal_speed", self.climb_horizontal_speed),
            ("drop_through_duration", self.drop_through_duration),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeSpeed { name, value });
            }
        }

        for (name, value) in [
            ("normal_gravity", self.normal_gravity),
            ("glide_gravity", self.glide_gravity),
            ("terminal_fall_speed", self.terminal_fall_speed),
            ("glide_fall_speed", self.glide_fall_speed),
            ("ground_stick_speed", self.ground_stick_speed),
            ("drop_nudge_speed", self.drop_nudge_speed),
        ] {
            if value >= 0.0 {
                return Err(ConfigError::NotDownward { name, value });
            }
        }

        if self.jump_height <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "jump_height",
                value: self.jump_height,
            });
        }

        if self.glide_fall_speed < self.terminal_fall_speed {
            return Err(ConfigError::GlideFasterThanFall {
                glide: self.glide_fall_speed,
                terminal: self.terminal_fall_speed,
            });
        }

        self.probes.validate()
    }
}

/// Shape and reach of the one-way platform probes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Lift above the feet where the upward jump probe starts
    pub jump_probe_lift: f32,
    /// Jump probe radius as a fraction of the body radius
    pub jump_probe_radius_scale: f32,
    /// How far above the feet the jump probe reaches
    pub jump_probe_distance: f32,
    /// Feet overlap radius as a fraction of the body radius
    pub drop_overlap_radius_scale: f32,
    /// Feet overlap capsule extent above the feet
    pub drop_overlap_up: f32,
    /// Feet overlap capsule extent below the feet
    pub drop_overlap_down: f32,
    /// Lift above the feet where the downward fallback cast starts
    pub drop_probe_lift: f32,
    /// Reach of the downward fallback cast
    pub drop_probe_distance: f32,
    /// Contact normals with a Y below this count as underside hits
    pub underside_normal_y: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            jump_probe_lift: 0.05,
            jump_probe_radius_scale: 0.95,
            jump_probe_distance: 0.4,
            drop_overlap_radius_scale: 0.98,
            drop_overlap_up: 0.02,
            drop_overlap_down: 0.06,
            drop_probe_lift: 0.05,
            drop_probe_distance: 0.6,
            underside_normal_y: -0.5,
        }
    }
}

impl ProbeConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("jump_probe_radius_scale", self.jump_probe_radius_scale),
            ("drop_overlap_radius_scale", self.drop_overlap_radius_scale),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        for (name, value) in [
            ("jump_probe_distance", self.jump_probe_distance),
            ("drop_probe_distance", self.drop_probe_distance),
        ] {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        Ok(())
    }
}
