//! Character motor: velocity integration and movement modes
//!
//! The motor owns velocity and three knobs (horizontal speed cap, gravity,
//! terminal fall speed). Modes rewrite the knobs; [`Motor::tick`] integrates
//! them and submits the displacement to the collision oracle. One-way
//! platform crossings are delegated to the motor's [`PlatformPass`].

use std::sync::{Arc, Weak};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use skitter_physics::{ColliderHandle, CollisionOracle, ContactHit, MoveOutcome, OneWayPlatform};

use crate::climb::Climbable;
use crate::events::{DropRejection, GravityCause, MovementEvent, SharedSink};

use super::movement::{HorizontalAxis, MovementConfig};
use super::platform_pass::{PassThroughConfig, PlatformPass};

/// Exclusive motor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorMode {
    Walk,
    Sprint,
    Crouch,
    AirMove,
    Glide,
    Climb,
}

/// Serializable view of the motor's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotorSnapshot {
    pub mode: MotorMode,
    pub velocity: Vec3,
    pub desired_x: f32,
    pub desired_y: f32,
    pub max_speed: f32,
    pub gravity: f32,
    pub terminal: f32,
    pub grounded: bool,
    pub climbing: bool,
    pub gliding: bool,
    pub suppressed: usize,
}

/// Moves one character body
pub struct Motor {
    config: MovementConfig,
    mode: MotorMode,
    velocity: Vec3,
    desired_x: f32,
    desired_y: f32,
    max_speed: f32,
    gravity: f32,
    terminal: f32,
    climbing: bool,
    gliding: bool,
    /// Result of the most recent move
    grounded: bool,
    /// A drop nudge was applied and must survive the next grounded clamp
    drop_nudge_pending: bool,
    climb_candidate: Weak<Climbable>,
    pass: PlatformPass,
    sink: SharedSink,
}

impl Motor {
    /// Create a motor in walk mode
    pub fn new(config: MovementConfig, pass_config: PassThroughConfig, sink: SharedSink) -> Self {
        let mut motor = Self {
            mode: MotorMode::Walk,
            velocity: Vec3::ZERO,
            desired_x: 0.0,
            desired_y: 0.0,
            max_speed: config.walk_speed,
            gravity: config.normal_gravity,
            terminal: config.terminal_fall_speed,
            climbing: false,
            gliding: false,
            grounded: false,
            drop_nudge_pending: false,
            climb_candidate: Weak::new(),
            pass: PlatformPass::new(pass_config, sink.clone()),
            config,
            sink,
        };
        motor.enter_walk();
        motor
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    // ---- knobs ----

    /// Desired horizontal input for this tick, clamped to [-1, 1]
    pub fn set_horizontal_input(&mut self, x: f32) {
        self.desired_x = x.clamp(-1.0, 1.0);
    }

    /// Desired climb input for this tick, clamped to [-1, 1]
    pub fn set_vertical_climb_input(&mut self, y: f32) {
        self.desired_y = y.clamp(-1.0, 1.0);
    }

    /// Overwrite gravity and terminal fall speed
    pub fn set_gravity(&mut self, gravity: f32, terminal: f32) {
        self.apply_gravity(gravity, terminal, GravityCause::External);
    }

    fn apply_gravity(&mut self, gravity: f32, terminal: f32, cause: GravityCause) {
        self.gravity = gravity;
        self.terminal = terminal;
        self.sink.record(MovementEvent::GravityChanged {
            gravity,
            terminal,
            cause,
        });
    }

    fn baseline_gravity(&mut self, cause: GravityCause) {
        self.apply_gravity(
            self.config.normal_gravity,
            self.config.terminal_fall_speed,
            cause,
        );
    }

    fn gravity_is_baseline(&self) -> bool {
        self.gravity == self.config.normal_gravity && self.terminal == self.config.terminal_fall_speed
    }

    // ---- modes ----

    fn enter_ground_mode(&mut self, mode: MotorMode, speed: f32) {
        self.climbing = false;
        self.gliding = false;
        self.max_speed = speed;
        self.mode = mode;
        self.baseline_gravity(GravityCause::Mode(mode));
        self.sink.record(MovementEvent::ModeEntered { mode });
    }

    pub fn enter_walk(&mut self) {
        self.enter_ground_mode(MotorMode::Walk, self.config.walk_speed);
    }

    pub fn enter_sprint(&mut self) {
        self.enter_ground_mode(MotorMode::Sprint, self.config.sprint_speed);
    }

    pub fn enter_crouch(&mut self) {
        self.enter_ground_mode(MotorMode::Crouch, self.config.crouch_speed);
    }

    /// Airborne steering; keeps whatever gravity is active
    pub fn enter_air_move(&mut self) {
        self.climbing = false;
        self.gliding = false;
        self.max_speed = self.config.air_move_speed;
        self.mode = MotorMode::AirMove;
        self.sink.record(MovementEvent::ModeEntered {
            mode: MotorMode::AirMove,
        });
    }

    /// Start gliding; ignored while grounded
    ///
    /// The current vertical speed is pulled into `[glide_fall_speed, 0]` so a
    /// glide started during a fast fall neither snaps upward nor exceeds the
    /// glide terminal.
    pub fn enter_glide(&mut self) {
        if self.grounded {
            self.sink.record(MovementEvent::GlideRejected);
            return;
        }
        self.climbing = false;
        self.gliding = true;
        self.max_speed = self.config.glide_horizontal_speed;
        self.mode = MotorMode::Glide;
        self.apply_gravity(
            self.config.glide_gravity,
            self.config.glide_fall_speed,
            GravityCause::Mode(MotorMode::Glide),
        );
        self.velocity.y = self.velocity.y.clamp(self.config.glide_fall_speed, 0.0);
        self.sink.record(MovementEvent::ModeEntered {
            mode: MotorMode::Glide,
        });
    }

    pub fn exit_glide(&mut self) {
        self.gliding = false;
        self.baseline_gravity(GravityCause::GlideEnded);
    }

    /// Attach to a climbable: vertical speed zeroed, gravity suspended
    pub fn enter_climb(&mut self) {
        self.gliding = false;
        self.climbing = true;
        self.max_speed = self.config.climb_horizontal_speed;
        self.mode = MotorMode::Climb;
        self.velocity.y = 0.0;
        self.sink.record(MovementEvent::ModeEntered {
            mode: MotorMode::Climb,
        });
    }

    pub fn exit_climb(&mut self) {
        self.climbing = false;
        self.baseline_gravity(GravityCause::ClimbEnded);
        self.desired_y = 0.0;
    }

    // ---- per tick ----

    /// Integrate one tick and move the body
    pub fn tick(&mut self, oracle: &mut dyn CollisionOracle, dt: f32) -> MoveOutcome {
        let horizontal = self.desired_x * self.max_speed;
        match self.config.horizontal_axis {
            HorizontalAxis::X => {
                self.velocity.x = horizontal;
                self.velocity.z = 0.0;
            }
            HorizontalAxis::Z => {
                self.velocity.x = 0.0;
                self.velocity.z = horizontal;
            }
        }

        if self.climbing {
            self.velocity.y = self.desired_y * self.config.climb_speed;
        } else if self.grounded {
            if self.velocity.y < 0.0 && !self.drop_nudge_pending {
                self.velocity.y = self.config.ground_stick_speed;
            }
            self.settle_on_ground();
        } else {
            if self.gliding
                && (self.gravity != self.config.glide_gravity
                    || self.terminal != self.config.glide_fall_speed)
            {
                self.sink.record(MovementEvent::GravityMismatch {
                    gravity: self.gravity,
                    terminal: self.terminal,
                });
            }
            self.velocity.y += self.gravity * dt;
            if self.velocity.y < self.terminal {
                self.velocity.y = self.terminal;
            }
        }
        self.drop_nudge_pending = false;

        let outcome = oracle.move_and_resolve(self.velocity * dt, dt);

        let was_grounded = self.grounded;
        self.grounded = outcome.flags.below;
        if self.grounded && !was_grounded && !self.climbing {
            self.settle_on_ground();
        }

        for contact in &outcome.contacts {
            self.on_contact(oracle, contact);
        }

        outcome
    }

    /// Glide cannot persist on the ground and gravity returns to baseline
    fn settle_on_ground(&mut self) {
        let was_gliding = self.gliding;
        if was_gliding {
            self.gliding = false;
            self.sink.record(MovementEvent::GlideEndedOnLanding);
        }
        if !self.gravity_is_baseline() {
            // Glide gravity is expected here; anything else is drift
            if !was_gliding {
                self.sink.record(MovementEvent::GravityMismatch {
                    gravity: self.gravity,
                    terminal: self.terminal,
                });
            }
            self.baseline_gravity(GravityCause::GroundedReset);
        }
    }

    /// Poll pending platform suppressions; call once per tick after [`tick`](Self::tick)
    pub fn update_pass_through(&mut self, oracle: &mut dyn CollisionOracle, dt: f32) {
        self.pass.update(oracle, dt);
    }

    /// Contact reported while moving
    ///
    /// Hitting the underside of an up-passable platform while rising opens
    /// it, covering the cases the jump probe misses.
    pub fn on_contact(&mut self, oracle: &mut dyn CollisionOracle, contact: &ContactHit) {
        let underside = contact.normal.y < self.config.probes.underside_normal_y;
        if !underside || self.velocity.y <= 0.0 {
            return;
        }
        let Some(platform) = oracle.one_way_platform(contact.collider) else {
            return;
        };
        if platform.solid != contact.collider || !platform.jump_up_through {
            return;
        }
        if self
            .pass
            .pass_up_through(oracle, Some(platform.solid), platform.top_y)
        {
            self.sink
                .record(MovementEvent::UndersidePassGranted { platform: platform.id });
        }
    }

    // ---- one-shots ----

    /// Launch upward; ignored unless grounded
    ///
    /// Climbing is always ended first, even when the jump itself is ignored.
    pub fn jump(&mut self, oracle: &mut dyn CollisionOracle) -> bool {
        if self.climbing {
            self.exit_climb();
        }
        if !self.grounded {
            self.sink.record(MovementEvent::JumpIgnored);
            return false;
        }

        let velocity_y = self.config.jump_velocity();
        self.velocity.y = velocity_y;
        self.gliding = false;
        self.baseline_gravity(GravityCause::Jump);
        self.sink.record(MovementEvent::Jumped { velocity_y });

        self.pre_open_overhead(oracle);
        true
    }

    /// Open a one-way platform right above before the head touches it
    fn pre_open_overhead(&mut self, oracle: &mut dyn CollisionOracle) {
        let probes = &self.config.probes;
        let origin = oracle.feet_position() + Vec3::Y * probes.jump_probe_lift;
        let radius = oracle.body_radius() * probes.jump_probe_radius_scale;

        let Some(hit) = oracle.sphere_cast(origin, radius, Vec3::Y, probes.jump_probe_distance)
        else {
            return;
        };
        let Some(platform) = oracle.one_way_platform(hit.collider) else {
            return;
        };
        if platform.solid != hit.collider || !platform.jump_up_through {
            return;
        }
        if self
            .pass
            .pass_up_through(oracle, Some(platform.solid), platform.top_y)
        {
            self.sink
                .record(MovementEvent::PlatformPreOpened { platform: platform.id });
        }
    }

    /// Halve upward speed; nothing when not ascending
    pub fn jump_cut(&mut self) {
        if self.velocity.y > 0.0 {
            let from = self.velocity.y;
            self.velocity.y *= 0.5;
            self.sink.record(MovementEvent::JumpCut {
                from,
                to: self.velocity.y,
            });
        }
    }

    /// Drop through the one-way platform underfoot for `duration` seconds
    pub fn try_drop_through(&mut self, oracle: &mut dyn CollisionOracle, duration: f32) -> bool {
        if !self.grounded {
            self.sink.record(MovementEvent::DropRejected {
                reason: DropRejection::NotGrounded,
            });
            return false;
        }

        let Some(platform) = self.find_droppable(oracle) else {
            self.sink.record(MovementEvent::DropRejected {
                reason: DropRejection::NoPlatform,
            });
            return false;
        };

        self.pass
            .drop_down_through(oracle, Some(platform.solid), duration);

        let nudge = self.config.drop_nudge_speed;
        if self.velocity.y > nudge {
            self.velocity.y = nudge;
        }
        self.drop_nudge_pending = true;
        self.sink.record(MovementEvent::DroppedThrough {
            platform: platform.id,
            duration,
        });
        true
    }

    /// Feet overlap first, downward cast as fallback
    fn find_droppable(&self, oracle: &dyn CollisionOracle) -> Option<OneWayPlatform> {
        let probes = &self.config.probes;
        let feet = oracle.feet_position();
        let radius = oracle.body_radius() * probes.drop_overlap_radius_scale;

        let droppable = |collider: ColliderHandle| {
            oracle
                .one_way_platform(collider)
                .filter(|p| p.solid == collider && p.jump_down_through)
        };

        let overlaps = oracle.overlap_capsule(
            feet + Vec3::Y * probes.drop_overlap_up,
            feet - Vec3::Y * probes.drop_overlap_down,
            radius,
        );
        if let Some(platform) = overlaps.into_iter().find_map(droppable) {
            return Some(platform);
        }

        let origin = feet + Vec3::Y * probes.drop_probe_lift;
        oracle
            .sphere_cast(origin, radius, Vec3::NEG_Y, probes.drop_probe_distance)
            .and_then(|hit| droppable(hit.collider))
    }

    // ---- climb candidate ----

    /// Last writer wins
    pub fn set_climb_candidate(&mut self, climbable: &Arc<Climbable>) {
        self.climb_candidate = Arc::downgrade(climbable);
        self.sink.record(MovementEvent::ClimbCandidateSet {
            climbable: climbable.id,
        });
    }

    /// Clear only if `climbable` is the stored candidate
    pub fn clear_climb_candidate(&mut self, climbable: &Arc<Climbable>) {
        if Weak::ptr_eq(&self.climb_candidate, &Arc::downgrade(climbable)) {
            self.climb_candidate = Weak::new();
            self.sink.record(MovementEvent::ClimbCandidateCleared {
                climbable: climbable.id,
            });
        }
    }

    pub fn has_climb_candidate(&self) -> bool {
        self.climb_candidate.strong_count() > 0
    }

    pub fn current_climbable(&self) -> Option<Arc<Climbable>> {
        self.climb_candidate.upgrade()
    }

    // ---- queries ----

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_climbing(&self) -> bool {
        self.climbing
    }

    pub fn is_gliding(&self) -> bool {
        self.gliding
    }

    pub fn vertical_speed(&self) -> f32 {
        self.velocity.y
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn mode(&self) -> MotorMode {
        self.mode
    }

    pub fn gravity(&self) -> (f32, f32) {
        (self.gravity, self.terminal)
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn platform_pass(&self) -> &PlatformPass {
        &self.pass
    }

    /// Stop horizontal motion immediately
    pub fn zero_horizontal(&mut self) {
        self.desired_x = 0.0;
        match self.config.horizontal_axis {
            HorizontalAxis::X => self.velocity.x = 0.0,
            HorizontalAxis::Z => self.velocity.z = 0.0,
        }
    }

    pub fn snapshot(&self) -> MotorSnapshot {
        MotorSnapshot {
            mode: self.mode,
            velocity: self.velocity,
            desired_x: self.desired_x,
            desired_y: self.desired_y,
            max_speed: self.max_speed,
            gravity: self.gravity,
            terminal: self.terminal,
            grounded: self.grounded,
            climbing: self.climbing,
            gliding: self.gliding,
            suppressed: self.pass.pending_count(),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }
}
