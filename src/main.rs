//! Skitter - headless movement sandbox
//!
//! Builds a small level in rapier, drives one character through a scripted
//! intent timeline at a fixed step and logs what the movement core does.
//!
//! Usage: `skitter [settings.toml] [--events events.jsonl] [--write-settings]`

mod script;
mod settings;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use skitter_core::GameTime;
use skitter_game::{
    ClimbType, Climbable, ClimbableSet, EventSink, MotorSnapshot, MovementEvent,
    PlayerController, PlayerState, RecordingSink, SharedSink, TracingSink,
};
use skitter_physics::{CharacterController, PhysicsWorld, RapierOracle};

use script::Script;
use settings::SandboxSettings;

/// Command line arguments
#[derive(Debug, Default)]
struct Args {
    settings: Option<PathBuf>,
    events: Option<PathBuf>,
    /// Persist the effective settings to the config directory
    write_settings: bool,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = Self::default();
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            if arg == "--events" {
                let path = iter.next().context("--events needs a file path")?;
                args.events = Some(PathBuf::from(path));
            } else if arg == "--write-settings" {
                args.write_settings = true;
            } else {
                args.settings = Some(PathBuf::from(arg));
            }
        }
        Ok(args)
    }
}

/// Logs through tracing and keeps a copy for the events dump
struct TeeSink {
    log: TracingSink,
    recorder: Arc<RecordingSink>,
}

impl EventSink for TeeSink {
    fn record(&self, event: MovementEvent) {
        self.log.record(event.clone());
        self.recorder.record(event);
    }
}

/// Ground, a one-way platform overhead, and a ladder
fn build_level(world: &mut PhysicsWorld, climbables: &mut ClimbableSet) {
    world.create_ground(0.0);

    // Underside at 1.88 just clears a standing character's head
    let platform = world.create_one_way_platform(
        Vec3::new(3.0, 0.1, 3.0),
        Vec3::new(5.0, 1.98, 0.0),
        true,
        true,
    );
    info!(id = %platform.id, top_y = platform.top_y, "platform placed");

    let trigger = world.create_trigger_volume(Vec3::new(1.0, 3.0, 0.5), Vec3::new(-3.0, 3.0, 0.0));
    let ladder = climbables.register(trigger, Climbable::new("ladder", ClimbType::Ladder));
    info!(id = %ladder.id, "ladder placed");

    world.refresh_queries();
}

/// Where a scripted run ended up
#[derive(Debug)]
struct RunReport {
    ticks: u64,
    state: Option<PlayerState>,
    snapshot: MotorSnapshot,
}

/// Drive one character through the tour for `settings.run.duration` seconds
fn run(settings: &SandboxSettings, sink: SharedSink) -> RunReport {
    let mut world = PhysicsWorld::new();
    let mut climbables = ClimbableSet::new();
    build_level(&mut world, &mut climbables);

    let mut body = CharacterController::new();
    body.spawn(&mut world, Vec3::new(0.0, 0.05, 0.0));

    let mut player = PlayerController::new(settings.player.clone(), sink);
    let script = Script::tour();
    let mut time = GameTime::new(settings.time.clone());

    let mut tick: u64 = 0;
    let mut last_label = "";
    while time.total_time < f64::from(settings.run.duration) {
        time.update(settings.run.frame_delta);

        for _ in 0..time.fixed_steps() {
            let now = player.clock();
            let Some(cue) = script.cue_at(now) else {
                continue;
            };
            if cue.label != last_label {
                info!(t = now, "cue: {}", cue.label);
                last_label = cue.label;
            }

            let dt = time.fixed_dt();
            let mut oracle = RapierOracle::new(&mut world, &mut body);
            let outcome = player.fixed_update(&mut oracle, &climbables, &cue.frame, dt);
            tick += 1;

            if !outcome.flags.is_empty() {
                debug!(tick, flags = ?outcome.flags, "blocked");
            }
            if tick % settings.run.log_every.max(1) == 0 {
                let motor = player.motor();
                info!(
                    tick,
                    state = ?player.state(),
                    x = body.position.x,
                    y = body.position.y,
                    vy = motor.vertical_speed(),
                    grounded = motor.is_grounded(),
                    "character"
                );
            }
        }
    }

    RunReport {
        ticks: tick,
        state: player.state(),
        snapshot: player.motor().snapshot(),
    }
}

fn write_events(path: &Path, events: &[MovementEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    info!("Wrote {} events to {:?}", events.len(), path);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting Skitter sandbox...");

    let args = Args::parse()?;
    let settings = SandboxSettings::load(args.settings.as_deref());
    settings
        .player
        .validate()
        .context("Invalid player tuning")?;
    if args.write_settings {
        settings.save()?;
    }

    let recorder = Arc::new(RecordingSink::new());
    let sink: SharedSink = if args.events.is_some() {
        Arc::new(TeeSink {
            log: TracingSink,
            recorder: recorder.clone(),
        })
    } else {
        Arc::new(TracingSink)
    };

    let report = run(&settings, sink);
    info!(
        ticks = report.ticks,
        state = ?report.state,
        snapshot = %serde_json::to_string(&report.snapshot)?,
        "Run finished"
    );

    if let Some(path) = &args.events {
        write_events(path, &recorder.take())?;
    }

    Ok(())
}
