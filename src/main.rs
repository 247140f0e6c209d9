//! Stride - Headless Driver
//!
//! Runs scripted walks through the locomotion test arena and logs what the
//! character controller did on each course.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec3;
use stride_game::{
    CameraMode, Landmark, Level, LocomotionConfig, LocomotionConfigPatch, Preset, RawInput, Simulation,
    SimulationConfig,
};

/// Headless locomotion test runner
#[derive(Parser)]
#[command(version, about = "Walks a capsule character through the stride test arena")]
struct Cli {
    /// Base tuning preset (first-person, third-person, platformer, surf).
    #[arg(long, default_value_t = Preset::FirstPerson)]
    preset: Preset,

    /// JSON file with config overrides, in camelCase field names.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Camera mode override.
    #[arg(long, value_enum)]
    camera: Option<CameraArg>,

    /// Ticks to run on each course.
    #[arg(long, default_value_t = 120)]
    ticks: u32,

    /// Seconds per tick. Defaults to the simulation tick rate (60 Hz).
    #[arg(long)]
    dt: Option<f32>,

    /// Only run this course.
    #[arg(long, value_enum)]
    course: Option<Course>,

    /// Print the final locomotion state of each course as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CameraArg {
    First,
    Third,
}

impl From<CameraArg> for CameraMode {
    fn from(arg: CameraArg) -> Self {
        match arg {
            CameraArg::First => CameraMode::FirstPerson,
            CameraArg::Third => CameraMode::ThirdPerson,
        }
    }
}

/// Scripted runs, one per arena feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Course {
    Ramp,
    Slick,
    Wall,
    Stairs,
    Crate,
    Crawl,
    Hop,
}

impl Course {
    const ALL: [Course; 7] = [
        Course::Ramp,
        Course::Slick,
        Course::Wall,
        Course::Stairs,
        Course::Crate,
        Course::Crawl,
        Course::Hop,
    ];

    fn landmark(self) -> Landmark {
        match self {
            Course::Ramp => Landmark::WalkableRamp,
            Course::Slick => Landmark::SlickRamp,
            Course::Wall => Landmark::SteepWall,
            Course::Stairs => Landmark::Stairs,
            Course::Crate => Landmark::Crate,
            Course::Crawl | Course::Hop => Landmark::LowCeiling,
        }
    }

    /// Where to start relative to the landmark.
    fn start_offset(self) -> Vec3 {
        match self {
            Course::Crawl => Vec3::new(-4.0, 0.0, 0.0),
            // Open floor past the slab's far edge
            Course::Hop => Vec3::new(5.0, 0.0, 0.0),
            _ => Vec3::ZERO,
        }
    }

    /// Input for one tick of the course.
    fn input(self, tick: u32, ticks: u32) -> RawInput {
        let mut input = RawInput::default();
        input.frame = tick;
        match self {
            Course::Crawl => {
                // Crawl under the slab, then let go of crouch while covered
                input.movement.forward = tick < ticks / 2;
                input.actions.crouch = tick < ticks / 2;
            }
            Course::Hop => {
                input.movement.forward = true;
                input.actions.sprint = true;
                input.actions.jump = tick % 20 < 2;
            }
            _ => input.movement.forward = true,
        }
        input
    }
}

fn load_config(cli: &Cli) -> Result<LocomotionConfig> {
    let mut config = cli.preset.config();

    if let Some(path) = &cli.config {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let patch: LocomotionConfigPatch =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        let (patched, clamped) = patch.apply(&config);
        for field in &clamped {
            log::warn!("{}: {} clamped to {}", field.field, field.from, field.to);
        }
        config = patched;
    }

    if let Some(camera) = cli.camera {
        config.camera_mode = camera.into();
    }

    config.validate().context("invalid locomotion config")?;
    Ok(config)
}

fn run_course(course: Course, config: &LocomotionConfig, cli: &Cli) -> Result<()> {
    let sim_config = SimulationConfig {
        locomotion: config.clone(),
        ..Default::default()
    };
    let mut sim = Simulation::new(sim_config, Level::test_arena());

    let landmark = sim
        .level
        .landmark(course.landmark())
        .with_context(|| format!("arena has no {:?}", course.landmark()))?;
    let id = sim.add_actor_at(&format!("{:?}", course), landmark + course.start_offset(), 0.0);
    sim.enable_controller(id)?;

    let start = sim.get_actor(id).map(|a| a.position()).unwrap_or(landmark);
    let dt = cli.dt.unwrap_or_else(|| sim.delta_time());
    let mut highest = start.y;
    for tick in 0..cli.ticks {
        sim.tick(dt, &course.input(tick, cli.ticks));
        if let Some(actor) = sim.get_actor(id) {
            highest = highest.max(actor.position().y);
            log::debug!("{:?} tick {}: {:?}", course, tick, actor.position());
        }
    }

    let actor = sim.get_actor(id).context("actor vanished")?;
    let end = actor.position();
    let diagnostics = actor.controller().map(|c| c.diagnostics()).unwrap_or_default();
    let state = actor.locomotion_state().context("controller was disabled")?;

    log::info!(
        "{:?}: moved {:.2}m, rose {:.2}m (peak {:.2}m), {:?} on {:?}, {:?}, {} steps, {} blocked moves",
        course,
        (end - start).length(),
        end.y - start.y,
        highest - start.y,
        state.contact,
        state.surface,
        state.posture,
        diagnostics.steps_taken,
        diagnostics.blocked_moves,
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(state)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::info!("preset {} ({:?} camera)", cli.preset, config.camera_mode);

    for course in Course::ALL {
        if cli.course.is_some_and(|only| only != course) {
            continue;
        }
        run_course(course, &config, &cli)?;
    }

    Ok(())
}
