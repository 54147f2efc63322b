#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the City Experiment simulation.

mod config;
mod headless;
mod session;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use city_experiment_core::Level;
use city_experiment_rendering::{
    Camera, Presentation, RenderingBackend, Scene, TileGridPresentation, ToolPalette,
};
use city_experiment_system_bootstrap::Bootstrap;
use city_experiment_system_clock::{Config as ClockConfig, SimulationClock};
use city_experiment_system_growth::{Config as GrowthConfig, Growth};
use city_experiment_world::{query, World, WorldConfig};
use glam::Vec2;

use crate::{
    config::Settings,
    headless::{road_row_script, HeadlessBackend},
    session::Session,
};

const BUNDLED_LEVEL: &str = include_str!("../assets/level_data.json");

#[derive(Parser, Debug)]
#[command(
    name = "city-experiment",
    about = "Runs the City Experiment simulation headlessly",
    version
)]
struct Args {
    /// Level layout JSON (`{"level": [...]}`); the bundled level is used when omitted
    #[arg(long, env = "CITY_LEVEL")]
    level: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, env = "CITY_CONFIG")]
    config: Option<PathBuf>,

    /// Growth roll seed, overriding the settings file
    #[arg(long, env = "CITY_SEED")]
    seed: Option<u64>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Duration of a single frame in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Drag a road across this row with the road tool before time runs
    #[arg(long)]
    road_row: Option<u32>,
}

/// Entry point for the City Experiment command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    settings.validate().context("invalid settings")?;

    let level = load_level(args.level.as_ref())?;
    let world = World::new(WorldConfig::new(settings.columns, settings.rows))
        .context("failed to create world")?;
    println!("{}", Bootstrap.welcome_banner(&world));

    let mut session = Session::new(
        world,
        SimulationClock::new(ClockConfig::new(settings.tick_quantum())),
        Growth::new(GrowthConfig::new(
            settings.growth_chance_percent,
            settings.seed,
        )),
    );

    let tile_grid = TileGridPresentation::new(settings.columns, settings.rows, settings.tile_size)
        .context("invalid tile grid")?;
    let viewport = Vec2::new(settings.screen_width, settings.screen_height);
    let mut scene = Scene::new(
        tile_grid,
        Camera::centered(tile_grid.world_size(), viewport, settings.camera_speed),
        ToolPalette::default(),
    );

    let seeded = session
        .seed(&level, &mut scene)
        .context("failed to seed the world from the level")?;
    let (columns, rows) = query::dimensions(session.world());
    log::info!(
        "seeded {seeded} tiles onto a {columns}x{rows} grid (seed {})",
        settings.seed
    );

    let script = match args.road_row {
        Some(row) if row < rows => road_row_script(&scene, row),
        Some(row) => {
            log::warn!("road row {row} lies outside the {rows} row grid; skipping");
            Vec::new()
        }
        None => Vec::new(),
    };

    let presentation = Presentation::new("City Experiment", scene);
    let backend = HeadlessBackend::new(args.frames, Duration::from_millis(args.frame_ms), script);
    backend.run(presentation, move |dt, input, scene| {
        session.frame(dt, input, scene);
    })
}

fn load_level(path: Option<&PathBuf>) -> Result<Level> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse level {}", path.display()))
        }
        None => serde_json::from_str(BUNDLED_LEVEL).context("bundled level is malformed"),
    }
}
