#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver that runs a scripted Emberfall session and prints a summary.

mod demo;

use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use emberfall_system_frame::FrameOrchestrator;
use emberfall_world::{query, PlayerSetup, World, WorldConfig};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "emberfall", about = "Runs a scripted Emberfall session", version)]
struct Args {
    /// TOML file with `[world]` and `[player]` tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value = "600")]
    frames: u64,

    /// Simulated milliseconds per frame
    #[arg(long, default_value = "16")]
    frame_ms: u64,

    /// Overrides the world seed from the configuration
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionConfig {
    world: WorldConfig,
    player: PlayerSetup,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }

    let mut world = World::new(config.world, &config.player);
    demo::populate(&mut world).context("failed to populate the demo world")?;
    let messages = world.subscribe_messages();

    let mut orchestrator = FrameOrchestrator::new(Box::<demo::DemoCatalog>::default());
    orchestrator
        .initialize(&mut world)
        .context("failed to initialize equipped items")?;

    println!("{}", query::welcome_banner(&world));
    info!(frames = args.frames, frame_ms = args.frame_ms, "simulation_started");

    let dt = Duration::from_millis(args.frame_ms);
    let mut slain = 0;
    let mut deaths = 0;
    for frame in 0..args.frames {
        for command in demo::scripted_commands(&world, frame) {
            let description = format!("{command:?}");
            orchestrator
                .apply(&mut world, command)
                .with_context(|| format!("command {description} failed on frame {frame}"))?;
        }
        let report = orchestrator
            .run_frame(&mut world, dt)
            .with_context(|| format!("frame {frame} aborted"))?;
        slain += report.reaped.len();
        if report.respawned {
            deaths += 1;
        }
        for message in messages.try_iter() {
            debug!(frame, %message, "message_shown");
        }
    }

    let player = world.player();
    println!(
        "frames: {}  level: {}  exp: {}/{}  money: {}  health: {}/{}",
        orchestrator.frames_run(),
        player.level(),
        player.exp(),
        player.max_exp(),
        player.money(),
        player.health().value(),
        player.health().max(),
    );
    println!(
        "enemies slain: {slain}  deaths: {deaths}  enemies left: {}",
        query::npc_count(&world)
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
