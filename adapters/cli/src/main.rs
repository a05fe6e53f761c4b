#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Maze Chase match headlessly.

mod autopilot;
mod config;
mod text_backend;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use maze_chase_rendering::{palette, Presentation, RenderingBackend, Scene};
use maze_chase_system_session::Session;
use maze_chase_world::{query, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    autopilot::Autopilot,
    config::{FileConfig, DEFAULT_RENDER_EVERY, DEFAULT_TICKS},
    text_backend::TextBackend,
};

/// Command-line arguments accepted by the Maze Chase binary.
#[derive(Debug, Parser)]
#[command(name = "maze-chase", about = "Runs a Maze Chase match and prints snapshots")]
struct Args {
    /// TOML file overriding match rules and run settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Text file describing the maze, one row per line.
    #[arg(long, value_name = "PATH")]
    layout: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long)]
    ticks: Option<u64>,
    /// Seed for pursuer wandering and the autopilot.
    #[arg(long)]
    seed: Option<u64>,
    /// Frames between printed snapshots.
    #[arg(long, value_name = "FRAMES")]
    render_every: Option<u64>,
}

/// Entry point for the Maze Chase command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let file = FileConfig::load(args.config.as_deref()).context("failed to load configuration")?;
    let mut rules = file.rules;
    if let Some(seed) = args.seed {
        rules.rng_seed = seed;
    }
    let ticks = args.ticks.or(file.run.ticks).unwrap_or(DEFAULT_TICKS);
    let render_every = args
        .render_every
        .or(file.run.render_every)
        .unwrap_or(DEFAULT_RENDER_EVERY);
    let seed = rules.rng_seed;

    let world = match &args.layout {
        Some(path) => {
            let rows = config::load_layout(path).context("failed to load maze layout")?;
            World::new(rows.as_slice(), rules)
                .with_context(|| format!("invalid maze layout in {}", path.display()))?
        }
        None => World::classic(rules).context("built-in maze layout is invalid")?,
    };
    info!(
        banner = query::welcome_banner(&world),
        ticks, render_every, seed, "starting match"
    );

    let scene = Scene::from_world(&world).context("failed to build the initial scene")?;
    let presentation = Presentation::new("Maze Chase", palette::BACKGROUND, scene);
    let mut session = Session::new(world);
    let backend = TextBackend::new(
        io::stdout().lock(),
        Autopilot::new(seed),
        session.tick_duration(),
        ticks,
        render_every,
    );

    let mut events = Vec::new();
    backend.run(presentation, move |_dt, input, scene| {
        events.clear();
        session.frame(input.direction, &mut events);
        debug!(count = events.len(), "frame events");

        let world = session.world();
        match Scene::from_world(world) {
            Ok(next) => *scene = next,
            Err(error) => {
                tracing::error!(%error, "failed to refresh scene");
                return false;
            }
        }

        let outcome = query::outcome(world);
        if outcome.is_terminal() || input.quit {
            info!(
                ?outcome,
                score = query::score(world),
                lives = query::lives(world),
                ticks = query::tick_index(world),
                "match stopped"
            );
            return false;
        }
        true
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
