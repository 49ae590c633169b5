// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` motion player - headless playback host
//!
//! Loads motion files into camera cuts and blend slots, ticks them at a fixed
//! step, and logs the poses and events they produce.

mod cli;
mod demo;
mod player;

use clap::Parser;
use cli::{Cli, Commands};
use ordoplay_motion::{MotionConfig, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => MotionConfig::load(path)?,
        None => MotionConfig::default(),
    };

    match cli.command {
        Commands::Play(args) => player::play(&args, &config).map(|_| ()),
        Commands::Demo { output, ron } => demo::write_demo(&output, ron),
    }
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ordoplay_motion=debug,motion_player=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay motion player v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("Playback failed: {e}");
        std::process::exit(1);
    }
}
