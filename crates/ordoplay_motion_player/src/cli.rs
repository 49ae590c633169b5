// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line interface of the motion player.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "motion_player")]
#[command(about = "Headless playback of OrdoPlay motion files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Motion config file (RON); defaults are used when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Play motion files as camera cuts
    Play(PlayArgs),

    /// Write a sample two-cut motion file
    Demo {
        /// Output motion file
        output: PathBuf,

        /// Also print the motions as RON
        #[arg(long)]
        ron: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PlayArgs {
    /// Motion files; every motion they hold becomes the next camera cut
    #[arg(required = true)]
    pub cuts: Vec<PathBuf>,

    /// Motion files blended onto an object while the camera plays
    #[arg(long)]
    pub blend: Vec<PathBuf>,

    /// Play blended motions once instead of looping them
    #[arg(long)]
    pub once: bool,

    /// Seconds of playback to simulate
    #[arg(long, default_value_t = 10.0)]
    pub duration: f32,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 30.0)]
    pub step: f32,
}
