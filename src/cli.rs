use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{activate, reset, run, status};

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Overlay injection orchestrator for single-page apps")]
#[command(version)]
pub struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drive a scripted host page through the full injection pipeline
    Run(run::Args),

    /// Simulate user activation of the target view
    Activate(activate::Args),

    /// Display persisted state (counters, analysis history)
    Status(status::Args),

    /// Re-seed the persisted state file
    Reset(reset::Args),
}
