mod app;
mod attempt;
mod config;
mod error;
mod grid;
mod input;
mod model;
mod obstacles;
mod player;
mod ranking;
mod render;
mod stage;

use clap::Parser;
use error::GameError;
use std::{path::PathBuf, process::ExitCode};

#[derive(Parser, Debug, Clone)]
#[command(name = "stagefall")]
#[command(about = "Dodge falling obstacles through ten stages", long_about = None)]
pub(crate) struct Args {
    /// Ranking log to read and append to (default: per-user data dir)
    #[arg(long)]
    ranking_file: Option<PathBuf>,

    /// Fixed RNG seed for reproducible obstacle columns
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds per tick. Tick counts per stage never change.
    #[arg(long)]
    tick_ms: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match app::run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("fatal: {e:#}");
            eprintln!("stagefall: {e:#}");
            let code = e.downcast_ref::<GameError>().map_or(1, GameError::exit_code);
            ExitCode::from(code as u8)
        }
    }
}
