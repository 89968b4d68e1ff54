#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Home Defence level headlessly.

mod level;
mod presenter;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use home_defence_simulation::{Progress, Simulation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use level::Level;
use presenter::LogPresenter;

/// Plays a level frame by frame and logs what happens.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Level file to play. The bundled meadow level is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Length of one simulated frame in milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Simulated time after which the run is abandoned.
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,
}

/// Entry point for the Home Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let level = match &cli.level {
        Some(path) => Level::load(path)?,
        None => Level::builtin()?,
    };

    let summary = play(
        level,
        Duration::from_millis(cli.frame_ms),
        Duration::from_secs(cli.max_seconds),
    )?;
    println!("{summary}");
    Ok(())
}

/// Runs `level` until the ending finishes or `limit` of simulated time passed.
fn play(level: Level, frame: Duration, limit: Duration) -> Result<String> {
    let Level {
        config,
        plan,
        grid,
        orders,
    } = level;
    let mut simulation = Simulation::new(config, plan, grid).context("level rejected")?;
    let mut presenter = LogPresenter::new(Duration::from_secs(2));
    let mut pending = orders.into_iter().peekable();
    let mut clock = Duration::ZERO;

    loop {
        while let Some((_, command)) = pending.next_if(|(at, _)| *at <= clock) {
            match simulation.handle_command(command) {
                Ok(tower) => info!(?command, ?tower, "build order carried out"),
                Err(reason) => warn!(?command, %reason, "build order refused"),
            }
        }

        if simulation.advance(frame, &mut presenter) == Progress::Finished {
            break;
        }
        clock = clock.saturating_add(frame);
        if clock >= limit {
            warn!(seconds = limit.as_secs(), "time limit reached before the game ended");
            break;
        }
    }

    let snapshot = simulation.snapshot();
    let result = match snapshot.outcome {
        Some(outcome) => format!("{outcome:?}"),
        None => "Unfinished".to_owned(),
    };
    Ok(format!(
        "{result} after {:.1}s: health {}, currency {}, waves cleared {}/{}, towers {}",
        snapshot.elapsed.as_secs_f32(),
        snapshot.health,
        snapshot.currency,
        snapshot.waves.cleared,
        snapshot.waves.total,
        snapshot.towers.len(),
    ))
}
