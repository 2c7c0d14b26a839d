#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for Path Defence sessions.
//!
//! Loads an optional TOML configuration, builds the scripted towers, runs the
//! session for a simulated duration and prints a summary of the outcome.

mod script;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use path_defence_core::{CellCoord, GameConfig, LevelLayout, PlayState};
use path_defence_system_session::Session;
use path_defence_world::query;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::script::{parse_build_order, parse_cell, BuildOrder};

#[derive(Parser, Debug)]
#[command(name = "path-defence")]
#[command(about = "Runs a headless Path Defence session")]
struct Args {
    /// TOML file overriding rules, catalog or level
    #[arg(long)]
    config: Option<PathBuf>,

    /// Built-in level number, replacing the configured level
    #[arg(long)]
    level: Option<u32>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 300.0)]
    seconds: f32,

    /// Milliseconds simulated per tick
    #[arg(long, default_value_t = 16)]
    step_ms: u64,

    /// Tower to build before the first tick, as `<tower>@<column>,<row>`
    #[arg(long = "build", value_parser = parse_build_order)]
    builds: Vec<BuildOrder>,

    /// Tower cell to upgrade after building, as `<column>,<row>`
    #[arg(long = "upgrade", value_parser = parse_cell)]
    upgrades: Vec<CellCoord>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    level: String,
    outcome: PlayState,
    simulated_seconds: f32,
    gold: u32,
    lives: i32,
    wave: usize,
    waves: usize,
    kills: u32,
    escapes: u32,
    gold_earned: u32,
    towers: usize,
}

/// Entry point for the Path Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref(), args.level)?;
    let mut session = Session::new(config).context("failed to create the session")?;

    let _ = session.start();
    for order in &args.builds {
        match session.place_tower(order.kind, order.cell) {
            Ok(tower) => info!(
                tower = tower.get(),
                kind = ?order.kind,
                cell = ?order.cell,
                "tower built"
            ),
            Err(reason) => warn!(
                kind = ?order.kind,
                cell = ?order.cell,
                %reason,
                "tower not built"
            ),
        }
    }
    for cell in &args.upgrades {
        match session.upgrade_tower(*cell) {
            Ok(level) => info!(?cell, upgrade_level = level, "tower upgraded"),
            Err(reason) => warn!(?cell, %reason, "tower not upgraded"),
        }
    }

    let simulated = run(&mut session, args.seconds, args.step_ms)?;
    let summary = summarize(&session, simulated);
    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialize the summary")?;
        println!("{json}");
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn load_config(path: Option<&Path>, level: Option<u32>) -> Result<GameConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration at {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse configuration at {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    if let Some(number) = level {
        config.level = LevelLayout::by_number(number)
            .with_context(|| format!("level {number} does not exist"))?;
    }
    config
        .validate()
        .context("configuration failed validation")?;
    Ok(config)
}

fn run(session: &mut Session, seconds: f32, step_ms: u64) -> Result<f32> {
    if step_ms == 0 {
        bail!("step must be at least one millisecond");
    }
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("simulated duration must be a non-negative number of seconds");
    }

    let step = Duration::from_millis(step_ms);
    let mut elapsed = 0.0_f32;
    while elapsed < seconds && session.play_state() == PlayState::Playing {
        let _ = session.tick(step);
        elapsed += step.as_secs_f32();
    }
    Ok(elapsed)
}

fn summarize(session: &Session, simulated_seconds: f32) -> Summary {
    let report = session.report();
    Summary {
        level: query::level(session.world()).name.clone(),
        outcome: session.play_state(),
        simulated_seconds,
        gold: session.gold(),
        lives: session.lives(),
        wave: session.current_wave(),
        waves: session.wave_count(),
        kills: report.kills,
        escapes: report.escapes,
        gold_earned: report.gold_earned,
        towers: query::tower_view(session.world()).iter().count(),
    }
}

fn print_summary(summary: &Summary) {
    println!("level:    {}", summary.level);
    println!("outcome:  {:?}", summary.outcome);
    println!("time:     {:.1}s", summary.simulated_seconds);
    println!("wave:     {}/{}", summary.wave, summary.waves);
    println!("gold:     {} ({} earned)", summary.gold, summary.gold_earned);
    println!("lives:    {}", summary.lives);
    println!("kills:    {}", summary.kills);
    println!("escapes:  {}", summary.escapes);
    println!("towers:   {}", summary.towers);
}
