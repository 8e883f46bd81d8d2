//! Swarm Survivor headless runner
//!
//! Plays an autopilot session against the simulation core and logs a summary.
//! Usage: `swarm-survivor [--seed N] [--ticks N] [--tuning FILE]`

use std::process::ExitCode;

use swarm_survivor::FixedTimestep;
use swarm_survivor::Tuning;
use swarm_survivor::consts::SIM_DT;
use swarm_survivor::sim::{GameEvent, GameState, TickInput, tick};

/// Presentation frame rate the runner pretends to have
const FRAME_DT: f32 = 1.0 / 30.0;

#[derive(Debug)]
struct Args {
    seed: u64,
    ticks: u64,
    tuning: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            ticks: 60 * 60 * 3,
            tuning: None,
        }
    }
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("missing value for {flag}"));
        match flag.as_str() {
            "--seed" => args.seed = value()?.parse().map_err(|e| format!("bad --seed: {e}"))?,
            "--ticks" => args.ticks = value()?.parse().map_err(|e| format!("bad --ticks: {e}"))?,
            "--tuning" => args.tuning = Some(value()?),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            eprintln!("usage: swarm-survivor [--seed N] [--ticks N] [--tuning FILE]");
            return ExitCode::from(2);
        }
    };

    let tuning = match &args.tuning {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };

    log::info!("Swarm Survivor (headless) starting, seed {:#x}", args.seed);
    let mut state = match GameState::with_tuning(args.seed, tuning) {
        Ok(state) => state,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let mut timestep = FixedTimestep::new();
    let mut ticks = 0;
    let mut runs = 0;
    let mut kills = 0u64;
    while ticks < args.ticks {
        for _ in 0..timestep.advance(FRAME_DT) {
            tick(&mut state, &input, SIM_DT);
            ticks += 1;
            for event in &state.events {
                match event {
                    GameEvent::EnemyKilled { .. } => kills += 1,
                    GameEvent::GameOver { .. } => runs += 1,
                    _ => {}
                }
            }
        }
    }

    let snapshot = state.snapshot();
    log::info!(
        "{} ticks, {} finished runs, {} kills; current run: score {}, level {}, {:.1}s, {} entities",
        ticks,
        runs,
        kills,
        snapshot.hud.score,
        snapshot.hud.level,
        snapshot.hud.survival_secs,
        snapshot.entities.len()
    );
    if state.high_scores.is_empty() {
        log::info!("No runs finished with a score");
    } else if let Some(best) = state.high_scores.best_survival_secs() {
        log::info!("Longest finished run: {:.1}s", best);
    }
    for (rank, entry) in state.high_scores.entries.iter().enumerate() {
        log::info!(
            "#{:<2} score {:>5}  level {:>3}  {:>7.1}s",
            rank + 1,
            entry.score,
            entry.level,
            entry.survival_secs
        );
    }
    ExitCode::SUCCESS
}
