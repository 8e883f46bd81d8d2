//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::collision::run_collisions;
use super::movement::run_movement;
use super::progression::open_offer;
use super::spawner::run_spawner;
use super::state::{GamePhase, GameState};
use super::weapons::{nearest_enemy, run_weapons};

/// Enemies closer than this make the autopilot back off
const AUTOPILOT_DANGER_RADIUS: f32 = 260.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement intent; each axis is -1, 0 or 1
    pub movement: Vec2,
    /// Pick this option of the current level-up offer
    pub select_upgrade: Option<usize>,
    /// Pause toggle
    pub pause: bool,
    /// Start a new run (only after game over)
    pub restart: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.events.clear();

    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    let input = &input;

    apply_commands(state, input);

    // Nothing advances outside Running: timers, movement and cooldowns are frozen
    if state.phase != GamePhase::Running {
        return;
    }

    state.time_ticks += 1;
    let dt_ms = dt * 1000.0;
    state.elapsed_ms += dt_ms as f64;

    run_spawner(state, dt_ms);
    run_movement(state, input.movement, dt);
    run_weapons(state);
    run_collisions(state, dt);
    state.registry.sweep();

    // Game over wins over any level-up queued this tick
    open_offer(state);
}

fn apply_commands(state: &mut GameState, input: &TickInput) {
    if input.restart {
        if let Err(e) = state.restart() {
            log::warn!("Ignoring restart: {e}");
        }
    }

    if let Some(index) = input.select_upgrade {
        match state.select_upgrade(index) {
            Ok(kind) => log::debug!("Selected {:?}", kind),
            Err(e) => log::warn!("Ignoring upgrade selection: {e}"),
        }
    }

    if input.pause {
        match state.phase {
            GamePhase::Running | GamePhase::Paused => state.toggle_pause(),
            phase => log::warn!("Ignoring pause toggle during {:?}", phase),
        }
    }
}

/// Drive the player for demos and soak runs.
///
/// Backs away from the nearest enemy when it gets close, otherwise walks to
/// the nearest pickup. Always takes the first upgrade and restarts on death.
fn autopilot(state: &GameState, input: &mut TickInput) {
    match state.phase {
        GamePhase::LevelUpPending => {
            input.select_upgrade = Some(0);
            return;
        }
        GamePhase::GameOver => {
            input.restart = true;
            return;
        }
        GamePhase::Paused => return,
        GamePhase::Running => {}
    }

    let player = state.registry.player.pos;
    let threat = nearest_enemy(&state.registry, player)
        .filter(|(_, pos)| pos.distance_squared(player) < AUTOPILOT_DANGER_RADIUS * AUTOPILOT_DANGER_RADIUS);

    let target = match threat {
        Some((_, enemy)) => Some(player - (enemy - player)),
        None => state
            .registry
            .gems
            .iter()
            .map(|g| g.pos)
            .chain(state.registry.chests.iter().map(|c| c.pos))
            .min_by(|a, b| a.distance_squared(player).total_cmp(&b.distance_squared(player))),
    };

    // Snap to the 8-way intent an input device would produce
    input.movement = target
        .map(|t| {
            let delta = t - player;
            Vec2::new(axis_intent(delta.x), axis_intent(delta.y))
        })
        .unwrap_or(Vec2::ZERO);
}

fn axis_intent(delta: f32) -> f32 {
    if delta > 1.0 {
        1.0
    } else if delta < -1.0 {
        -1.0
    } else {
        0.0
    }
}
