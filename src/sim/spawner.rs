//! Enemy spawning and difficulty escalation
//!
//! Three independent timers, each an elapsed-time accumulator that only
//! advances while the simulation runs:
//! - enemy spawn (interval shrinks with difficulty, clamped to a floor)
//! - difficulty escalation (fixed interval)
//! - boss spawn (fixed interval)

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::state::{Enemy, EnemyKind, EntityId, GameEvent, GameState};
use crate::polar_to_cartesian;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Serialize)]
pub struct Spawner {
    pub spawn_accum_ms: f32,
    pub difficulty_accum_ms: f32,
    pub boss_accum_ms: f32,
    /// Number of escalations so far
    pub difficulty_level: u32,
    pub spawn_interval_ms: f32,
    /// Base speed handed to newly spawned enemies
    pub enemy_speed: f32,
}

/// Timer expirations from one [`Spawner::advance`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnTicks {
    pub enemies: u32,
    pub escalations: u32,
    pub bosses: u32,
}

impl Spawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            spawn_accum_ms: 0.0,
            difficulty_accum_ms: 0.0,
            boss_accum_ms: 0.0,
            difficulty_level: 0,
            spawn_interval_ms: tuning.spawn_interval_at(0),
            enemy_speed: tuning.enemy_speed_at(0),
        }
    }

    /// Raise difficulty one step and restart the spawn timer on the new interval
    pub fn escalate(&mut self, tuning: &Tuning) {
        self.difficulty_level += 1;
        self.enemy_speed = tuning.enemy_speed_at(self.difficulty_level);
        self.spawn_interval_ms = tuning.spawn_interval_at(self.difficulty_level);
        self.spawn_accum_ms = 0.0;
    }

    /// Advance all timers by `dt_ms` and report how many times each fired
    pub fn advance(&mut self, dt_ms: f32, tuning: &Tuning) -> SpawnTicks {
        let mut ticks = SpawnTicks::default();

        // A non-positive interval disables its timer instead of spinning
        self.difficulty_accum_ms += dt_ms;
        if tuning.difficulty_interval_ms > 0.0 {
            while self.difficulty_accum_ms >= tuning.difficulty_interval_ms {
                self.difficulty_accum_ms -= tuning.difficulty_interval_ms;
                self.escalate(tuning);
                ticks.escalations += 1;
            }
        }

        self.spawn_accum_ms += dt_ms;
        if self.spawn_interval_ms > 0.0 {
            while self.spawn_accum_ms >= self.spawn_interval_ms {
                self.spawn_accum_ms -= self.spawn_interval_ms;
                ticks.enemies += 1;
            }
        }

        self.boss_accum_ms += dt_ms;
        if tuning.boss_interval_ms > 0.0 {
            while self.boss_accum_ms >= tuning.boss_interval_ms {
                self.boss_accum_ms -= tuning.boss_interval_ms;
                ticks.bosses += 1;
            }
        }

        ticks
    }
}

/// Run the spawn timers for one tick, injecting enemies into the registry
pub fn run_spawner(state: &mut GameState, dt_ms: f32) {
    let ticks = state.spawner.advance(dt_ms, &state.tuning);

    for _ in 0..ticks.escalations {
        log::info!(
            "Difficulty {}: enemy speed {:.1}, spawn interval {} ms",
            state.spawner.difficulty_level,
            state.spawner.enemy_speed,
            state.spawner.spawn_interval_ms
        );
        state.events.push(GameEvent::DifficultyRaised {
            level: state.spawner.difficulty_level,
        });
    }

    for _ in 0..ticks.enemies {
        let kind = if state.rng.random_bool(state.tuning.tank_probability) {
            EnemyKind::Tank
        } else {
            EnemyKind::Basic
        };
        spawn_enemy(state, kind);
    }

    for _ in 0..ticks.bosses {
        let id = spawn_enemy(state, EnemyKind::Boss);
        log::info!("Boss {} spawned at {:.0}s", id, state.survival_secs());
    }
}

/// Spawn one enemy just outside the view, at a random angle around the player
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind) -> EntityId {
    let angle = state.rng.random_range(0.0..TAU);
    let pos = spawn_position(state.registry.player.pos, angle, state.tuning.spawn_distance);
    let enemy = Enemy::new(kind, pos, state.spawner.enemy_speed, &state.tuning);
    let id = state.registry.add(enemy);
    log::debug!("Spawned {:?} {} at ({:.0}, {:.0})", kind, id, pos.x, pos.y);
    state.events.push(GameEvent::EnemySpawned { id, kind });
    id
}

fn spawn_position(center: Vec2, angle: f32, distance: f32) -> Vec2 {
    center + polar_to_cartesian(distance, angle)
}
