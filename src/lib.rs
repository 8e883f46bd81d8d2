//! Swarm Survivor - simulation core for a top-down survival arena game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, spawning, weapons, combat, progression)
//! - `tuning`: Data-driven game balance
//! - `highscores`: In-process leaderboard of finished runs
//! - `error`: Error type for commands and tuning

pub mod error;
pub mod highscores;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use highscores::HighScores;
pub use tuning::{OrbitDamagePolicy, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Entity bounding-box edge lengths
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const ENEMY_SIZE: f32 = 30.0;
    pub const TANK_SIZE: f32 = 45.0;
    pub const BOSS_SIZE: f32 = 80.0;
    pub const ORBIT_BLADE_SIZE: f32 = 20.0;
    pub const PROJECTILE_SIZE: f32 = 10.0;
    pub const GEM_SIZE: f32 = 15.0;
    pub const CHEST_SIZE: f32 = 30.0;

    /// Options presented per level-up, not counting the heal option
    pub const MAX_UPGRADE_CHOICES: usize = 4;
}

/// Fallback direction used when a direction cannot be normalized
pub const DEFAULT_DIRECTION: Vec2 = Vec2::X;

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Unit vector from `from` toward `to`.
///
/// Coincident points yield [`DEFAULT_DIRECTION`] instead of NaN.
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).try_normalize().unwrap_or(DEFAULT_DIRECTION)
}

/// Rotate a vector by `degrees` (counter-clockwise in a y-up frame)
#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Fixed-timestep accumulator for presentation loops.
///
/// Feed it wall-clock frame deltas; it reports how many `SIM_DT` steps to run.
#[derive(Debug, Clone, Default)]
pub struct FixedTimestep {
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame delta and return the number of substeps due (at most `MAX_SUBSTEPS`)
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= consts::SIM_DT && substeps < consts::MAX_SUBSTEPS {
            self.accumulator -= consts::SIM_DT;
            substeps += 1;
        }
        // Drop the backlog rather than carry it into the next frame
        if substeps == consts::MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(consts::SIM_DT);
        }
        substeps
    }

    /// Discard any accumulated time (after pause/unfocus)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
