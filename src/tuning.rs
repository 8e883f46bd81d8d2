//! Data-driven game balance
//!
//! Every balance number the simulation reads lives here. A tuning document is
//! JSON; missing keys fall back to [`Tuning::default`], so a file can override
//! just the values being experimented with.
//!
//! Speeds are world units per second, durations are milliseconds.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// How orbit-blade contact damage relates to the tick rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrbitDamagePolicy {
    /// Full blade damage on every tick of overlap (DPS scales with tick rate)
    #[default]
    PerTick,
    /// Damage scaled by `dt * orbit_reference_hz`, independent of tick rate
    PerSecond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,
    pub view_width: f32,
    pub view_height: f32,
    /// Extra margin around the view before projectiles are culled
    pub cull_margin: f32,

    // === Player ===
    pub player_speed: f32,
    pub player_max_health: f32,
    pub xp_first_threshold: u32,
    pub xp_threshold_growth: f32,

    // === Enemies ===
    pub enemy_base_speed: f32,
    pub basic_health: f32,
    pub basic_contact_damage: f32,
    pub basic_xp: u32,
    pub tank_health: f32,
    pub tank_contact_damage: f32,
    pub tank_xp: u32,
    pub tank_speed_factor: f32,
    pub boss_health: f32,
    pub boss_contact_damage: f32,
    pub boss_xp: u32,
    pub boss_speed_factor: f32,
    pub tank_probability: f64,
    /// Distance from the player at which enemies appear
    pub spawn_distance: f32,

    // === Spawner & difficulty ===
    pub spawn_interval_ms: f32,
    pub spawn_interval_factor: f32,
    pub spawn_interval_floor_ms: f32,
    pub difficulty_interval_ms: f32,
    pub difficulty_speed_factor: f32,
    pub boss_interval_ms: f32,

    // === Orbit blade ===
    pub orbit_radius: f32,
    pub orbit_angular_speed: f32,
    pub orbit_damage: f32,
    pub orbit_damage_policy: OrbitDamagePolicy,
    pub orbit_reference_hz: f32,

    // === Projectile launcher ===
    pub projectile_cooldown_ms: f32,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    pub evolved_spread_degrees: f32,

    // === Beam emitter ===
    pub beam_cooldown_ms: f32,
    pub beam_duration_ms: f32,
    pub beam_length: f32,
    pub beam_width: f32,
    pub beam_damage: f32,

    // === Pickups ===
    pub gem_seek_speed: f32,
    pub chest_levels: u32,

    // === Upgrades ===
    pub upgrade_level_cap: u32,
    pub weapon_level_cap: u32,
    pub cooldown_factor: f32,
    pub cooldown_floor_ms: f32,
    pub damage_multiplier_step: f32,
    pub speed_step: f32,
    pub max_health_step: f32,
    pub magnet_step: f32,
    pub orbit_speed_step: f32,
    /// Fraction of max health restored by the heal option
    pub heal_fraction: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            world_width: 3200.0,
            world_height: 3200.0,
            view_width: 1280.0,
            view_height: 720.0,
            cull_margin: 100.0,

            player_speed: 300.0,
            player_max_health: 100.0,
            xp_first_threshold: 10,
            xp_threshold_growth: 1.5,

            enemy_base_speed: 120.0,
            basic_health: 10.0,
            basic_contact_damage: 10.0,
            basic_xp: 5,
            tank_health: 40.0,
            tank_contact_damage: 20.0,
            tank_xp: 15,
            tank_speed_factor: 0.7,
            boss_health: 500.0,
            boss_contact_damage: 50.0,
            boss_xp: 100,
            boss_speed_factor: 0.5,
            tank_probability: 0.2,
            spawn_distance: 800.0,

            spawn_interval_ms: 1000.0,
            spawn_interval_factor: 0.9,
            spawn_interval_floor_ms: 200.0,
            difficulty_interval_ms: 20_000.0,
            difficulty_speed_factor: 1.1,
            boss_interval_ms: 120_000.0,

            orbit_radius: 100.0,
            orbit_angular_speed: 6.0,
            orbit_damage: 10.0,
            orbit_damage_policy: OrbitDamagePolicy::PerTick,
            orbit_reference_hz: 60.0,

            projectile_cooldown_ms: 1200.0,
            projectile_speed: 600.0,
            projectile_damage: 10.0,
            evolved_spread_degrees: 20.0,

            beam_cooldown_ms: 2000.0,
            beam_duration_ms: 300.0,
            beam_length: 400.0,
            beam_width: 24.0,
            beam_damage: 25.0,

            gem_seek_speed: 360.0,
            chest_levels: 1,

            upgrade_level_cap: 5,
            weapon_level_cap: 5,
            cooldown_factor: 0.85,
            cooldown_floor_ms: 100.0,
            damage_multiplier_step: 0.1,
            speed_step: 60.0,
            max_health_step: 20.0,
            magnet_step: 60.0,
            orbit_speed_step: 1.2,
            heal_fraction: 0.3,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON tuning document and validate it
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("world_width", self.world_width),
            ("world_height", self.world_height),
            ("view_width", self.view_width),
            ("view_height", self.view_height),
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("spawn_interval_floor_ms", self.spawn_interval_floor_ms),
            ("difficulty_interval_ms", self.difficulty_interval_ms),
            ("boss_interval_ms", self.boss_interval_ms),
            ("cooldown_floor_ms", self.cooldown_floor_ms),
            ("beam_duration_ms", self.beam_duration_ms),
            ("player_max_health", self.player_max_health),
            ("xp_threshold_growth", self.xp_threshold_growth),
            ("orbit_reference_hz", self.orbit_reference_hz),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }
        if self.spawn_interval_floor_ms > self.spawn_interval_ms {
            return Err(invalid(
                "spawn_interval_floor_ms",
                "must not exceed spawn_interval_ms".to_string(),
            ));
        }
        if !(self.cooldown_factor > 0.0 && self.cooldown_factor <= 1.0) {
            return Err(invalid("cooldown_factor", "must be in (0, 1]".to_string()));
        }
        if !(self.spawn_interval_factor > 0.0 && self.spawn_interval_factor <= 1.0) {
            return Err(invalid("spawn_interval_factor", "must be in (0, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.tank_probability) {
            return Err(invalid("tank_probability", "must be in [0, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.heal_fraction) {
            return Err(invalid("heal_fraction", "must be in [0, 1]".to_string()));
        }
        if self.xp_first_threshold == 0 {
            return Err(invalid("xp_first_threshold", "must be at least 1".to_string()));
        }
        if self.upgrade_level_cap == 0 || self.weapon_level_cap == 0 {
            return Err(invalid("upgrade_level_cap", "level caps must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Spawn interval after `difficulty_level` escalations, clamped to the floor
    pub fn spawn_interval_at(&self, difficulty_level: u32) -> f32 {
        let scaled = self.spawn_interval_ms * self.spawn_interval_factor.powi(difficulty_level as i32);
        scaled.round().max(self.spawn_interval_floor_ms)
    }

    /// Base enemy speed after `difficulty_level` escalations
    pub fn enemy_speed_at(&self, difficulty_level: u32) -> f32 {
        self.enemy_base_speed * self.difficulty_speed_factor.powi(difficulty_level as i32)
    }
}

fn invalid(field: &'static str, reason: String) -> SimError {
    SimError::InvalidTuning { field, reason }
}
