//! Game state and core simulation types
//!
//! Every entity carries a stable `id` handed out by the [`Registry`]; cross
//! references (projectile and beam source weapons) are ids, never borrows.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::aabb::{Aabb, OrientedBox};
use super::progression::UpgradeOffer;
use super::registry::Registry;
use super::spawner::Spawner;
use crate::consts::*;
use crate::error::SimError;
use crate::highscores::HighScores;
use crate::tuning::Tuning;
use crate::{DEFAULT_DIRECTION, polar_to_cartesian};

/// Stable entity handle, unique for the lifetime of a session
pub type EntityId = u32;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Waiting for the player to pick an upgrade
    LevelUpPending,
    /// Frozen by the player; no timers advance
    Paused,
    /// Run ended, waiting for restart
    GameOver,
}

/// Registry categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Player,
    Enemy,
    Weapon,
    Projectile,
    Beam,
    Gem,
    Chest,
}

/// Things that happened during the last tick, for audio/presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    EnemySpawned { id: EntityId, kind: EnemyKind },
    /// `by` is the weapon whose hit landed the kill
    EnemyKilled { id: EntityId, kind: EnemyKind, pos: Vec2, by: EntityId },
    PlayerHit { damage: f32, health: f32 },
    GemCollected { xp: u32 },
    ChestOpened { levels: u32 },
    LevelUp { level: u32 },
    WeaponFired { weapon: EntityId },
    WeaponEvolved { old: EntityId, new: EntityId },
    DifficultyRaised { level: u32 },
    GameOver { score: u64 },
}

/// Upgrade kinds offered on level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpgradeKind {
    ProjectileCooldown,
    BeamCooldown,
    OrbitSpeed,
    DamageUp,
    MoveSpeed,
    MaxHealth,
    Magnet,
    /// Always available; has no level
    Heal,
}

impl UpgradeKind {
    /// Levelled upgrades, in presentation order. Heal is not part of the pool.
    pub const POOL: [UpgradeKind; 7] = [
        UpgradeKind::ProjectileCooldown,
        UpgradeKind::BeamCooldown,
        UpgradeKind::OrbitSpeed,
        UpgradeKind::DamageUp,
        UpgradeKind::MoveSpeed,
        UpgradeKind::MaxHealth,
        UpgradeKind::Magnet,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            UpgradeKind::ProjectileCooldown => "Launcher Fire Rate",
            UpgradeKind::BeamCooldown => "Beam Fire Rate",
            UpgradeKind::OrbitSpeed => "Blade Spin Speed",
            UpgradeKind::DamageUp => "Damage Up",
            UpgradeKind::MoveSpeed => "Move Speed",
            UpgradeKind::MaxHealth => "Max Health",
            UpgradeKind::Magnet => "Gem Magnet",
            UpgradeKind::Heal => "Restore Health",
        }
    }

    fn slot(self) -> Option<usize> {
        Self::POOL.iter().position(|k| *k == self)
    }
}

/// Per-upgrade level counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpgradeLevels([u32; UpgradeKind::POOL.len()]);

impl UpgradeLevels {
    pub fn get(&self, kind: UpgradeKind) -> u32 {
        kind.slot().map(|i| self.0[i]).unwrap_or(0)
    }

    pub fn set(&mut self, kind: UpgradeKind, level: u32) {
        if let Some(i) = kind.slot() {
            self.0[i] = level;
        }
    }

    pub fn increment(&mut self, kind: UpgradeKind) -> u32 {
        let level = self.get(kind) + 1;
        self.set(kind, level);
        level
    }
}

/// Shared capability of everything that occupies space
pub trait Body {
    fn id(&self) -> EntityId;
    fn pos(&self) -> Vec2;
    fn bounds(&self) -> Aabb;
    fn is_alive(&self) -> bool;
    /// Mark dead; returns false if it already was
    fn kill(&mut self) -> bool;
}

macro_rules! impl_body {
    ($ty:ty, |$s:ident| $bounds:expr) => {
        impl Body for $ty {
            fn id(&self) -> EntityId {
                self.id
            }
            fn pos(&self) -> Vec2 {
                self.pos
            }
            fn bounds(&self) -> Aabb {
                let $s = self;
                $bounds
            }
            fn is_alive(&self) -> bool {
                self.alive
            }
            fn kill(&mut self) -> bool {
                std::mem::replace(&mut self.alive, false)
            }
        }
    };
}

/// The player character
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    /// Last nonzero movement direction (unit length)
    pub facing: Vec2,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub damage_multiplier: f32,
    pub magnet_radius: f32,
    pub upgrades: UpgradeLevels,
    alive: bool,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            id,
            pos,
            facing: DEFAULT_DIRECTION,
            speed: tuning.player_speed,
            health: tuning.player_max_health,
            max_health: tuning.player_max_health,
            level: 1,
            experience: 0,
            experience_to_next: tuning.xp_first_threshold,
            damage_multiplier: 1.0,
            magnet_radius: 0.0,
            upgrades: UpgradeLevels::default(),
            alive: true,
        }
    }

    /// Subtract damage, clamped at 0. Returns true on the hit that kills.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.health > 0.0;
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.max_health);
        was_alive && self.health <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }

    /// Bank experience; returns the number of level-ups it caused
    pub fn gain_experience(&mut self, amount: u32, growth: f32) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.experience >= self.experience_to_next {
            self.experience -= self.experience_to_next;
            self.advance_level(growth);
            gained += 1;
        }
        gained
    }

    /// Grant levels directly, leaving banked experience alone
    pub fn grant_levels(&mut self, levels: u32, growth: f32) {
        for _ in 0..levels {
            self.advance_level(growth);
        }
    }

    /// Thresholds saturate at `u32::MAX` on very long runs
    fn advance_level(&mut self, growth: f32) {
        self.level = self.level.saturating_add(1);
        let next = (self.experience_to_next as f32 * growth) as u32;
        self.experience_to_next = next.max(self.experience_to_next.saturating_add(1));
    }

    pub fn experience_ratio(&self) -> f32 {
        self.experience as f32 / self.experience_to_next.max(1) as f32
    }

    pub fn health_ratio(&self) -> f32 {
        self.health / self.max_health
    }
}

impl_body!(Player, |p| Aabb::square(p.pos, PLAYER_SIZE));

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnemyKind {
    Basic,
    Tank,
    Boss,
}

impl EnemyKind {
    pub fn size(&self) -> f32 {
        match self {
            EnemyKind::Basic => ENEMY_SIZE,
            EnemyKind::Tank => TANK_SIZE,
            EnemyKind::Boss => BOSS_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub speed: f32,
    pub health: f32,
    pub contact_damage: f32,
    pub xp_value: u32,
    alive: bool,
}

impl Enemy {
    /// Build an enemy of `kind` with stats scaled from `base_speed`
    pub fn new(kind: EnemyKind, pos: Vec2, base_speed: f32, tuning: &Tuning) -> Self {
        let (speed_factor, health, contact_damage, xp_value) = match kind {
            EnemyKind::Basic => (1.0, tuning.basic_health, tuning.basic_contact_damage, tuning.basic_xp),
            EnemyKind::Tank => (
                tuning.tank_speed_factor,
                tuning.tank_health,
                tuning.tank_contact_damage,
                tuning.tank_xp,
            ),
            EnemyKind::Boss => (
                tuning.boss_speed_factor,
                tuning.boss_health,
                tuning.boss_contact_damage,
                tuning.boss_xp,
            ),
        };
        Self {
            id: 0,
            kind,
            pos,
            speed: base_speed * speed_factor,
            health,
            contact_damage,
            xp_value,
            alive: true,
        }
    }

    /// Subtract damage. Returns true only on the hit that first takes health to <= 0.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.health > 0.0;
        self.health -= amount.max(0.0);
        was_alive && self.health <= 0.0
    }
}

impl_body!(Enemy, |e| Aabb::square(e.pos, e.kind.size()));

/// Orbiting blade parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Orbit {
    pub radius: f32,
    pub angle: f32,
    /// Radians per second
    pub angular_speed: f32,
}

impl Orbit {
    pub fn offset(&self) -> Vec2 {
        polar_to_cartesian(self.radius, self.angle)
    }
}

/// Weapon variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum WeaponKind {
    /// Revolves around the player, damaging on overlap
    OrbitBlade(Orbit),
    /// Fires one projectile at the nearest enemy
    Launcher,
    /// Evolved launcher: three-shot fan
    SpreadLauncher,
    /// Fires a beam along the player's facing
    BeamEmitter,
}

impl WeaponKind {
    /// Orbit-class weapons deal damage by overlap instead of firing
    pub fn is_orbit(&self) -> bool {
        matches!(self, WeaponKind::OrbitBlade(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Weapon {
    pub id: EntityId,
    pub kind: WeaponKind,
    /// Center of the weapon body (the player's center for invisible weapons)
    pub pos: Vec2,
    pub level: u32,
    pub cooldown_ms: f32,
    /// Session clock at the last shot
    pub last_fire_ms: f64,
    pub damage: f32,
    alive: bool,
}

impl Weapon {
    pub fn new(kind: WeaponKind, cooldown_ms: f32, damage: f32, now_ms: f64) -> Self {
        Self {
            id: 0,
            kind,
            pos: Vec2::ZERO,
            level: 1,
            cooldown_ms,
            last_fire_ms: now_ms,
            damage,
            alive: true,
        }
    }

    /// Cooldown elapsed? Orbit weapons never fire.
    pub fn is_ready(&self, now_ms: f64) -> bool {
        !self.kind.is_orbit() && now_ms - self.last_fire_ms >= self.cooldown_ms as f64
    }
}

impl_body!(Weapon, |w| match w.kind {
    WeaponKind::OrbitBlade(_) => Aabb::square(w.pos, ORBIT_BLADE_SIZE),
    _ => Aabb::square(w.pos, 0.0),
});

#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    pub id: EntityId,
    pub source: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Already scaled by the damage multiplier at fire time
    pub damage: f32,
    alive: bool,
}

impl Projectile {
    pub fn new(source: EntityId, pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            id: 0,
            source,
            pos,
            vel,
            damage,
            alive: true,
        }
    }
}

impl_body!(Projectile, |p| Aabb::square(p.pos, PROJECTILE_SIZE));

#[derive(Debug, Clone, Serialize)]
pub struct Beam {
    pub id: EntityId,
    pub source: EntityId,
    pub pos: Vec2,
    pub region: OrientedBox,
    pub damage: f32,
    pub remaining_ms: f32,
    /// Enemies this beam has already damaged
    pub already_hit: Vec<EntityId>,
    alive: bool,
}

impl Beam {
    pub fn new(source: EntityId, region: OrientedBox, damage: f32, duration_ms: f32) -> Self {
        Self {
            id: 0,
            source,
            pos: region.center,
            region,
            damage,
            remaining_ms: duration_ms,
            already_hit: Vec::new(),
            alive: true,
        }
    }

    /// Record a hit; false if this enemy was hit before
    pub fn try_hit(&mut self, enemy: EntityId) -> bool {
        if self.already_hit.contains(&enemy) {
            false
        } else {
            self.already_hit.push(enemy);
            true
        }
    }
}

impl_body!(Beam, |b| b.region.bounds());

#[derive(Debug, Clone, Serialize)]
pub struct Gem {
    pub id: EntityId,
    pub pos: Vec2,
    pub xp: u32,
    alive: bool,
}

impl Gem {
    pub fn new(pos: Vec2, xp: u32) -> Self {
        Self {
            id: 0,
            pos,
            xp,
            alive: true,
        }
    }
}

impl_body!(Gem, |g| Aabb::square(g.pos, GEM_SIZE));

#[derive(Debug, Clone, Serialize)]
pub struct Chest {
    pub id: EntityId,
    pub pos: Vec2,
    pub levels: u32,
    alive: bool,
}

impl Chest {
    pub fn new(pos: Vec2, levels: u32) -> Self {
        Self {
            id: 0,
            pos,
            levels,
            alive: true,
        }
    }
}

impl_body!(Chest, |c| Aabb::square(c.pos, CHEST_SIZE));

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub registry: Registry,
    pub spawner: Spawner,
    pub phase: GamePhase,
    /// Enemies killed by weapons this run
    pub score: u64,
    /// Simulation tick counter (only advances while running)
    pub time_ticks: u64,
    /// Session clock in milliseconds (only advances while running)
    pub elapsed_ms: f64,
    /// Level-ups earned but not yet resolved
    pub pending_level_ups: u32,
    /// Options on screen while `LevelUpPending`
    pub offer: Option<UpgradeOffer>,
    /// Events from the most recent tick
    pub events: Vec<GameEvent>,
    /// Finished runs this process
    pub high_scores: HighScores,
}

impl GameState {
    /// Create a new session with default tuning
    pub fn new(seed: u64) -> Self {
        Self::build(seed, Tuning::default())
    }

    /// Create a session with custom balance; rejects tuning that fails
    /// [`Tuning::validate`]
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self, SimError> {
        tuning.validate()?;
        Ok(Self::build(seed, tuning))
    }

    fn build(seed: u64, tuning: Tuning) -> Self {
        let registry = Registry::new(&tuning);
        let spawner = Spawner::new(&tuning);
        let mut state = Self {
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            registry,
            spawner,
            phase: GamePhase::Running,
            score: 0,
            time_ticks: 0,
            elapsed_ms: 0.0,
            pending_level_ups: 0,
            offer: None,
            events: Vec::new(),
            high_scores: HighScores::new(),
        };
        state.arm_starting_weapons();
        state
    }

    /// Clear every entity and timer and start a fresh run.
    ///
    /// The RNG stream and the leaderboard carry over.
    pub fn restart(&mut self) -> Result<(), SimError> {
        if self.phase != GamePhase::GameOver {
            return Err(SimError::RestartWhileAlive { phase: self.phase });
        }
        self.registry.reset(&self.tuning);
        self.spawner = Spawner::new(&self.tuning);
        self.phase = GamePhase::Running;
        self.score = 0;
        self.time_ticks = 0;
        self.elapsed_ms = 0.0;
        self.pending_level_ups = 0;
        self.offer = None;
        self.events.clear();
        self.arm_starting_weapons();
        log::info!("Restarted run");
        Ok(())
    }

    /// Toggle between `Running` and `Paused`; other phases are unaffected
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            other => other,
        };
    }

    fn arm_starting_weapons(&mut self) {
        let now = self.elapsed_ms;
        let t = &self.tuning;
        let orbit = WeaponKind::OrbitBlade(Orbit {
            radius: t.orbit_radius,
            angle: 0.0,
            angular_speed: t.orbit_angular_speed,
        });
        let weapons = [
            Weapon::new(orbit, 0.0, t.orbit_damage, now),
            Weapon::new(WeaponKind::Launcher, t.projectile_cooldown_ms, t.projectile_damage, now),
            Weapon::new(WeaponKind::BeamEmitter, t.beam_cooldown_ms, t.beam_damage, now),
        ];
        for mut weapon in weapons {
            weapon.pos = self.registry.player.pos;
            self.registry.add(weapon);
        }
    }

    /// Seconds survived in the current run
    pub fn survival_secs(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }
}
