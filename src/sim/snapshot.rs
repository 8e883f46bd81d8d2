//! Read-only views of the session for presentation
//!
//! Built after a tick; nothing here can mutate simulation state.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::Serialize;

use super::progression::UpgradeChoice;
use super::registry::EntityRef;
use super::state::{EnemyKind, EntityId, GamePhase, GameState, WeaponKind};

/// What to draw for a snapshot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum EntityKind {
    Player = 0,
    BasicEnemy = 1,
    TankEnemy = 2,
    BossEnemy = 3,
    OrbitBlade = 4,
    Projectile = 5,
    Beam = 6,
    Gem = 7,
    Chest = 8,
}

impl From<EnemyKind> for EntityKind {
    fn from(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Basic => EntityKind::BasicEnemy,
            EnemyKind::Tank => EntityKind::TankEnemy,
            EnemyKind::Boss => EntityKind::BossEnemy,
        }
    }
}

/// One drawable entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Full extents of the drawn shape
    pub size: Vec2,
    /// Radians; nonzero only for beams
    pub rotation: f32,
}

impl EntitySnapshot {
    /// Presentation view of an entity. Launchers and beam emitters have no
    /// body of their own and yield None.
    pub fn from_entity(entity: EntityRef<'_>) -> Option<Self> {
        let (kind, size, rotation) = match entity {
            EntityRef::Player(_) => (EntityKind::Player, entity.bounds().size(), 0.0),
            EntityRef::Enemy(e) => (e.kind.into(), entity.bounds().size(), 0.0),
            EntityRef::Weapon(w) => match w.kind {
                WeaponKind::OrbitBlade(_) => (EntityKind::OrbitBlade, entity.bounds().size(), 0.0),
                _ => return None,
            },
            EntityRef::Projectile(_) => (EntityKind::Projectile, entity.bounds().size(), 0.0),
            EntityRef::Beam(b) => (EntityKind::Beam, b.region.half * 2.0, b.region.rotation()),
            EntityRef::Gem(_) => (EntityKind::Gem, entity.bounds().size(), 0.0),
            EntityRef::Chest(_) => (EntityKind::Chest, entity.bounds().size(), 0.0),
        };
        Some(Self {
            id: entity.id(),
            kind,
            pos: entity.pos(),
            size,
            rotation,
        })
    }

    pub fn instance(&self) -> RenderInstance {
        RenderInstance {
            position: self.pos.to_array(),
            size: self.size.to_array(),
            rotation: self.rotation,
            kind: self.kind as u32,
        }
    }
}

/// Heads-up display values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u64,
    pub level: u32,
    /// experience / experience_to_next
    pub experience_ratio: f32,
    /// health / max_health
    pub health_ratio: f32,
    pub survival_secs: f64,
    pub difficulty_level: u32,
    /// Ordered upgrade choices; empty unless `LevelUpPending`
    pub choices: Vec<UpgradeChoice>,
}

/// Everything presentation needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub hud: Hud,
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        let player = &state.registry.player;
        let choices = match (state.phase, &state.offer) {
            (GamePhase::LevelUpPending, Some(offer)) => offer.choices.clone(),
            _ => Vec::new(),
        };
        Self {
            tick: state.time_ticks,
            hud: Hud {
                phase: state.phase,
                score: state.score,
                level: player.level,
                experience_ratio: player.experience_ratio(),
                health_ratio: player.health_ratio(),
                survival_secs: state.survival_secs(),
                difficulty_level: state.spawner.difficulty_level,
                choices,
            },
            entities: state.registry.all().filter_map(EntitySnapshot::from_entity).collect(),
        }
    }

    /// GPU-ready instance list in draw order
    pub fn instances(&self) -> Vec<RenderInstance> {
        self.entities.iter().map(EntitySnapshot::instance).collect()
    }
}

impl GameState {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

/// Per-entity instance data for a renderer's instance buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub position: [f32; 2],
    pub size: [f32; 2],
    pub rotation: f32,
    /// `EntityKind` discriminant
    pub kind: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_SIZE;
    use crate::sim::aabb::OrientedBox;
    use crate::sim::state::{Beam, Enemy, Gem};

    #[test]
    fn test_hidden_weapons_not_drawn() {
        let state = GameState::new(4);
        let snap = state.snapshot();
        let kinds: Vec<EntityKind> = snap.entities.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EntityKind::Player, EntityKind::OrbitBlade]);
        assert_eq!(snap.entities[0].size, Vec2::splat(PLAYER_SIZE));
    }

    #[test]
    fn test_snapshot_lists_live_entities() {
        let mut state = GameState::new(4);
        let tuning = state.tuning.clone();
        let enemy = state
            .registry
            .add(Enemy::new(EnemyKind::Tank, Vec2::new(300.0, 0.0), 100.0, &tuning));
        let gem = state.registry.add(Gem::new(Vec2::new(-50.0, 0.0), 5));
        state.registry.remove(gem);
        let snap = state.snapshot();
        assert!(snap.entities.iter().any(|e| e.id == enemy && e.kind == EntityKind::TankEnemy));
        assert!(snap.entities.iter().all(|e| e.id != gem));
    }

    #[test]
    fn test_beam_snapshot_is_rotated() {
        let mut state = GameState::new(4);
        let region = OrientedBox::from_origin(Vec2::ZERO, Vec2::Y, 400.0, 24.0);
        state.registry.add(Beam::new(2, region, 25.0, 300.0));
        let snap = state.snapshot();
        let beam = snap.entities.iter().find(|e| e.kind == EntityKind::Beam).unwrap();
        assert_eq!(beam.size, Vec2::new(400.0, 24.0));
        assert!((beam.rotation - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(beam.pos, Vec2::new(0.0, 200.0));
    }

    #[test]
    fn test_hud_choices_only_while_pending() {
        let mut state = GameState::new(4);
        assert!(state.snapshot().hud.choices.is_empty());
        state.pending_level_ups = 1;
        crate::sim::progression::open_offer(&mut state);
        let hud = state.snapshot().hud;
        assert_eq!(hud.phase, GamePhase::LevelUpPending);
        assert_eq!(hud.choices.len(), 5);
        assert!(hud.choices.iter().all(|c| !c.label.is_empty()));
    }

    #[test]
    fn test_instances_cast_to_bytes() {
        let state = GameState::new(4);
        let instances = state.snapshot().instances();
        let bytes: &[u8] = bytemuck::cast_slice(&instances);
        assert_eq!(bytes.len(), instances.len() * std::mem::size_of::<RenderInstance>());
        assert_eq!(std::mem::size_of::<RenderInstance>(), 24);
        assert_eq!(instances[0].kind, EntityKind::Player as u32);
    }
}
