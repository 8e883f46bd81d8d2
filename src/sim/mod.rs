//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies
//!
//! Per tick: spawner, movement, weapons, collisions, then progression.

pub mod aabb;
pub mod collision;
pub mod movement;
pub mod progression;
pub mod registry;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapons;

pub use aabb::{Aabb, OrientedBox};
pub use progression::{UpgradeChoice, UpgradeOffer};
pub use registry::{Entity, EntityRef, Registry};
pub use snapshot::{EntityKind, EntitySnapshot, Hud, RenderInstance, Snapshot};
pub use spawner::Spawner;
pub use state::{
    Beam, Body, Category, Chest, Enemy, EnemyKind, EntityId, GameEvent, GamePhase, GameState, Gem, Orbit,
    Player, Projectile, UpgradeKind, Weapon, WeaponKind,
};
pub use tick::{TickInput, tick};
