//! Weapon cooldowns, targeting, firing patterns, and evolution
//!
//! Cooldowns compare against the last shot rather than accumulating, so a
//! long frame never produces a catch-up burst.

use glam::Vec2;

use super::aabb::OrientedBox;
use super::registry::Registry;
use super::state::{Beam, Body, EntityId, GameEvent, GameState, Projectile, UpgradeKind, Weapon, WeaponKind};
use crate::tuning::{OrbitDamagePolicy, Tuning};
use crate::{direction_to, rotate_degrees};

/// The live enemy closest to `from` by squared distance
pub fn nearest_enemy(registry: &Registry, from: Vec2) -> Option<(EntityId, Vec2)> {
    registry
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .min_by(|a, b| a.pos.distance_squared(from).total_cmp(&b.pos.distance_squared(from)))
        .map(|e| (e.id, e.pos))
}

/// Fire every weapon whose cooldown has elapsed
pub fn run_weapons(state: &mut GameState) {
    let now = state.elapsed_ms;
    for slot in 0..state.registry.weapons.len() {
        if !state.registry.weapons[slot].is_ready(now) {
            continue;
        }
        let fired = fire(&mut state.registry, slot, &state.tuning);
        let weapon = &mut state.registry.weapons[slot];
        // The cycle is spent even when there was nothing to shoot at
        weapon.last_fire_ms = now;
        if fired {
            state.events.push(GameEvent::WeaponFired { weapon: weapon.id });
        }
    }
}

/// Spawn the weapon's shots. Returns false if it had no target.
fn fire(registry: &mut Registry, slot: usize, tuning: &Tuning) -> bool {
    let weapon = &registry.weapons[slot];
    let (source, origin, kind) = (weapon.id, weapon.pos, weapon.kind);
    let damage = weapon.damage * registry.player.damage_multiplier;

    match kind {
        WeaponKind::OrbitBlade(_) => false,
        WeaponKind::Launcher => {
            let Some((_, target)) = nearest_enemy(registry, registry.player.pos) else {
                return false;
            };
            let dir = direction_to(origin, target);
            registry.add(Projectile::new(source, origin, dir * tuning.projectile_speed, damage));
            true
        }
        WeaponKind::SpreadLauncher => {
            let Some((_, target)) = nearest_enemy(registry, registry.player.pos) else {
                return false;
            };
            let dir = direction_to(origin, target);
            let spread = tuning.evolved_spread_degrees;
            for shot in [dir, rotate_degrees(dir, spread), rotate_degrees(dir, -spread)] {
                registry.add(Projectile::new(source, origin, shot * tuning.projectile_speed, damage));
            }
            true
        }
        WeaponKind::BeamEmitter => {
            let region = OrientedBox::from_origin(
                registry.player.pos,
                registry.player.facing,
                tuning.beam_length,
                tuning.beam_width,
            );
            registry.add(Beam::new(source, region, damage, tuning.beam_duration_ms));
            true
        }
    }
}

/// Damage one orbit-blade overlap deals this tick
pub fn orbit_hit_damage(weapon: &Weapon, multiplier: f32, tuning: &Tuning, dt: f32) -> f32 {
    let per_tick = weapon.damage * multiplier;
    match tuning.orbit_damage_policy {
        OrbitDamagePolicy::PerTick => per_tick,
        OrbitDamagePolicy::PerSecond => per_tick * dt * tuning.orbit_reference_hz,
    }
}

/// Evolved form of a launcher; keeps its slot state (level, cooldown, damage, timing)
pub fn evolved(weapon: &Weapon) -> Weapon {
    let mut next = weapon.clone();
    next.kind = WeaponKind::SpreadLauncher;
    next
}

/// Evolve the launcher once it and Damage Up are both at their caps.
///
/// Returns `(old_id, new_id)` when an evolution happened.
pub fn try_evolve(state: &mut GameState) -> Option<(EntityId, EntityId)> {
    let damage_level = state.registry.player.upgrades.get(UpgradeKind::DamageUp);
    if damage_level < state.tuning.upgrade_level_cap {
        return None;
    }
    let slot = state.registry.weapons.iter().position(|w| {
        w.kind == WeaponKind::Launcher && w.level >= state.tuning.weapon_level_cap
    })?;
    let replacement = evolved(&state.registry.weapons[slot]);
    let (old, new) = state.registry.replace_weapon(slot, replacement)?;
    log::info!("Launcher evolved into spread launcher ({} -> {})", old, new);
    state.events.push(GameEvent::WeaponEvolved { old, new });
    Some((old, new))
}
