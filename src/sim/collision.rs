//! Collision and combat resolution
//!
//! Runs after movement and firing, so every test uses post-movement positions.
//! Order within a tick:
//! 1. orbit blades vs enemies (every tick of overlap)
//! 2. projectiles vs enemies (single use)
//! 3. beams vs enemies (once per enemy per beam)
//! 4. player vs gems
//! 5. player vs chests
//! 6. player vs enemies (contact damage)
//!
//! Enemy death is handled inline by [`damage_enemy`], which re-checks
//! liveness first so an enemy killed earlier in the tick is never credited twice.

use super::progression;
use super::state::{Body, Chest, EnemyKind, EntityId, GameEvent, GameState, Gem};
use super::weapons::orbit_hit_damage;

/// Resolve every overlap for this tick
pub fn run_collisions(state: &mut GameState, dt: f32) {
    orbit_vs_enemies(state, dt);
    projectiles_vs_enemies(state);
    beams_vs_enemies(state);
    player_vs_gems(state);
    player_vs_chests(state);
    player_vs_enemies(state);
}

/// Apply damage from weapon `source` to a live enemy, handling death and loot.
///
/// Returns true if this call killed it. Dead or unknown ids are a no-op.
pub fn damage_enemy(state: &mut GameState, id: EntityId, amount: f32, source: EntityId) -> bool {
    let Some(enemy) = state.registry.enemy_mut(id) else {
        return false;
    };
    if !enemy.take_damage(amount) {
        return false;
    }
    let (kind, pos, xp) = (enemy.kind, enemy.pos, enemy.xp_value);
    if !state.registry.remove(id) {
        return false;
    }

    state.score += 1;
    match kind {
        EnemyKind::Boss => {
            state.registry.add(Chest::new(pos, state.tuning.chest_levels));
            log::info!("Boss {} defeated, chest dropped", id);
        }
        _ => {
            state.registry.add(Gem::new(pos, xp));
        }
    }
    state.events.push(GameEvent::EnemyKilled {
        id,
        kind,
        pos,
        by: source,
    });
    true
}

fn overlapping_enemies(state: &GameState, bounds: &super::aabb::Aabb) -> Vec<EntityId> {
    state
        .registry
        .enemies
        .iter()
        .filter(|e| e.is_alive() && e.bounds().overlaps(bounds))
        .map(|e| e.id)
        .collect()
}

fn orbit_vs_enemies(state: &mut GameState, dt: f32) {
    let multiplier = state.registry.player.damage_multiplier;
    for slot in 0..state.registry.weapons.len() {
        let weapon = &state.registry.weapons[slot];
        if !weapon.kind.is_orbit() || !weapon.is_alive() {
            continue;
        }
        let (source, damage) = (weapon.id, orbit_hit_damage(weapon, multiplier, &state.tuning, dt));
        let bounds = weapon.bounds();
        for enemy in overlapping_enemies(state, &bounds) {
            damage_enemy(state, enemy, damage, source);
        }
    }
}

fn projectiles_vs_enemies(state: &mut GameState) {
    for i in 0..state.registry.projectiles.len() {
        let projectile = &state.registry.projectiles[i];
        if !projectile.is_alive() {
            continue;
        }
        let bounds = projectile.bounds();
        let (source, damage) = (projectile.source, projectile.damage);
        let hit = state
            .registry
            .enemies
            .iter()
            .find(|e| e.is_alive() && e.bounds().overlaps(&bounds))
            .map(|e| e.id);
        if let Some(enemy) = hit {
            state.registry.projectiles[i].kill();
            damage_enemy(state, enemy, damage, source);
        }
    }
}

fn beams_vs_enemies(state: &mut GameState) {
    for i in 0..state.registry.beams.len() {
        let beam = &state.registry.beams[i];
        if !beam.is_alive() {
            continue;
        }
        let (region, source, damage) = (beam.region, beam.source, beam.damage);
        let candidates: Vec<EntityId> = state
            .registry
            .enemies
            .iter()
            .filter(|e| e.is_alive() && region.overlaps_aabb(&e.bounds()))
            .map(|e| e.id)
            .collect();
        for enemy in candidates {
            if state.registry.beams[i].try_hit(enemy) {
                damage_enemy(state, enemy, damage, source);
            }
        }
    }
}

fn player_vs_gems(state: &mut GameState) {
    let bounds = state.registry.player.bounds();
    let mut xp = 0;
    for gem in state.registry.gems.iter_mut() {
        if gem.is_alive() && gem.bounds().overlaps(&bounds) && gem.kill() {
            xp += gem.xp;
            state.events.push(GameEvent::GemCollected { xp: gem.xp });
        }
    }
    if xp > 0 {
        progression::grant_experience(state, xp);
    }
}

fn player_vs_chests(state: &mut GameState) {
    let bounds = state.registry.player.bounds();
    let mut levels = 0;
    for chest in state.registry.chests.iter_mut() {
        if chest.is_alive() && chest.bounds().overlaps(&bounds) && chest.kill() {
            levels += chest.levels;
            state.events.push(GameEvent::ChestOpened { levels: chest.levels });
        }
    }
    if levels > 0 {
        progression::grant_levels(state, levels);
    }
}

fn player_vs_enemies(state: &mut GameState) {
    let bounds = state.registry.player.bounds();
    for enemy in overlapping_enemies(state, &bounds) {
        let Some(contact) = state.registry.enemy_mut(enemy).map(|e| e.contact_damage) else {
            continue;
        };
        // Contact destroys the enemy without score or loot
        state.registry.remove(enemy);
        let player = &mut state.registry.player;
        let died = player.take_damage(contact);
        state.events.push(GameEvent::PlayerHit {
            damage: contact,
            health: player.health,
        });
        if died {
            progression::enter_game_over(state);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::aabb::OrientedBox;
    use crate::sim::state::{Beam, Category, Enemy, GamePhase, Projectile, WeaponKind};
    use glam::Vec2;

    fn add_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> EntityId {
        let tuning = state.tuning.clone();
        state.registry.add(Enemy::new(kind, pos, 0.0, &tuning))
    }

    fn enemy_health(state: &GameState, id: EntityId) -> f32 {
        state.registry.enemies.iter().find(|e| e.id == id).map(|e| e.health).unwrap()
    }

    #[test]
    fn test_death_awards_once_across_sources() {
        let mut state = GameState::new(1);
        let id = add_enemy(&mut state, EnemyKind::Basic, Vec2::new(300.0, 0.0));
        assert!(damage_enemy(&mut state, id, 10.0, 0));
        assert!(!damage_enemy(&mut state, id, 10.0, 0));
        assert_eq!(state.score, 1);
        assert_eq!(state.registry.count(Category::Gem), 1);
        assert_eq!(state.registry.gems[0].xp, state.tuning.basic_xp);
    }

    #[test]
    fn test_boss_drops_chest() {
        let mut state = GameState::new(1);
        let id = add_enemy(&mut state, EnemyKind::Boss, Vec2::new(300.0, 0.0));
        damage_enemy(&mut state, id, 10_000.0, 0);
        assert_eq!(state.registry.count(Category::Chest), 1);
        assert_eq!(state.registry.count(Category::Gem), 0);
    }

    #[test]
    fn test_orbit_damages_every_tick() {
        let mut state = GameState::new(1);
        let blade_pos = state.registry.weapons[0].pos + Vec2::new(100.0, 0.0);
        state.registry.weapons[0].pos = blade_pos;
        let id = add_enemy(&mut state, EnemyKind::Boss, blade_pos);
        let start = enemy_health(&state, id);
        for _ in 0..3 {
            orbit_vs_enemies(&mut state, SIM_DT);
        }
        assert!((start - enemy_health(&state, id) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_projectile_single_use() {
        let mut state = GameState::new(1);
        let pos = Vec2::new(300.0, 0.0);
        let a = add_enemy(&mut state, EnemyKind::Tank, pos);
        let b = add_enemy(&mut state, EnemyKind::Tank, pos);
        let shot = state.registry.add(Projectile::new(0, pos, Vec2::ZERO, 5.0));
        projectiles_vs_enemies(&mut state);
        assert!(!state.registry.is_alive(shot));
        let damaged = [a, b]
            .iter()
            .filter(|id| enemy_health(&state, **id) < state.tuning.tank_health)
            .count();
        assert_eq!(damaged, 1);
    }

    #[test]
    fn test_projectile_ignores_enemy_killed_this_tick() {
        let mut state = GameState::new(1);
        let pos = Vec2::new(300.0, 0.0);
        let id = add_enemy(&mut state, EnemyKind::Basic, pos);
        let first = state.registry.add(Projectile::new(0, pos, Vec2::ZERO, 50.0));
        let second = state.registry.add(Projectile::new(0, pos, Vec2::ZERO, 50.0));
        projectiles_vs_enemies(&mut state);
        assert!(!state.registry.is_alive(id));
        assert!(!state.registry.is_alive(first));
        // Nothing left to hit, so the second shot flies on
        assert!(state.registry.is_alive(second));
        assert_eq!(state.score, 1);
    }

    #[test]
    fn test_kill_credited_to_firing_weapon() {
        let mut state = GameState::new(1);
        let pos = Vec2::new(300.0, 0.0);
        let launcher = state.registry.weapons[1].id;
        let id = add_enemy(&mut state, EnemyKind::Basic, pos);
        state.registry.add(Projectile::new(launcher, pos, Vec2::ZERO, 50.0));
        projectiles_vs_enemies(&mut state);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::EnemyKilled { id: killed, by, .. } if *killed == id && *by == launcher
        )));

        let blade = state.registry.weapons[0].id;
        let blade_pos = state.registry.weapons[0].pos;
        let id = add_enemy(&mut state, EnemyKind::Basic, blade_pos);
        orbit_vs_enemies(&mut state, SIM_DT);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::EnemyKilled { id: killed, by, .. } if *killed == id && *by == blade
        )));
    }

    #[test]
    fn test_beam_hits_stationary_enemy_once() {
        let mut state = GameState::new(1);
        let id = add_enemy(&mut state, EnemyKind::Boss, Vec2::new(200.0, 0.0));
        let start = enemy_health(&state, id);
        let region = OrientedBox::from_origin(Vec2::ZERO, Vec2::X, 400.0, 24.0);
        let damage = 25.0;
        state.registry.add(Beam::new(0, region, damage, 300.0));
        let ticks = (300.0 / (SIM_DT * 1000.0)).ceil() as u32 + 2;
        for _ in 0..ticks {
            beams_vs_enemies(&mut state);
            crate::sim::movement::age_beams(&mut state.registry, SIM_DT * 1000.0);
        }
        assert_eq!(state.registry.count(Category::Beam), 0);
        assert!((start - enemy_health(&state, id) - damage).abs() < 1e-4);
    }

    #[test]
    fn test_gem_pickup_levels_player() {
        let mut state = GameState::new(1);
        let threshold = state.registry.player.experience_to_next;
        state.registry.add(Gem::new(Vec2::ZERO, threshold));
        player_vs_gems(&mut state);
        assert_eq!(state.registry.count(Category::Gem), 0);
        assert_eq!(state.registry.player.level, 2);
        assert_eq!(state.registry.player.experience, 0);
        assert_eq!(state.pending_level_ups, 1);
    }

    #[test]
    fn test_chest_grants_levels() {
        let mut state = GameState::new(1);
        state.registry.add(Chest::new(Vec2::ZERO, 2));
        player_vs_chests(&mut state);
        assert_eq!(state.registry.player.level, 3);
        assert_eq!(state.registry.player.experience, 0);
        assert_eq!(state.pending_level_ups, 2);
    }

    #[test]
    fn test_contact_damage_destroys_enemy_without_reward() {
        let mut state = GameState::new(1);
        let id = add_enemy(&mut state, EnemyKind::Tank, Vec2::new(5.0, 0.0));
        player_vs_enemies(&mut state);
        assert!(!state.registry.is_alive(id));
        assert_eq!(state.score, 0);
        assert_eq!(state.registry.count(Category::Gem), 0);
        let expected = state.tuning.player_max_health - state.tuning.tank_contact_damage;
        assert_eq!(state.registry.player.health, expected);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_lethal_contact_ends_run() {
        let mut state = GameState::new(1);
        state.registry.player.health = 5.0;
        add_enemy(&mut state, EnemyKind::Boss, Vec2::ZERO);
        add_enemy(&mut state, EnemyKind::Basic, Vec2::ZERO);
        player_vs_enemies(&mut state);
        assert_eq!(state.registry.player.health, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_invisible_weapons_never_collide() {
        let mut state = GameState::new(1);
        let launcher = state
            .registry
            .weapons
            .iter()
            .find(|w| w.kind == WeaponKind::Launcher)
            .map(|w| w.pos)
            .unwrap();
        // Enemy sits on the launcher; the blade is far away
        let id = add_enemy(&mut state, EnemyKind::Basic, launcher);
        state.registry.weapons[0].pos = Vec2::new(500.0, 500.0);
        orbit_vs_enemies(&mut state, SIM_DT);
        assert!(state.registry.is_alive(id));
    }
}
