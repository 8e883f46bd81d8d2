//! Per-kind movement rules
//!
//! Runs before any collision pass so overlap tests see post-movement positions.

use glam::Vec2;

use super::aabb::Aabb;
use super::registry::Registry;
use super::state::{Body, GameState, WeaponKind};
use crate::consts::PLAYER_SIZE;
use crate::direction_to;
use crate::tuning::Tuning;

/// Playable world, centered on the origin
pub fn world_bounds(tuning: &Tuning) -> Aabb {
    Aabb::new(Vec2::ZERO, Vec2::new(tuning.world_width, tuning.world_height))
}

/// The region a projectile must keep touching to stay alive
pub fn active_region(player_pos: Vec2, tuning: &Tuning) -> Aabb {
    Aabb::new(player_pos, Vec2::new(tuning.view_width, tuning.view_height)).expanded(tuning.cull_margin)
}

/// Advance every entity population by one tick
pub fn run_movement(state: &mut GameState, intent: Vec2, dt: f32) {
    let world = world_bounds(&state.tuning);
    move_player(&mut state.registry, intent, dt, &world);

    let registry = &mut state.registry;
    move_enemies(registry, dt);
    move_weapons(registry, dt);

    let region = active_region(registry.player.pos, &state.tuning);
    move_projectiles(registry, dt, &region);
    age_beams(registry, dt * 1000.0);
    move_gems(registry, state.tuning.gem_seek_speed, dt);
}

/// Move by `intent * speed`, then clamp to the world
pub fn move_player(registry: &mut Registry, intent: Vec2, dt: f32, world: &Aabb) {
    let player = &mut registry.player;
    let dir = intent.normalize_or_zero();
    if dir != Vec2::ZERO {
        player.facing = dir;
    }
    let moved = player.pos + dir * player.speed * dt;
    player.pos = world.clamp_inside(moved, Vec2::splat(PLAYER_SIZE * 0.5));
}

/// Every enemy variant seeks straight toward the player
pub fn move_enemies(registry: &mut Registry, dt: f32) {
    let target = registry.player.pos;
    for enemy in registry.enemies.iter_mut().filter(|e| e.is_alive()) {
        let steering = direction_to(enemy.pos, target);
        let step = enemy.speed * dt;
        // Stop on the player instead of jittering across it
        let dist = enemy.pos.distance(target);
        enemy.pos += steering * step.min(dist);
    }
}

/// Spin orbit blades and keep every weapon centered on the player
pub fn move_weapons(registry: &mut Registry, dt: f32) {
    let center = registry.player.pos;
    for weapon in registry.weapons.iter_mut() {
        match &mut weapon.kind {
            WeaponKind::OrbitBlade(orbit) => {
                orbit.angle = (orbit.angle + orbit.angular_speed * dt) % std::f32::consts::TAU;
                weapon.pos = center + orbit.offset();
            }
            _ => weapon.pos = center,
        }
    }
}

/// Constant-velocity flight; projectiles leaving the active region are destroyed
pub fn move_projectiles(registry: &mut Registry, dt: f32, region: &Aabb) {
    for projectile in registry.projectiles.iter_mut().filter(|p| p.is_alive()) {
        projectile.pos += projectile.vel * dt;
        if !projectile.bounds().overlaps(region) {
            projectile.kill();
        }
    }
}

/// Beams stay put and expire purely on elapsed time
pub fn age_beams(registry: &mut Registry, dt_ms: f32) {
    for beam in registry.beams.iter_mut().filter(|b| b.is_alive()) {
        beam.remaining_ms -= dt_ms;
        if beam.remaining_ms <= 0.0 {
            beam.kill();
        }
    }
}

/// Gems within the magnet radius (boundary included) drift toward the player
pub fn move_gems(registry: &mut Registry, seek_speed: f32, dt: f32) {
    let player = &registry.player;
    if player.magnet_radius <= 0.0 {
        return;
    }
    let (target, radius) = (player.pos, player.magnet_radius);
    for gem in registry.gems.iter_mut().filter(|g| g.is_alive()) {
        let dist = gem.pos.distance(target);
        if dist <= radius {
            let step = (seek_speed * dt).min(dist);
            gem.pos += direction_to(gem.pos, target) * step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::aabb::OrientedBox;
    use crate::sim::state::{Beam, Enemy, EnemyKind, Gem, Projectile};

    #[test]
    fn test_player_clamped_to_world() {
        let mut state = GameState::new(1);
        let world = world_bounds(&state.tuning);
        state.registry.player.pos = Vec2::new(1595.0, 0.0);
        move_player(&mut state.registry, Vec2::X, 1.0, &world);
        assert_eq!(state.registry.player.pos.x, 1600.0 - PLAYER_SIZE * 0.5);
    }

    #[test]
    fn test_facing_keeps_last_nonzero_direction() {
        let mut state = GameState::new(1);
        let world = world_bounds(&state.tuning);
        move_player(&mut state.registry, Vec2::new(0.0, -1.0), SIM_DT, &world);
        move_player(&mut state.registry, Vec2::ZERO, SIM_DT, &world);
        assert_eq!(state.registry.player.facing, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_diagonal_intent_not_faster() {
        let mut state = GameState::new(1);
        let world = world_bounds(&state.tuning);
        move_player(&mut state.registry, Vec2::new(1.0, 1.0), 1.0, &world);
        let moved = state.registry.player.pos.length();
        assert!((moved - state.registry.player.speed).abs() < 1e-3);
    }

    #[test]
    fn test_enemies_seek_player() {
        let mut state = GameState::new(1);
        let tuning = state.tuning.clone();
        let id = state
            .registry
            .add(Enemy::new(EnemyKind::Basic, Vec2::new(500.0, 0.0), 120.0, &tuning));
        move_enemies(&mut state.registry, 1.0);
        let enemy = state.registry.enemies.iter().find(|e| e.id == id).unwrap();
        assert!((enemy.pos.x - 380.0).abs() < 1e-3);
        assert_eq!(enemy.pos.y, 0.0);
    }

    #[test]
    fn test_orbit_blade_follows_player() {
        let mut state = GameState::new(1);
        state.registry.player.pos = Vec2::new(50.0, 50.0);
        move_weapons(&mut state.registry, 0.0);
        let blade = &state.registry.weapons[0];
        assert!((blade.pos - Vec2::new(150.0, 50.0)).length() < 1e-3);
    }

    #[test]
    fn test_projectile_culled_outside_region() {
        let mut state = GameState::new(1);
        let region = active_region(Vec2::ZERO, &state.tuning);
        let id = state
            .registry
            .add(Projectile::new(0, Vec2::new(735.0, 0.0), Vec2::new(100.0, 0.0), 1.0));
        // Just off-screen but inside the margin
        move_projectiles(&mut state.registry, 0.0, &region);
        assert!(state.registry.is_alive(id));
        move_projectiles(&mut state.registry, 1.0, &region);
        assert!(!state.registry.is_alive(id));
    }

    #[test]
    fn test_beam_expires_on_time_only() {
        let mut state = GameState::new(1);
        let region = OrientedBox::from_origin(Vec2::ZERO, Vec2::X, 400.0, 24.0);
        let id = state.registry.add(Beam::new(0, region, 5.0, 300.0));
        age_beams(&mut state.registry, 299.0);
        assert!(state.registry.is_alive(id));
        age_beams(&mut state.registry, 1.0);
        assert!(!state.registry.is_alive(id));
    }

    #[test]
    fn test_magnet_pulls_gems_in_range() {
        let mut state = GameState::new(1);
        let distance = 100.0;
        let id = state.registry.add(Gem::new(Vec2::new(distance, 0.0), 5));

        state.registry.player.magnet_radius = 60.0;
        move_gems(&mut state.registry, 360.0, SIM_DT);
        assert_eq!(state.registry.gems[0].pos.x, distance);

        state.registry.player.magnet_radius = 120.0;
        let mut last = distance;
        for _ in 0..5 {
            move_gems(&mut state.registry, 360.0, SIM_DT);
            let x = state.registry.gems[0].pos.x;
            assert!(x < last);
            last = x;
        }
        assert!(state.registry.is_alive(id));
    }

    #[test]
    fn test_magnet_radius_equal_to_distance_pulls() {
        let mut state = GameState::new(1);
        state.registry.add(Gem::new(Vec2::new(0.0, 80.0), 5));
        state.registry.player.magnet_radius = 80.0;
        move_gems(&mut state.registry, 360.0, SIM_DT);
        let y = state.registry.gems[0].pos.y;
        assert!(y < 80.0);
        assert!((y - (80.0 - 360.0 * SIM_DT)).abs() < 1e-3);
    }
}
