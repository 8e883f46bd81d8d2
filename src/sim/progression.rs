//! Experience, level-ups, upgrade offers, and game over
//!
//! Level-ups earned during a tick are queued in `pending_level_ups`; the tick
//! opens an offer once it finishes, and each selection resolves one of them.

use rand::seq::index;
use serde::Serialize;

use super::state::{GameEvent, GamePhase, GameState, UpgradeKind, Weapon, WeaponKind};
use super::weapons::try_evolve;
use crate::consts::MAX_UPGRADE_CHOICES;
use crate::error::SimError;

/// One option on the level-up screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeChoice {
    pub kind: UpgradeKind,
    pub label: &'static str,
    /// Level before taking this choice (0 for Heal)
    pub level: u32,
}

/// The options presented for one level-up.
///
/// Holds up to `MAX_UPGRADE_CHOICES` sampled upgrades followed by Heal,
/// which is always offered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpgradeOffer {
    pub choices: Vec<UpgradeChoice>,
}

impl UpgradeOffer {
    /// The sampled upgrades, without the trailing Heal option
    pub fn upgrades(&self) -> &[UpgradeChoice] {
        let n = self.choices.len().saturating_sub(1);
        &self.choices[..n]
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Bank experience and queue any level-ups it causes
pub fn grant_experience(state: &mut GameState, xp: u32) {
    let growth = state.tuning.xp_threshold_growth;
    let gained = state.registry.player.gain_experience(xp, growth);
    queue_level_ups(state, gained);
}

/// Grant levels directly (treasure chests)
pub fn grant_levels(state: &mut GameState, levels: u32) {
    let growth = state.tuning.xp_threshold_growth;
    state.registry.player.grant_levels(levels, growth);
    queue_level_ups(state, levels);
}

fn queue_level_ups(state: &mut GameState, levels: u32) {
    if levels == 0 {
        return;
    }
    state.pending_level_ups = state.pending_level_ups.saturating_add(levels);
    let level = state.registry.player.level;
    for reached in (level.saturating_sub(levels) + 1)..=level {
        state.events.push(GameEvent::LevelUp { level: reached });
    }
    log::info!("Level {} reached ({} pending)", level, state.pending_level_ups);
}

/// Terminal state for the run; records the result on the leaderboard
pub fn enter_game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.offer = None;
    state.pending_level_ups = 0;
    let level = state.registry.player.level;
    let secs = state.survival_secs();
    let rank = state.high_scores.add_score(state.score, level, secs);
    log::info!(
        "Game over: score {}, level {}, survived {:.1}s (rank {:?})",
        state.score,
        level,
        secs,
        rank
    );
    state.events.push(GameEvent::GameOver { score: state.score });
}

/// Slot of the weapon an upgrade kind levels, if any
fn weapon_slot(state: &GameState, kind: UpgradeKind) -> Option<usize> {
    let fits: fn(&WeaponKind) -> bool = match kind {
        UpgradeKind::ProjectileCooldown => |k| matches!(k, WeaponKind::Launcher | WeaponKind::SpreadLauncher),
        UpgradeKind::BeamCooldown => |k| matches!(k, WeaponKind::BeamEmitter),
        UpgradeKind::OrbitSpeed => |k| matches!(k, WeaponKind::OrbitBlade(_)),
        _ => return None,
    };
    state.registry.weapons.iter().position(|w| fits(&w.kind))
}

fn is_weapon_upgrade(kind: UpgradeKind) -> bool {
    matches!(
        kind,
        UpgradeKind::ProjectileCooldown | UpgradeKind::BeamCooldown | UpgradeKind::OrbitSpeed
    )
}

/// Current level shown for an upgrade kind
pub fn current_level(state: &GameState, kind: UpgradeKind) -> u32 {
    match weapon_slot(state, kind) {
        Some(slot) => state.registry.weapons[slot].level,
        None => state.registry.player.upgrades.get(kind),
    }
}

/// Upgrade kinds not yet at their cap
pub fn eligible_upgrades(state: &GameState) -> Vec<UpgradeKind> {
    let t = &state.tuning;
    UpgradeKind::POOL
        .into_iter()
        .filter(|&kind| {
            if state.registry.player.upgrades.get(kind) >= t.upgrade_level_cap {
                return false;
            }
            if is_weapon_upgrade(kind) {
                return weapon_slot(state, kind)
                    .is_some_and(|slot| state.registry.weapons[slot].level < t.weapon_level_cap);
            }
            true
        })
        .collect()
}

/// Sample distinct upgrades without replacement, then append Heal
pub fn roll_offer(state: &mut GameState) -> UpgradeOffer {
    let eligible = eligible_upgrades(state);
    let amount = eligible.len().min(MAX_UPGRADE_CHOICES);
    let picked = index::sample(&mut state.rng, eligible.len(), amount);

    let mut choices: Vec<UpgradeChoice> = picked
        .into_iter()
        .map(|i| {
            let kind = eligible[i];
            UpgradeChoice {
                kind,
                label: kind.label(),
                level: current_level(state, kind),
            }
        })
        .collect();
    choices.push(UpgradeChoice {
        kind: UpgradeKind::Heal,
        label: UpgradeKind::Heal.label(),
        level: 0,
    });
    UpgradeOffer { choices }
}

/// Enter `LevelUpPending` if level-ups are queued and the run is live
pub fn open_offer(state: &mut GameState) {
    if state.phase != GamePhase::Running || state.pending_level_ups == 0 {
        return;
    }
    state.offer = Some(roll_offer(state));
    state.phase = GamePhase::LevelUpPending;
}

fn reduce_cooldown(weapon: &mut Weapon, factor: f32, floor_ms: f32) {
    weapon.cooldown_ms = (weapon.cooldown_ms * factor).max(floor_ms);
}

/// Apply an upgrade's fixed per-level delta, then check for evolution
pub fn apply_upgrade(state: &mut GameState, kind: UpgradeKind) {
    let t = &state.tuning;
    let slot = weapon_slot(state, kind);
    let player = &mut state.registry.player;

    match kind {
        UpgradeKind::ProjectileCooldown | UpgradeKind::BeamCooldown => {
            if let Some(slot) = slot {
                let weapon = &mut state.registry.weapons[slot];
                reduce_cooldown(weapon, t.cooldown_factor, t.cooldown_floor_ms);
                weapon.level += 1;
            }
        }
        UpgradeKind::OrbitSpeed => {
            if let Some(slot) = slot {
                let weapon = &mut state.registry.weapons[slot];
                if let WeaponKind::OrbitBlade(orbit) = &mut weapon.kind {
                    orbit.angular_speed += t.orbit_speed_step;
                }
                weapon.level += 1;
            }
        }
        UpgradeKind::DamageUp => player.damage_multiplier += t.damage_multiplier_step,
        UpgradeKind::MoveSpeed => player.speed += t.speed_step,
        UpgradeKind::MaxHealth => {
            player.max_health += t.max_health_step;
            player.heal(t.max_health_step);
        }
        UpgradeKind::Magnet => player.magnet_radius += t.magnet_step,
        UpgradeKind::Heal => {
            let amount = player.max_health * t.heal_fraction;
            player.heal(amount);
        }
    }

    if kind != UpgradeKind::Heal {
        let level = state.registry.player.upgrades.increment(kind);
        log::info!("Upgrade {:?} -> level {}", kind, level);
    }
    try_evolve(state);
}

impl GameState {
    /// Take option `index` of the current offer.
    ///
    /// Only valid while `LevelUpPending`. If more level-ups are queued a new
    /// offer is rolled immediately; otherwise the run resumes.
    pub fn select_upgrade(&mut self, index: usize) -> Result<UpgradeKind, SimError> {
        if self.phase != GamePhase::LevelUpPending {
            return Err(SimError::NoUpgradePending { phase: self.phase });
        }
        let Some(offer) = self.offer.as_ref() else {
            return Err(SimError::NoUpgradePending { phase: self.phase });
        };
        let kind = offer
            .choices
            .get(index)
            .map(|c| c.kind)
            .ok_or(SimError::ChoiceOutOfRange {
                index,
                available: offer.len(),
            })?;

        apply_upgrade(self, kind);
        self.pending_level_ups = self.pending_level_ups.saturating_sub(1);
        if self.pending_level_ups > 0 {
            self.offer = Some(roll_offer(self));
        } else {
            self.offer = None;
            self.phase = GamePhase::Running;
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn max_out(state: &mut GameState, kinds: &[UpgradeKind]) {
        let cap = state.tuning.upgrade_level_cap;
        for &kind in kinds {
            state.registry.player.upgrades.set(kind, cap);
        }
    }

    fn pending(state: &mut GameState, levels: u32) {
        state.pending_level_ups = levels;
        open_offer(state);
    }

    #[test]
    fn test_offer_has_four_upgrades_and_heal() {
        let mut state = GameState::new(11);
        pending(&mut state, 1);
        assert_eq!(state.phase, GamePhase::LevelUpPending);
        let offer = state.offer.as_ref().unwrap();
        assert_eq!(offer.upgrades().len(), MAX_UPGRADE_CHOICES);
        assert_eq!(offer.choices.last().map(|c| c.kind), Some(UpgradeKind::Heal));
        let kinds: HashSet<_> = offer.upgrades().iter().map(|c| c.kind).collect();
        assert_eq!(kinds.len(), MAX_UPGRADE_CHOICES);
        assert!(!kinds.contains(&UpgradeKind::Heal));
    }

    #[test]
    fn test_two_eligible_upgrades() {
        for seed in 0..32 {
            let mut state = GameState::new(seed);
            max_out(
                &mut state,
                &[
                    UpgradeKind::ProjectileCooldown,
                    UpgradeKind::BeamCooldown,
                    UpgradeKind::OrbitSpeed,
                    UpgradeKind::DamageUp,
                    UpgradeKind::MoveSpeed,
                ],
            );
            assert_eq!(eligible_upgrades(&state).len(), 2);
            let offer = roll_offer(&mut state);
            assert_eq!(offer.upgrades().len(), 2);
            assert_eq!(offer.len(), 3);
            assert_eq!(offer.choices[2].kind, UpgradeKind::Heal);
        }
    }

    #[test]
    fn test_all_maxed_offers_only_heal() {
        let mut state = GameState::new(5);
        max_out(&mut state, &UpgradeKind::POOL);
        pending(&mut state, 1);
        let offer = state.offer.as_ref().unwrap();
        assert_eq!(offer.len(), 1);
        assert_eq!(offer.choices[0].kind, UpgradeKind::Heal);
        state.registry.player.health = 10.0;
        assert_eq!(state.select_upgrade(0).unwrap(), UpgradeKind::Heal);
        assert!((state.registry.player.health - 40.0).abs() < 1e-4);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_weapon_level_caps_eligibility() {
        let mut state = GameState::new(5);
        let cap = state.tuning.weapon_level_cap;
        let slot = weapon_slot(&state, UpgradeKind::BeamCooldown).unwrap();
        state.registry.weapons[slot].level = cap;
        assert!(!eligible_upgrades(&state).contains(&UpgradeKind::BeamCooldown));
    }

    #[test]
    fn test_select_outside_level_up_is_rejected() {
        let mut state = GameState::new(5);
        assert!(matches!(state.select_upgrade(0), Err(SimError::NoUpgradePending { .. })));
        pending(&mut state, 1);
        let available = state.offer.as_ref().unwrap().len();
        assert!(matches!(
            state.select_upgrade(available),
            Err(SimError::ChoiceOutOfRange { .. })
        ));
        assert_eq!(state.phase, GamePhase::LevelUpPending);
    }

    #[test]
    fn test_queued_level_ups_need_one_selection_each() {
        let mut state = GameState::new(5);
        pending(&mut state, 2);
        state.select_upgrade(0).unwrap();
        assert_eq!(state.phase, GamePhase::LevelUpPending);
        assert!(state.offer.is_some());
        state.select_upgrade(0).unwrap();
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.offer.is_none());
    }

    #[test]
    fn test_upgrade_deltas() {
        let mut state = GameState::new(5);
        apply_upgrade(&mut state, UpgradeKind::MaxHealth);
        apply_upgrade(&mut state, UpgradeKind::Magnet);
        apply_upgrade(&mut state, UpgradeKind::DamageUp);
        apply_upgrade(&mut state, UpgradeKind::ProjectileCooldown);
        let player = &state.registry.player;
        assert_eq!(player.max_health, 120.0);
        assert_eq!(player.health, 120.0);
        assert_eq!(player.magnet_radius, 60.0);
        assert!((player.damage_multiplier - 1.1).abs() < 1e-5);
        assert_eq!(player.upgrades.get(UpgradeKind::Magnet), 1);
        let slot = weapon_slot(&state, UpgradeKind::ProjectileCooldown).unwrap();
        assert!((state.registry.weapons[slot].cooldown_ms - 1020.0).abs() < 1e-3);
        assert_eq!(state.registry.weapons[slot].level, 2);
    }

    #[test]
    fn test_cooldown_floor() {
        let mut state = GameState::with_tuning(
            5,
            crate::Tuning {
                upgrade_level_cap: 100,
                weapon_level_cap: 100,
                ..Default::default()
            },
        )
        .unwrap();
        for _ in 0..50 {
            apply_upgrade(&mut state, UpgradeKind::BeamCooldown);
        }
        let slot = weapon_slot(&state, UpgradeKind::BeamCooldown).unwrap();
        assert_eq!(state.registry.weapons[slot].cooldown_ms, state.tuning.cooldown_floor_ms);
    }

    #[test]
    fn test_upgrades_drive_evolution() {
        let mut state = GameState::new(5);
        let slots = state.registry.weapons.len();
        for _ in 0..state.tuning.upgrade_level_cap {
            apply_upgrade(&mut state, UpgradeKind::DamageUp);
        }
        for _ in 1..state.tuning.weapon_level_cap {
            apply_upgrade(&mut state, UpgradeKind::ProjectileCooldown);
        }
        let slot = weapon_slot(&state, UpgradeKind::ProjectileCooldown).unwrap();
        assert_eq!(state.registry.weapons[slot].kind, WeaponKind::SpreadLauncher);
        assert_eq!(state.registry.weapons.len(), slots);
        assert!(!eligible_upgrades(&state).contains(&UpgradeKind::ProjectileCooldown));
        let evolutions = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::WeaponEvolved { .. }))
            .count();
        assert_eq!(evolutions, 1);
    }

    #[test]
    fn test_game_over_records_run() {
        let mut state = GameState::new(5);
        state.score = 42;
        enter_game_over(&mut state);
        enter_game_over(&mut state);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.high_scores.entries.len(), 1);
        assert_eq!(state.high_scores.top_score(), Some(42));
    }

    proptest! {
        #[test]
        fn prop_health_stays_in_range(ops in prop::collection::vec((0usize..8, 0.0f32..200.0), 1..60)) {
            let mut state = GameState::new(9);
            for (op, amount) in ops {
                match op {
                    0 => {
                        state.registry.player.take_damage(amount);
                    }
                    1 => state.registry.player.heal(amount),
                    n => apply_upgrade(&mut state, UpgradeKind::POOL[(n - 2) % UpgradeKind::POOL.len()]),
                }
                let player = &state.registry.player;
                prop_assert!(player.health >= 0.0 && player.health <= player.max_health);
            }
        }

        #[test]
        fn prop_experience_below_threshold_after_gain(gains in prop::collection::vec(0u32..500, 1..20)) {
            let mut state = GameState::new(9);
            let mut last_level = state.registry.player.level;
            for xp in gains {
                grant_experience(&mut state, xp);
                let player = &state.registry.player;
                prop_assert!(player.experience < player.experience_to_next);
                prop_assert!(player.level >= last_level);
                last_level = player.level;
            }
            prop_assert_eq!(state.pending_level_ups, state.registry.player.level - 1);
        }
    }
}
