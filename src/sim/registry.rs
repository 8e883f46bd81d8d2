//! Entity registry
//!
//! Owns every live entity, grouped by category. Removal only flips a liveness
//! flag, so passes that iterate one category while killing entities of
//! another never invalidate each other. [`Registry::sweep`] drops the dead at
//! the end of a tick.

use std::collections::BTreeMap;

use glam::Vec2;

use super::aabb::Aabb;
use super::state::{Beam, Body, Category, Chest, Enemy, EntityId, Gem, Player, Projectile, Weapon};
use crate::tuning::Tuning;

/// Anything the registry can store, other than the player
#[derive(Debug, Clone)]
pub enum Entity {
    Enemy(Enemy),
    Weapon(Weapon),
    Projectile(Projectile),
    Beam(Beam),
    Gem(Gem),
    Chest(Chest),
}

macro_rules! entity_from {
    ($($variant:ident),*) => {
        $(impl From<$variant> for Entity {
            fn from(e: $variant) -> Self {
                Entity::$variant(e)
            }
        })*
    };
}

entity_from!(Enemy, Weapon, Projectile, Beam, Gem, Chest);

impl Entity {
    pub fn category(&self) -> Category {
        match self {
            Entity::Enemy(_) => Category::Enemy,
            Entity::Weapon(_) => Category::Weapon,
            Entity::Projectile(_) => Category::Projectile,
            Entity::Beam(_) => Category::Beam,
            Entity::Gem(_) => Category::Gem,
            Entity::Chest(_) => Category::Chest,
        }
    }
}

/// Borrowed view of one registry entry
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Player(&'a Player),
    Enemy(&'a Enemy),
    Weapon(&'a Weapon),
    Projectile(&'a Projectile),
    Beam(&'a Beam),
    Gem(&'a Gem),
    Chest(&'a Chest),
}

impl EntityRef<'_> {
    fn body(&self) -> &dyn Body {
        match *self {
            EntityRef::Player(e) => e,
            EntityRef::Enemy(e) => e,
            EntityRef::Weapon(e) => e,
            EntityRef::Projectile(e) => e,
            EntityRef::Beam(e) => e,
            EntityRef::Gem(e) => e,
            EntityRef::Chest(e) => e,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            EntityRef::Player(_) => Category::Player,
            EntityRef::Enemy(_) => Category::Enemy,
            EntityRef::Weapon(_) => Category::Weapon,
            EntityRef::Projectile(_) => Category::Projectile,
            EntityRef::Beam(_) => Category::Beam,
            EntityRef::Gem(_) => Category::Gem,
            EntityRef::Chest(_) => Category::Chest,
        }
    }

    pub fn id(&self) -> EntityId {
        self.body().id()
    }

    pub fn pos(&self) -> Vec2 {
        self.body().pos()
    }

    pub fn bounds(&self) -> Aabb {
        self.body().bounds()
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    pub player: Player,
    pub enemies: Vec<Enemy>,
    /// Index is the logical inventory slot
    pub weapons: Vec<Weapon>,
    pub projectiles: Vec<Projectile>,
    pub beams: Vec<Beam>,
    pub gems: Vec<Gem>,
    pub chests: Vec<Chest>,
    categories: BTreeMap<EntityId, Category>,
    next_id: EntityId,
}

impl Registry {
    /// Empty registry with a fresh player at the world center
    pub fn new(tuning: &Tuning) -> Self {
        Self::starting_at(tuning, 1)
    }

    fn starting_at(tuning: &Tuning, player_id: EntityId) -> Self {
        Self {
            player: Player::new(player_id, Vec2::ZERO, tuning),
            enemies: Vec::new(),
            weapons: Vec::new(),
            projectiles: Vec::new(),
            beams: Vec::new(),
            gems: Vec::new(),
            chests: Vec::new(),
            categories: BTreeMap::from([(player_id, Category::Player)]),
            next_id: player_id + 1,
        }
    }

    /// Drop every entity and start over with a fresh player.
    ///
    /// Ids keep counting up so stale handles from the last run never match.
    pub fn reset(&mut self, tuning: &Tuning) {
        *self = Self::starting_at(tuning, self.next_id);
    }

    fn allocate(&mut self, category: Category) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        self.categories.insert(id, category);
        id
    }

    /// Insert an entity under a newly allocated id
    pub fn add(&mut self, entity: impl Into<Entity>) -> EntityId {
        let entity = entity.into();
        let id = self.allocate(entity.category());
        match entity {
            Entity::Enemy(mut e) => {
                e.id = id;
                self.enemies.push(e);
            }
            Entity::Weapon(mut e) => {
                e.id = id;
                self.weapons.push(e);
            }
            Entity::Projectile(mut e) => {
                e.id = id;
                self.projectiles.push(e);
            }
            Entity::Beam(mut e) => {
                e.id = id;
                self.beams.push(e);
            }
            Entity::Gem(mut e) => {
                e.id = id;
                self.gems.push(e);
            }
            Entity::Chest(mut e) => {
                e.id = id;
                self.chests.push(e);
            }
        }
        id
    }

    /// Mark an entity dead. Returns true only the first time; unknown or
    /// already-removed ids are a no-op. The player cannot be removed.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let Some(category) = self.categories.get(&id).copied() else {
            return false;
        };
        match category {
            Category::Player => false,
            Category::Enemy => kill_in(&mut self.enemies, id),
            Category::Weapon => kill_in(&mut self.weapons, id),
            Category::Projectile => kill_in(&mut self.projectiles, id),
            Category::Beam => kill_in(&mut self.beams, id),
            Category::Gem => kill_in(&mut self.gems, id),
            Category::Chest => kill_in(&mut self.chests, id),
        }
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Look up a live entity by id
    pub fn get(&self, id: EntityId) -> Option<EntityRef<'_>> {
        let category = *self.categories.get(&id)?;
        self.alive(category).find(|e| e.id() == id)
    }

    /// Live entities of one category, in insertion order (weapons in slot order)
    pub fn alive(&self, category: Category) -> Box<dyn Iterator<Item = EntityRef<'_>> + '_> {
        match category {
            Category::Player => Box::new(std::iter::once(EntityRef::Player(&self.player))),
            Category::Enemy => Box::new(live(&self.enemies).map(EntityRef::Enemy)),
            Category::Weapon => Box::new(live(&self.weapons).map(EntityRef::Weapon)),
            Category::Projectile => Box::new(live(&self.projectiles).map(EntityRef::Projectile)),
            Category::Beam => Box::new(live(&self.beams).map(EntityRef::Beam)),
            Category::Gem => Box::new(live(&self.gems).map(EntityRef::Gem)),
            Category::Chest => Box::new(live(&self.chests).map(EntityRef::Chest)),
        }
    }

    /// Live enemy by id. Enemies are stored in id order, so this is a binary search.
    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        let index = self.enemies.binary_search_by_key(&id, |e| e.id).ok()?;
        Some(&mut self.enemies[index]).filter(|e| e.is_alive())
    }

    pub fn for_each_alive(&self, category: Category, f: impl FnMut(EntityRef<'_>)) {
        self.alive(category).for_each(f);
    }

    /// Every live entity, player first
    pub fn all(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        const ORDER: [Category; 7] = [
            Category::Player,
            Category::Gem,
            Category::Chest,
            Category::Enemy,
            Category::Weapon,
            Category::Projectile,
            Category::Beam,
        ];
        ORDER.into_iter().flat_map(move |c| self.alive(c))
    }

    pub fn count(&self, category: Category) -> usize {
        self.alive(category).count()
    }

    /// Install `weapon` in `slot`, retiring the weapon that held it.
    ///
    /// Returns `(old_id, new_id)`. The slot never holds both.
    pub fn replace_weapon(&mut self, slot: usize, mut weapon: Weapon) -> Option<(EntityId, EntityId)> {
        let old_id = self.weapons.get(slot)?.id;
        weapon.id = self.allocate(Category::Weapon);
        let new_id = weapon.id;
        self.weapons[slot] = weapon;
        self.categories.remove(&old_id);
        Some((old_id, new_id))
    }

    /// Drop dead entities from storage
    pub fn sweep(&mut self) {
        let categories = &mut self.categories;
        sweep_vec(&mut self.enemies, categories);
        sweep_vec(&mut self.weapons, categories);
        sweep_vec(&mut self.projectiles, categories);
        sweep_vec(&mut self.beams, categories);
        sweep_vec(&mut self.gems, categories);
        sweep_vec(&mut self.chests, categories);
    }
}

fn live<T: Body>(v: &[T]) -> impl Iterator<Item = &T> {
    v.iter().filter(|e| e.is_alive())
}

fn kill_in<T: Body>(v: &mut [T], id: EntityId) -> bool {
    v.iter_mut().find(|e| e.id() == id).is_some_and(|e| e.kill())
}

fn sweep_vec<T: Body>(v: &mut Vec<T>, categories: &mut BTreeMap<EntityId, Category>) {
    v.retain(|e| {
        let keep = e.is_alive();
        if !keep {
            categories.remove(&e.id());
        }
        keep
    });
}
