//! Dungeon enemies: spawn-time stat derivation, wandering movement and
//! death drops.

use crate::content::{ContentPack, EnemyArchetype, Item};
use crate::game::entity::{CombatEntity, Combatant};
use crate::game::{new_entity_id, Direction, EntityId, Position};
use crate::generation::Grid;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One entry of a resolved drop table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDrop {
    pub item: Item,
    pub chance: f64,
}

/// Rewards yielded by a defeated enemy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnemyDrops {
    pub gold: i32,
    pub xp: i32,
    pub items: Vec<Item>,
}

/// A spawned enemy. Stats are derived from the archetype's base values plus
/// level scaling (and the boss multiplier) at construction and only change
/// through combat afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub name: String,
    combat: CombatEntity,
    pub level: u32,
    pub is_boss: bool,
    pub gold_drop: i32,
    pub xp_drop: i32,
    pub drops: Vec<ItemDrop>,
    pub skill_ids: Vec<String>,
    pub position: Position,
    pub in_combat: bool,
}

impl Enemy {
    /// Derives a concrete enemy from an archetype at the given stage level.
    ///
    /// Per level above 1: +5 hp, +2 attack, +1 defense. Bosses then multiply
    /// hp by 3 and attack/defense by 2, and carry a `(BOSS)` name tag.
    pub fn spawn<R: Rng>(
        archetype: &EnemyArchetype,
        level: u32,
        is_boss: bool,
        position: Position,
        content: &ContentPack,
        rng: &mut R,
    ) -> Self {
        let level = level.max(1);
        let scale = (level - 1) as i32;
        let mut hp = archetype.hp + scale * 5;
        let mut attack = archetype.attack + scale * 2;
        let mut defense = archetype.defense + scale;
        let name = if is_boss {
            hp *= 3;
            attack *= 2;
            defense *= 2;
            format!("{} (BOSS)", archetype.name)
        } else {
            archetype.name.clone()
        };

        let lvl = level as i32;
        let (gold_min, gold_max) = archetype.gold_per_level;
        let (xp_min, xp_max) = archetype.xp_per_level;
        let gold_drop = rng.gen_range(lvl * gold_min..=lvl * gold_max);
        let xp_drop = rng.gen_range(lvl * xp_min..=lvl * xp_max);

        let drops = archetype
            .drops
            .iter()
            .filter_map(|entry| {
                content.item_by_name(&entry.item).map(|item| ItemDrop {
                    item: item.clone(),
                    chance: entry.chance,
                })
            })
            .collect();

        Self {
            id: new_entity_id(),
            name,
            combat: CombatEntity::new(hp, attack, defense, archetype.luck, archetype.mp)
                .with_element(archetype.element),
            level,
            is_boss,
            gold_drop,
            xp_drop,
            drops,
            skill_ids: archetype.skill_ids.clone(),
            position,
            in_combat: false,
        }
    }

    /// Board glyph: `B` for bosses, `E` otherwise.
    pub fn glyph(&self) -> char {
        if self.is_boss {
            'B'
        } else {
            'E'
        }
    }

    /// Takes one uniformly random cardinal step, rejecting moves that leave
    /// the board or land on a wall. Enemies locked in combat never move.
    pub fn wander<R: Rng>(&mut self, grid: &Grid, rng: &mut R) {
        if self.in_combat {
            return;
        }
        let directions = Direction::all();
        if let Some(dir) = directions.choose(rng) {
            let target = self.position + dir.to_delta();
            if grid.is_walkable(target) {
                self.position = target;
            }
        }
    }

    /// Rolls gold, xp and the item drop table.
    pub fn roll_drops<R: Rng>(&self, rng: &mut R) -> EnemyDrops {
        let items = self
            .drops
            .iter()
            .filter(|d| rng.gen::<f64>() < d.chance)
            .map(|d| d.item.clone())
            .collect();
        EnemyDrops {
            gold: self.gold_drop,
            xp: self.xp_drop,
            items,
        }
    }
}

impl Combatant for Enemy {
    fn combat(&self) -> &CombatEntity {
        &self.combat
    }

    fn combat_mut(&mut self) -> &mut CombatEntity {
        &mut self.combat
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
