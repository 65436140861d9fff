//! The local player: class stats, progression counters, learned skills and
//! inventory. Combat state is composed, not inherited; see
//! [`CombatEntity`](crate::CombatEntity).

use crate::config;
use crate::content::{ClassDef, Item, PlayerClass};
use crate::game::entity::{CombatEntity, Combatant};
use crate::game::Position;
use crate::net::api::PlayerRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The locally controlled character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub class: PlayerClass,
    combat: CombatEntity,
    pub level: u32,
    pub xp: i32,
    pub xp_to_next_level: i32,
    pub gold: i32,
    pub skill_points: i32,
    /// Learned skills: id → per-skill scaling level
    pub skills: HashMap<String, u32>,
    pub inventory: Vec<Item>,
    pub position: Position,
    // Lifetime records synced to the player-record API.
    pub max_dungeon_level: u32,
    pub max_gold_held: i32,
    pub max_level_reached: u32,
}

impl Player {
    /// Creates a level-1 player from a class stat block.
    pub fn new(name: &str, class_def: &ClassDef, position: Position) -> Self {
        Self {
            name: name.to_string(),
            class: class_def.class,
            combat: CombatEntity::new(
                class_def.hp,
                class_def.attack,
                class_def.defense,
                class_def.luck,
                class_def.mp,
            ),
            level: 1,
            xp: 0,
            xp_to_next_level: config::BASE_XP_TO_LEVEL,
            gold: 0,
            skill_points: 0,
            skills: HashMap::new(),
            inventory: Vec::new(),
            position,
            max_dungeon_level: 0,
            max_gold_held: 0,
            max_level_reached: 1,
        }
    }

    /// Adds gold, tracking the lifetime maximum for the rankings.
    pub fn add_gold(&mut self, amount: i32) {
        self.gold += amount;
        if self.gold > self.max_gold_held {
            self.max_gold_held = self.gold;
        }
    }

    pub fn has_skill(&self, skill_id: &str) -> bool {
        self.skills.contains_key(skill_id)
    }

    /// Current scaling level of a learned skill, if any.
    pub fn skill_level(&self, skill_id: &str) -> Option<u32> {
        self.skills.get(skill_id).copied()
    }

    /// Learns a skill at level 1. Point accounting is the progression
    /// engine's job.
    pub fn learn_skill(&mut self, skill_id: &str) {
        self.skills.entry(skill_id.to_string()).or_insert(1);
    }

    /// Learned skill ids in a stable order for menu display.
    pub fn learned_skill_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.skills.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn add_to_inventory(&mut self, item: Item) {
        self.inventory.push(item);
    }

    /// Consumes the inventory item at `index` if it is consumable, applying
    /// its restore effects. Non-consumables are left in place.
    pub fn use_item(&mut self, index: usize) -> Option<Item> {
        let item = self.inventory.get(index)?;
        if !item.is_consumable() {
            return None;
        }
        let item = self.inventory.remove(index);
        let combat = &mut self.combat;
        if item.restore_hp > 0 {
            combat.set_hp(combat.hp() + item.restore_hp);
        }
        if item.restore_mp > 0 {
            combat.set_mp(combat.mp() + item.restore_mp);
        }
        Some(item)
    }

    /// Records a dungeon stage reached, keeping the lifetime maximum.
    pub fn record_dungeon_level(&mut self, stage: u32) {
        if stage > self.max_dungeon_level {
            self.max_dungeon_level = stage;
        }
    }

    /// Snapshot for the player-record API.
    pub fn record(&self) -> PlayerRecord {
        PlayerRecord {
            name: self.name.clone(),
            class: self.class,
            max_dungeon_level: self.max_dungeon_level,
            max_gold: self.max_gold_held,
            max_level_reached: self.max_level_reached,
        }
    }
}

impl Combatant for Player {
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
