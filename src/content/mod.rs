//! # Content Module
//!
//! Static game content: element interactions, skills, items, player classes
//! and enemy archetypes. Tables are plain serde-friendly data: the built-in
//! pack ships with the client, and a full replacement can be loaded from
//! JSON, so the engine treats all of it as externally supplied configuration.

use crate::{DuskholdError, DuskholdResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Elemental affinity of a skill or combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Poison,
    Fire,
    Water,
    Earth,
    Ice,
    Electric,
}

/// Weakness/resistance sets for one element.
///
/// `weaknesses` lists the element types this element takes increased damage
/// from; `resistances` lists the types it shrugs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDef {
    pub kind: ElementKind,
    pub weaknesses: Vec<ElementKind>,
    pub resistances: Vec<ElementKind>,
}

/// Lookup table for elemental damage adjustment.
#[derive(Debug, Clone, Default)]
pub struct ElementTable {
    defs: HashMap<ElementKind, ElementDef>,
}

impl ElementTable {
    /// Builds a table from a list of element definitions.
    pub fn from_defs(defs: Vec<ElementDef>) -> Self {
        Self {
            defs: defs.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    /// True if `defender` takes increased damage from `incoming`.
    pub fn is_weak_to(&self, defender: ElementKind, incoming: ElementKind) -> bool {
        self.defs
            .get(&defender)
            .map(|d| d.weaknesses.contains(&incoming))
            .unwrap_or(false)
    }

    /// True if `defender` resists `incoming`.
    pub fn resists(&self, defender: ElementKind, incoming: ElementKind) -> bool {
        self.defs
            .get(&defender)
            .map(|d| d.resistances.contains(&incoming))
            .unwrap_or(false)
    }
}

/// Playable character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerClass {
    Rogue,
    Knight,
    Wizard,
}

impl PlayerClass {
    /// Display name, capitalized for the status header.
    pub fn name(self) -> &'static str {
        match self {
            PlayerClass::Rogue => "Rogue",
            PlayerClass::Knight => "Knight",
            PlayerClass::Wizard => "Wizard",
        }
    }

    /// Parses a class from user input, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rogue" => Some(PlayerClass::Rogue),
            "knight" => Some(PlayerClass::Knight),
            "wizard" => Some(PlayerClass::Wizard),
            _ => None,
        }
    }
}

/// Base stat block for one player class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub class: PlayerClass,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub luck: i32,
    pub mp: i32,
}

/// A combat skill, physical or magical.
///
/// `duration` doubles as both the stun length and the DoT length, matching
/// the single duration field the content tables carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    /// Base damage before level scaling; 0 means a pure status skill
    pub damage: i32,
    pub mp_cost: i32,
    /// Chance in [0, 1] to stun the defender for `duration` turns
    pub stun_chance: f64,
    /// Turns a stun or DoT rider lasts
    pub duration: u32,
    /// Damage per turn of the DoT rider; 0 means no DoT
    pub effect_per_turn: i32,
    /// Magical skills replace the attack/defense formula with scaled damage
    pub magical: bool,
    pub element: Option<ElementKind>,
    /// Classes allowed to learn this skill; empty means enemy-only
    pub classes: Vec<PlayerClass>,
    /// Base skill-point cost before level penalty
    pub skill_cost: i32,
}

/// Categories of inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Potion,
    Weapon,
    Material,
    Seed,
}

/// An inventory item instance. Items are plain values; picking one up clones
/// it out of the content table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub category: ItemCategory,
    pub sell_price: i32,
    /// HP restored when consumed (potions)
    #[serde(default)]
    pub restore_hp: i32,
    /// MP restored when consumed (potions)
    #[serde(default)]
    pub restore_mp: i32,
}

impl Item {
    /// True if consuming this item has any effect.
    pub fn is_consumable(&self) -> bool {
        self.category == ItemCategory::Potion && (self.restore_hp > 0 || self.restore_mp > 0)
    }
}

/// One entry of an enemy's drop table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTableEntry {
    pub item: String,
    pub chance: f64,
}

/// Spawn template for one enemy kind. Concrete stats are derived from these
/// base values plus level scaling at spawn time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub name: String,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub luck: i32,
    pub mp: i32,
    pub element: Option<ElementKind>,
    /// Skills this enemy may cast in combat
    pub skill_ids: Vec<String>,
    /// Gold drop range per level: `level*min ..= level*max`
    pub gold_per_level: (i32, i32),
    /// XP drop range per level: `level*min ..= level*max`
    pub xp_per_level: (i32, i32),
    pub drops: Vec<DropTableEntry>,
}

/// The complete static content set the client runs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPack {
    pub elements: Vec<ElementDef>,
    pub classes: Vec<ClassDef>,
    pub skills: Vec<Skill>,
    pub items: Vec<Item>,
    pub enemies: Vec<EnemyArchetype>,
    pub boss: EnemyArchetype,
}

impl ContentPack {
    /// Loads a content pack from a JSON document.
    pub fn from_json(json: &str) -> DuskholdResult<Self> {
        let pack: ContentPack = serde_json::from_str(json)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Checks cross-references between tables.
    pub fn validate(&self) -> DuskholdResult<()> {
        for archetype in self.enemies.iter().chain(std::iter::once(&self.boss)) {
            for skill_id in &archetype.skill_ids {
                if self.skill_by_id(skill_id).is_none() {
                    return Err(DuskholdError::Content(format!(
                        "enemy {} references unknown skill {}",
                        archetype.name, skill_id
                    )));
                }
            }
            for drop in &archetype.drops {
                if self.item_by_name(&drop.item).is_none() {
                    return Err(DuskholdError::Content(format!(
                        "enemy {} drops unknown item {}",
                        archetype.name, drop.item
                    )));
                }
            }
        }
        Ok(())
    }

    /// Builds the element lookup table for the combat engine.
    pub fn element_table(&self) -> ElementTable {
        ElementTable::from_defs(self.elements.clone())
    }

    pub fn skill_by_id(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn class_def(&self, class: PlayerClass) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Skills a given class is allowed to learn, in table order.
    pub fn skills_for_class(&self, class: PlayerClass) -> Vec<&Skill> {
        self.skills
            .iter()
            .filter(|s| s.classes.contains(&class))
            .collect()
    }

    /// Items rolled into chest loot: potions and weapons.
    pub fn chest_loot_pool(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| matches!(i.category, ItemCategory::Potion | ItemCategory::Weapon))
            .collect()
    }

    /// The content set the client ships with.
    pub fn builtin() -> Self {
        let elements = vec![
            element(ElementKind::Poison, &[ElementKind::Fire, ElementKind::Ice], &[ElementKind::Earth]),
            element(ElementKind::Fire, &[ElementKind::Water, ElementKind::Earth], &[ElementKind::Ice]),
            element(ElementKind::Water, &[ElementKind::Earth, ElementKind::Electric], &[ElementKind::Fire]),
            element(ElementKind::Earth, &[ElementKind::Water, ElementKind::Ice], &[ElementKind::Electric]),
            element(ElementKind::Ice, &[ElementKind::Fire, ElementKind::Electric], &[ElementKind::Water]),
            element(ElementKind::Electric, &[ElementKind::Earth], &[ElementKind::Water, ElementKind::Ice]),
        ];

        let classes = vec![
            ClassDef { class: PlayerClass::Rogue, hp: 80, attack: 15, defense: 4, luck: 8, mp: 40 },
            ClassDef { class: PlayerClass::Knight, hp: 120, attack: 12, defense: 10, luck: 3, mp: 30 },
            ClassDef { class: PlayerClass::Wizard, hp: 70, attack: 18, defense: 3, luck: 5, mp: 60 },
        ];

        let rogue = &[PlayerClass::Rogue];
        let knight = &[PlayerClass::Knight];
        let wizard = &[PlayerClass::Wizard];

        let skills = vec![
            // Rogue
            physical("cheap_shot", "Cheap Shot", 15, 5, 0.20, 0, 0, rogue, 1),
            physical("backstab", "Backstab", 30, 12, 0.05, 0, 0, rogue, 2),
            physical("sinister_strike", "Sinister Strike", 20, 8, 0.0, 0, 0, rogue, 1),
            physical("eviscerate", "Eviscerate", 45, 20, 0.0, 0, 0, rogue, 3),
            physical("ambush", "Ambush", 50, 25, 0.15, 0, 0, rogue, 3),
            physical("kidney_shot", "Kidney Shot", 10, 15, 0.50, 2, 0, rogue, 2),
            physical("garrote", "Garrote", 5, 18, 0.0, 3, 8, rogue, 2),
            physical("rupture", "Rupture", 0, 22, 0.0, 4, 10, rogue, 3),
            // Knight
            physical("power_strike", "Power Strike", 25, 10, 0.10, 0, 0, knight, 1),
            physical("mortal_strike", "Mortal Strike", 40, 18, 0.0, 0, 0, knight, 2),
            physical("shield_slam", "Shield Slam", 35, 15, 0.25, 0, 0, knight, 2),
            physical("heroic_strike", "Heroic Strike", 28, 12, 0.0, 0, 0, knight, 1),
            physical("execute", "Execute", 60, 30, 0.0, 0, 0, knight, 3),
            physical("thunderclap", "Thunderclap", 20, 14, 0.15, 0, 0, knight, 2),
            physical("rend", "Rend", 5, 10, 0.0, 3, 7, knight, 1),
            physical("charge", "Charge", 15, 8, 0.30, 0, 0, knight, 1),
            // Wizard
            magical("apply_poison", "Apply Poison", 5, 10, 0.0, 3, 5, ElementKind::Poison, wizard, 1),
            magical("fire_blast", "Fire Blast", 30, 12, 0.0, 2, 4, ElementKind::Fire, wizard, 2),
            magical("ice_shard", "Ice Shard", 20, 8, 0.0, 2, 10, ElementKind::Ice, wizard, 1),
            magical("earthquake", "Earthquake", 25, 15, 0.10, 1, 0, ElementKind::Earth, wizard, 2),
            magical("thunder_strike", "Thunder Strike", 35, 14, 0.15, 1, 0, ElementKind::Electric, wizard, 3),
            // Enemy-only
            magical("venom_bite", "Venom Bite", 4, 4, 0.0, 3, 3, ElementKind::Poison, &[], 0),
        ];

        let items = vec![
            Item { name: "Health Potion".into(), category: ItemCategory::Potion, sell_price: 10, restore_hp: 30, restore_mp: 0 },
            Item { name: "Mana Potion".into(), category: ItemCategory::Potion, sell_price: 10, restore_hp: 0, restore_mp: 20 },
            Item { name: "Iron Sword".into(), category: ItemCategory::Weapon, sell_price: 40, restore_hp: 0, restore_mp: 0 },
            Item { name: "Steel Sword".into(), category: ItemCategory::Weapon, sell_price: 90, restore_hp: 0, restore_mp: 0 },
            Item { name: "Snake Skin".into(), category: ItemCategory::Material, sell_price: 5, restore_hp: 0, restore_mp: 0 },
            Item { name: "Mushroom".into(), category: ItemCategory::Material, sell_price: 25, restore_hp: 0, restore_mp: 0 },
            Item { name: "Mushroom Seed".into(), category: ItemCategory::Seed, sell_price: 10, restore_hp: 0, restore_mp: 0 },
        ];

        let enemies = vec![
            EnemyArchetype {
                name: "Snake".into(),
                hp: 10,
                attack: 5,
                defense: 2,
                luck: 2,
                mp: 12,
                element: Some(ElementKind::Poison),
                skill_ids: vec!["venom_bite".into()],
                gold_per_level: (3, 8),
                xp_per_level: (8, 15),
                drops: vec![DropTableEntry { item: "Snake Skin".into(), chance: 0.3 }],
            },
            EnemyArchetype {
                name: "Goblin".into(),
                hp: 15,
                attack: 7,
                defense: 3,
                luck: 3,
                mp: 0,
                element: Some(ElementKind::Earth),
                skill_ids: vec![],
                gold_per_level: (10, 20),
                xp_per_level: (15, 30),
                drops: vec![DropTableEntry { item: "Mushroom Seed".into(), chance: 0.05 }],
            },
        ];

        let boss = EnemyArchetype {
            name: "Shadow Lord".into(),
            hp: 20,
            attack: 10,
            defense: 5,
            luck: 5,
            mp: 40,
            element: Some(ElementKind::Fire),
            skill_ids: vec!["fire_blast".into()],
            gold_per_level: (50, 100),
            xp_per_level: (100, 200),
            drops: vec![DropTableEntry { item: "Steel Sword".into(), chance: 0.5 }],
        };

        Self { elements, classes, skills, items, enemies, boss }
    }
}

fn element(kind: ElementKind, weaknesses: &[ElementKind], resistances: &[ElementKind]) -> ElementDef {
    ElementDef {
        kind,
        weaknesses: weaknesses.to_vec(),
        resistances: resistances.to_vec(),
    }
}

#[allow(clippy::too_many_arguments)]
fn physical(
    id: &str,
    name: &str,
    damage: i32,
    mp_cost: i32,
    stun_chance: f64,
    duration: u32,
    effect_per_turn: i32,
    classes: &[PlayerClass],
    skill_cost: i32,
) -> Skill {
    Skill {
        id: id.into(),
        name: name.into(),
        damage,
        mp_cost,
        stun_chance,
        duration,
        effect_per_turn,
        magical: false,
        element: None,
        classes: classes.to_vec(),
        skill_cost,
    }
}

#[allow(clippy::too_many_arguments)]
fn magical(
    id: &str,
    name: &str,
    damage: i32,
    mp_cost: i32,
    stun_chance: f64,
    duration: u32,
    effect_per_turn: i32,
    element: ElementKind,
    classes: &[PlayerClass],
    skill_cost: i32,
) -> Skill {
    Skill {
        id: id.into(),
        name: name.into(),
        damage,
        mp_cost,
        stun_chance,
        duration,
        effect_per_turn,
        magical: true,
        element: Some(element),
        classes: classes.to_vec(),
        skill_cost,
    }
}
