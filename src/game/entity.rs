//! Shared combat state for anything that can fight.
//!
//! Players and enemies both hold a [`CombatEntity`] stat block by composition
//! and expose it through the [`Combatant`] trait, which is the only surface
//! the combat resolution engine sees.

use crate::content::ElementKind;
use serde::{Deserialize, Serialize};

/// Stun status. While `active`, the entity's combat action is skipped;
/// end-of-turn processing decrements `turns_remaining` and clears the flag
/// when it reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StunState {
    pub active: bool,
    pub turns_remaining: u32,
}

/// One active damage-over-time effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotEffect {
    pub name: String,
    pub damage_per_turn: i32,
    pub turns_remaining: i32,
}

/// Result of one damage-over-time tick, for UI reporting.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DotTick {
    /// Sum of all active effect damages, applied as a single hp decrement
    pub total_damage: i32,
    /// Names of effects that expired this tick
    pub expired: Vec<String>,
}

/// Mutable stat/status block shared by every fighting entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEntity {
    hp: i32,
    max_hp: i32,
    mp: i32,
    max_mp: i32,
    attack: i32,
    defense: i32,
    luck: i32,
    element: Option<ElementKind>,
    stun: StunState,
    dot_effects: Vec<DotEffect>,
}

impl CombatEntity {
    /// Creates a fresh entity at full hp/mp.
    pub fn new(max_hp: i32, attack: i32, defense: i32, luck: i32, max_mp: i32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            attack,
            defense,
            luck,
            element: None,
            stun: StunState::default(),
            dot_effects: Vec::new(),
        }
    }

    /// Sets the elemental affinity, builder-style.
    pub fn with_element(mut self, element: Option<ElementKind>) -> Self {
        self.element = element;
        self
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    /// Sets current HP, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp);
    }

    /// Raises max HP and refills to full.
    pub fn raise_max_hp(&mut self, delta: i32) {
        self.max_hp += delta;
        self.hp = self.max_hp;
    }

    pub fn mp(&self) -> i32 {
        self.mp
    }

    pub fn max_mp(&self) -> i32 {
        self.max_mp
    }

    /// Sets current MP, clamped to `[0, max_mp]`.
    pub fn set_mp(&mut self, mp: i32) {
        self.mp = mp.clamp(0, self.max_mp);
    }

    /// Raises max MP and refills to full.
    pub fn raise_max_mp(&mut self, delta: i32) {
        self.max_mp += delta;
        self.mp = self.max_mp;
    }

    pub fn attack(&self) -> i32 {
        self.attack
    }

    pub fn set_attack(&mut self, attack: i32) {
        self.attack = attack;
    }

    pub fn defense(&self) -> i32 {
        self.defense
    }

    pub fn set_defense(&mut self, defense: i32) {
        self.defense = defense;
    }

    pub fn luck(&self) -> i32 {
        self.luck
    }

    pub fn set_luck(&mut self, luck: i32) {
        self.luck = luck;
    }

    pub fn element(&self) -> Option<ElementKind> {
        self.element
    }

    pub fn set_element(&mut self, element: Option<ElementKind>) {
        self.element = element;
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    // ---- Stun ----

    pub fn stun(&self) -> StunState {
        self.stun
    }

    pub fn set_stun(&mut self, active: bool, turns: u32) {
        self.stun = StunState {
            active,
            turns_remaining: turns,
        };
    }

    pub fn is_stunned(&self) -> bool {
        self.stun.active
    }

    /// End-of-turn stun decrement. Returns true if the stun wore off now.
    pub fn tick_stun(&mut self) -> bool {
        if !self.stun.active {
            return false;
        }
        self.stun.turns_remaining = self.stun.turns_remaining.saturating_sub(1);
        if self.stun.turns_remaining == 0 {
            self.stun.active = false;
            return true;
        }
        false
    }

    // ---- Damage over time ----

    /// Adds a DoT effect. An effect with the same name is replaced: damage
    /// and duration overwritten, never stacked.
    pub fn add_dot_effect(&mut self, name: &str, damage_per_turn: i32, duration: u32) {
        if let Some(existing) = self.dot_effects.iter_mut().find(|e| e.name == name) {
            existing.damage_per_turn = damage_per_turn;
            existing.turns_remaining = duration as i32;
            return;
        }
        self.dot_effects.push(DotEffect {
            name: name.to_string(),
            damage_per_turn,
            turns_remaining: duration as i32,
        });
    }

    pub fn dot_effects(&self) -> &[DotEffect] {
        &self.dot_effects
    }

    /// Applies every active DoT effect in insertion order: damages are summed
    /// and applied as one hp decrement, durations tick down by one, expired
    /// effects are removed and reported by name.
    pub fn process_dot_effects(&mut self) -> DotTick {
        let mut tick = DotTick::default();

        for effect in &mut self.dot_effects {
            tick.total_damage += effect.damage_per_turn;
            effect.turns_remaining -= 1;
            if effect.turns_remaining <= 0 {
                tick.expired.push(effect.name.clone());
            }
        }
        self.dot_effects.retain(|e| e.turns_remaining > 0);

        if tick.total_damage > 0 {
            self.set_hp(self.hp - tick.total_damage);
        }
        tick
    }
}

/// Capability surface the combat engine needs from either side of a fight.
///
/// Player and enemy both implement this by handing out their composed
/// [`CombatEntity`] block; the engine never needs to know which is which.
pub trait Combatant {
    fn combat(&self) -> &CombatEntity;
    fn combat_mut(&mut self) -> &mut CombatEntity;
    fn display_name(&self) -> &str;
}

impl Combatant for CombatEntity {
    fn combat(&self) -> &CombatEntity {
        self
    }

    fn combat_mut(&mut self) -> &mut CombatEntity {
        self
    }

    fn display_name(&self) -> &str {
        "combatant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hp_clamping() {
        let mut entity = CombatEntity::new(50, 10, 5, 0, 20);
        entity.set_hp(9999);
        assert_eq!(entity.hp(), 50);
        entity.set_hp(-12);
        assert_eq!(entity.hp(), 0);
        assert!(!entity.is_alive());
    }

    #[test]
    fn test_mp_clamping() {
        let mut entity = CombatEntity::new(50, 10, 5, 0, 20);
        entity.set_mp(21);
        assert_eq!(entity.mp(), 20);
        entity.set_mp(-1);
        assert_eq!(entity.mp(), 0);
    }

    #[test]
    fn test_stun_ticks_down_and_clears() {
        let mut entity = CombatEntity::new(50, 10, 5, 0, 20);
        entity.set_stun(true, 2);
        assert!(entity.is_stunned());
        assert!(!entity.tick_stun());
        assert!(entity.is_stunned());
        assert!(entity.tick_stun());
        assert!(!entity.is_stunned());
    }

    #[test]
    fn test_instant_stun_skips_one_turn() {
        // A zero-duration stun still costs the victim its next action.
        let mut entity = CombatEntity::new(50, 10, 5, 0, 20);
        entity.set_stun(true, 0);
        assert!(entity.is_stunned());
        assert!(entity.tick_stun());
        assert!(!entity.is_stunned());
    }

    #[test]
    fn test_dot_replaces_not_stacks() {
        let mut entity = CombatEntity::new(100, 10, 5, 0, 20);
        entity.add_dot_effect("Poison", 5, 3);
        entity.add_dot_effect("Poison", 5, 3);
        assert_eq!(entity.dot_effects().len(), 1);
        assert_eq!(entity.dot_effects()[0].damage_per_turn, 5);
        assert_eq!(entity.dot_effects()[0].turns_remaining, 3);
    }

    #[test]
    fn test_dot_batch_application_and_expiry() {
        let mut entity = CombatEntity::new(100, 10, 5, 0, 20);
        entity.add_dot_effect("Poison", 5, 2);
        entity.add_dot_effect("Burn", 4, 1);

        let tick = entity.process_dot_effects();
        assert_eq!(tick.total_damage, 9);
        assert_eq!(tick.expired, vec!["Burn".to_string()]);
        assert_eq!(entity.hp(), 91);
        assert_eq!(entity.dot_effects().len(), 1);

        let tick = entity.process_dot_effects();
        assert_eq!(tick.total_damage, 5);
        assert_eq!(tick.expired, vec!["Poison".to_string()]);
        assert!(entity.dot_effects().is_empty());
    }

    #[test]
    fn test_raise_max_refills() {
        let mut entity = CombatEntity::new(50, 10, 5, 0, 20);
        entity.set_hp(1);
        entity.set_mp(0);
        entity.raise_max_hp(10);
        entity.raise_max_mp(5);
        assert_eq!(entity.hp(), 60);
        assert_eq!(entity.mp(), 25);
    }

    proptest! {
        #[test]
        fn prop_hp_mp_always_clamped(values in proptest::collection::vec(any::<i32>(), 0..32)) {
            let mut entity = CombatEntity::new(75, 10, 5, 0, 30);
            for v in values {
                entity.set_hp(v);
                entity.set_mp(v);
                prop_assert!(entity.hp() >= 0 && entity.hp() <= entity.max_hp());
                prop_assert!(entity.mp() >= 0 && entity.mp() <= entity.max_mp());
            }
        }
    }
}
