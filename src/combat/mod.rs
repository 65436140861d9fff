//! # Combat Module
//!
//! Turn-based attack resolution and the experience/skill-point economy.
//!
//! The resolution engine computes one attack action end to end: miss check,
//! MP gate, base damage, elemental adjustment, status riders, critical hit,
//! resource consumption and damage application. Both sides of a fight go
//! through the same code path: attacker and defender are anything
//! implementing [`Combatant`].

pub mod progression;

use crate::content::{ElementTable, Skill};
use crate::game::entity::{Combatant, DotTick};
use rand::Rng;

/// Everything one resolved attack produced, for the battle UI to report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttackOutcome {
    /// The defender's luck turned the attack away; nothing else happened
    pub missed: bool,
    /// The attacker could not pay the skill's MP cost; nothing was consumed
    pub insufficient_mp: bool,
    /// Damage applied to the defender, when the attack landed
    pub damage: Option<i32>,
    pub critical: bool,
    pub defender_died: bool,
    pub stun_applied: bool,
    pub dot_applied: bool,
}

impl AttackOutcome {
    fn miss() -> Self {
        Self {
            missed: true,
            ..Self::default()
        }
    }

    fn out_of_mana() -> Self {
        Self {
            insufficient_mp: true,
            ..Self::default()
        }
    }
}

/// Resolves a single attack action from `attacker` against `defender`.
///
/// `skill` carries the skill definition plus the attacker's per-skill level,
/// which scales both damage and MP cost; `None` is a basic weapon swing.
///
/// Resolution order: miss check, MP gate, base damage, elemental
/// multipliers, status riders, critical hit, MP consumption, damage
/// application. A miss or an empty mana pool aborts before anything is
/// mutated.
pub fn resolve_attack<R: Rng>(
    rng: &mut R,
    attacker: &mut impl Combatant,
    defender: &mut impl Combatant,
    skill: Option<(&Skill, u32)>,
    elements: &ElementTable,
) -> AttackOutcome {
    // 1. Miss: defender's luck, strict `<` so luck 100 always dodges.
    if rng.gen::<f64>() < defender.combat().luck() as f64 / 100.0 {
        return AttackOutcome::miss();
    }

    // 2. MP gate, before any damage math.
    let mut mp_cost = 0;
    if let Some((skill, level)) = skill {
        mp_cost = progression::scaled_mp_cost(skill.mp_cost, level);
        if attacker.combat().mp() < mp_cost {
            return AttackOutcome::out_of_mana();
        }
    }

    // 3. Base damage.
    let attack = attacker.combat().attack();
    let defense = defender.combat().defense();
    let mut damage = match skill {
        None => (attack - defense).max(1) as f64,
        Some((skill, level)) if skill.magical => {
            // Magical skills ignore the attack/defense formula entirely.
            progression::scaled_damage(skill.damage, level) as f64
        }
        Some((skill, level)) => {
            let scaled = progression::scaled_damage(skill.damage, level) as f64;
            (scaled + attack as f64 * 0.5 - defense as f64).max(1.0)
        }
    };

    let mut stun_applied = false;
    let mut dot_applied = false;
    if let Some((skill, _)) = skill {
        // 4. Elemental adjustment: the skill's element and the attacker's own
        // element are checked against the defender independently and both
        // factors multiply in.
        if let Some(defender_element) = defender.combat().element() {
            if let Some(skill_element) = skill.element {
                if elements.is_weak_to(defender_element, skill_element) {
                    damage *= 1.5;
                } else if elements.resists(defender_element, skill_element) {
                    damage *= 0.75;
                }
            }
            if let Some(attacker_element) = attacker.combat().element() {
                if elements.is_weak_to(defender_element, attacker_element) {
                    damage *= 1.2;
                } else if elements.resists(defender_element, attacker_element) {
                    damage *= 0.9;
                }
            }
        }

        // 5. Status riders land once the miss gate is passed, whether or not
        // the hit itself amounts to much.
        if skill.stun_chance > 0.0 && rng.gen::<f64>() < skill.stun_chance {
            defender.combat_mut().set_stun(true, skill.duration);
            stun_applied = true;
        }
        if skill.effect_per_turn > 0 && skill.duration > 0 {
            defender
                .combat_mut()
                .add_dot_effect(&skill.name, skill.effect_per_turn, skill.duration);
            dot_applied = true;
        }
    }

    // 6. Critical: attacker's luck, doubling after all multipliers.
    let critical = rng.gen::<f64>() < attacker.combat().luck() as f64 / 100.0;
    if critical {
        damage *= 2.0;
    }

    // 7. Pay for the skill.
    if skill.is_some() {
        let mp = attacker.combat().mp();
        attacker.combat_mut().set_mp(mp - mp_cost);
    }

    // 8. Apply.
    let dealt = damage.floor() as i32;
    let hp = defender.combat().hp();
    defender.combat_mut().set_hp(hp - dealt);

    AttackOutcome {
        missed: false,
        insufficient_mp: false,
        damage: Some(dealt),
        critical,
        defender_died: !defender.combat().is_alive(),
        stun_applied,
        dot_applied,
    }
}

/// How a battle ended, from the player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleResult {
    Victory,
    Defeat,
    Fled,
}

/// A flee attempt: succeeds with `0.5 + luck/200`, so even a luckless
/// escape is a coin flip. Failure forfeits the turn.
pub fn attempt_flee<R: Rng>(rng: &mut R, runner: &impl Combatant) -> bool {
    let chance = 0.5 + runner.combat().luck() as f64 / 200.0;
    rng.gen::<f64>() < chance
}

/// One enemy combat turn: skill-bearing enemies cast an affordable skill
/// some of the time, everyone else just swings. Returns the outcome plus
/// the name of the skill used, if any.
pub fn enemy_take_turn<R: Rng>(
    rng: &mut R,
    enemy: &mut crate::game::Enemy,
    player: &mut crate::game::Player,
    content: &crate::content::ContentPack,
    elements: &ElementTable,
) -> (AttackOutcome, Option<String>) {
    let skill = if !enemy.skill_ids.is_empty()
        && rng.gen::<f64>() < crate::config::ENEMY_SKILL_CHANCE
    {
        enemy
            .skill_ids
            .first()
            .and_then(|id| content.skill_by_id(id))
            .filter(|s| enemy.combat().mp() >= progression::scaled_mp_cost(s.mp_cost, 1))
            .cloned()
    } else {
        None
    };

    match skill {
        Some(skill) => {
            let outcome = resolve_attack(rng, enemy, player, Some((&skill, 1)), elements);
            (outcome, Some(skill.name))
        }
        None => (resolve_attack(rng, enemy, player, None, elements), None),
    }
}

/// End-of-turn status report for one combatant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnEnd {
    /// The stun wore off at this boundary
    pub stun_cleared: bool,
    /// Damage-over-time results, applied after the stun decrement
    pub dot: DotTick,
}

/// Processes one combatant's end-of-turn statuses: stun decrement first,
/// then the DoT tick. The ordering is load-bearing for effects that expire
/// this turn.
pub fn end_of_turn(combatant: &mut impl Combatant) -> TurnEnd {
    let combat = combatant.combat_mut();
    let stun_cleared = combat.tick_stun();
    let dot = combat.process_dot_effects();
    TurnEnd { stun_cleared, dot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentPack, ElementDef, ElementKind, PlayerClass};
    use crate::game::entity::CombatEntity;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(77)
    }

    fn elements() -> ElementTable {
        ContentPack::builtin().element_table()
    }

    fn plain(attack: i32, defense: i32, luck: i32) -> CombatEntity {
        CombatEntity::new(100, attack, defense, luck, 50)
    }

    fn test_skill(damage: i32, mp_cost: i32, magical: bool) -> Skill {
        Skill {
            id: "test".into(),
            name: "Test Strike".into(),
            damage,
            mp_cost,
            stun_chance: 0.0,
            duration: 0,
            effect_per_turn: 0,
            magical,
            element: None,
            classes: vec![PlayerClass::Rogue],
            skill_cost: 1,
        }
    }

    #[test]
    fn test_basic_attack_damage_formula() {
        let mut rng = rng();
        let mut attacker = plain(15, 0, 0);
        let mut defender = plain(0, 4, 0);
        let outcome = resolve_attack(&mut rng, &mut attacker, &mut defender, None, &elements());
        assert!(!outcome.missed);
        assert_eq!(outcome.damage, Some(11));
        assert_eq!(defender.hp(), 89);
    }

    #[test]
    fn test_basic_attack_damage_floor() {
        let mut rng = rng();
        let mut attacker = plain(1, 0, 0);
        let mut defender = plain(0, 100, 0);
        let outcome = resolve_attack(&mut rng, &mut attacker, &mut defender, None, &elements());
        assert_eq!(outcome.damage, Some(1));
    }

    #[test]
    fn test_full_luck_defender_always_dodges() {
        let mut rng = rng();
        let mut attacker = plain(50, 0, 0);
        let mut defender = plain(0, 0, 100);
        for _ in 0..50 {
            let outcome =
                resolve_attack(&mut rng, &mut attacker, &mut defender, None, &elements());
            assert!(outcome.missed);
        }
        assert_eq!(defender.hp(), 100);
    }

    #[test]
    fn test_full_luck_attacker_always_crits() {
        let mut rng = rng();
        let mut attacker = plain(20, 0, 100);
        let mut defender = plain(0, 10, 0);
        let outcome = resolve_attack(&mut rng, &mut attacker, &mut defender, None, &elements());
        assert!(outcome.critical);
        assert_eq!(outcome.damage, Some(20)); // (20 - 10) * 2
    }

    #[test]
    fn test_skill_mp_gate_leaves_mp_untouched() {
        let mut rng = rng();
        let skill = test_skill(25, 10, false);
        let mut attacker = plain(10, 0, 0);
        attacker.set_mp(9);
        let mut defender = plain(0, 0, 0);

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &elements(),
        );
        assert!(outcome.insufficient_mp);
        assert_eq!(outcome.damage, None);
        assert_eq!(attacker.mp(), 9);
        assert_eq!(defender.hp(), 100);
    }

    #[test]
    fn test_magical_skill_ignores_attack_and_defense() {
        let mut rng = rng();
        let skill = test_skill(30, 5, true);
        let mut attacker = plain(999, 0, 0);
        let mut defender = plain(0, 999, 0);

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &elements(),
        );
        assert_eq!(outcome.damage, Some(30));
        assert_eq!(attacker.mp(), 45);
    }

    #[test]
    fn test_physical_skill_formula() {
        let mut rng = rng();
        let skill = test_skill(20, 5, false);
        let mut attacker = plain(10, 0, 0);
        let mut defender = plain(0, 8, 0);

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &elements(),
        );
        // (20 + 10*0.5) - 8 = 17
        assert_eq!(outcome.damage, Some(17));
    }

    #[test]
    fn test_elemental_double_weakness_multiplies_both_factors() {
        let mut rng = rng();
        // Custom table where earth is weak to fire.
        let table = ElementTable::from_defs(vec![ElementDef {
            kind: ElementKind::Earth,
            weaknesses: vec![ElementKind::Fire],
            resistances: vec![],
        }]);
        let mut skill = test_skill(30, 0, true);
        skill.element = Some(ElementKind::Fire);

        let mut attacker = plain(0, 0, 0);
        attacker.set_element(Some(ElementKind::Fire));
        let mut defender = plain(0, 0, 0);
        defender.set_element(Some(ElementKind::Earth));

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &table,
        );
        // 30 * 1.5 (skill element) * 1.2 (attacker element) = 54
        assert_eq!(outcome.damage, Some(54));
    }

    #[test]
    fn test_elemental_resistance_discounts() {
        let mut rng = rng();
        let table = elements();
        // Fire resists ice: 40 * 0.75 = 30.
        let mut skill = test_skill(40, 0, true);
        skill.element = Some(ElementKind::Ice);

        let mut attacker = plain(0, 0, 0);
        let mut defender = plain(0, 0, 0);
        defender.set_element(Some(ElementKind::Fire));

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &table,
        );
        assert_eq!(outcome.damage, Some(30));
    }

    #[test]
    fn test_dot_rider_lands_alongside_damage() {
        let mut rng = rng();
        let mut skill = test_skill(10, 0, true);
        skill.effect_per_turn = 4;
        skill.duration = 2;

        let mut attacker = plain(0, 0, 0);
        let mut defender = plain(0, 0, 0);

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &elements(),
        );
        assert!(outcome.dot_applied);
        assert_eq!(outcome.damage, Some(10));
        assert_eq!(defender.dot_effects().len(), 1);
        assert_eq!(defender.dot_effects()[0].name, "Test Strike");
    }

    #[test]
    fn test_guaranteed_stun_rider() {
        let mut rng = rng();
        let mut skill = test_skill(5, 0, true);
        skill.stun_chance = 1.0;
        skill.duration = 2;

        let mut attacker = plain(0, 0, 0);
        let mut defender = plain(0, 0, 0);

        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 1)),
            &elements(),
        );
        assert!(outcome.stun_applied);
        assert!(defender.is_stunned());
        assert_eq!(defender.stun().turns_remaining, 2);
    }

    #[test]
    fn test_skill_level_scales_damage_and_cost() {
        let mut rng = rng();
        let skill = test_skill(30, 10, true);
        let mut attacker = plain(0, 0, 0);
        let mut defender = plain(0, 0, 0);

        // Level 3: damage 30 * 1.2 = 36, cost 10 * 1.10 = 11.
        let outcome = resolve_attack(
            &mut rng,
            &mut attacker,
            &mut defender,
            Some((&skill, 3)),
            &elements(),
        );
        assert_eq!(outcome.damage, Some(36));
        assert_eq!(attacker.mp(), 50 - 11);
    }

    #[test]
    fn test_lethal_attack_reports_death() {
        let mut rng = rng();
        let mut attacker = plain(200, 0, 0);
        let mut defender = plain(0, 0, 0);
        let outcome = resolve_attack(&mut rng, &mut attacker, &mut defender, None, &elements());
        assert!(outcome.defender_died);
        assert_eq!(defender.hp(), 0);
    }

    #[test]
    fn test_enemy_without_skills_always_swings() {
        let pack = ContentPack::builtin();
        let table = pack.element_table();
        let mut rng = rng();
        let goblin = pack.enemies.iter().find(|a| a.name == "Goblin").unwrap();
        let mut enemy = crate::game::Enemy::spawn(
            goblin,
            1,
            false,
            crate::game::Position::origin(),
            &pack,
            &mut rng,
        );
        let knight = pack.class_def(PlayerClass::Knight).unwrap();
        let mut player =
            crate::game::Player::new("Ash", knight, crate::game::Position::origin());

        for _ in 0..10 {
            let (_, skill_name) = enemy_take_turn(&mut rng, &mut enemy, &mut player, &pack, &table);
            assert!(skill_name.is_none());
        }
    }

    #[test]
    fn test_flee_with_full_luck_always_escapes() {
        let mut rng = rng();
        let runner = plain(0, 0, 100);
        for _ in 0..20 {
            assert!(attempt_flee(&mut rng, &runner));
        }
    }

    #[test]
    fn test_end_of_turn_order_stun_then_dot() {
        let mut entity = plain(0, 0, 0);
        entity.set_stun(true, 1);
        entity.add_dot_effect("Poison", 5, 1);

        let report = end_of_turn(&mut entity);
        assert!(report.stun_cleared);
        assert_eq!(report.dot.total_damage, 5);
        assert_eq!(report.dot.expired, vec!["Poison".to_string()]);
        assert_eq!(entity.hp(), 95);
        assert!(!entity.is_stunned());
    }
}
