//! Experience, leveling and the skill-point economy.

use crate::content::Skill;
use crate::game::entity::Combatant;
use crate::game::Player;
use crate::{DuskholdError, DuskholdResult};

/// One level gained while absorbing experience.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub new_level: u32,
    pub skill_points_gained: i32,
}

/// Effective damage of a skill at a given per-skill level: +10% per level
/// above 1, truncated.
pub fn scaled_damage(base: i32, skill_level: u32) -> i32 {
    let level = skill_level.max(1);
    (base as f64 * (1.0 + 0.1 * (level - 1) as f64)).floor() as i32
}

/// Effective MP cost of a skill at a given per-skill level: +5% per level
/// above 1, truncated.
pub fn scaled_mp_cost(base: i32, skill_level: u32) -> i32 {
    let level = skill_level.max(1);
    (base as f64 * (1.0 + 0.05 * (level - 1) as f64)).floor() as i32
}

/// Skill-point price of a skill for a player of the given level: the base
/// cost plus a penalty of one point per ten levels.
pub fn skill_cost(skill: &Skill, player_level: u32) -> i32 {
    skill.skill_cost + (player_level / 10) as i32
}

/// Grants experience and applies every level-up it pays for.
///
/// Each level: threshold × 1.5 (truncated), +10 max HP with a full heal,
/// +2 attack, +1 defense, +1 luck, +5 max MP refilled, `1 + level/5` skill
/// points, and every learned skill's scaling level ticks up by one.
pub fn award_xp(player: &mut Player, amount: i32) -> Vec<LevelUp> {
    let mut level_ups = Vec::new();
    player.xp += amount;

    while player.xp >= player.xp_to_next_level {
        player.xp -= player.xp_to_next_level;
        player.level += 1;
        player.xp_to_next_level = (player.xp_to_next_level as f64 * 1.5) as i32;

        let combat = player.combat_mut();
        combat.raise_max_hp(10);
        combat.set_attack(combat.attack() + 2);
        combat.set_defense(combat.defense() + 1);
        combat.set_luck(combat.luck() + 1);
        combat.raise_max_mp(5);

        let gained = 1 + (player.level / 5) as i32;
        player.skill_points += gained;

        for skill_level in player.skills.values_mut() {
            *skill_level += 1;
        }

        if player.level > player.max_level_reached {
            player.max_level_reached = player.level;
        }

        level_ups.push(LevelUp {
            new_level: player.level,
            skill_points_gained: gained,
        });
    }
    level_ups
}

/// True if the player may purchase the skill right now: it belongs to their
/// class, is not already learned, and they can pay the level-adjusted cost.
pub fn can_buy_skill(player: &Player, skill: &Skill) -> bool {
    skill.classes.contains(&player.class)
        && !player.has_skill(&skill.id)
        && player.skill_points >= skill_cost(skill, player.level)
}

/// Purchases a skill: deducts the level-adjusted cost and learns it at
/// skill-level 1. Rejected purchases leave the player untouched.
pub fn buy_skill(player: &mut Player, skill: &Skill) -> DuskholdResult<()> {
    if !can_buy_skill(player, skill) {
        return Err(DuskholdError::InvalidAction(format!(
            "cannot learn {}",
            skill.name
        )));
    }
    player.skill_points -= skill_cost(skill, player.level);
    player.learn_skill(&skill.id);
    Ok(())
}
