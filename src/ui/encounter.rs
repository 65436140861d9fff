//! The turn-based battle screen.
//!
//! Combat is strictly alternating: the player acts, their end-of-turn
//! statuses tick, then the enemy acts and ticks. The screen only drives the
//! flow; every rule lives in the combat engine.

use super::{read_key_blocking, Display, Key, StyleTag};
use crate::combat::{
    attempt_flee, end_of_turn, enemy_take_turn, resolve_attack, AttackOutcome, BattleResult,
    TurnEnd,
};
use crate::game::session::BattleContext;
use crate::game::Combatant;
use crate::{progression, DuskholdResult};

/// Runs one battle to its end.
pub fn run_battle(
    display: &mut impl Display,
    ctx: &mut BattleContext<'_>,
) -> DuskholdResult<BattleResult> {
    display.clear_and_home()?;
    display.write_styled_line(
        &format!(
            "You are fighting a {} [Lvl {}]!",
            ctx.enemy.name, ctx.enemy.level
        ),
        StyleTag::Bad,
    )?;

    loop {
        show_health(display, ctx)?;

        // Player turn.
        if ctx.player.combat().is_stunned() {
            display.write_styled_line("You are stunned and cannot act!", StyleTag::Warning)?;
        } else if let PlayerMove::Fled = player_turn(display, ctx)? {
            return Ok(BattleResult::Fled);
        }
        report_turn_end(display, "You", end_of_turn(ctx.player))?;

        if !ctx.player.combat().is_alive() {
            return Ok(BattleResult::Defeat);
        }
        if !ctx.enemy.combat().is_alive() {
            display.write_styled_line("You killed the enemy!", StyleTag::Good)?;
            return Ok(BattleResult::Victory);
        }

        // Enemy turn.
        if ctx.enemy.combat().is_stunned() {
            display.write_styled_line(
                &format!("{} is stunned and cannot act!", ctx.enemy.name),
                StyleTag::Warning,
            )?;
        } else {
            display.write_styled_line("It's the enemy's turn!", StyleTag::Bad)?;
            let (outcome, skill_name) =
                enemy_take_turn(ctx.rng, ctx.enemy, ctx.player, ctx.content, ctx.elements);
            if let Some(skill_name) = skill_name {
                display.write_styled_line(
                    &format!("{} casts {}!", ctx.enemy.name, skill_name),
                    StyleTag::Accent,
                )?;
            }
            let enemy_name = ctx.enemy.name.clone();
            describe_attack(display, &outcome, &enemy_name, "you")?;
        }
        let enemy_name = ctx.enemy.name.clone();
        report_turn_end(display, &enemy_name, end_of_turn(ctx.enemy))?;

        if !ctx.enemy.combat().is_alive() {
            display.write_styled_line("You killed the enemy!", StyleTag::Good)?;
            return Ok(BattleResult::Victory);
        }
        if !ctx.player.combat().is_alive() {
            return Ok(BattleResult::Defeat);
        }
    }
}

enum PlayerMove {
    Acted,
    Fled,
}

/// Prompts until the player spends their turn. Invalid choices, cancelled
/// submenus and unpayable skills re-prompt without consuming anything.
fn player_turn(
    display: &mut impl Display,
    ctx: &mut BattleContext<'_>,
) -> DuskholdResult<PlayerMove> {
    loop {
        display.write_styled_line("It's your turn!", StyleTag::Title)?;
        display.write_styled_line("1. Attack  2. Skill  3. Item  4. Run Away", StyleTag::Plain)?;

        match read_key_blocking(display)? {
            Key::Char('1') => {
                let outcome = resolve_attack(ctx.rng, ctx.player, ctx.enemy, None, ctx.elements);
                let enemy_name = ctx.enemy.name.clone();
                describe_attack(display, &outcome, "You", &enemy_name)?;
                return Ok(PlayerMove::Acted);
            }
            Key::Char('2') => {
                if cast_skill(display, ctx)? {
                    return Ok(PlayerMove::Acted);
                }
            }
            Key::Char('3') => {
                if drink_potion(display, ctx)? {
                    return Ok(PlayerMove::Acted);
                }
            }
            Key::Char('4') => {
                if attempt_flee(ctx.rng, ctx.player) {
                    display.write_styled_line("You ran away!", StyleTag::Warning)?;
                    return Ok(PlayerMove::Fled);
                }
                display.write_styled_line("You failed to escape!", StyleTag::Bad)?;
                return Ok(PlayerMove::Acted);
            }
            _ => {
                display.write_styled_line("That's not a valid choice!", StyleTag::Bad)?;
            }
        }
    }
}

/// Skill submenu. Returns false if the player backed out or could not pay,
/// leaving the turn unspent.
fn cast_skill(display: &mut impl Display, ctx: &mut BattleContext<'_>) -> DuskholdResult<bool> {
    let skill_ids = ctx.player.learned_skill_ids();
    if skill_ids.is_empty() {
        display.write_styled_line("You have not learned any skills!", StyleTag::Warning)?;
        return Ok(false);
    }

    display.write_styled_line("Cast which skill? (Esc to cancel)", StyleTag::Title)?;
    let mut choices = Vec::new();
    for (i, skill_id) in skill_ids.iter().take(9).enumerate() {
        let Some(skill) = ctx.content.skill_by_id(skill_id) else {
            continue;
        };
        let level = ctx.player.skill_level(skill_id).unwrap_or(1);
        display.write_styled_line(
            &format!(
                "{}. {} Lv.{} (dmg {}, mp {})",
                i + 1,
                skill.name,
                level,
                progression::scaled_damage(skill.damage, level),
                progression::scaled_mp_cost(skill.mp_cost, level)
            ),
            StyleTag::Plain,
        )?;
        choices.push((skill.clone(), level));
    }

    loop {
        match read_key_blocking(display)? {
            Key::Escape => return Ok(false),
            Key::Char(c) => {
                let Some(index) = c.to_digit(10).map(|d| d as usize) else {
                    continue;
                };
                let Some((skill, level)) = index.checked_sub(1).and_then(|i| choices.get(i)) else {
                    continue;
                };
                let outcome =
                    resolve_attack(ctx.rng, ctx.player, ctx.enemy, Some((skill, *level)), ctx.elements);
                if outcome.insufficient_mp {
                    display.write_styled_line("Not enough MP!", StyleTag::Warning)?;
                    return Ok(false);
                }
                display.write_styled_line(&format!("You cast {}!", skill.name), StyleTag::Accent)?;
                let enemy_name = ctx.enemy.name.clone();
                describe_attack(display, &outcome, "You", &enemy_name)?;
                return Ok(true);
            }
            _ => {}
        }
    }
}

/// Potion submenu. Returns false if nothing was drinkable or the player
/// backed out.
fn drink_potion(display: &mut impl Display, ctx: &mut BattleContext<'_>) -> DuskholdResult<bool> {
    let consumables: Vec<(usize, String)> = ctx
        .player
        .inventory
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_consumable())
        .map(|(i, item)| (i, item.name.clone()))
        .collect();
    if consumables.is_empty() {
        display.write_styled_line("No items to use!", StyleTag::Warning)?;
        return Ok(false);
    }

    display.write_styled_line("Use which item? (Esc to cancel)", StyleTag::Title)?;
    for (slot, (_, name)) in consumables.iter().take(9).enumerate() {
        display.write_styled_line(&format!("{}. {}", slot + 1, name), StyleTag::Plain)?;
    }

    loop {
        match read_key_blocking(display)? {
            Key::Escape => return Ok(false),
            Key::Char(c) => {
                let Some(slot) = c.to_digit(10).map(|d| d as usize) else {
                    continue;
                };
                let Some(&(inventory_index, _)) =
                    slot.checked_sub(1).and_then(|i| consumables.get(i))
                else {
                    continue;
                };
                if let Some(item) = ctx.player.use_item(inventory_index) {
                    display
                        .write_styled_line(&format!("You used {}!", item.name), StyleTag::Good)?;
                    return Ok(true);
                }
                return Ok(false);
            }
            _ => {}
        }
    }
}

fn show_health(display: &mut impl Display, ctx: &BattleContext<'_>) -> DuskholdResult<()> {
    display.write_styled_line(
        &format!(
            "Enemy HP: {}/{} | Your HP: {}/{} MP: {}/{}",
            ctx.enemy.combat().hp().max(0),
            ctx.enemy.combat().max_hp(),
            ctx.player.combat().hp().max(0),
            ctx.player.combat().max_hp(),
            ctx.player.combat().mp(),
            ctx.player.combat().max_mp()
        ),
        StyleTag::Warning,
    )
}

fn describe_attack(
    display: &mut impl Display,
    outcome: &AttackOutcome,
    attacker: &str,
    defender: &str,
) -> DuskholdResult<()> {
    if outcome.missed {
        display.write_styled_line(&format!("{}'s attack missed!", attacker), StyleTag::Info)?;
        return Ok(());
    }
    if outcome.critical {
        display.write_styled_line("Critical hit!", StyleTag::Bad)?;
    }
    if let Some(damage) = outcome.damage {
        display.write_styled_line(
            &format!("{} attacked {} for {} damage!", attacker, defender, damage),
            StyleTag::Good,
        )?;
    }
    if outcome.stun_applied {
        display.write_styled_line(&format!("{} is stunned!", defender), StyleTag::Accent)?;
    }
    if outcome.dot_applied {
        display.write_styled_line(
            &format!("{} is afflicted by a lingering effect!", defender),
            StyleTag::Accent,
        )?;
    }
    Ok(())
}

fn report_turn_end(
    display: &mut impl Display,
    who: &str,
    report: TurnEnd,
) -> DuskholdResult<()> {
    if report.dot.total_damage > 0 {
        display.write_styled_line(
            &format!("{} took {} damage over time!", who, report.dot.total_damage),
            StyleTag::Accent,
        )?;
    }
    for name in &report.dot.expired {
        display.write_styled_line(&format!("{} wore off.", name), StyleTag::Info)?;
    }
    if report.stun_cleared {
        display.write_styled_line(&format!("{} is no longer stunned.", who), StyleTag::Info)?;
    }
    Ok(())
}
