//! Out-of-combat screens: the skill tree, the inventory, the ranking boards
//! and the death screen.

use super::{read_key_blocking, Display, Key, StyleTag};
use crate::game::{Combatant, GameSession};
use crate::net::api::RankCategory;
use crate::{progression, DuskholdResult};

/// Skill-tree screen: lists the class's skills with live costs; number keys
/// buy, Esc leaves.
pub fn skills_menu(display: &mut impl Display, session: &mut GameSession) -> DuskholdResult<()> {
    loop {
        display.clear_and_home()?;
        display.write_styled_line("=== SKILL TREE ===", StyleTag::Title)?;
        display.write_styled_line(
            &format!(
                "Class: {} | Skill Points: {}",
                session.player.class.name(),
                session.player.skill_points
            ),
            StyleTag::Info,
        )?;

        let skills: Vec<crate::content::Skill> = session
            .content
            .skills_for_class(session.player.class)
            .into_iter()
            .cloned()
            .collect();
        if skills.is_empty() {
            display.write_styled_line("No skills available for your class!", StyleTag::Bad)?;
        }
        for (i, skill) in skills.iter().take(9).enumerate() {
            let line = if let Some(level) = session.player.skill_level(&skill.id) {
                format!(
                    "{}. {} [LEARNED] Lv.{} (dmg {}, mp {})",
                    i + 1,
                    skill.name,
                    level,
                    progression::scaled_damage(skill.damage, level),
                    progression::scaled_mp_cost(skill.mp_cost, level)
                )
            } else {
                format!(
                    "{}. {} (dmg {}, mp {}) - cost {} SP",
                    i + 1,
                    skill.name,
                    skill.damage,
                    skill.mp_cost,
                    progression::skill_cost(skill, session.player.level)
                )
            };
            let style = if session.player.has_skill(&skill.id) {
                StyleTag::Good
            } else {
                StyleTag::Plain
            };
            display.write_styled_line(&line, style)?;
        }
        display.write_styled_line("[1-9] learn  [Esc/q] back", StyleTag::Plain)?;

        match read_key_blocking(display)? {
            Key::Escape | Key::Char('q') => return Ok(()),
            Key::Char(c) => {
                let Some(index) = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1)) else {
                    continue;
                };
                let Some(skill) = skills.get(index) else {
                    continue;
                };
                match progression::buy_skill(&mut session.player, skill) {
                    Ok(()) => {
                        display.write_styled_line(
                            &format!("You learned {}!", skill.name),
                            StyleTag::Good,
                        )?;
                    }
                    Err(_) => {
                        display.write_styled_line(
                            "You can't learn that skill right now!",
                            StyleTag::Warning,
                        )?;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Inventory screen: number keys consume potions, Esc leaves.
pub fn inventory_menu(display: &mut impl Display, session: &mut GameSession) -> DuskholdResult<()> {
    loop {
        display.clear_and_home()?;
        display.write_styled_line("=== INVENTORY ===", StyleTag::Title)?;
        if session.player.inventory.is_empty() {
            display.write_styled_line("Your bag is empty.", StyleTag::Plain)?;
        }
        for (i, item) in session.player.inventory.iter().take(9).enumerate() {
            let note = if item.is_consumable() { " (usable)" } else { "" };
            display.write_styled_line(&format!("{}. {}{}", i + 1, item.name, note), StyleTag::Plain)?;
        }
        display.write_styled_line("[1-9] use  [Esc/q] back", StyleTag::Plain)?;

        match read_key_blocking(display)? {
            Key::Escape | Key::Char('q') => return Ok(()),
            Key::Char(c) => {
                let Some(index) = c.to_digit(10).and_then(|d| (d as usize).checked_sub(1)) else {
                    continue;
                };
                if index >= session.player.inventory.len() {
                    continue;
                }
                match session.player.use_item(index) {
                    Some(item) => display
                        .write_styled_line(&format!("You used {}!", item.name), StyleTag::Good)?,
                    None => display
                        .write_styled_line("That item can't be used.", StyleTag::Warning)?,
                }
            }
            _ => {}
        }
    }
}

/// Ranking boards, fetched live; degrades to a notice when offline.
pub fn rankings_menu(display: &mut impl Display, session: &mut GameSession) -> DuskholdResult<()> {
    display.clear_and_home()?;
    display.write_styled_line("=== RANKINGS ===", StyleTag::Title)?;

    for (category, label) in [
        (RankCategory::Gold, "Richest"),
        (RankCategory::Level, "Highest Level"),
        (RankCategory::Dungeon, "Deepest Delver"),
    ] {
        display.write_styled_line(&format!("-- {} --", label), StyleTag::Info)?;
        match session.rankings(category) {
            Ok(entries) => {
                for entry in entries.iter().take(5) {
                    display.write_styled_line(
                        &format!("{}: {}", entry.name, entry.value),
                        StyleTag::Plain,
                    )?;
                }
            }
            Err(_) => {
                display.write_styled_line("(rankings unavailable offline)", StyleTag::Warning)?;
            }
        }
    }
    display.write_styled_line("Press any key to continue...", StyleTag::Plain)?;
    read_key_blocking(display)?;
    Ok(())
}

/// Final stats screen; waits for any key.
pub fn death_screen(display: &mut impl Display, session: &GameSession) -> DuskholdResult<()> {
    let player = &session.player;
    display.clear_and_home()?;
    display.write_styled_line("=== YOU HAVE FALLEN ===", StyleTag::Bad)?;
    display.write_styled_line(
        &format!("{} the {} reached level {}", player.name, player.class.name(), player.level),
        StyleTag::Plain,
    )?;
    display.write_styled_line(
        &format!(
            "Deepest stage: {} | Gold held: {} | ATK {} DEF {}",
            player.max_dungeon_level,
            player.gold,
            player.combat().attack(),
            player.combat().defense()
        ),
        StyleTag::Plain,
    )?;
    display.write_styled_line("Press any key to exit...", StyleTag::Plain)?;
    read_key_blocking(display)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentPack, PlayerClass};
    use crate::net::api::OfflineRecords;
    use crate::net::NullRelay;
    use crate::ui::BufferDisplay;

    fn session() -> GameSession {
        GameSession::new(
            "Ash",
            PlayerClass::Rogue,
            3,
            ContentPack::builtin(),
            Box::new(NullRelay),
            Box::new(OfflineRecords::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_skills_menu_buys_with_points() {
        let mut session = session();
        session.player.skill_points = 5;
        let mut display = BufferDisplay::new();
        // Rogue list is in table order; slot 1 is Cheap Shot (cost 1).
        display.script_keys([Key::Char('1'), Key::Escape]);

        skills_menu(&mut display, &mut session).unwrap();
        assert!(session.player.has_skill("cheap_shot"));
        assert!(display.saw("You learned Cheap Shot!"));
    }

    #[test]
    fn test_skills_menu_rejects_broke_player() {
        let mut session = session();
        session.player.skill_points = 0;
        let mut display = BufferDisplay::new();
        display.script_keys([Key::Char('1'), Key::Escape]);

        skills_menu(&mut display, &mut session).unwrap();
        assert!(!session.player.has_skill("cheap_shot"));
        assert!(display.saw("can't learn"));
    }

    #[test]
    fn test_inventory_menu_consumes_potion() {
        let mut session = session();
        let potion = session
            .content
            .item_by_name("Health Potion")
            .unwrap()
            .clone();
        session.player.add_to_inventory(potion);
        session.player.combat_mut().set_hp(10);

        let mut display = BufferDisplay::new();
        display.script_keys([Key::Char('1'), Key::Escape]);
        inventory_menu(&mut display, &mut session).unwrap();

        assert!(session.player.inventory.is_empty());
        assert_eq!(session.player.combat().hp(), 40);
    }

    #[test]
    fn test_rankings_menu_degrades_offline() {
        let mut session = session();
        let mut display = BufferDisplay::new();
        display.script_keys([Key::Enter]);
        rankings_menu(&mut display, &mut session).unwrap();
        assert!(display.saw("rankings unavailable"));
    }
}
